use anyhow::{Context, Result};
use bridge_core::Dispatcher;
use channel_registry::{build_registry, MetricsHub};
use clap::{Parser, ValueEnum};
use daq_hal::{AnalogIo, MockDaq};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

mod config;
mod mqtt;

#[derive(Parser)]
#[command(
    name = "daq-bridge",
    version,
    about = "MQTT bridge for analog data-acquisition channels"
)]
struct Args {
    /// Path to the YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Hardware backend to drive
    #[arg(long, value_enum, default_value_t = Backend::Mock)]
    backend: Backend,

    /// Device name passed to the backend
    #[arg(long, default_value = "mock0")]
    device: String,

    /// Log a metrics snapshot every N seconds (0 disables)
    #[arg(long, default_value_t = 0)]
    metrics_interval_secs: u64,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Backend {
    /// In-process loopback device (portable)
    Mock,
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_tracing();
    let args = Args::parse();

    let config = config::load_config(&args.config)?;
    info!(
        path = %args.config,
        channels = config.channels.len(),
        "configuration loaded"
    );
    if config.channels.is_empty() {
        warn!("no channels configured; every request will be answered with an error");
    }

    let registry =
        Arc::new(build_registry(config.channels.clone()).context("building channel registry")?);
    let hub = MetricsHub::new().map_err(|e| anyhow::anyhow!("failed to init metrics: {e}"))?;
    hub.bridge.channels_loaded.set(registry.len() as i64);

    if args.metrics_interval_secs > 0 {
        let hub = hub.clone();
        let period = Duration::from_secs(args.metrics_interval_secs);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                info!(metrics = %hub.encode_text(), "metrics snapshot");
            }
        });
    }

    match args.backend {
        Backend::Mock => {
            let hardware = Arc::new(
                MockDaq::open(&args.device)
                    .with_context(|| format!("opening device {}", args.device))?,
            );
            let dispatcher = Dispatcher::new(registry, hardware);
            mqtt::run(&config.mqtt, dispatcher, hub).await
        }
    }
}

fn setup_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
