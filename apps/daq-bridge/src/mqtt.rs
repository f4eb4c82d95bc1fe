//! MQTT session: subscriptions, dispatch fan-out, and the publisher task.
//!
//! Each inbound publish is dispatched on its own task so a slow hardware
//! transaction on one channel never delays decoding of the next message.
//! All outbound events funnel through one mpsc into a single publisher.

use crate::config::MqttConfig;
use anyhow::Context;
use bridge_core::{
    decode, parse_set_payload, DispatchError, Dispatcher, InboundKind, InboundMessage,
    OutboundBody, OutboundEvent,
};
use channel_registry::MetricsHub;
use daq_hal::AnalogIo;
use rumqttc::{AsyncClient, Event, LastWill, MqttOptions, Packet, Publish, QoS};
use serde_json::json;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub const STATUS_TOPIC: &str = "daq/bridge/status";

const SUBSCRIPTIONS: [&str; 2] = ["daq/dac/+/+/set", "daq/adc/+/+/request"];
const RECONNECT_DELAY: Duration = Duration::from_secs(5);
const OUTBOUND_QUEUE: usize = 256;

/// Connect to the broker and run the bridge until interrupted.
pub async fn run<H: AnalogIo + 'static>(
    config: &MqttConfig,
    dispatcher: Dispatcher<H>,
    hub: MetricsHub,
) -> anyhow::Result<()> {
    let mut options = MqttOptions::new(
        &config.client_id,
        &config.broker_address,
        config.broker_port,
    );
    options.set_keep_alive(Duration::from_secs(config.keep_alive_secs));
    if let (Some(user), Some(pass)) = (&config.username, &config.password) {
        options.set_credentials(user, pass);
    }
    // The broker flips the status to offline for us if the bridge dies.
    options.set_last_will(LastWill::new(
        STATUS_TOPIC,
        status_payload(false),
        QoS::AtLeastOnce,
        true,
    ));

    let (client, mut event_loop) = AsyncClient::new(options, 64);

    let (events_tx, events_rx) = mpsc::channel::<OutboundEvent>(OUTBOUND_QUEUE);
    let publisher = tokio::spawn(publish_events(client.clone(), events_rx, hub.clone()));

    // Sampler events pass through a counting forwarder into the same queue,
    // so scheduled and on-demand reads share one publish path.
    let (samples_tx, mut samples_rx) = mpsc::channel::<OutboundEvent>(OUTBOUND_QUEUE);
    let samplers = bridge_core::spawn_samplers(dispatcher.clone(), samples_tx);
    let forwarder = {
        let events_tx = events_tx.clone();
        let hub = hub.clone();
        tokio::spawn(async move {
            while let Some(event) = samples_rx.recv().await {
                hub.bridge.samples_taken.inc();
                if events_tx.send(event).await.is_err() {
                    break;
                }
            }
        })
    };

    loop {
        tokio::select! {
            polled = event_loop.poll() => match polled {
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    info!(
                        broker = %config.broker_address,
                        port = config.broker_port,
                        "connected to broker"
                    );
                    for topic in SUBSCRIPTIONS {
                        client
                            .subscribe(topic, QoS::AtLeastOnce)
                            .await
                            .with_context(|| format!("subscribing to {topic}"))?;
                    }
                    client
                        .publish(STATUS_TOPIC, QoS::AtLeastOnce, true, status_payload(true))
                        .await
                        .context("publishing online status")?;
                }
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    hub.bridge.rx_commands.inc();
                    handle_publish(publish, &dispatcher, &events_tx);
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(error = %e, "broker connection lost, retrying");
                    tokio::time::sleep(RECONNECT_DELAY).await;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown requested");
                break;
            }
        }
    }

    for handle in &samplers {
        handle.abort();
    }
    forwarder.abort();
    publisher.abort();
    let _ = client
        .publish(STATUS_TOPIC, QoS::AtLeastOnce, true, status_payload(false))
        .await;
    let _ = client.disconnect().await;
    // Keep polling briefly so the offline status and disconnect reach the
    // broker before the session drops.
    let drain = async {
        while event_loop.poll().await.is_ok() {}
    };
    let _ = tokio::time::timeout(Duration::from_secs(2), drain).await;
    Ok(())
}

/// Decode one inbound publish and hand it to a dispatch task.
///
/// An undecodable topic is unanswerable (there is no address to derive an
/// error topic from) and is only logged. A bad payload on a decodable topic
/// is answerable and becomes an error event like any other failure.
fn handle_publish<H: AnalogIo + 'static>(
    publish: Publish,
    dispatcher: &Dispatcher<H>,
    events: &mpsc::Sender<OutboundEvent>,
) {
    let (address, kind) = match decode(&publish.topic) {
        Ok(decoded) => decoded,
        Err(err) => {
            warn!(topic = %publish.topic, error = %err, "ignoring undecodable topic");
            return;
        }
    };
    let value = match kind {
        InboundKind::Set => match parse_set_payload(&publish.payload) {
            Ok(volts) => Some(volts),
            Err(err) => {
                let event = DispatchError::InvalidPayload(err.to_string()).into_event(address);
                let events = events.clone();
                tokio::spawn(async move {
                    let _ = events.send(event).await;
                });
                return;
            }
        },
        InboundKind::Request => None,
    };

    let msg = InboundMessage {
        address,
        kind,
        value,
    };
    let dispatcher = dispatcher.clone();
    let events = events.clone();
    tokio::spawn(async move {
        let event = dispatcher.dispatch_to_event(msg).await;
        let _ = events.send(event).await;
    });
}

async fn publish_events(
    client: AsyncClient,
    mut events: mpsc::Receiver<OutboundEvent>,
    hub: MetricsHub,
) {
    while let Some(event) = events.recv().await {
        match event.body {
            OutboundBody::Response { .. } => hub.bridge.tx_responses.inc(),
            OutboundBody::Error { .. } => hub.bridge.tx_errors.inc(),
        }
        let topic = event.topic();
        debug!(%topic, retain = event.retain, "publishing event");
        if let Err(e) = client
            .publish(topic.as_str(), QoS::AtLeastOnce, event.retain, event.payload())
            .await
        {
            warn!(%topic, error = %e, "failed to queue publish");
        }
    }
}

fn status_payload(connected: bool) -> String {
    json!({ "connected": connected }).to_string()
}
