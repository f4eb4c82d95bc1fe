use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};

#[derive(Clone)]
pub struct BridgeMetrics {
    pub rx_commands: IntCounter,
    pub tx_responses: IntCounter,
    pub tx_errors: IntCounter,
    pub samples_taken: IntCounter,
    pub channels_loaded: IntGauge,
}

#[derive(Clone)]
pub struct MetricsHub {
    pub registry: Registry,
    pub bridge: BridgeMetrics,
}

impl MetricsHub {
    pub fn new() -> Result<Self, String> {
        let registry = Registry::new();
        let rx_commands = IntCounter::new("daq_rx_commands", "Total bus commands received")
            .map_err(|e| format!("metrics init error: {e}"))?;
        let tx_responses = IntCounter::new("daq_tx_responses", "Total response events published")
            .map_err(|e| format!("metrics init error: {e}"))?;
        let tx_errors = IntCounter::new("daq_tx_errors", "Total error events published")
            .map_err(|e| format!("metrics init error: {e}"))?;
        let samples_taken = IntCounter::new("daq_samples_taken", "Total periodic samples completed")
            .map_err(|e| format!("metrics init error: {e}"))?;
        let channels_loaded =
            IntGauge::new("daq_channels_loaded", "Number of channels registered at startup")
                .map_err(|e| format!("metrics init error: {e}"))?;
        let bridge = BridgeMetrics {
            rx_commands,
            tx_responses,
            tx_errors,
            samples_taken,
            channels_loaded,
        };
        let _ = registry.register(Box::new(bridge.rx_commands.clone()));
        let _ = registry.register(Box::new(bridge.tx_responses.clone()));
        let _ = registry.register(Box::new(bridge.tx_errors.clone()));
        let _ = registry.register(Box::new(bridge.samples_taken.clone()));
        let _ = registry.register(Box::new(bridge.channels_loaded.clone()));
        Ok(Self { registry, bridge })
    }

    pub fn encode_text(&self) -> String {
        let mut buf = Vec::new();
        let encoder = TextEncoder::new();
        if let Err(e) = encoder.encode(&self.registry.gather(), &mut buf) {
            return format!("error encoding metrics: {e}");
        }
        String::from_utf8(buf).unwrap_or_default()
    }
}
