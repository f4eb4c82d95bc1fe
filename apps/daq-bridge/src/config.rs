use anyhow::Context;
use channel_registry::ChannelSpec;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct BridgeConfig {
    #[serde(default)]
    pub mqtt: MqttConfig,
    #[serde(default)]
    pub channels: Vec<ChannelSpec>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    pub broker_address: String,
    pub broker_port: u16,
    pub client_id: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub keep_alive_secs: u64,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            broker_address: "localhost".to_string(),
            broker_port: 1883,
            client_id: "daq-bridge".to_string(),
            username: None,
            password: None,
            keep_alive_secs: 60,
        }
    }
}

pub fn load_config(path: impl AsRef<Path>) -> anyhow::Result<BridgeConfig> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading config: {}", path.display()))?;
    let config: BridgeConfig =
        serde_yaml::from_str(&raw).with_context(|| format!("parsing config: {}", path.display()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_uses_defaults() {
        let config: BridgeConfig = serde_yaml::from_str("channels: []").unwrap();
        assert_eq!(config.mqtt.broker_address, "localhost");
        assert_eq!(config.mqtt.broker_port, 1883);
        assert_eq!(config.mqtt.client_id, "daq-bridge");
        assert_eq!(config.mqtt.keep_alive_secs, 60);
        assert!(config.channels.is_empty());
    }

    #[test]
    fn full_config_parses() {
        let yaml = r#"
mqtt:
  broker_address: broker.lab.internal
  broker_port: 8883
  client_id: daq-bridge-rig2
  username: rig2
  password: hunter2
  keep_alive_secs: 30
channels:
  - domain: output
    board: 0
    channel: 1
    min: 0.0
    max: 5.0
  - domain: input
    board: 0
    channel: 2
    poll_interval_ms: 1000
"#;
        let config: BridgeConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.mqtt.broker_address, "broker.lab.internal");
        assert_eq!(config.mqtt.username.as_deref(), Some("rig2"));
        assert_eq!(config.channels.len(), 2);
        assert_eq!(config.channels[1].poll_interval_ms, Some(1000));
    }
}
