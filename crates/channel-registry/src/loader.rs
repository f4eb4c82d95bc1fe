use crate::{ChannelAddress, ChannelConfig, ChannelRegistry, ConfigError, Domain};
use safety_limits::OutputLimits;
use serde::Deserialize;

/// One channel as written in the configuration file.
///
/// `min`/`max` must be given together (output channels only);
/// `poll_interval_ms` enables periodic sampling on an input channel.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChannelSpec {
    pub domain: Domain,
    pub board: u32,
    pub channel: u32,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    #[serde(default)]
    pub poll_interval_ms: Option<u64>,
}

impl ChannelSpec {
    pub fn into_config(self) -> Result<ChannelConfig, ConfigError> {
        let address = ChannelAddress {
            domain: self.domain,
            board: self.board,
            channel: self.channel,
        };
        let limits = match (self.min, self.max) {
            (Some(min_volts), Some(max_volts)) => Some(OutputLimits {
                min_volts,
                max_volts,
            }),
            (None, None) => None,
            _ => return Err(ConfigError::PartialLimits(address)),
        };
        Ok(ChannelConfig {
            address,
            limits,
            poll_interval_ms: self.poll_interval_ms,
        })
    }
}

/// Validate the configured channels and build the registry from them.
pub fn build_registry(
    specs: impl IntoIterator<Item = ChannelSpec>,
) -> Result<ChannelRegistry, ConfigError> {
    let mut registry = ChannelRegistry::new();
    for spec in specs {
        registry.register(spec.into_config()?)?;
    }
    Ok(registry)
}
