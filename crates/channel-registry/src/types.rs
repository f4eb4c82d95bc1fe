use core::fmt;
use safety_limits::OutputLimits;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Whether a channel drives a DAC output or samples an ADC input.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Output,
    Input,
}

/// Identity of one analog line on one board. Immutable once parsed.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ChannelAddress {
    pub domain: Domain,
    pub board: u32,
    pub channel: u32,
}

impl fmt::Display for ChannelAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let domain = match self.domain {
            Domain::Output => "dac",
            Domain::Input => "adc",
        };
        write!(f, "{domain}/{}/{}", self.board, self.channel)
    }
}

/// Startup configuration for one channel. Immutable for the process lifetime.
///
/// `limits` is present exactly for output channels, `poll_interval_ms` only
/// ever for input channels; [`crate::ChannelRegistry::register`] enforces
/// both.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    pub address: ChannelAddress,
    pub limits: Option<OutputLimits>,
    pub poll_interval_ms: Option<u64>,
}

/// Last known value of a channel, owned by the registry.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChannelState {
    pub last_value: Option<f64>,
    pub last_updated: Option<OffsetDateTime>,
}
