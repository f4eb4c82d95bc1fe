//! channel-registry: configured analog channels and their runtime state
//!
//! The registry is built once at startup from configuration and is the single
//! point of synchronization between on-demand command handlers and the
//! periodic sampler. Each channel carries an in-flight flag behind an RAII
//! guard so that operations on one address serialize while distinct addresses
//! proceed in parallel.

mod types;
pub use types::{ChannelAddress, ChannelConfig, ChannelState, Domain};

mod registry;
pub use registry::{Busy, ChannelRegistry, ConfigError, InFlightGuard};

mod loader;
pub use loader::{build_registry, ChannelSpec};

mod metrics;
pub use metrics::{BridgeMetrics, MetricsHub};
