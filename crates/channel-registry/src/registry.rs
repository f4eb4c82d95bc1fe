use crate::{ChannelAddress, ChannelConfig, ChannelState, Domain};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use time::OffsetDateTime;
use tracing::debug;

/// Startup-time configuration failures. Any of these is fatal: the bridge
/// must not come up with an inconsistent channel table.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("duplicate channel address: {0}")]
    DuplicateAddress(ChannelAddress),
    #[error("output channel {0} has no voltage limits")]
    MissingLimits(ChannelAddress),
    #[error("input channel {0} must not declare voltage limits")]
    UnexpectedLimits(ChannelAddress),
    #[error("output channel {0} cannot be periodically sampled")]
    UnexpectedPollInterval(ChannelAddress),
    #[error("poll interval for {0} must be non-zero")]
    ZeroPollInterval(ChannelAddress),
    #[error("invalid limits for {address}: min {min:?} exceeds max {max:?}")]
    InvalidLimits {
        address: ChannelAddress,
        min: f64,
        max: f64,
    },
    #[error("channel {0} must set both min and max, or neither")]
    PartialLimits(ChannelAddress),
}

/// The channel is already executing an operation against hardware.
#[derive(Debug, Error)]
#[error("channel busy")]
pub struct Busy;

struct ChannelEntry {
    config: ChannelConfig,
    in_flight: AtomicBool,
    state: Mutex<ChannelState>,
}

/// Scoped in-flight marker for one channel.
///
/// Dropping the guard clears the flag, so every exit path of an operation,
/// including failures, releases the channel.
pub struct InFlightGuard {
    entry: Arc<ChannelEntry>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.entry.in_flight.store(false, Ordering::Release);
    }
}

/// Arena of all configured channels, keyed by [`ChannelAddress`].
///
/// Built once at startup, then shared immutably; all per-channel mutability
/// lives inside the entries so lookups never contend across addresses.
#[derive(Default)]
pub struct ChannelRegistry {
    entries: HashMap<ChannelAddress, Arc<ChannelEntry>>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one configured channel. Called once per channel at startup.
    pub fn register(&mut self, config: ChannelConfig) -> Result<(), ConfigError> {
        let address = config.address;
        match (address.domain, &config.limits) {
            (Domain::Output, None) => return Err(ConfigError::MissingLimits(address)),
            (Domain::Input, Some(_)) => return Err(ConfigError::UnexpectedLimits(address)),
            (Domain::Output, Some(limits)) => {
                if limits.min_volts > limits.max_volts {
                    return Err(ConfigError::InvalidLimits {
                        address,
                        min: limits.min_volts,
                        max: limits.max_volts,
                    });
                }
            }
            (Domain::Input, None) => {}
        }
        match (address.domain, config.poll_interval_ms) {
            (Domain::Output, Some(_)) => {
                return Err(ConfigError::UnexpectedPollInterval(address))
            }
            (Domain::Input, Some(0)) => return Err(ConfigError::ZeroPollInterval(address)),
            _ => {}
        }
        match self.entries.entry(address) {
            Entry::Occupied(_) => Err(ConfigError::DuplicateAddress(address)),
            Entry::Vacant(slot) => {
                debug!(%address, "registered channel");
                slot.insert(Arc::new(ChannelEntry {
                    config,
                    in_flight: AtomicBool::new(false),
                    state: Mutex::new(ChannelState::default()),
                }));
                Ok(())
            }
        }
    }

    pub fn lookup(&self, address: &ChannelAddress) -> Option<&ChannelConfig> {
        self.entries.get(address).map(|e| &e.config)
    }

    /// Atomically mark the channel in flight.
    ///
    /// Fails with [`Busy`] when an operation is already running on this
    /// address (an unregistered address is never acquirable). The caller
    /// must report the rejection rather than block, to bound latency.
    pub fn try_acquire(&self, address: &ChannelAddress) -> Result<InFlightGuard, Busy> {
        let entry = self.entries.get(address).ok_or(Busy)?;
        entry
            .in_flight
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .map_err(|_| Busy)?;
        Ok(InFlightGuard {
            entry: Arc::clone(entry),
        })
    }

    /// Record a completed operation's value.
    ///
    /// A timestamp at or before the currently recorded one is dropped, so a
    /// stale completion can never overwrite a newer state.
    pub fn update_state(&self, address: &ChannelAddress, value: f64, timestamp: OffsetDateTime) {
        let Some(entry) = self.entries.get(address) else {
            return;
        };
        let mut state = entry.state.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = state.last_updated {
            if timestamp <= previous {
                debug!(%address, "dropping stale state update");
                return;
            }
        }
        state.last_value = Some(value);
        state.last_updated = Some(timestamp);
    }

    /// Snapshot of a channel's last known value.
    pub fn state(&self, address: &ChannelAddress) -> Option<ChannelState> {
        self.entries
            .get(address)
            .map(|e| *e.state.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Input channels configured for periodic sampling.
    pub fn polled_inputs(&self) -> Vec<ChannelConfig> {
        let mut configs: Vec<ChannelConfig> = self
            .entries
            .values()
            .filter(|e| e.config.poll_interval_ms.is_some())
            .map(|e| e.config.clone())
            .collect();
        configs.sort_by_key(|c| (c.address.board, c.address.channel));
        configs
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
