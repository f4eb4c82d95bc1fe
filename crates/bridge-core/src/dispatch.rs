use crate::messages::{InboundKind, InboundMessage, OutboundEvent};
use channel_registry::{Busy, ChannelAddress, ChannelRegistry};
use daq_hal::{AnalogIo, HardwareError};
use safety_limits::SafetyError;
use std::sync::Arc;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{debug, warn};

/// Why a dispatch produced an error event instead of a response.
///
/// Each variant's display text is exactly what goes out in the error
/// payload's `error` field.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("unknown channel")]
    UnknownChannel,
    #[error(transparent)]
    Busy(#[from] Busy),
    #[error("channel is not writable")]
    NotWritable,
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
    #[error(transparent)]
    Safety(#[from] SafetyError),
    #[error(transparent)]
    Hardware(#[from] HardwareError),
}

impl DispatchError {
    /// Convert a failed dispatch into its single outbound error event.
    pub fn into_event(self, address: ChannelAddress) -> OutboundEvent {
        OutboundEvent::error(address, self.to_string())
    }
}

/// Per-message state machine executing decoded commands against hardware.
///
/// Stateless across messages except through the registry. Hardware calls run
/// on the blocking thread pool so a slow driver transaction on one channel
/// never stalls dispatch of unrelated channels.
pub struct Dispatcher<H> {
    registry: Arc<ChannelRegistry>,
    hardware: Arc<H>,
}

impl<H> Clone for Dispatcher<H> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            hardware: Arc::clone(&self.hardware),
        }
    }
}

impl<H: AnalogIo + 'static> Dispatcher<H> {
    pub fn new(registry: Arc<ChannelRegistry>, hardware: Arc<H>) -> Self {
        Self { registry, hardware }
    }

    pub fn registry(&self) -> &Arc<ChannelRegistry> {
        &self.registry
    }

    /// Execute one inbound message to completion.
    ///
    /// The in-flight guard is held from lookup until the state update and
    /// released on every exit path. Safety validation runs before any
    /// hardware write, unconditionally.
    pub async fn dispatch(&self, msg: InboundMessage) -> Result<OutboundEvent, DispatchError> {
        let address = msg.address;
        let config = self
            .registry
            .lookup(&address)
            .cloned()
            .ok_or(DispatchError::UnknownChannel)?;
        let _guard = self.registry.try_acquire(&address)?;

        let voltage = match msg.kind {
            InboundKind::Set => {
                let requested = msg
                    .value
                    .ok_or_else(|| DispatchError::InvalidPayload("no voltage provided".into()))?;
                let limits = config.limits.ok_or(DispatchError::NotWritable)?;
                safety_limits::validate(&limits, requested)?;
                let hardware = Arc::clone(&self.hardware);
                run_blocking(move || {
                    hardware.write_analog(address.board, address.channel, requested)
                })
                .await?;
                debug!(%address, volts = requested, "analog write complete");
                requested
            }
            InboundKind::Request => {
                let hardware = Arc::clone(&self.hardware);
                let volts =
                    run_blocking(move || hardware.read_analog(address.board, address.channel))
                        .await?;
                debug!(%address, volts, "analog read complete");
                volts
            }
        };

        self.registry
            .update_state(&address, voltage, OffsetDateTime::now_utc());
        Ok(OutboundEvent::response(address, voltage))
    }

    /// Dispatch and fold any failure into its error event, so every inbound
    /// message yields exactly one outbound event.
    pub async fn dispatch_to_event(&self, msg: InboundMessage) -> OutboundEvent {
        let address = msg.address;
        match self.dispatch(msg).await {
            Ok(event) => event,
            Err(err) => {
                warn!(%address, error = %err, "dispatch failed");
                err.into_event(address)
            }
        }
    }
}

async fn run_blocking<T: Send + 'static>(
    op: impl FnOnce() -> Result<T, HardwareError> + Send + 'static,
) -> Result<T, DispatchError> {
    match tokio::task::spawn_blocking(op).await {
        Ok(result) => result.map_err(DispatchError::Hardware),
        Err(join) => Err(DispatchError::Hardware(HardwareError::Io(format!(
            "hardware task failed: {join}"
        )))),
    }
}
