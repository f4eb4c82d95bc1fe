use crate::{DeviceInfo, Result};

/// A minimal blocking analog I/O interface.
///
/// Calls may block for the duration of a hardware transaction, so callers on
/// an async runtime should run them on a blocking-capable thread. Implementors
/// handle their own internal synchronization; operations on distinct channels
/// must not serialize against each other.
pub trait AnalogIo: Send + Sync {
    /// Open a device backend by name (e.g., "mock0", "usb-1208fs").
    fn open(name: &str) -> Result<Self>
    where
        Self: Sized;

    /// Attempt to list available devices for this backend.
    fn list() -> Result<Vec<DeviceInfo>>;

    /// Drive an analog output channel to `volts`.
    fn write_analog(&self, board: u32, channel: u32, volts: f64) -> Result<()>;

    /// Sample an analog input channel, returning the voltage read.
    fn read_analog(&self, board: u32, channel: u32) -> Result<f64>;
}
