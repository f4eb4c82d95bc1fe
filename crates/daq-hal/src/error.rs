use thiserror::Error;

pub type Result<T, E = HardwareError> = core::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum HardwareError {
    #[error("device not found: {0}")]
    DeviceNotFound(String),
    #[error("operation not supported on this backend: {0}")]
    Unsupported(&'static str),
    #[error("driver I/O error: {0}")]
    Io(String),
    #[error("no such channel: board {board} channel {channel}")]
    NoSuchChannel { board: u32, channel: u32 },
}
