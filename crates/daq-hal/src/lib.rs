//! daq-hal: cross-platform analog I/O abstractions
//!
//! This crate provides traits and types for talking to multichannel analog
//! data-acquisition hardware (DAC outputs, ADC inputs), with feature-gated
//! backends. The default build enables a `mock` backend so that binaries and
//! tests can compile on any host without native drivers.

mod types;
pub use types::DeviceInfo;

mod error;
pub use error::{HardwareError, Result};

mod traits;
pub use traits::AnalogIo;

#[cfg(feature = "mock")]
mod mock;

#[cfg(feature = "mock")]
pub use mock::MockDaq;
