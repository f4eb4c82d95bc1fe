use crate::{AnalogIo, DeviceInfo, Result};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use tracing::trace;

/// A simple in-process loopback device. Each instance is independent.
///
/// Writes are remembered per `(board, channel)`; reads return the value
/// staged with [`MockDaq::set_input`], falling back to the last written
/// value for that address, then to 0.0.
pub struct MockDaq {
    name: String,
    outputs: Mutex<HashMap<(u32, u32), f64>>,
    inputs: Mutex<HashMap<(u32, u32), f64>>,
}

impl MockDaq {
    /// Stage the voltage the next reads of `(board, channel)` will return.
    pub fn set_input(&self, board: u32, channel: u32, volts: f64) {
        self.inputs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((board, channel), volts);
    }

    /// The last voltage written to `(board, channel)`, if any.
    pub fn last_written(&self, board: u32, channel: u32) -> Option<f64> {
        self.outputs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(board, channel))
            .copied()
    }
}

impl AnalogIo for MockDaq {
    fn open(name: &str) -> Result<Self> {
        Ok(Self {
            name: name.to_string(),
            outputs: Mutex::new(HashMap::new()),
            inputs: Mutex::new(HashMap::new()),
        })
    }

    fn list() -> Result<Vec<DeviceInfo>> {
        Ok(vec![DeviceInfo {
            name: "mock0".to_string(),
            driver: "mock".to_string(),
        }])
    }

    fn write_analog(&self, board: u32, channel: u32, volts: f64) -> Result<()> {
        trace!(device = %self.name, board, channel, volts, "mock write");
        self.outputs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((board, channel), volts);
        Ok(())
    }

    fn read_analog(&self, board: u32, channel: u32) -> Result<f64> {
        let staged = self
            .inputs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(board, channel))
            .copied();
        let volts = match staged {
            Some(v) => v,
            None => self.last_written(board, channel).unwrap_or(0.0),
        };
        trace!(device = %self.name, board, channel, volts, "mock read");
        Ok(volts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_returns_staged_input() {
        let daq = MockDaq::open("mock0").unwrap();
        daq.set_input(0, 2, 3.3);
        assert_eq!(daq.read_analog(0, 2).unwrap(), 3.3);
    }

    #[test]
    fn read_falls_back_to_written_value() {
        let daq = MockDaq::open("mock0").unwrap();
        daq.write_analog(1, 0, 2.5).unwrap();
        assert_eq!(daq.read_analog(1, 0).unwrap(), 2.5);
        assert_eq!(daq.last_written(1, 0), Some(2.5));
    }

    #[test]
    fn unknown_channel_reads_zero() {
        let daq = MockDaq::open("mock0").unwrap();
        assert_eq!(daq.read_analog(7, 7).unwrap(), 0.0);
    }
}
