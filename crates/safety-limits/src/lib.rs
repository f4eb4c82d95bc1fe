//! safety-limits: output-range validation for analog channels
//!
//! Every voltage bound for hardware must pass [`validate`] first. The check
//! is pure and unconditional; a rejected value never reaches a driver.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configured safe output range for a single analog output channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutputLimits {
    pub min_volts: f64,
    pub max_volts: f64,
}

impl OutputLimits {
    pub fn contains(&self, volts: f64) -> bool {
        volts >= self.min_volts && volts <= self.max_volts
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SafetyError {
    #[error("out of range: {requested:?} not in [{min:?},{max:?}]")]
    OutOfRange { min: f64, max: f64, requested: f64 },
    #[error("not a finite voltage: {requested:?}")]
    NotFinite { requested: f64 },
}

/// Check a requested output voltage against the channel's configured range.
///
/// NaN and infinite values are rejected outright; NaN compares false against
/// both bounds and would otherwise pass a naive range check.
pub fn validate(limits: &OutputLimits, requested: f64) -> Result<(), SafetyError> {
    if !requested.is_finite() {
        return Err(SafetyError::NotFinite { requested });
    }
    if !limits.contains(requested) {
        return Err(SafetyError::OutOfRange {
            min: limits.min_volts,
            max: limits.max_volts,
            requested,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMITS: OutputLimits = OutputLimits {
        min_volts: 0.0,
        max_volts: 5.0,
    };

    #[test]
    fn in_range_passes() {
        assert!(validate(&LIMITS, 2.5).is_ok());
    }

    #[test]
    fn bounds_are_inclusive() {
        assert!(validate(&LIMITS, 0.0).is_ok());
        assert!(validate(&LIMITS, 5.0).is_ok());
    }

    #[test]
    fn above_max_rejected() {
        let err = validate(&LIMITS, 9.0).unwrap_err();
        assert_eq!(
            err.to_string(),
            "out of range: 9.0 not in [0.0,5.0]"
        );
    }

    #[test]
    fn below_min_rejected() {
        assert!(matches!(
            validate(&LIMITS, -0.1),
            Err(SafetyError::OutOfRange { .. })
        ));
    }

    #[test]
    fn nan_and_infinities_rejected() {
        assert!(matches!(
            validate(&LIMITS, f64::NAN),
            Err(SafetyError::NotFinite { .. })
        ));
        assert!(matches!(
            validate(&LIMITS, f64::INFINITY),
            Err(SafetyError::NotFinite { .. })
        ));
        assert!(matches!(
            validate(&LIMITS, f64::NEG_INFINITY),
            Err(SafetyError::NotFinite { .. })
        ));
    }
}
