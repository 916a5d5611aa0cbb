//! Value-based rejection of hardware repeats.
//!
//! The scale re-broadcasts the final frame of a weigh-in for several seconds,
//! each copy arriving with a new capture time. Two measurements are the same
//! weigh-in when weight and impedance both match within small tolerances;
//! timestamps are never compared.

use serde::{Deserialize, Serialize};

use crate::measurement::ValidatedMeasurement;

/// Epsilons used to compare two measurements.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DuplicateTolerance {
    pub weight_epsilon_kg: f64,
    pub impedance_epsilon_ohm: f64,
}

impl Default for DuplicateTolerance {
    fn default() -> Self {
        Self {
            weight_epsilon_kg: 0.05,
            impedance_epsilon_ohm: 1.0,
        }
    }
}

/// Whether `candidate` repeats `last_accepted`.
#[must_use]
pub fn is_duplicate(
    candidate: &ValidatedMeasurement,
    last_accepted: Option<&ValidatedMeasurement>,
    tolerance: DuplicateTolerance,
) -> bool {
    last_accepted.is_some_and(|last| {
        (candidate.weight_kg() - last.weight_kg()).abs() <= tolerance.weight_epsilon_kg
            && (candidate.impedance_ohm() - last.impedance_ohm()).abs()
                <= tolerance.impedance_epsilon_ohm
    })
}

/// Remembers the most recent accepted measurement of one device.
#[derive(Debug, Clone, Default)]
pub struct MeasurementDeduplicator {
    tolerance: DuplicateTolerance,
    last_accepted: Option<ValidatedMeasurement>,
}

impl MeasurementDeduplicator {
    #[must_use]
    pub fn new(tolerance: DuplicateTolerance) -> Self {
        Self {
            tolerance,
            last_accepted: None,
        }
    }

    #[must_use]
    pub fn tolerance(&self) -> DuplicateTolerance {
        self.tolerance
    }

    #[must_use]
    pub fn last_accepted(&self) -> Option<&ValidatedMeasurement> {
        self.last_accepted.as_ref()
    }

    /// Compare against the remembered measurement without updating it.
    #[must_use]
    pub fn is_duplicate(&self, candidate: &ValidatedMeasurement) -> bool {
        is_duplicate(candidate, self.last_accepted.as_ref(), self.tolerance)
    }

    /// Replace the remembered measurement.
    pub fn remember(&mut self, measurement: ValidatedMeasurement) {
        self.last_accepted = Some(measurement);
    }

    /// Return `true` for a duplicate; otherwise remember `candidate` and
    /// return `false`.
    pub fn check_and_remember(&mut self, candidate: ValidatedMeasurement) -> bool {
        if self.is_duplicate(&candidate) {
            return true;
        }
        self.remember(candidate);
        false
    }
}
