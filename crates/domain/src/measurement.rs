//! Validated measurement — the single authoritative reading of one weigh-in.

use serde::Serialize;

use crate::composition::VENDOR;
use crate::error::{CalculationError, Quantity};
use crate::time::Timestamp;

/// Weight and impedance of one physical weigh-in.
///
/// Only constructible through [`ValidatedMeasurement::new`], which guarantees
/// a plausible weight and a strictly positive impedance below the ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ValidatedMeasurement {
    weight_kg: f64,
    impedance_ohm: f64,
    captured_at: Timestamp,
}

impl ValidatedMeasurement {
    /// Check the physiological bounds and build a measurement.
    ///
    /// # Errors
    ///
    /// Returns [`CalculationError::ImplausibleInput`] when the weight or the
    /// impedance is outside its bounds (zero or negative impedance included).
    pub fn new(
        weight_kg: f64,
        impedance_ohm: f64,
        captured_at: Timestamp,
    ) -> Result<Self, CalculationError> {
        if !VENDOR.inputs.weight_kg.contains(weight_kg) {
            return Err(CalculationError::ImplausibleInput {
                quantity: Quantity::Weight,
                value: weight_kg,
            });
        }
        if !VENDOR.inputs.impedance_ohm.contains(impedance_ohm) {
            return Err(CalculationError::ImplausibleInput {
                quantity: Quantity::Impedance,
                value: impedance_ohm,
            });
        }
        Ok(Self {
            weight_kg,
            impedance_ohm,
            captured_at,
        })
    }

    #[must_use]
    pub fn weight_kg(&self) -> f64 {
        self.weight_kg
    }

    #[must_use]
    pub fn impedance_ohm(&self) -> f64 {
        self.impedance_ohm
    }

    #[must_use]
    pub fn captured_at(&self) -> Timestamp {
        self.captured_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::now;

    #[test]
    fn should_accept_plausible_reading() {
        let m = ValidatedMeasurement::new(72.4, 520.0, now()).unwrap();
        assert!((m.weight_kg() - 72.4).abs() < f64::EPSILON);
        assert!((m.impedance_ohm() - 520.0).abs() < f64::EPSILON);
    }

    #[test]
    fn should_reject_zero_impedance() {
        let err = ValidatedMeasurement::new(72.4, 0.0, now()).unwrap_err();
        assert!(matches!(
            err,
            CalculationError::ImplausibleInput {
                quantity: Quantity::Impedance,
                ..
            }
        ));
    }

    #[test]
    fn should_reject_negative_impedance() {
        assert!(ValidatedMeasurement::new(72.4, -14.0, now()).is_err());
    }

    #[test]
    fn should_reject_impedance_above_ceiling() {
        assert!(ValidatedMeasurement::new(72.4, 3200.0, now()).is_err());
    }

    #[test]
    fn should_reject_implausible_weight() {
        let err = ValidatedMeasurement::new(4.0, 520.0, now()).unwrap_err();
        assert!(matches!(
            err,
            CalculationError::ImplausibleInput {
                quantity: Quantity::Weight,
                ..
            }
        ));
    }

    #[test]
    fn should_reject_non_finite_weight() {
        assert!(ValidatedMeasurement::new(f64::NAN, 520.0, now()).is_err());
    }
}
