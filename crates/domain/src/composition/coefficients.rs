//! Calibration constants for the body-composition formulas.
//!
//! All numeric constants live in one immutable [`Coefficients`] table so a
//! recalibration never touches the control flow in [`super`]. [`VENDOR`]
//! reproduces the reverse-engineered formula set of the Mi body-composition
//! scale; BMR uses the Katch–McArdle lean-mass equation.

use crate::profile::Sex;

/// Closed interval used for plausibility bounds and saturation ranges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    #[must_use]
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Finite and within `[min, max]`.
    #[must_use]
    pub fn contains(self, value: f64) -> bool {
        value.is_finite() && value >= self.min && value <= self.max
    }

    #[must_use]
    pub fn clamp(self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }
}

/// A value with one constant per sex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerSex<T> {
    pub male: T,
    pub female: T,
}

impl<T: Copy> PerSex<T> {
    #[must_use]
    pub fn get(&self, sex: Sex) -> T {
        match sex {
            Sex::Male => self.male,
            Sex::Female => self.female,
        }
    }
}

/// Past `threshold` the vendor formula jumps to `value` (then clamps).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Saturation {
    pub threshold: f64,
    pub value: f64,
}

/// Physiological bounds for the calculator inputs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputBounds {
    pub weight_kg: Bounds,
    /// Strictly positive: zero or negative impedance is never plausible.
    pub impedance_ohm: Bounds,
    pub height_cm: Bounds,
    pub age_years: Bounds,
}

/// Lean-mass regression: `height_sq·(h/100)² + weight·w + intercept − impedance·z − age·a`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LbmRegression {
    pub height_sq: f64,
    pub weight: f64,
    pub intercept: f64,
    pub impedance: f64,
    pub age: f64,
}

/// Sex/age dependent offset subtracted from the lean-mass regression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgeSplit {
    pub split_age: u32,
    pub up_to: f64,
    pub above: f64,
}

/// Multiplicative correction applied inside a weight band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightBand {
    pub limit_kg: f64,
    pub factor: f64,
}

/// Multiplicative correction applied strictly above a height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeightBand {
    pub min_height_cm: f64,
    pub factor: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FatCoefficients {
    pub offset: PerSex<AgeSplit>,
    /// Men lighter than `limit_kg`.
    pub male_light: WeightBand,
    /// Women heavier than `limit_kg`.
    pub female_heavy: WeightBand,
    /// Women lighter than `limit_kg`.
    pub female_light: WeightBand,
    /// Extra factor on the female bands for women taller than `min_height_cm`.
    pub female_tall: HeightBand,
    pub saturation: Saturation,
    pub range: Bounds,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaterCoefficients {
    /// Share of fat-free mass that is water.
    pub fat_free_share: f64,
    pub split_percentage: f64,
    pub factor_up_to_split: f64,
    pub factor_above_split: f64,
    pub saturation: Saturation,
    pub range: Bounds,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoneCoefficients {
    pub base: PerSex<f64>,
    pub lbm_factor: f64,
    pub step_threshold: f64,
    pub step: f64,
    pub saturation_threshold: PerSex<f64>,
    pub saturated_value: f64,
    pub range: Bounds,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MuscleCoefficients {
    pub saturation_threshold: PerSex<f64>,
    pub saturated_value: f64,
    pub range: Bounds,
}

/// Heavy branch: `weight_factor·w / (quadratic·h² + linear·h + offset) − shift + age_factor·age`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeavyVisceral {
    pub weight_factor: f64,
    pub quadratic: f64,
    pub linear: f64,
    pub offset: f64,
    pub shift: f64,
}

/// Light branch: `(base − slope·h)·w − height_factor·h − shift + (age_factor − age_penalty)·age`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightVisceral {
    pub base: f64,
    pub slope: f64,
    pub height_factor: f64,
    pub shift: f64,
    pub age_penalty: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisceralCoefficients {
    /// Heavy branch when `weight > threshold_slope·h − threshold_offset`.
    pub threshold_slope: f64,
    pub threshold_offset: f64,
    pub heavy: HeavyVisceral,
    pub light: LightVisceral,
    pub age_factor: f64,
}

/// `(height − height_offset) · factor`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IdealWeight {
    pub height_offset: f64,
    pub factor: f64,
}

/// `intercept + lbm_factor · lbm`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeanMassBmr {
    pub intercept: f64,
    pub lbm_factor: f64,
    pub range: Bounds,
}

/// `intercept + weight·w − height·h − age·a`; the population reference curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BmrRegression {
    pub intercept: f64,
    pub weight: f64,
    pub height: f64,
    pub age: f64,
}

/// Complete calibration table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coefficients {
    pub inputs: InputBounds,
    pub lbm: LbmRegression,
    pub fat: FatCoefficients,
    pub water: WaterCoefficients,
    pub bone: BoneCoefficients,
    pub muscle: MuscleCoefficients,
    pub visceral: PerSex<VisceralCoefficients>,
    pub visceral_range: Bounds,
    pub bmi_range: Bounds,
    pub ideal_weight: PerSex<IdealWeight>,
    pub ideal_weight_range: Bounds,
    pub bmr: LeanMassBmr,
    pub reference_bmr: PerSex<BmrRegression>,
    /// Youngest and oldest metabolic-age bracket, one bracket per year.
    pub metabolic_age_brackets: (u32, u32),
}

/// Mi body-composition scale calibration.
pub const VENDOR: Coefficients = Coefficients {
    inputs: InputBounds {
        weight_kg: Bounds::new(10.0, 200.0),
        impedance_ohm: Bounds::new(f64::MIN_POSITIVE, 3000.0),
        height_cm: Bounds::new(90.0, 220.0),
        age_years: Bounds::new(0.0, 99.0),
    },
    lbm: LbmRegression {
        height_sq: 9.058,
        weight: 0.32,
        intercept: 12.226,
        impedance: 0.0068,
        age: 0.0542,
    },
    fat: FatCoefficients {
        offset: PerSex {
            male: AgeSplit {
                split_age: 49,
                up_to: 0.8,
                above: 0.8,
            },
            female: AgeSplit {
                split_age: 49,
                up_to: 9.25,
                above: 7.25,
            },
        },
        male_light: WeightBand {
            limit_kg: 61.0,
            factor: 0.98,
        },
        female_heavy: WeightBand {
            limit_kg: 60.0,
            factor: 0.96,
        },
        female_light: WeightBand {
            limit_kg: 50.0,
            factor: 1.02,
        },
        female_tall: HeightBand {
            min_height_cm: 160.0,
            factor: 1.03,
        },
        saturation: Saturation {
            threshold: 63.0,
            value: 75.0,
        },
        range: Bounds::new(5.0, 75.0),
    },
    water: WaterCoefficients {
        fat_free_share: 0.7,
        split_percentage: 50.0,
        factor_up_to_split: 1.02,
        factor_above_split: 0.98,
        saturation: Saturation {
            threshold: 65.0,
            value: 75.0,
        },
        range: Bounds::new(35.0, 75.0),
    },
    bone: BoneCoefficients {
        base: PerSex {
            male: 0.180_168_94,
            female: 0.245_691_014,
        },
        lbm_factor: 0.05158,
        step_threshold: 2.2,
        step: 0.1,
        saturation_threshold: PerSex {
            male: 5.2,
            female: 5.1,
        },
        saturated_value: 8.0,
        range: Bounds::new(0.5, 8.0),
    },
    muscle: MuscleCoefficients {
        saturation_threshold: PerSex {
            male: 93.5,
            female: 84.0,
        },
        saturated_value: 120.0,
        range: Bounds::new(10.0, 120.0),
    },
    visceral: PerSex {
        male: VisceralCoefficients {
            threshold_slope: 0.625,
            threshold_offset: 0.0,
            heavy: HeavyVisceral {
                weight_factor: 305.0,
                quadratic: 0.0826,
                linear: -0.4,
                offset: 48.0,
                shift: 2.9,
            },
            light: LightVisceral {
                base: 0.765,
                slope: 0.0015,
                height_factor: 0.143,
                shift: 5.0,
                age_penalty: 0.0,
            },
            age_factor: 0.15,
        },
        female: VisceralCoefficients {
            threshold_slope: 0.5,
            threshold_offset: 13.0,
            heavy: HeavyVisceral {
                weight_factor: 500.0,
                quadratic: 0.1158,
                linear: 1.45,
                offset: -120.0,
                shift: 6.0,
            },
            light: LightVisceral {
                base: 0.691,
                slope: 0.0048,
                height_factor: 0.027,
                shift: 0.0,
                age_penalty: 1.0,
            },
            age_factor: 0.07,
        },
    },
    visceral_range: Bounds::new(1.0, 50.0),
    bmi_range: Bounds::new(10.0, 90.0),
    ideal_weight: PerSex {
        male: IdealWeight {
            height_offset: 80.0,
            factor: 0.7,
        },
        female: IdealWeight {
            height_offset: 70.0,
            factor: 0.6,
        },
    },
    ideal_weight_range: Bounds::new(5.0, 200.0),
    bmr: LeanMassBmr {
        intercept: 370.0,
        lbm_factor: 21.6,
        range: Bounds::new(500.0, 10_000.0),
    },
    reference_bmr: PerSex {
        male: BmrRegression {
            intercept: 877.8,
            weight: 14.916,
            height: 0.726,
            age: 8.976,
        },
        female: BmrRegression {
            intercept: 864.6,
            weight: 10.2036,
            height: 0.39336,
            age: 6.204,
        },
    },
    metabolic_age_brackets: (15, 80),
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_reject_zero_impedance() {
        assert!(!VENDOR.inputs.impedance_ohm.contains(0.0));
        assert!(VENDOR.inputs.impedance_ohm.contains(1.0));
    }

    #[test]
    fn should_reject_non_finite_values() {
        assert!(!Bounds::new(0.0, 10.0).contains(f64::NAN));
        assert!(!Bounds::new(0.0, f64::MAX).contains(f64::INFINITY));
    }

    #[test]
    fn should_pick_constant_by_sex() {
        assert!((VENDOR.ideal_weight.get(Sex::Male).height_offset - 80.0).abs() < f64::EPSILON);
        assert!((VENDOR.ideal_weight.get(Sex::Female).height_offset - 70.0).abs() < f64::EPSILON);
    }
}
