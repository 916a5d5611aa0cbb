//! Body-composition formula engine.
//!
//! [`compute`] is a pure function from `{weight, impedance, height, age, sex}`
//! to a [`BodyComposition`]. Inputs outside physiological bounds fail with
//! [`CalculationError::ImplausibleInput`]; every output is checked to be finite
//! and inside its sanity range, failing with
//! [`CalculationError::ImplausibleOutput`] rather than emitting garbage.
//!
//! Reported lean body mass is the fat-free mass `weight × (1 − fat%)`, so
//! `fat% + lbm/weight·100 = 100` holds for every successful computation.

pub mod coefficients;

use serde::{Deserialize, Serialize};

use crate::error::{CalculationError, Quantity};
use crate::profile::Sex;

pub use coefficients::{Bounds, Coefficients, VENDOR};

/// Profile attributes the formulas depend on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyParameters {
    pub height_cm: f64,
    pub age_years: u32,
    pub sex: Sex,
}

/// Derived metrics for one measurement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyComposition {
    /// Lean (fat-free) body mass, kg.
    pub lbm: f64,
    pub fat_percentage: f64,
    pub water_percentage: f64,
    /// kg
    pub muscle_mass: f64,
    /// kg
    pub bone_mass: f64,
    /// Unitless index.
    pub visceral_fat: f64,
    pub bmi: f64,
    /// kcal/day
    pub bmr: f64,
    /// kg
    pub ideal_weight: f64,
    /// Years.
    pub metabolic_age: u32,
}

/// Compute body composition with the [`VENDOR`] calibration.
///
/// # Errors
///
/// See [`BodyCompositionCalculator::compute`].
pub fn compute(
    weight_kg: f64,
    impedance_ohm: f64,
    body: BodyParameters,
) -> Result<BodyComposition, CalculationError> {
    BodyCompositionCalculator::default().compute(weight_kg, impedance_ohm, body)
}

/// Formula engine bound to one coefficient table.
#[derive(Debug, Clone, Copy)]
pub struct BodyCompositionCalculator<'a> {
    coefficients: &'a Coefficients,
}

impl Default for BodyCompositionCalculator<'static> {
    fn default() -> Self {
        Self {
            coefficients: &VENDOR,
        }
    }
}

/// Inputs after plausibility checks, shared by the individual formulas.
struct Subject {
    weight: f64,
    impedance: f64,
    height: f64,
    age: f64,
    age_years: u32,
    sex: Sex,
}

impl<'a> BodyCompositionCalculator<'a> {
    #[must_use]
    pub fn new(coefficients: &'a Coefficients) -> Self {
        Self { coefficients }
    }

    /// Derive the full metrics set.
    ///
    /// # Errors
    ///
    /// Returns [`CalculationError::ImplausibleInput`] when weight, impedance,
    /// height or age are outside the table's input bounds, and
    /// [`CalculationError::ImplausibleOutput`] when a derived metric is not
    /// finite or outside its sanity range.
    pub fn compute(
        &self,
        weight_kg: f64,
        impedance_ohm: f64,
        body: BodyParameters,
    ) -> Result<BodyComposition, CalculationError> {
        let inputs = &self.coefficients.inputs;
        check_input(Quantity::Weight, weight_kg, inputs.weight_kg)?;
        check_input(Quantity::Impedance, impedance_ohm, inputs.impedance_ohm)?;
        check_input(Quantity::Height, body.height_cm, inputs.height_cm)?;
        check_input(Quantity::Age, f64::from(body.age_years), inputs.age_years)?;

        let subject = Subject {
            weight: weight_kg,
            impedance: impedance_ohm,
            height: body.height_cm,
            age: f64::from(body.age_years),
            age_years: body.age_years,
            sex: body.sex,
        };

        let lbm_coefficient = self.lbm_coefficient(&subject);
        let fat_percentage = self.fat_percentage(&subject, lbm_coefficient);
        let lbm = subject.weight * (1.0 - fat_percentage / 100.0);
        let bone_mass = self.bone_mass(&subject, lbm_coefficient);
        let bmr = self.coefficients.bmr.intercept + self.coefficients.bmr.lbm_factor * lbm;

        let composition = BodyComposition {
            lbm,
            fat_percentage,
            water_percentage: self.water_percentage(fat_percentage),
            muscle_mass: self.muscle_mass(&subject, fat_percentage, bone_mass),
            bone_mass,
            visceral_fat: self.visceral_fat(&subject),
            bmi: self.bmi(&subject),
            bmr,
            ideal_weight: self.ideal_weight(&subject),
            metabolic_age: self.metabolic_age(&subject, bmr),
        };
        self.check_outputs(&composition, subject.weight)?;
        Ok(composition)
    }

    fn lbm_coefficient(&self, s: &Subject) -> f64 {
        let c = &self.coefficients.lbm;
        let height_m = s.height / 100.0;
        c.height_sq * height_m * height_m + c.weight * s.weight + c.intercept
            - c.impedance * s.impedance
            - c.age * s.age
    }

    fn fat_percentage(&self, s: &Subject, lbm_coefficient: f64) -> f64 {
        let c = &self.coefficients.fat;
        let split = c.offset.get(s.sex);
        let offset = if s.age_years <= split.split_age {
            split.up_to
        } else {
            split.above
        };

        let tall = if s.height > c.female_tall.min_height_cm {
            c.female_tall.factor
        } else {
            1.0
        };
        let factor = match s.sex {
            Sex::Male if s.weight < c.male_light.limit_kg => c.male_light.factor,
            Sex::Female if s.weight > c.female_heavy.limit_kg => c.female_heavy.factor * tall,
            Sex::Female if s.weight < c.female_light.limit_kg => c.female_light.factor * tall,
            _ => 1.0,
        };

        let mut fat = (1.0 - ((lbm_coefficient - offset) * factor) / s.weight) * 100.0;
        if fat > c.saturation.threshold {
            fat = c.saturation.value;
        }
        c.range.clamp(fat)
    }

    fn water_percentage(&self, fat_percentage: f64) -> f64 {
        let c = &self.coefficients.water;
        let water = (100.0 - fat_percentage) * c.fat_free_share;
        let factor = if water <= c.split_percentage {
            c.factor_up_to_split
        } else {
            c.factor_above_split
        };
        let mut adjusted = water * factor;
        if adjusted >= c.saturation.threshold {
            adjusted = c.saturation.value;
        }
        c.range.clamp(adjusted)
    }

    fn bone_mass(&self, s: &Subject, lbm_coefficient: f64) -> f64 {
        let c = &self.coefficients.bone;
        let mut bone = lbm_coefficient * c.lbm_factor - c.base.get(s.sex);
        if bone > c.step_threshold {
            bone += c.step;
        } else {
            bone -= c.step;
        }
        if bone > c.saturation_threshold.get(s.sex) {
            bone = c.saturated_value;
        }
        c.range.clamp(bone)
    }

    fn muscle_mass(&self, s: &Subject, fat_percentage: f64, bone_mass: f64) -> f64 {
        let c = &self.coefficients.muscle;
        let mut muscle = s.weight - fat_percentage * 0.01 * s.weight - bone_mass;
        if muscle >= c.saturation_threshold.get(s.sex) {
            muscle = c.saturated_value;
        }
        c.range.clamp(muscle)
    }

    fn visceral_fat(&self, s: &Subject) -> f64 {
        let c = self.coefficients.visceral.get(s.sex);
        let h = s.height;
        let value = if s.weight > c.threshold_slope * h - c.threshold_offset {
            let heavy = c.heavy;
            let denominator = heavy.quadratic * h * h + heavy.linear * h + heavy.offset;
            heavy.weight_factor * s.weight / denominator - heavy.shift + c.age_factor * s.age
        } else {
            let light = c.light;
            (light.base - light.slope * h) * s.weight - light.height_factor * h - light.shift
                + (c.age_factor - light.age_penalty) * s.age
        };
        self.coefficients.visceral_range.clamp(value)
    }

    fn bmi(&self, s: &Subject) -> f64 {
        let height_m = s.height / 100.0;
        self.coefficients
            .bmi_range
            .clamp(s.weight / (height_m * height_m))
    }

    fn ideal_weight(&self, s: &Subject) -> f64 {
        let c = self.coefficients.ideal_weight.get(s.sex);
        (s.height - c.height_offset) * c.factor
    }

    /// Youngest bracket whose reference BMR, for a body of the same weight and
    /// height, is closest to `bmr`.
    fn metabolic_age(&self, s: &Subject, bmr: f64) -> u32 {
        let reference = self.coefficients.reference_bmr.get(s.sex);
        let (youngest, oldest) = self.coefficients.metabolic_age_brackets;
        let mut best = youngest;
        let mut best_gap = f64::INFINITY;
        for age in youngest..=oldest {
            let expected = reference.intercept + reference.weight * s.weight
                - reference.height * s.height
                - reference.age * f64::from(age);
            let gap = (expected - bmr).abs();
            if gap < best_gap {
                best = age;
                best_gap = gap;
            }
        }
        best
    }

    fn check_outputs(&self, m: &BodyComposition, weight: f64) -> Result<(), CalculationError> {
        let c = self.coefficients;
        let (youngest, oldest) = c.metabolic_age_brackets;
        let checks = [
            ("lbm", m.lbm, Bounds::new(f64::MIN_POSITIVE, weight)),
            ("fat_percentage", m.fat_percentage, c.fat.range),
            ("water_percentage", m.water_percentage, c.water.range),
            ("muscle_mass", m.muscle_mass, c.muscle.range),
            ("bone_mass", m.bone_mass, c.bone.range),
            ("visceral_fat", m.visceral_fat, c.visceral_range),
            ("bmi", m.bmi, c.bmi_range),
            ("bmr", m.bmr, c.bmr.range),
            ("ideal_weight", m.ideal_weight, c.ideal_weight_range),
            (
                "metabolic_age",
                f64::from(m.metabolic_age),
                Bounds::new(f64::from(youngest), f64::from(oldest)),
            ),
        ];
        for (metric, value, range) in checks {
            if !range.contains(value) {
                return Err(CalculationError::ImplausibleOutput { metric, value });
            }
        }
        Ok(())
    }
}

fn check_input(quantity: Quantity, value: f64, bounds: Bounds) -> Result<(), CalculationError> {
    if bounds.contains(value) {
        Ok(())
    } else {
        Err(CalculationError::ImplausibleInput { quantity, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn male(height_cm: f64, age_years: u32) -> BodyParameters {
        BodyParameters {
            height_cm,
            age_years,
            sex: Sex::Male,
        }
    }

    fn female(height_cm: f64, age_years: u32) -> BodyParameters {
        BodyParameters {
            height_cm,
            age_years,
            sex: Sex::Female,
        }
    }

    #[test]
    fn should_compute_reference_male_reading() {
        let m = compute(72.4, 520.0, male(180.0, 30)).unwrap();

        assert!((m.fat_percentage - 18.8123).abs() < 1e-3);
        assert!((m.lbm - 58.7799).abs() < 1e-3);
        assert!((m.water_percentage - 55.6948).abs() < 1e-3);
        assert!((m.bone_mass - 2.9930).abs() < 1e-3);
        assert!((m.muscle_mass - 55.7870).abs() < 1e-3);
        assert!((m.visceral_fat - 9.598).abs() < 1e-3);
        assert!((m.bmi - 22.3457).abs() < 1e-3);
        assert!((m.ideal_weight - 70.0).abs() < 1e-9);
        assert!((m.bmr - (370.0 + 21.6 * m.lbm)).abs() < 1e-9);
        assert_eq!(m.metabolic_age, 21);
    }

    #[test]
    fn should_close_fat_and_lean_fractions() {
        let cases = [
            (72.4, 520.0, male(180.0, 30)),
            (55.0, 610.0, female(162.0, 44)),
            (95.0, 430.0, male(175.0, 58)),
            (48.0, 700.0, female(158.0, 70)),
            (120.0, 380.0, male(190.0, 22)),
        ];
        for (weight, impedance, body) in cases {
            let m = compute(weight, impedance, body).unwrap();
            let closure = m.fat_percentage + m.lbm / weight * 100.0;
            assert!((closure - 100.0).abs() < 1e-9, "closure {closure} for {weight} kg");
        }
    }

    #[test]
    fn should_be_bit_identical_across_calls() {
        let a = compute(81.3, 497.0, female(171.0, 39)).unwrap();
        let b = compute(81.3, 497.0, female(171.0, 39)).unwrap();
        assert_eq!(a.lbm.to_bits(), b.lbm.to_bits());
        assert_eq!(a.visceral_fat.to_bits(), b.visceral_fat.to_bits());
        assert_eq!(a.bmr.to_bits(), b.bmr.to_bits());
        assert_eq!(a, b);
    }

    #[test]
    fn should_reject_zero_impedance() {
        let err = compute(72.4, 0.0, male(180.0, 30)).unwrap_err();
        assert_eq!(
            err,
            CalculationError::ImplausibleInput {
                quantity: Quantity::Impedance,
                value: 0.0,
            }
        );
    }

    #[test]
    fn should_reject_negative_impedance() {
        let err = compute(72.4, -2.0, male(180.0, 30)).unwrap_err();
        assert!(matches!(
            err,
            CalculationError::ImplausibleInput {
                quantity: Quantity::Impedance,
                ..
            }
        ));
    }

    #[test]
    fn should_reject_impedance_above_ceiling() {
        assert!(compute(72.4, 3001.0, male(180.0, 30)).is_err());
    }

    #[test]
    fn should_reject_weight_outside_bounds() {
        let err = compute(9.5, 520.0, male(180.0, 30)).unwrap_err();
        assert!(matches!(
            err,
            CalculationError::ImplausibleInput {
                quantity: Quantity::Weight,
                ..
            }
        ));
        assert!(compute(200.5, 520.0, male(180.0, 30)).is_err());
    }

    #[test]
    fn should_reject_height_and_age_outside_bounds() {
        assert!(matches!(
            compute(72.4, 520.0, male(221.0, 30)),
            Err(CalculationError::ImplausibleInput {
                quantity: Quantity::Height,
                ..
            })
        ));
        assert!(matches!(
            compute(72.4, 520.0, male(180.0, 100)),
            Err(CalculationError::ImplausibleInput {
                quantity: Quantity::Age,
                ..
            })
        ));
    }

    #[test]
    fn should_apply_tall_factor_only_to_women_above_min_height() {
        use super::coefficients::{FatCoefficients, HeightBand};

        let without_tall = Coefficients {
            fat: FatCoefficients {
                female_tall: HeightBand {
                    factor: 1.0,
                    ..VENDOR.fat.female_tall
                },
                ..VENDOR.fat
            },
            ..VENDOR
        };
        let flat = BodyCompositionCalculator::new(&without_tall);
        let vendor = BodyCompositionCalculator::default();

        let tall = female(170.0, 30);
        let short = female(155.0, 30);
        let with = vendor.compute(70.0, 500.0, tall).unwrap();
        let without = flat.compute(70.0, 500.0, tall).unwrap();
        assert!((with.fat_percentage - without.fat_percentage).abs() > 0.1);

        let with = vendor.compute(70.0, 500.0, short).unwrap();
        let without = flat.compute(70.0, 500.0, short).unwrap();
        assert!((with.fat_percentage - without.fat_percentage).abs() < 1e-12);
    }

    #[test]
    fn should_fail_when_an_output_leaves_its_sanity_range() {
        // Saturated fat leaves 2.5 kg of lean mass, a BMR of 424 kcal.
        let err = compute(10.0, 3000.0, male(90.0, 99)).unwrap_err();
        assert!(matches!(
            err,
            CalculationError::ImplausibleOutput { metric: "bmr", .. }
        ));
    }

    #[test]
    fn should_age_metabolism_with_more_fat() {
        let lean = compute(80.0, 420.0, male(180.0, 35)).unwrap();
        let fat = compute(80.0, 650.0, male(180.0, 35)).unwrap();
        assert!(fat.fat_percentage > lean.fat_percentage);
        assert!(fat.metabolic_age >= lean.metabolic_age);
    }

    #[test]
    fn should_use_female_ideal_weight_formula() {
        let m = compute(60.0, 550.0, female(165.0, 30)).unwrap();
        assert!((m.ideal_weight - 57.0).abs() < 1e-9);
    }

    #[test]
    fn should_keep_every_metric_inside_its_range() {
        let m = compute(150.0, 300.0, male(160.0, 60)).unwrap();
        assert!(VENDOR.fat.range.contains(m.fat_percentage));
        assert!(VENDOR.water.range.contains(m.water_percentage));
        assert!(VENDOR.bone.range.contains(m.bone_mass));
        assert!(VENDOR.muscle.range.contains(m.muscle_mass));
        assert!(VENDOR.visceral_range.contains(m.visceral_fat));
        assert!(VENDOR.bmi_range.contains(m.bmi));
    }
}
