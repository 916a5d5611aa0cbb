//! Final output of the pipeline handed to storage.

use serde::{Deserialize, Serialize};

use crate::attribution::Attribution;
use crate::composition::BodyComposition;
use crate::id::{MeasurementId, ProfileId};
use crate::measurement::ValidatedMeasurement;
use crate::time::Timestamp;

/// One stored weigh-in with its derived metrics. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    pub id: MeasurementId,
    pub weight: f64,
    pub impedance: f64,
    pub lbm: f64,
    pub fat_percentage: f64,
    pub water_percentage: f64,
    pub muscle_mass: f64,
    pub bone_mass: f64,
    pub visceral_fat: f64,
    pub bmi: f64,
    pub bmr: f64,
    pub ideal_weight: f64,
    pub metabolic_age: u32,
    pub timestamp: Timestamp,
    /// `None` marks an unknown user awaiting manual reassignment.
    pub attributed_user: Option<ProfileId>,
}

impl MetricsRecord {
    /// Field order of the storage collaborator's record layout.
    pub const COLUMNS: [&'static str; 14] = [
        "weight",
        "impedance",
        "lbm",
        "fat_percentage",
        "water_percentage",
        "muscle_mass",
        "bone_mass",
        "visceral_fat",
        "bmi",
        "bmr",
        "ideal_weight",
        "metabolic_age",
        "timestamp",
        "attributed_user",
    ];

    #[must_use]
    pub fn new(
        measurement: &ValidatedMeasurement,
        composition: &BodyComposition,
        attribution: Attribution,
    ) -> Self {
        Self {
            id: MeasurementId::new(),
            weight: measurement.weight_kg(),
            impedance: measurement.impedance_ohm(),
            lbm: composition.lbm,
            fat_percentage: composition.fat_percentage,
            water_percentage: composition.water_percentage,
            muscle_mass: composition.muscle_mass,
            bone_mass: composition.bone_mass,
            visceral_fat: composition.visceral_fat,
            bmi: composition.bmi,
            bmr: composition.bmr,
            ideal_weight: composition.ideal_weight,
            metabolic_age: composition.metabolic_age,
            timestamp: measurement.captured_at(),
            attributed_user: attribution.profile_id(),
        }
    }

    #[must_use]
    pub fn attribution(&self) -> Attribution {
        self.attributed_user
            .map_or(Attribution::Unknown, Attribution::Profile)
    }

    #[must_use]
    pub fn is_unassigned(&self) -> bool {
        self.attributed_user.is_none()
    }
}
