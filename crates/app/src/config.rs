//! Pipeline configuration consumed by the orchestrator.

use std::time::Duration;

use bodyscale_domain::address::DeviceAddress;
use bodyscale_domain::attribution::AttributionConfig;
use bodyscale_domain::composition::{BodyParameters, VENDOR};
use bodyscale_domain::dedup::DuplicateTolerance;
use bodyscale_domain::error::{ScaleError, ValidationError};
use bodyscale_domain::profile::Sex;

/// Shortest and longest scan window.
pub const SCAN_WINDOW_BOUNDS: (Duration, Duration) =
    (Duration::from_secs(1), Duration::from_secs(120));

/// Shortest and longest delay between the start of two cycles.
pub const CYCLE_PERIOD_BOUNDS: (Duration, Duration) =
    (Duration::from_secs(1), Duration::from_secs(3600));

/// Everything the pipeline needs to process one device.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Only frames from this scale are processed.
    pub device: DeviceAddress,
    pub scan_window: Duration,
    pub cycle_period: Duration,
    pub tolerance: DuplicateTolerance,
    pub attribution: AttributionConfig,
    /// Body parameters used when no profile could be attributed.
    pub fallback_body: BodyParameters,
}

impl PipelineConfig {
    #[must_use]
    pub fn new(device: DeviceAddress) -> Self {
        Self {
            device,
            scan_window: Duration::from_secs(20),
            cycle_period: Duration::from_secs(10),
            tolerance: DuplicateTolerance::default(),
            attribution: AttributionConfig::default(),
            fallback_body: BodyParameters {
                height_cm: 180.0,
                age_years: 30,
                sex: Sex::Male,
            },
        }
    }

    /// Check the documented bounds.
    ///
    /// # Errors
    ///
    /// Returns [`ScaleError::Validation`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ScaleError> {
        let out_of_bounds = |field, reason| ValidationError::OutOfBounds { field, reason };

        let (min, max) = SCAN_WINDOW_BOUNDS;
        if self.scan_window < min || self.scan_window > max {
            return Err(out_of_bounds("scan_window", "must be between 1 and 120 seconds").into());
        }
        let (min, max) = CYCLE_PERIOD_BOUNDS;
        if self.cycle_period < min || self.cycle_period > max {
            return Err(
                out_of_bounds("cycle_period", "must be between 1 and 3600 seconds").into(),
            );
        }
        if !is_positive(self.tolerance.weight_epsilon_kg) {
            return Err(out_of_bounds("weight_epsilon_kg", "must be positive").into());
        }
        if !is_positive(self.tolerance.impedance_epsilon_ohm) {
            return Err(out_of_bounds("impedance_epsilon_ohm", "must be positive").into());
        }
        let threshold = self.attribution.acceptance_threshold;
        if threshold.is_nan() || threshold <= 0.0 {
            return Err(out_of_bounds("acceptance_threshold", "must be positive").into());
        }
        if self.attribution.min_history < 2 {
            return Err(out_of_bounds("min_history", "must be at least 2").into());
        }
        if !is_positive(self.attribution.default_mean_kg) {
            return Err(out_of_bounds("default_mean_kg", "must be positive").into());
        }
        if !is_positive(self.attribution.fallback_spread_ratio) {
            return Err(out_of_bounds("fallback_spread_ratio", "must be positive").into());
        }
        if !is_positive(self.attribution.min_relative_std_dev) {
            return Err(out_of_bounds("min_relative_std_dev", "must be positive").into());
        }
        if !VENDOR.inputs.height_cm.contains(self.fallback_body.height_cm) {
            return Err(ValidationError::HeightOutOfRange(self.fallback_body.height_cm).into());
        }
        if self.fallback_body.age_years > 99 {
            return Err(out_of_bounds("fallback_profile.age_years", "must be at most 99").into());
        }
        Ok(())
    }
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}
