//! Measurement service — manual review of unknown-user records.

use bodyscale_domain::attribution::Attribution;
use bodyscale_domain::composition;
use bodyscale_domain::error::{NotFoundError, ScaleError};
use bodyscale_domain::id::{MeasurementId, ProfileId};
use bodyscale_domain::measurement::ValidatedMeasurement;
use bodyscale_domain::metrics::MetricsRecord;

use crate::ports::{MeasurementRepository, ProfileRepository};

/// Application service for reviewing and reassigning stored measurements.
pub struct MeasurementService<M, P> {
    measurements: M,
    profiles: P,
}

impl<M: MeasurementRepository, P: ProfileRepository> MeasurementService<M, P> {
    /// Create a new service backed by the given repositories.
    pub fn new(measurements: M, profiles: P) -> Self {
        Self {
            measurements,
            profiles,
        }
    }

    /// List records stored without an attributed user.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn list_unassigned(&self) -> Result<Vec<MetricsRecord>, ScaleError> {
        self.measurements.list_unassigned().await
    }

    /// Attribute a stored record to an existing profile.
    ///
    /// The composition is recomputed from the stored weight and impedance
    /// with the profile's body parameters at the time of the weigh-in, so
    /// metrics derived from the fallback body are replaced.
    ///
    /// # Errors
    ///
    /// Returns [`ScaleError::NotFound`] when the profile or the record does
    /// not exist, [`ScaleError::Calculation`] when the stored values are
    /// implausible for the profile, or a storage error from the repositories.
    #[tracing::instrument(skip(self))]
    pub async fn reassign(
        &self,
        id: MeasurementId,
        profile_id: ProfileId,
    ) -> Result<MetricsRecord, ScaleError> {
        let profiles = self.profiles.list().await?;
        let profile = profiles
            .iter()
            .find(|p| p.id == profile_id)
            .ok_or_else(|| NotFoundError {
                entity: "Profile",
                id: profile_id.to_string(),
            })?;
        let stored = self
            .measurements
            .get(id)
            .await?
            .ok_or_else(|| NotFoundError {
                entity: "Measurement",
                id: id.to_string(),
            })?;

        let measurement =
            ValidatedMeasurement::new(stored.weight, stored.impedance, stored.timestamp)?;
        let body = profile.body_parameters_on(stored.timestamp.date_naive());
        let composition = composition::compute(stored.weight, stored.impedance, body)?;
        let record = self
            .measurements
            .update(MetricsRecord {
                id,
                ..MetricsRecord::new(&measurement, &composition, Attribution::Profile(profile_id))
            })
            .await?;
        tracing::info!(
            measurement_id = %id,
            %profile_id,
            previous_fat_percentage = stored.fat_percentage,
            fat_percentage = record.fat_percentage,
            "measurement reassigned"
        );
        Ok(record)
    }
}
