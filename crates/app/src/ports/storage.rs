//! Storage port — persistence of metrics records.

use std::future::Future;

use bodyscale_domain::error::ScaleError;
use bodyscale_domain::history::WeightHistory;
use bodyscale_domain::id::{MeasurementId, ProfileId};
use bodyscale_domain::metrics::MetricsRecord;

/// Repository for [`MetricsRecord`]s.
pub trait MeasurementRepository: Send + Sync {
    /// Persist a new record.
    fn save(
        &self,
        record: MetricsRecord,
    ) -> impl Future<Output = Result<MetricsRecord, ScaleError>> + Send;

    /// Past weights attributed to `profile_id`, oldest first.
    fn weight_history(
        &self,
        profile_id: ProfileId,
    ) -> impl Future<Output = Result<WeightHistory, ScaleError>> + Send;

    /// Most recent record by timestamp, whoever it is attributed to.
    fn latest(&self) -> impl Future<Output = Result<Option<MetricsRecord>, ScaleError>> + Send;

    /// Records stored with an unknown user, oldest first.
    fn list_unassigned(&self)
    -> impl Future<Output = Result<Vec<MetricsRecord>, ScaleError>> + Send;

    /// Record with `id`, if any.
    fn get(
        &self,
        id: MeasurementId,
    ) -> impl Future<Output = Result<Option<MetricsRecord>, ScaleError>> + Send;

    /// Overwrite every column of the record with `record.id` atomically and
    /// return it as stored.
    ///
    /// Fails with [`ScaleError::NotFound`] when no record has that id.
    fn update(
        &self,
        record: MetricsRecord,
    ) -> impl Future<Output = Result<MetricsRecord, ScaleError>> + Send;
}
