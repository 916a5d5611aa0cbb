//! `SQLite` implementation of [`MeasurementRepository`].

use chrono::SecondsFormat;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use bodyscale_app::ports::MeasurementRepository;
use bodyscale_domain::error::{NotFoundError, ScaleError};
use bodyscale_domain::history::{WeightHistory, WeightSample};
use bodyscale_domain::id::{MeasurementId, ProfileId};
use bodyscale_domain::metrics::MetricsRecord;
use bodyscale_domain::time::Timestamp;

use crate::error::StorageError;

/// Wrapper for converting database rows into domain types without polluting
/// domain structs with database concerns.
struct Wrapper(MetricsRecord);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: uuid::Uuid = row.try_get("id")?;
        let attributed_user: Option<uuid::Uuid> = row.try_get("attributed_user")?;
        let metabolic_age: i64 = row.try_get("metabolic_age")?;
        let timestamp: String = row.try_get("timestamp")?;

        Ok(Self(MetricsRecord {
            id: MeasurementId::from_uuid(id),
            weight: row.try_get("weight")?,
            impedance: row.try_get("impedance")?,
            lbm: row.try_get("lbm")?,
            fat_percentage: row.try_get("fat_percentage")?,
            water_percentage: row.try_get("water_percentage")?,
            muscle_mass: row.try_get("muscle_mass")?,
            bone_mass: row.try_get("bone_mass")?,
            visceral_fat: row.try_get("visceral_fat")?,
            bmi: row.try_get("bmi")?,
            bmr: row.try_get("bmr")?,
            ideal_weight: row.try_get("ideal_weight")?,
            metabolic_age: u32::try_from(metabolic_age)
                .map_err(|err| sqlx::Error::Decode(Box::new(err)))?,
            timestamp: parse_timestamp(&timestamp)?,
            attributed_user: attributed_user.map(ProfileId::from_uuid),
        }))
    }
}

/// Weight column of a profile's history.
struct SampleRow(WeightSample);

impl<'r> FromRow<'r, SqliteRow> for SampleRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let timestamp: String = row.try_get("timestamp")?;
        Ok(Self(WeightSample {
            weight_kg: row.try_get("weight")?,
            recorded_at: parse_timestamp(&timestamp)?,
        }))
    }
}

fn parse_timestamp(value: &str) -> Result<Timestamp, sqlx::Error> {
    Ok(chrono::DateTime::parse_from_rfc3339(value)
        .map_err(|err| sqlx::Error::Decode(Box::new(err)))?
        .with_timezone(&chrono::Utc))
}

/// Fixed-width UTC form so that text ordering matches time ordering.
fn format_timestamp(value: Timestamp) -> String {
    value.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

const INSERT: &str = r"
    INSERT INTO measurements (
        id, weight, impedance, lbm, fat_percentage, water_percentage, muscle_mass,
        bone_mass, visceral_fat, bmi, bmr, ideal_weight, metabolic_age, timestamp,
        attributed_user
    )
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
";

const SELECT_HISTORY: &str = r"
    SELECT weight, timestamp FROM measurements
    WHERE attributed_user = ?
    ORDER BY timestamp ASC
";

const SELECT_LATEST: &str = "SELECT * FROM measurements ORDER BY timestamp DESC LIMIT 1";

const SELECT_UNASSIGNED: &str = r"
    SELECT * FROM measurements
    WHERE attributed_user IS NULL
    ORDER BY timestamp ASC
";

const SELECT_BY_ID: &str = "SELECT * FROM measurements WHERE id = ?";

const UPDATE: &str = r"
    UPDATE measurements SET
        weight = ?, impedance = ?, lbm = ?, fat_percentage = ?, water_percentage = ?,
        muscle_mass = ?, bone_mass = ?, visceral_fat = ?, bmi = ?, bmr = ?,
        ideal_weight = ?, metabolic_age = ?, timestamp = ?, attributed_user = ?
    WHERE id = ?
";

/// `SQLite`-backed measurement repository.
pub struct SqliteMeasurementRepository {
    pool: SqlitePool,
}

impl SqliteMeasurementRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl MeasurementRepository for SqliteMeasurementRepository {
    async fn save(&self, record: MetricsRecord) -> Result<MetricsRecord, ScaleError> {
        sqlx::query(INSERT)
            .bind(record.id.as_uuid())
            .bind(record.weight)
            .bind(record.impedance)
            .bind(record.lbm)
            .bind(record.fat_percentage)
            .bind(record.water_percentage)
            .bind(record.muscle_mass)
            .bind(record.bone_mass)
            .bind(record.visceral_fat)
            .bind(record.bmi)
            .bind(record.bmr)
            .bind(record.ideal_weight)
            .bind(i64::from(record.metabolic_age))
            .bind(format_timestamp(record.timestamp))
            .bind(record.attributed_user.map(ProfileId::as_uuid))
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(record)
    }

    async fn weight_history(&self, profile_id: ProfileId) -> Result<WeightHistory, ScaleError> {
        let rows: Vec<SampleRow> = sqlx::query_as(SELECT_HISTORY)
            .bind(profile_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(WeightHistory::new(
            profile_id,
            rows.into_iter().map(|r| r.0).collect(),
        ))
    }

    async fn latest(&self) -> Result<Option<MetricsRecord>, ScaleError> {
        let row: Option<Wrapper> = sqlx::query_as(SELECT_LATEST)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(row.map(|w| w.0))
    }

    async fn list_unassigned(&self) -> Result<Vec<MetricsRecord>, ScaleError> {
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_UNASSIGNED)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    async fn get(&self, id: MeasurementId) -> Result<Option<MetricsRecord>, ScaleError> {
        let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_ID)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(row.map(|w| w.0))
    }

    async fn update(&self, record: MetricsRecord) -> Result<MetricsRecord, ScaleError> {
        let mut tx = self.pool.begin().await.map_err(StorageError::from)?;

        let result = sqlx::query(UPDATE)
            .bind(record.weight)
            .bind(record.impedance)
            .bind(record.lbm)
            .bind(record.fat_percentage)
            .bind(record.water_percentage)
            .bind(record.muscle_mass)
            .bind(record.bone_mass)
            .bind(record.visceral_fat)
            .bind(record.bmi)
            .bind(record.bmr)
            .bind(record.ideal_weight)
            .bind(i64::from(record.metabolic_age))
            .bind(format_timestamp(record.timestamp))
            .bind(record.attributed_user.map(ProfileId::as_uuid))
            .bind(record.id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(StorageError::from)?;

        // Dropping the transaction rolls it back.
        if result.rows_affected() == 0 {
            return Err(NotFoundError {
                entity: "Measurement",
                id: record.id.to_string(),
            }
            .into());
        }

        let row: Wrapper = sqlx::query_as(SELECT_BY_ID)
            .bind(record.id.as_uuid())
            .fetch_one(&mut *tx)
            .await
            .map_err(StorageError::from)?;
        tx.commit().await.map_err(StorageError::from)?;

        Ok(row.0)
    }
}
