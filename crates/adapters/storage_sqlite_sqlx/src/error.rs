//! Storage-specific error type wrapping sqlx errors.

use bodyscale_domain::error::ScaleError;

/// Errors originating from the `SQLite` storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A query or connection failed.
    #[error("database error")]
    Database(#[from] sqlx::Error),

    /// Failed to run migrations.
    #[error("migration error")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl From<StorageError> for ScaleError {
    fn from(err: StorageError) -> Self {
        Self::Storage(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_convert_database_error_to_storage_error() {
        let err: ScaleError = StorageError::Database(sqlx::Error::RowNotFound).into();
        assert!(matches!(err, ScaleError::Storage(_)));
    }

    #[test]
    fn should_display_database_error() {
        let err = StorageError::Database(sqlx::Error::PoolClosed);
        assert_eq!(err.to_string(), "database error");
    }
}
