//! Profile store error types.

use bodyscale_domain::error::ScaleError;

/// Errors specific to the JSON profile store.
#[derive(Debug, thiserror::Error)]
pub enum ProfileStoreError {
    /// The profile file exists but could not be read.
    #[error("failed to read profile file")]
    Io(#[from] std::io::Error),

    /// The profile file is not a valid profile document.
    #[error("failed to parse profile file")]
    Json(#[from] serde_json::Error),
}

impl From<ProfileStoreError> for ScaleError {
    fn from(err: ProfileStoreError) -> Self {
        ScaleError::Storage(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_display_parse_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{{bad").unwrap_err();
        let err = ProfileStoreError::from(json_err);
        assert_eq!(err.to_string(), "failed to parse profile file");
    }

    #[test]
    fn should_convert_io_error_to_storage_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: ScaleError = ProfileStoreError::from(io_err).into();
        assert!(matches!(err, ScaleError::Storage(_)));
    }
}
