//! BLE adapter error types.

use bodyscale_domain::error::ScaleError;

/// Errors specific to the BLE adapter.
#[derive(Debug, thiserror::Error)]
pub enum BleError {
    /// No BLE adapter found at the configured index.
    #[error("no BLE adapter available at index {0}")]
    NotAvailable(usize),

    /// BLE scan or adapter operation failed.
    #[error("BLE scan error")]
    Scan(#[from] btleplug::Error),
}

impl From<BleError> for ScaleError {
    fn from(err: BleError) -> Self {
        ScaleError::Scan(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_display_not_available_error() {
        let err = BleError::NotAvailable(1);
        assert_eq!(err.to_string(), "no BLE adapter available at index 1");
    }

    #[test]
    fn should_display_scan_error() {
        let err = BleError::Scan(btleplug::Error::DeviceNotFound);
        assert_eq!(err.to_string(), "BLE scan error");
    }

    #[test]
    fn should_convert_not_available_to_scan_error() {
        let err: ScaleError = BleError::NotAvailable(0).into();
        assert!(matches!(err, ScaleError::Scan(_)));
    }

    #[test]
    fn should_convert_btleplug_error_to_scan_error() {
        let err: ScaleError = BleError::Scan(btleplug::Error::DeviceNotFound).into();
        assert!(matches!(err, ScaleError::Scan(_)));
    }
}
