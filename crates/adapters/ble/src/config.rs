//! BLE scan configuration.

use serde::Deserialize;

/// Configuration for the passive BLE scan collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BleConfig {
    /// Index of the host adapter to scan with, in the order the OS lists them.
    pub adapter_index: usize,
    /// Ask the adapter to report only `0x181B` advertisements.
    ///
    /// Some backends ignore service filters; frames are filtered again in
    /// software either way.
    pub filter_by_service: bool,
}

impl Default for BleConfig {
    fn default() -> Self {
        Self {
            adapter_index: 0,
            filter_by_service: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_use_first_adapter_by_default() {
        let config = BleConfig::default();
        assert_eq!(config.adapter_index, 0);
        assert!(config.filter_by_service);
    }

    #[test]
    fn should_deserialize_partial_table() {
        let config: BleConfig = toml::from_str("adapter_index = 1").unwrap();
        assert_eq!(config.adapter_index, 1);
        assert!(config.filter_by_service);
    }
}
