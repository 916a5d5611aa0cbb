//! Service-data extraction.

use bodyscale_domain::frame::{SERVICE_DATA_PREFIX, SERVICE_UUID_181B};

/// Rebuild the raw scale payload from one service-data entry.
///
/// BLE stacks strip the 16-bit UUID from service data and report it as a
/// full 128-bit UUID instead; the pipeline expects the raw AD value, so
/// the `1B 18` prefix is restored. Returns `None` for any other service.
#[must_use]
pub fn raw_payload_from_service_data(uuid: uuid::Uuid, data: &[u8]) -> Option<Vec<u8>> {
    if uuid != SERVICE_UUID_181B {
        return None;
    }
    let mut payload = Vec::with_capacity(SERVICE_DATA_PREFIX.len() + data.len());
    payload.extend_from_slice(&SERVICE_DATA_PREFIX);
    payload.extend_from_slice(data);
    Some(payload)
}
