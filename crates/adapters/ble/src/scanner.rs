//! BLE scanner — captures scale advertisements for one bounded window.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use btleplug::api::{BDAddr, Central, CentralEvent, Manager as _, Peripheral as _, ScanFilter};
use btleplug::platform::{Adapter, Manager};
use tokio_stream::StreamExt as _;

use bodyscale_app::ports::FrameSource;
use bodyscale_domain::address::DeviceAddress;
use bodyscale_domain::error::ScaleError;
use bodyscale_domain::frame::{RawFrame, SERVICE_UUID_181B};
use bodyscale_domain::time::now;

use crate::config::BleConfig;
use crate::error::BleError;
use crate::payload::raw_payload_from_service_data;

/// Scan collaborator backed by the host Bluetooth adapter.
///
/// Every call to [`FrameSource::scan`] opens the adapter, listens for the
/// requested window and stops scanning again, so the radio is idle between
/// cycles. Sequence numbers keep increasing across calls.
pub struct BleFrameSource {
    config: BleConfig,
    sequence: AtomicU64,
}

impl BleFrameSource {
    #[must_use]
    pub fn new(config: BleConfig) -> Self {
        Self {
            config,
            sequence: AtomicU64::new(0),
        }
    }

    fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::Relaxed)
    }

    fn scan_filter(&self) -> ScanFilter {
        if self.config.filter_by_service {
            ScanFilter {
                services: vec![SERVICE_UUID_181B],
            }
        } else {
            ScanFilter::default()
        }
    }

    async fn central(&self) -> Result<Adapter, BleError> {
        let manager = Manager::new().await?;
        let adapters = manager.adapters().await?;
        adapters
            .into_iter()
            .nth(self.config.adapter_index)
            .ok_or(BleError::NotAvailable(self.config.adapter_index))
    }

    /// Listen for `window` and collect every `0x181B` advertisement.
    ///
    /// # Errors
    ///
    /// Returns [`BleError`] when the adapter is unavailable or the scan
    /// cannot be started or stopped.
    async fn capture(&self, window: Duration) -> Result<Vec<RawFrame>, BleError> {
        let central = self.central().await?;
        let mut events = central.events().await?;
        central.start_scan(self.scan_filter()).await?;
        let guard = ScanGuard::new(central.clone());
        tracing::debug!(window = ?window, "BLE scan started");

        let mut frames = Vec::new();
        let deadline = tokio::time::Instant::now() + window;

        while tokio::time::Instant::now() < deadline {
            let remaining = deadline - tokio::time::Instant::now();
            match tokio::time::timeout(remaining, events.next()).await {
                Ok(Some(CentralEvent::ServiceDataAdvertisement { id, service_data })) => {
                    let Ok(peripheral) = central.peripheral(&id).await else {
                        continue;
                    };
                    let address = device_address(peripheral.address());
                    for (uuid, data) in &service_data {
                        let Some(payload) = raw_payload_from_service_data(*uuid, data) else {
                            continue;
                        };
                        tracing::trace!(mac = %address, len = payload.len(), "scale advertisement");
                        frames.push(RawFrame {
                            address,
                            payload,
                            sequence: self.next_sequence(),
                            received_at: now(),
                        });
                    }
                }
                Ok(Some(_)) => {}
                Ok(None) | Err(_) => break,
            }
        }

        guard.stop().await?;
        tracing::debug!(count = frames.len(), "BLE scan finished");
        Ok(frames)
    }
}

impl FrameSource for BleFrameSource {
    async fn scan(&self, window: Duration) -> Result<Vec<RawFrame>, ScaleError> {
        Ok(self.capture(window).await?)
    }
}

/// A radio that is currently scanning.
trait Scanning: Send + 'static {
    fn stop_scanning(self) -> impl Future<Output = Result<(), BleError>> + Send;
}

impl Scanning for Adapter {
    async fn stop_scanning(self) -> Result<(), BleError> {
        self.stop_scan().await?;
        Ok(())
    }
}

/// Stops the scan when dropped, so a capture cancelled at shutdown does not
/// leave the adapter scanning.
struct ScanGuard<S: Scanning> {
    scanning: Option<S>,
}

impl<S: Scanning> ScanGuard<S> {
    fn new(scanning: S) -> Self {
        Self {
            scanning: Some(scanning),
        }
    }

    async fn stop(mut self) -> Result<(), BleError> {
        match self.scanning.take() {
            Some(scanning) => scanning.stop_scanning().await,
            None => Ok(()),
        }
    }
}

impl<S: Scanning> Drop for ScanGuard<S> {
    fn drop(&mut self) {
        let Some(scanning) = self.scanning.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    match scanning.stop_scanning().await {
                        Ok(()) => tracing::debug!("BLE scan stopped after cancellation"),
                        Err(error) => tracing::warn!(%error, "failed to stop cancelled BLE scan"),
                    }
                });
            }
            Err(_) => tracing::warn!("no runtime to stop cancelled BLE scan"),
        }
    }
}

fn device_address(addr: BDAddr) -> DeviceAddress {
    DeviceAddress::new(addr.into_inner())
}
