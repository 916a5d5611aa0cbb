//! Per-device session — the mutable state of one monitored scale.
//!
//! Owns the stabilization detector and the last accepted measurement. One
//! session exists per device and is only touched from its orchestrator loop.

use bodyscale_domain::address::DeviceAddress;
use bodyscale_domain::dedup::{DuplicateTolerance, MeasurementDeduplicator};
use bodyscale_domain::error::{CalculationError, DecodeError, MalformedFrame};
use bodyscale_domain::frame::{self, RawFrame};
use bodyscale_domain::measurement::ValidatedMeasurement;
use bodyscale_domain::stabilization::{Detection, PendingReason, StabilizationDetector};

/// What the session made of one raw frame.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    /// Sent by another device; filtered.
    WrongDevice,
    Malformed(MalformedFrame),
    Pending(PendingReason),
    /// The weigh-in completed with an implausible reading.
    Implausible(CalculationError),
    /// Repeat of the last accepted weigh-in.
    Duplicate(ValidatedMeasurement),
    /// A new weigh-in, now remembered as the last accepted one.
    Fresh(ValidatedMeasurement),
}

impl SessionOutcome {
    /// Stable reason tag used in logs and cycle reports.
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            Self::WrongDevice => "wrong_device",
            Self::Malformed(_) => "malformed_frame",
            Self::Pending(reason) => reason.reason(),
            Self::Implausible(err) => err.reason(),
            Self::Duplicate(_) => "duplicate",
            Self::Fresh(_) => "accepted",
        }
    }
}

/// Stabilization and deduplication state of one scale.
#[derive(Debug, Clone)]
pub struct DeviceSession {
    device: DeviceAddress,
    detector: StabilizationDetector,
    dedup: MeasurementDeduplicator,
}

impl DeviceSession {
    #[must_use]
    pub fn new(device: DeviceAddress, tolerance: DuplicateTolerance) -> Self {
        Self {
            device,
            detector: StabilizationDetector::new(),
            dedup: MeasurementDeduplicator::new(tolerance),
        }
    }

    #[must_use]
    pub fn device(&self) -> DeviceAddress {
        self.device
    }

    #[must_use]
    pub fn detector(&self) -> &StabilizationDetector {
        &self.detector
    }

    #[must_use]
    pub fn last_accepted(&self) -> Option<&ValidatedMeasurement> {
        self.dedup.last_accepted()
    }

    /// Seed the duplicate reference, e.g. from the latest stored record.
    pub fn remember(&mut self, measurement: ValidatedMeasurement) {
        self.dedup.remember(measurement);
    }

    /// Run one frame through decode, stabilization and deduplication.
    pub fn process_frame(&mut self, raw: &RawFrame) -> SessionOutcome {
        let decoded = match frame::decode(raw, self.device) {
            Ok(decoded) => decoded,
            Err(DecodeError::WrongDevice { .. }) => return SessionOutcome::WrongDevice,
            Err(DecodeError::MalformedFrame(err)) => return SessionOutcome::Malformed(err),
        };

        match self.detector.observe(&decoded, raw.received_at) {
            Detection::Pending(reason) => SessionOutcome::Pending(reason),
            Detection::Rejected(err) => SessionOutcome::Implausible(err),
            Detection::Accepted(measurement) => {
                if self.dedup.check_and_remember(measurement) {
                    SessionOutcome::Duplicate(measurement)
                } else {
                    SessionOutcome::Fresh(measurement)
                }
            }
        }
    }
}
