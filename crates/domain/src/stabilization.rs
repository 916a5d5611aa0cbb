//! Recognition of the one authoritative frame per weigh-in.
//!
//! While the reading settles the scale broadcasts dozens of frames. Only a
//! frame flagged both stabilized and impedance-present completes a weigh-in;
//! every other frame leaves the detector waiting.

use crate::error::CalculationError;
use crate::frame::DecodedFrame;
use crate::measurement::ValidatedMeasurement;
use crate::time::Timestamp;

/// Detector state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetectorState {
    #[default]
    Waiting,
    Accepted,
}

/// Why a frame did not complete a weigh-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingReason {
    /// The weight is still fluctuating.
    Stabilizing,
    /// Stabilized, but impedance has not been sampled yet.
    MissingImpedance,
    /// The person stepped off the scale.
    WeightRemoved,
}

impl PendingReason {
    /// Stable reason tag used in logs and cycle reports.
    #[must_use]
    pub fn reason(self) -> &'static str {
        match self {
            Self::Stabilizing => "stabilizing",
            Self::MissingImpedance => "missing_impedance",
            Self::WeightRemoved => "weight_removed",
        }
    }
}

/// Result of feeding one frame to the detector.
#[derive(Debug, Clone, PartialEq)]
pub enum Detection {
    Pending(PendingReason),
    /// The weigh-in completed with a plausible reading.
    Accepted(ValidatedMeasurement),
    /// The weigh-in completed but its weight or impedance is implausible.
    Rejected(CalculationError),
}

/// Per-device state machine `Waiting → Accepted → Waiting`.
#[derive(Debug, Clone, Default)]
pub struct StabilizationDetector {
    state: DetectorState,
}

impl StabilizationDetector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> DetectorState {
        self.state
    }

    pub fn reset(&mut self) {
        self.state = DetectorState::Waiting;
    }

    /// Feed one decoded frame received at `received_at`.
    ///
    /// A completing frame moves the detector to [`DetectorState::Accepted`],
    /// emits the measurement (or the plausibility failure) and resets to
    /// [`DetectorState::Waiting`] so the next weigh-in can be recognised.
    pub fn observe(&mut self, frame: &DecodedFrame, received_at: Timestamp) -> Detection {
        if frame.is_weight_removed() {
            return Detection::Pending(PendingReason::WeightRemoved);
        }
        if !frame.is_stabilized() {
            return Detection::Pending(PendingReason::Stabilizing);
        }
        if !frame.has_impedance() {
            return Detection::Pending(PendingReason::MissingImpedance);
        }

        self.state = DetectorState::Accepted;
        let detection =
            match ValidatedMeasurement::new(frame.weight_kg(), frame.impedance_ohm(), received_at) {
                Ok(measurement) => Detection::Accepted(measurement),
                Err(err) => Detection::Rejected(err),
            };
        self.reset();
        detection
    }
}
