//! Common error types used across the workspace.
//!
//! [`ScaleError`] is the base error crossing port boundaries. Each pipeline
//! stage has its own typed error and converts via `#[from]`; adapters box
//! their errors into [`ScaleError::Scan`] or [`ScaleError::Storage`].

use std::fmt;

use crate::address::DeviceAddress;

/// Boxed error coming from a collaborator (scan transport, storage backend).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Base error type for the workspace.
#[derive(Debug, thiserror::Error)]
pub enum ScaleError {
    /// A domain invariant was violated.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// A referenced record does not exist.
    #[error("not found")]
    NotFound(#[from] NotFoundError),

    /// A raw advertisement could not be decoded.
    #[error("failed to decode advertisement")]
    Decode(#[from] DecodeError),

    /// Body-composition inputs or outputs were outside physiological bounds.
    #[error("body composition calculation failed")]
    Calculation(#[from] CalculationError),

    /// The scan collaborator failed in a way the loop cannot recover from.
    #[error("scan error")]
    Scan(#[source] BoxError),

    /// The storage collaborator failed.
    #[error("storage error")]
    Storage(#[source] BoxError),
}

/// Violated domain invariants.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("username must not be empty")]
    EmptyUsername,

    #[error("display name must not be empty")]
    EmptyDisplayName,

    #[error("height {0} cm is outside the supported range")]
    HeightOutOfRange(f64),

    #[error("birthdate lies in the future")]
    BirthdateInFuture,

    #[error("invalid device address {0:?}")]
    InvalidAddress(String),

    /// A configuration value is outside its documented bounds.
    #[error("{field} {reason}")]
    OutOfBounds {
        field: &'static str,
        reason: &'static str,
    },
}

/// A lookup by id found nothing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

/// Why an advertisement was not turned into a [`DecodedFrame`](crate::frame::DecodedFrame).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The payload does not carry the expected signature or length.
    #[error("malformed frame")]
    MalformedFrame(#[from] MalformedFrame),

    /// The frame comes from another device. Filtered, not a failure.
    #[error("frame from {actual} ignored, expecting {expected}")]
    WrongDevice {
        expected: DeviceAddress,
        actual: DeviceAddress,
    },
}

impl DecodeError {
    /// Stable reason tag used in logs and cycle reports.
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            Self::MalformedFrame(_) => "malformed_frame",
            Self::WrongDevice { .. } => "wrong_device",
        }
    }
}

/// Details about why a payload is not a scale advertisement.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedFrame {
    #[error("unexpected service data prefix {found:02X?}")]
    BadSignature { found: [u8; 2] },

    #[error("payload must be at least {minimum} bytes, got {actual}")]
    TooShort { minimum: usize, actual: usize },
}

/// Physical quantity checked against plausibility bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantity {
    Weight,
    Impedance,
    Height,
    Age,
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Weight => f.write_str("weight"),
            Self::Impedance => f.write_str("impedance"),
            Self::Height => f.write_str("height"),
            Self::Age => f.write_str("age"),
        }
    }
}

/// Failure of the body-composition engine.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CalculationError {
    /// An input lies outside physiological bounds; the measurement is skipped.
    #[error("implausible {quantity}: {value}")]
    ImplausibleInput { quantity: Quantity, value: f64 },

    /// A derived metric is not finite or outside its sanity range.
    #[error("implausible {metric}: {value}")]
    ImplausibleOutput { metric: &'static str, value: f64 },
}

impl CalculationError {
    /// Stable reason tag used in logs and cycle reports.
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            Self::ImplausibleInput { .. } => "implausible_input",
            Self::ImplausibleOutput { .. } => "implausible_output",
        }
    }
}
