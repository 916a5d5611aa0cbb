//! # bodyscale-app
//!
//! Application layer — use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `FrameSource` — bounded scan window yielding raw advertisements
//!   - `ProfileRepository` — read-only snapshot of user profiles
//!   - `MeasurementRepository` — persist records, weight histories, reassignment
//! - Own the per-device [`session::DeviceSession`] (stabilization state and last
//!   accepted measurement)
//! - Drive the polling loop in [`orchestrator::MeasurementOrchestrator`]
//! - Expose manual reassignment of unknown-user records through
//!   [`services::measurement_service::MeasurementService`]
//!
//! ## Dependency rule
//! Depends on `bodyscale-domain` only (plus `tokio` for timers, `select!` and
//! the shutdown channel). Never imports adapter crates. Adapters depend on
//! *this* crate, not the reverse.

pub mod config;
pub mod orchestrator;
pub mod ports;
pub mod services;
pub mod session;
