//! # bodyscale-domain
//!
//! Pure domain model for the bodyscale measurement pipeline.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Decode raw scale advertisements into typed frames ([`frame`])
//! - Recognise the single stabilized, impedance-bearing frame per weigh-in
//!   ([`stabilization`])
//! - Reject hardware repeats of an already accepted weigh-in ([`dedup`])
//! - Attribute an anonymous weight to the most likely user profile
//!   ([`attribution`])
//! - Derive body-composition metrics from weight, impedance and profile
//!   attributes ([`composition`])
//!
//! Data flows strictly `frame → stabilization → dedup → attribution →
//! composition`; no module refers back to a later stage.
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod address;
pub mod attribution;
pub mod composition;
pub mod dedup;
pub mod frame;
pub mod history;
pub mod measurement;
pub mod metrics;
pub mod profile;
pub mod stabilization;
