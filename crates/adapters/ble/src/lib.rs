//! # bodyscale-adapter-ble
//!
//! Passive BLE adapter — the scan collaborator of the measurement pipeline.
//!
//! ## How it works
//!
//! The scale broadcasts every reading as a service-data advertisement under
//! the Body Composition service UUID (no connection needed). This adapter
//! listens for a bounded window and returns every such advertisement as a
//! [`RawFrame`](bodyscale_domain::frame::RawFrame) keyed by device address.
//! Decoding, stabilization and deduplication happen in the pipeline.
//!
//! | Format | UUID | Service data | Raw frame |
//! |--------|------|--------------|-----------|
//! | Mi body-composition scale | `0x181B` | 13 bytes | `1B 18` + 13 bytes |
//!
//! ## Dependency rule
//!
//! Same as other adapters: depends on `bodyscale-app` and `bodyscale-domain`.

mod config;
mod error;
pub mod payload;
mod scanner;

pub use config::BleConfig;
pub use error::BleError;
pub use scanner::BleFrameSource;
