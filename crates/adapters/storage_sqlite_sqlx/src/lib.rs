//! # bodyscale-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the [`MeasurementRepository`](bodyscale_app::ports::MeasurementRepository)
//!   port defined in `bodyscale-app`
//! - Manage `SQLite` connection pool lifecycle
//! - Run database migrations (using sqlx embedded migrations)
//! - Map between domain types and database rows
//!
//! ## Dependency rule
//! Depends on `bodyscale-app` (for port traits) and `bodyscale-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

mod error;
mod measurement_repo;
pub mod pool;

pub use error::StorageError;
pub use measurement_repo::SqliteMeasurementRepository;
pub use pool::{Config, Database};
