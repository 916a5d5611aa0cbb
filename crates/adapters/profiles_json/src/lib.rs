//! # bodyscale-adapter-profiles-json — JSON profile store
//!
//! Implements [`ProfileRepository`](bodyscale_app::ports::ProfileRepository)
//! over a `users.json` document maintained outside the daemon. The file is
//! re-read on every call so edits apply from the next cycle on.

mod error;
mod profile_repo;

pub use error::ProfileStoreError;
pub use profile_repo::JsonProfileRepository;
