//! Profile port — read-only snapshot of the people sharing the scale.

use std::future::Future;

use bodyscale_domain::error::ScaleError;
use bodyscale_domain::profile::UserProfile;

/// Read access to user profiles managed outside the pipeline.
pub trait ProfileRepository: Send + Sync {
    /// Current snapshot of all profiles. Called at least once per cycle.
    fn list(&self) -> impl Future<Output = Result<Vec<UserProfile>, ScaleError>> + Send;
}
