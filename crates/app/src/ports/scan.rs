//! Scan port — pull source of raw scale advertisements.

use std::future::Future;
use std::time::Duration;

use bodyscale_domain::error::ScaleError;
use bodyscale_domain::frame::RawFrame;

/// Supplies the advertisements captured during one bounded scan window.
///
/// Implementations must return once `window` has elapsed even when nothing
/// was heard. Frames carry a monotonically increasing `sequence` within the
/// source.
pub trait FrameSource: Send + Sync {
    /// Listen for `window` and return every frame captured, in arrival order.
    fn scan(
        &self,
        window: Duration,
    ) -> impl Future<Output = Result<Vec<RawFrame>, ScaleError>> + Send;
}
