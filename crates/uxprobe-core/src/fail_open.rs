//! Fail-open helper for best-effort work
//!
//! Failure screenshots and fixture cleanup happen while a run is already being
//! torn down. Their errors are logged and swallowed so they never mask the
//! original failure.
//!
//! DO NOT use fail-open for:
//! - Assertion steps
//! - Navigation
//! - Closing the browser session

use std::future::Future;
use tracing::warn;

use crate::Result;

/// Execute an operation whose failure must not abort the caller
///
/// Logs the error via `tracing::warn!` on failure and returns `None`.
///
/// # Usage
///
/// ```no_run
/// use uxprobe_core::fail_open::fail_open;
/// use uxprobe_core::Result;
///
/// async fn capture_error_screenshot() -> Result<()> {
///     Ok(())
/// }
///
/// async fn example() {
///     let shot = fail_open("failure screenshot", || capture_error_screenshot()).await;
///     // shot is None if the capture failed
/// }
/// ```
pub async fn fail_open<F, Fut, T>(operation_name: &str, f: F) -> Option<T>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    match f().await {
        Ok(val) => Some(val),
        Err(e) => {
            warn!("{} failed (fail-open): {}", operation_name, e);
            None
        }
    }
}
