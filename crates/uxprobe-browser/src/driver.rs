//! The seam between the verification runner and a live page

use async_trait::async_trait;
use uxprobe_core::{ElementState, Locator, Result};

/// Operations the runner needs from a browser page
///
/// [`BrowserSession`](crate::BrowserSession) is the real implementation;
/// tests drive the runner with scripted fakes.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Load `url` and wait for the navigation to finish
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Snapshot the first element matching `locator` without waiting
    async fn probe(&self, locator: &Locator) -> Result<ElementState>;

    /// Click the first element matching `locator`
    async fn click(&self, locator: &Locator) -> Result<()>;

    /// Replace the value of the first input matching `locator`
    async fn fill(&self, locator: &Locator, value: &str) -> Result<()>;

    /// Answer the next native `alert`/`confirm`/`prompt` with `Some(accept)`.
    ///
    /// Must be called before the click that opens the dialog: a native dialog
    /// blocks the page until it is answered. `None` disarms; unarmed dialogs
    /// are dismissed.
    async fn arm_dialog(&self, answer: Option<bool>) -> Result<()>;

    /// Message of the native dialog answered since the last arm, taken once
    async fn answered_dialog(&self) -> Result<Option<String>>;

    /// PNG screenshot of the current viewport
    async fn capture_png(&self) -> Result<Vec<u8>>;

    /// Release the session. Called exactly once per run.
    async fn close(&mut self) -> Result<()>;
}
