//! Browser error types - re-exports the unified ProbeError from uxprobe-core
//!
//! Browser failures map onto these ProbeError variants:
//! - Browser(String) - launch, tab and CDP errors
//! - Navigation { url, reason } - page load failures
//! - AssertionTimeout { .. } - a bounded wait expired
//! - Interaction { locator, reason } - click/fill could not be performed
//! - Screenshot(String) - capture or write failures
//!
//! Error messages should include the locator or URL involved.

pub use uxprobe_core::{ProbeError, Result};

pub type BrowserError = ProbeError;
