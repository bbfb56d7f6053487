//! Headless browser verification for uxprobe
//!
//! This crate drives Chrome/Chromium over the DevTools Protocol (CDP) to check
//! that pages of a locally running web application render and behave as
//! expected.
//!
//! # Features
//!
//! - **Browser Management**: Launch a headless Chrome or attach to a running one
//! - **Locators**: Find elements by CSS, ARIA role and name, text, or attribute
//! - **Bounded Waits**: Poll DOM state until a condition holds or times out
//! - **Dialogs**: Answer native `confirm()` dialogs or in-page confirmation dialogs
//! - **Screenshots**: PNG capture on success and on failure
//! - **Scenarios**: Built-in checks for the application's pages
//!
//! # Example
//!
//! ```no_run
//! use uxprobe_browser::{BrowserConfig, VerificationRunner};
//! use uxprobe_core::{Condition, Locator, ProbeConfig, VerificationRun};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ProbeConfig::default();
//!     let run = VerificationRun::new("home", config.url_for("/"))
//!         .expect(Locator::role("heading", "Unselected"), Condition::Visible)
//!         .with_screenshot_dir(&config.screenshot_dir);
//!
//!     let runner = VerificationRunner::from_config(&config);
//!     let report = runner
//!         .run_in_browser(BrowserConfig::from(&config.browser), &run)
//!         .await;
//!
//!     println!("passed: {}", report.passed());
//! }
//! ```
//!
//! # Requirements
//!
//! - Chrome or Chromium browser installed
//! - For connecting to existing browser: `chrome --remote-debugging-port=9222`
//!
//! # Architecture
//!
//! - [`driver`]: The `PageDriver` seam the runner is written against
//! - [`browser`]: Browser lifecycle and session management
//! - [`dom`]: In-page locator resolution
//! - [`wait`]: Bounded waits on element state, dialogs and files
//! - [`screenshot`]: Screenshot capture to disk
//! - [`verification`]: The verification runner
//! - [`scenarios`]: Built-in scenarios and their fixtures
//! - [`error`]: Error types for browser operations

pub mod browser;
pub mod dom;
pub mod driver;
pub mod error;
pub mod scenarios;
pub mod screenshot;
pub mod verification;
pub mod wait;

// Re-export commonly used types
pub use browser::{BrowserConfig, BrowserSession};
pub use driver::PageDriver;
pub use error::{BrowserError, Result};
pub use scenarios::{Scenario, ScenarioPlan};
pub use screenshot::capture_screenshot;
pub use verification::VerificationRunner;
pub use wait::{wait_for, wait_for_dialog, wait_for_file, wait_for_step};
