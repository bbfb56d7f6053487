//! Unified error types for uxprobe

use std::time::Duration;
use thiserror::Error;

/// Unified error type for all uxprobe operations
#[derive(Error, Debug)]
pub enum ProbeError {
    // Session errors
    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    // Verification errors
    #[error("Timed out after {timeout:?} waiting for {locator} to be {condition} (last seen: {last_seen})")]
    AssertionTimeout {
        locator: String,
        condition: String,
        timeout: Duration,
        last_seen: String,
    },

    #[error("Interaction failed on {locator}: {reason}")]
    Interaction { locator: String, reason: String },

    #[error("Screenshot failed: {0}")]
    Screenshot(String),

    // Fixture errors
    #[error("Fixture error: {0}")]
    Fixture(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown scenario: {0}")]
    UnknownScenario(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Generic
    #[error("{0}")]
    Other(String),
}

impl ProbeError {
    /// Whether this error is an assertion that did not hold within its timeout
    pub fn is_assertion_timeout(&self) -> bool {
        matches!(self, ProbeError::AssertionTimeout { .. })
    }
}

/// Result type alias using ProbeError
pub type Result<T> = std::result::Result<T, ProbeError>;
