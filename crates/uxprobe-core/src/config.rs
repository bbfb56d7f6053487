//! Configuration management for uxprobe
//!
//! Settings can come from a TOML file; anything missing falls back to the
//! defaults below, which match the hard-coded local development setup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::{ProbeError, Result};

/// Harness configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Root URL of the application under test
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Directory screenshots are written to
    #[serde(default = "default_screenshot_dir")]
    pub screenshot_dir: PathBuf,

    /// Working directory of the application (fixtures live under `.cache/`)
    #[serde(default = "default_app_root")]
    pub app_root: PathBuf,

    /// Browser launch settings
    #[serde(default)]
    pub browser: BrowserSettings,

    /// Bounded-wait settings
    #[serde(default)]
    pub waits: WaitSettings,
}

/// Browser launch settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowserSettings {
    #[serde(default = "default_headless")]
    pub headless: bool,

    #[serde(default = "default_window_width")]
    pub window_width: u32,

    #[serde(default = "default_window_height")]
    pub window_height: u32,

    #[serde(default)]
    pub user_agent: Option<String>,

    /// Page load timeout in seconds
    #[serde(default = "default_navigation_timeout_secs")]
    pub navigation_timeout_secs: u64,

    /// Attach to an already running Chrome on this DevTools port
    #[serde(default)]
    pub connect_port: Option<u16>,
}

/// Bounded-wait settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitSettings {
    /// Timeout for steps that do not set their own
    #[serde(default = "default_timeout_ms")]
    pub default_timeout_ms: u64,

    /// Delay between DOM probes
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

// Default value providers
fn default_base_url() -> String {
    "http://localhost:9002".to_string()
}

fn default_screenshot_dir() -> PathBuf {
    PathBuf::from("verification")
}

fn default_app_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_headless() -> bool {
    true
}

fn default_window_width() -> u32 {
    1920
}

fn default_window_height() -> u32 {
    1080
}

fn default_navigation_timeout_secs() -> u64 {
    30
}

fn default_timeout_ms() -> u64 {
    5_000
}

fn default_poll_interval_ms() -> u64 {
    100
}

impl ProbeConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ProbeError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    /// Load configuration from `path` if given, otherwise use defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ProbeError::Config(format!("Failed to parse config file: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| ProbeError::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Check values that serde cannot; run again after overriding fields
    pub fn validate(&self) -> Result<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ProbeError::Config(format!(
                "base_url must be an http(s) URL, got {}",
                self.base_url
            )));
        }
        if self.waits.poll_interval_ms == 0 {
            return Err(ProbeError::Config(
                "poll_interval_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Join a page path onto the base URL
    pub fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.waits.default_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.waits.poll_interval_ms)
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            screenshot_dir: default_screenshot_dir(),
            app_root: default_app_root(),
            browser: BrowserSettings::default(),
            waits: WaitSettings::default(),
        }
    }
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: default_headless(),
            window_width: default_window_width(),
            window_height: default_window_height(),
            user_agent: None,
            navigation_timeout_secs: default_navigation_timeout_secs(),
            connect_port: None,
        }
    }
}

impl Default for WaitSettings {
    fn default() -> Self {
        Self {
            default_timeout_ms: default_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}
