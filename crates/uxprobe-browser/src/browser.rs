//! Browser lifecycle management using Chrome DevTools Protocol

use crate::dom::{self, DomAction};
use crate::driver::PageDriver;
use crate::error::{BrowserError, Result};
use async_trait::async_trait;
use headless_chrome::protocol::cdp::types::Event;
use headless_chrome::protocol::cdp::Page::CaptureScreenshotFormatOption;
use headless_chrome::{Browser, LaunchOptions, Tab};
use serde::Deserialize;
use std::ffi::OsStr;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, info, warn};
use uxprobe_core::config::BrowserSettings;
use uxprobe_core::{ElementState, Locator};

/// Configuration for browser launch
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    /// Run in headless mode (default: true)
    pub headless: bool,
    /// Browser window width
    pub window_width: u32,
    /// Browser window height
    pub window_height: u32,
    /// User agent string
    pub user_agent: Option<String>,
    /// Navigation timeout in seconds
    pub timeout_seconds: u64,
    /// Attach to a running Chrome on this DevTools port instead of launching one
    pub connect_port: Option<u16>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            window_width: 1920,
            window_height: 1080,
            user_agent: None,
            timeout_seconds: 30,
            connect_port: None,
        }
    }
}

impl From<&BrowserSettings> for BrowserConfig {
    fn from(settings: &BrowserSettings) -> Self {
        Self {
            headless: settings.headless,
            window_width: settings.window_width,
            window_height: settings.window_height,
            user_agent: settings.user_agent.clone(),
            timeout_seconds: settings.navigation_timeout_secs,
            connect_port: settings.connect_port,
        }
    }
}

/// Native dialog state shared with the tab's event listener
#[derive(Debug, Default)]
struct NativeDialogs {
    /// Answer for the next dialog
    armed: Option<bool>,
    /// Message of the last dialog answered with an armed answer
    answered: Option<String>,
}

/// Active browser session with Chrome DevTools Protocol
pub struct BrowserSession {
    /// Underlying browser instance; dropping it kills the Chrome process
    browser: Option<Browser>,
    /// Current active tab
    tab: Arc<Tab>,
    dialogs: Arc<Mutex<NativeDialogs>>,
}

impl BrowserSession {
    fn new(browser: Browser, tab: Arc<Tab>) -> Result<Self> {
        let dialogs = watch_dialogs(&tab)?;
        Ok(Self {
            browser: Some(browser),
            tab,
            dialogs,
        })
    }

    fn dialogs(&self) -> Result<MutexGuard<'_, NativeDialogs>> {
        self.dialogs
            .lock()
            .map_err(|_| BrowserError::Browser("Dialog state lock poisoned".to_string()))
    }

    /// Launch or attach according to `config`
    pub async fn open(config: BrowserConfig) -> Result<Self> {
        match config.connect_port {
            Some(port) => Self::connect(port).await,
            None => Self::launch_with_config(config).await,
        }
    }

    /// Launch browser with custom configuration
    pub async fn launch_with_config(config: BrowserConfig) -> Result<Self> {
        info!(
            "Launching browser (headless: {}, size: {}x{})",
            config.headless, config.window_width, config.window_height
        );

        let user_agent_arg: Option<String> = config
            .user_agent
            .as_ref()
            .map(|ua| format!("--user-agent={}", ua));

        let mut launch_options = LaunchOptions::default_builder()
            .headless(config.headless)
            .window_size(Some((config.window_width, config.window_height)))
            .build()
            .map_err(|e| BrowserError::Browser(format!("Invalid launch options: {}", e)))?;

        if let Some(ref ua_arg) = user_agent_arg {
            launch_options.args.push(OsStr::new(ua_arg));
        }

        let browser = Browser::new(launch_options)
            .map_err(|e| BrowserError::Browser(format!("Failed to launch browser: {}", e)))?;

        let tab = browser
            .new_tab()
            .map_err(|e| BrowserError::Browser(format!("Failed to create tab: {}", e)))?;
        tab.set_default_timeout(Duration::from_secs(config.timeout_seconds));

        info!("Browser launched successfully");

        Self::new(browser, tab)
    }

    /// Connect to an existing browser instance
    ///
    /// # Arguments
    /// * `port` - Chrome DevTools Protocol port (typically 9222)
    pub async fn connect(port: u16) -> Result<Self> {
        info!("Connecting to existing browser on port {}", port);

        let ws_url = discover_websocket_url(port).await?;
        debug!("DevTools websocket: {}", ws_url);

        let browser = Browser::connect(ws_url)
            .map_err(|e| BrowserError::Browser(format!("Failed to connect to browser: {}", e)))?;

        let tab = browser
            .new_tab()
            .map_err(|e| BrowserError::Browser(format!("Failed to create tab: {}", e)))?;

        info!("Connected to browser successfully");

        Self::new(browser, tab)
    }

    /// Execute JavaScript in the page context
    pub async fn evaluate_script(&self, script: &str) -> Result<serde_json::Value> {
        let result = self
            .tab
            .evaluate(script, false)
            .map_err(|e| BrowserError::Browser(format!("JavaScript evaluation failed: {}", e)))?;

        Ok(result.value.unwrap_or(serde_json::Value::Null))
    }

    async fn act(&self, locator: &Locator, action: DomAction, value: Option<&str>) -> Result<()> {
        let script = dom::expression(locator, action, value)?;
        let raw = self.evaluate_script(&script).await?;
        dom::parse_action(locator, raw)
    }
}

#[async_trait]
impl PageDriver for BrowserSession {
    async fn navigate(&self, url: &str) -> Result<()> {
        debug!("Navigating to {}", url);

        self.tab
            .navigate_to(url)
            .map_err(|e| BrowserError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        self.tab
            .wait_until_navigated()
            .map_err(|e| BrowserError::Navigation {
                url: url.to_string(),
                reason: format!("timed out waiting for load: {}", e),
            })?;

        info!("Successfully navigated to {}", url);
        Ok(())
    }

    async fn probe(&self, locator: &Locator) -> Result<ElementState> {
        let script = dom::expression(locator, DomAction::Probe, None)?;
        let raw = self.evaluate_script(&script).await?;
        dom::parse_state(raw)
    }

    async fn click(&self, locator: &Locator) -> Result<()> {
        debug!("Clicking {}", locator);
        self.act(locator, DomAction::Click, None).await
    }

    async fn fill(&self, locator: &Locator, value: &str) -> Result<()> {
        debug!("Filling {}", locator);
        self.act(locator, DomAction::Fill, Some(value)).await
    }

    async fn arm_dialog(&self, answer: Option<bool>) -> Result<()> {
        let mut dialogs = self.dialogs()?;
        dialogs.armed = answer;
        dialogs.answered = None;
        Ok(())
    }

    async fn answered_dialog(&self) -> Result<Option<String>> {
        Ok(self.dialogs()?.answered.take())
    }

    async fn capture_png(&self) -> Result<Vec<u8>> {
        self.tab
            .capture_screenshot(CaptureScreenshotFormatOption::Png, None, None, true)
            .map_err(|e| BrowserError::Screenshot(format!("CDP capture failed: {}", e)))
    }

    async fn close(&mut self) -> Result<()> {
        let Some(browser) = self.browser.take() else {
            return Ok(());
        };

        info!("Closing browser session");
        let closed = self.tab.close(true);
        drop(browser);

        closed
            .map(|_| ())
            .map_err(|e| BrowserError::Browser(format!("Failed to close tab: {}", e)))
    }
}

/// Answer native dialogs as they open
///
/// A native dialog blocks script evaluation until answered, so the answer is
/// sent from the event listener rather than from a later step.
fn watch_dialogs(tab: &Tab) -> Result<Arc<Mutex<NativeDialogs>>> {
    let state = Arc::new(Mutex::new(NativeDialogs::default()));
    let dialog = tab.get_dialog();
    let listener_state = state.clone();

    tab.add_event_listener(Arc::new(move |event: &Event| {
        let Event::PageJavascriptDialogOpening(event) = event else {
            return;
        };
        let message = event.params.message.clone();
        let armed = listener_state
            .lock()
            .ok()
            .and_then(|mut dialogs| dialogs.armed.take());

        let answered = match armed {
            Some(accept) => {
                debug!("Answering dialog \"{}\" (accept: {})", message, accept);
                let answered = if accept {
                    dialog.accept(None)
                } else {
                    dialog.dismiss()
                };
                if answered.is_ok() {
                    if let Ok(mut dialogs) = listener_state.lock() {
                        dialogs.answered = Some(message.clone());
                    }
                }
                answered
            }
            None => {
                warn!("Dismissing unexpected dialog \"{}\"", message);
                dialog.dismiss()
            }
        };

        if let Err(e) = answered {
            warn!("Failed to answer dialog \"{}\": {}", message, e);
        }
    }))
    .map_err(|e| BrowserError::Browser(format!("Failed to watch dialogs: {}", e)))?;

    Ok(state)
}

#[derive(Debug, Deserialize)]
struct DevToolsVersion {
    #[serde(rename = "webSocketDebuggerUrl")]
    web_socket_debugger_url: String,
}

/// Ask a running Chrome for its browser-level websocket endpoint
async fn discover_websocket_url(port: u16) -> Result<String> {
    let url = format!("http://127.0.0.1:{}/json/version", port);
    let version: DevToolsVersion = reqwest::get(&url)
        .await
        .map_err(|e| BrowserError::Browser(format!("No DevTools endpoint at {}: {}", url, e)))?
        .json()
        .await
        .map_err(|e| BrowserError::Browser(format!("Unexpected response from {}: {}", url, e)))?;

    Ok(version.web_socket_debugger_url)
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        if self.browser.is_some() {
            warn!("BrowserSession dropped without close(), browser will be killed");
        } else {
            debug!("BrowserSession dropped");
        }
    }
}
