//! Bounded waits on DOM state, dialogs and application files

use crate::driver::PageDriver;
use crate::error::{BrowserError, Result};
use std::io::ErrorKind;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};
use uxprobe_core::{AssertionStep, Condition, ElementState, FileAssertion, Locator};

/// Poll `locator` until `condition` holds or `timeout` elapses
///
/// The page is probed at least once even with a zero timeout. Probe errors
/// (for example while the page is mid-navigation) count as "not yet" and are
/// reported in the timeout error if they were the last thing seen.
pub async fn wait_for<D: PageDriver + ?Sized>(
    driver: &D,
    locator: &Locator,
    condition: &Condition,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<ElementState> {
    debug!("Waiting for {} to be {} (timeout: {:?})", locator, condition, timeout);

    let deadline = Instant::now() + timeout;
    let mut last_seen = ElementState::absent().summary();

    loop {
        match driver.probe(locator).await {
            Ok(state) if condition.is_satisfied(&state) => {
                debug!("{} is {}", locator, condition);
                return Ok(state);
            }
            Ok(state) => last_seen = state.summary(),
            Err(e) => {
                debug!("Probe of {} failed: {}", locator, e);
                last_seen = format!("probe error: {}", e);
            }
        }

        let now = Instant::now();
        if now >= deadline {
            return Err(BrowserError::AssertionTimeout {
                locator: locator.to_string(),
                condition: condition.to_string(),
                timeout,
                last_seen,
            });
        }

        tokio::time::sleep(poll_interval.min(deadline - now)).await;
    }
}

/// Evaluate one assertion step with its own timeout or `default_timeout`
pub async fn wait_for_step<D: PageDriver + ?Sized>(
    driver: &D,
    step: &AssertionStep,
    default_timeout: Duration,
    poll_interval: Duration,
) -> Result<ElementState> {
    wait_for(
        driver,
        &step.locator,
        &step.condition,
        step.timeout(default_timeout),
        poll_interval,
    )
    .await
}

/// Wait for the dialog opened by the previous click to be answered
///
/// A native dialog has already been answered by the session when it opened
/// (see [`PageDriver::arm_dialog`]); an in-page dialog is answered by clicking
/// `button` once it is visible.
pub async fn wait_for_dialog<D: PageDriver + ?Sized>(
    driver: &D,
    accept: bool,
    button: Option<&Locator>,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<()> {
    let answer = if accept { "accepted" } else { "dismissed" };
    let deadline = Instant::now() + timeout;
    let mut last_seen = "no dialog".to_string();

    loop {
        if let Some(message) = driver.answered_dialog().await? {
            info!("Native dialog \"{}\" {}", message, answer);
            return Ok(());
        }

        if let Some(button) = button {
            match driver.probe(button).await {
                Ok(state) if Condition::Visible.is_satisfied(&state) => {
                    driver.arm_dialog(None).await?;
                    driver.click(button).await?;
                    info!("In-page dialog {} via {}", answer, button);
                    return Ok(());
                }
                Ok(state) => last_seen = format!("no native dialog, button {}", state.summary()),
                Err(e) => last_seen = format!("probe error: {}", e),
            }
        }

        let now = Instant::now();
        if now >= deadline {
            driver.arm_dialog(None).await?;
            return Err(BrowserError::AssertionTimeout {
                locator: button
                    .map(ToString::to_string)
                    .unwrap_or_else(|| "native dialog".to_string()),
                condition: answer.to_string(),
                timeout,
                last_seen,
            });
        }

        tokio::time::sleep(poll_interval.min(deadline - now)).await;
    }
}

/// Poll a file until its contents satisfy the assertion
///
/// A missing file is a valid state (it lacks everything); other read errors
/// end the wait.
pub async fn wait_for_file(
    assertion: &FileAssertion,
    default_timeout: Duration,
    poll_interval: Duration,
) -> Result<()> {
    let timeout = assertion.timeout(default_timeout);
    let deadline = Instant::now() + timeout;

    loop {
        let content = match tokio::fs::read_to_string(&assertion.path).await {
            Ok(content) => Some(content),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };

        if assertion.condition.is_satisfied(content.as_deref()) {
            debug!("{} is {}", assertion.path.display(), assertion.condition);
            return Ok(());
        }

        let now = Instant::now();
        if now >= deadline {
            return Err(BrowserError::AssertionTimeout {
                locator: format!("file {}", assertion.path.display()),
                condition: assertion.condition.to_string(),
                timeout,
                last_seen: match content {
                    Some(content) => format!("{} bytes", content.len()),
                    None => "missing".to_string(),
                },
            });
        }

        tokio::time::sleep(poll_interval.min(deadline - now)).await;
    }
}
