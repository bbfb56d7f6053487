//! The verification runner
//!
//! A run is strictly linear: navigate, evaluate each step in order, screenshot,
//! close. The first failing step ends the run; there are no run-level retries.

use crate::browser::{BrowserConfig, BrowserSession};
use crate::driver::PageDriver;
use crate::error::{BrowserError, Result};
use crate::screenshot::capture_screenshot;
use crate::wait::{wait_for, wait_for_dialog, wait_for_file, wait_for_step};
use chrono::Utc;
use std::time::Duration;
use tracing::{error, info, warn};
use uxprobe_core::fail_open::fail_open;
use uxprobe_core::{
    Condition, Interaction, Locator, ProbeConfig, RunOutcome, RunReport, Step, VerificationRun,
};

/// A step failure: index of the failing step (`None` before the first step) and the error
type StepFailure = (Option<usize>, BrowserError);

/// Executes [`VerificationRun`]s against a [`PageDriver`]
#[derive(Debug, Clone)]
pub struct VerificationRunner {
    default_timeout: Duration,
    poll_interval: Duration,
}

impl VerificationRunner {
    pub fn new(default_timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            default_timeout,
            poll_interval,
        }
    }

    pub fn from_config(config: &ProbeConfig) -> Self {
        Self::new(config.default_timeout(), config.poll_interval())
    }

    /// Open a browser session for `run` and execute it
    ///
    /// A session that cannot be opened yields a failed report; there is
    /// nothing to screenshot or close in that case.
    pub async fn run_in_browser(&self, browser: BrowserConfig, run: &VerificationRun) -> RunReport {
        let started_at = Utc::now();

        match BrowserSession::open(browser).await {
            Ok(session) => self.run(session, run).await,
            Err(e) => {
                error!("Verification '{}' failed: {}", run.name, e);
                RunReport {
                    started_at,
                    ..RunReport::not_started(run, e.to_string())
                }
            }
        }
    }

    /// Execute `run` on an already opened session
    ///
    /// The driver is closed exactly once before this returns, whatever the
    /// outcome.
    pub async fn run<D: PageDriver>(&self, mut driver: D, run: &VerificationRun) -> RunReport {
        let started_at = Utc::now();
        info!("Running verification '{}' ({} steps)", run.name, run.steps.len());

        let (steps_completed, result) = self.execute(&driver, run).await;

        let (outcome, screenshot) = match result {
            Ok(()) => match &run.success_screenshot {
                Some(path) => match capture_screenshot(&driver, path).await {
                    Ok(shot) => (RunOutcome::Passed, Some(shot)),
                    Err(e) => {
                        error!("Verification '{}' failed: {}", run.name, e);
                        (
                            RunOutcome::Failed {
                                step: None,
                                reason: e.to_string(),
                            },
                            None,
                        )
                    }
                },
                None => (RunOutcome::Passed, None),
            },
            Err((step, e)) => {
                error!("Verification '{}' failed: {}", run.name, e);
                let shot = match &run.failure_screenshot {
                    Some(path) => {
                        fail_open("failure screenshot", || capture_screenshot(&driver, path)).await
                    }
                    None => None,
                };
                (
                    RunOutcome::Failed {
                        step,
                        reason: e.to_string(),
                    },
                    shot,
                )
            }
        };

        if let Err(e) = driver.close().await {
            warn!("Session for '{}' did not close cleanly: {}", run.name, e);
        }

        if matches!(outcome, RunOutcome::Passed) {
            info!("Verification '{}' successful", run.name);
        }

        RunReport {
            name: run.name.clone(),
            url: run.url.clone(),
            outcome,
            steps_completed,
            steps_total: run.steps.len(),
            screenshot,
            started_at,
            finished_at: Utc::now(),
        }
    }

    /// Navigate and evaluate steps; returns the number of completed steps
    async fn execute<D: PageDriver>(
        &self,
        driver: &D,
        run: &VerificationRun,
    ) -> (usize, std::result::Result<(), StepFailure>) {
        info!("Navigating to {}", run.url);
        if let Err(e) = driver.navigate(&run.url).await {
            return (0, Err((None, e)));
        }

        for (index, step) in run.steps.iter().enumerate() {
            info!("Step {}/{}: {}", index + 1, run.steps.len(), step.describe());
            // A click followed by a dialog answer must arm it first
            let dialog_answer = run.steps.get(index + 1).and_then(Step::dialog_answer);
            if let Err(e) = self.execute_step(driver, step, dialog_answer).await {
                return (index, Err((Some(index), e)));
            }
        }

        (run.steps.len(), Ok(()))
    }

    async fn execute_step<D: PageDriver>(
        &self,
        driver: &D,
        step: &Step,
        dialog_answer: Option<bool>,
    ) -> Result<()> {
        match step {
            Step::Assert(assertion) => {
                wait_for_step(driver, assertion, self.default_timeout, self.poll_interval).await?;
            }
            Step::File(assertion) => {
                wait_for_file(assertion, self.default_timeout, self.poll_interval).await?;
            }
            Step::Interact(Interaction::Click { locator }) => {
                self.wait_actionable(driver, locator).await?;
                if dialog_answer.is_some() {
                    driver.arm_dialog(dialog_answer).await?;
                }
                driver.click(locator).await?;
            }
            Step::Interact(Interaction::Fill { locator, value }) => {
                self.wait_actionable(driver, locator).await?;
                driver.fill(locator, value).await?;
            }
            Step::Interact(Interaction::Pause { millis }) => {
                tokio::time::sleep(Duration::from_millis(*millis)).await;
            }
            Step::Interact(Interaction::AcceptDialog { button }) => {
                self.answer_dialog(driver, true, button.as_ref()).await?;
            }
            Step::Interact(Interaction::DismissDialog { button }) => {
                self.answer_dialog(driver, false, button.as_ref()).await?;
            }
        }
        Ok(())
    }

    async fn answer_dialog<D: PageDriver>(
        &self,
        driver: &D,
        accept: bool,
        button: Option<&Locator>,
    ) -> Result<()> {
        wait_for_dialog(
            driver,
            accept,
            button,
            self.default_timeout,
            self.poll_interval,
        )
        .await
    }

    async fn wait_actionable<D: PageDriver>(&self, driver: &D, locator: &Locator) -> Result<()> {
        wait_for(
            driver,
            locator,
            &Condition::Visible,
            self.default_timeout,
            self.poll_interval,
        )
        .await
        .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runner_from_config() {
        let mut config = ProbeConfig::default();
        config.waits.default_timeout_ms = 750;
        config.waits.poll_interval_ms = 25;

        let runner = VerificationRunner::from_config(&config);
        assert_eq!(runner.default_timeout, Duration::from_millis(750));
        assert_eq!(runner.poll_interval, Duration::from_millis(25));
    }
}
