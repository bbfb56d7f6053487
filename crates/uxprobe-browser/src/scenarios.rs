//! Built-in verification scenarios for the local application

use crate::error::{BrowserError, Result};
use std::time::Duration;
use tracing::{error, info};
use uxprobe_core::fail_open::fail_open;
use uxprobe_core::{
    ActivityLogFixture, Condition, FileCondition, LogEntry, Locator, ProbeConfig, RunReport,
    VerificationRun,
};

/// Label of the control that empties the activity log
pub const CLEAR_LABEL: &str = "Clear";
/// Role of the in-page confirmation dialog
pub const DIALOG_ROLE: &str = "alertdialog";
/// Label of the button that confirms clearing in the dialog
pub const CONFIRM_LABEL: &str = "Continue";
/// Label of the button that dismisses the dialog
pub const CANCEL_LABEL: &str = "Cancel";
/// File the file-list toggle scenario expects to find
pub const TOGGLE_FILE_NAME: &str = "test-file-1.csv";

/// The activity viewer re-fetches every 5 seconds
const LOG_POLL_TIMEOUT: Duration = Duration::from_secs(15);
/// Time given to client-side rendering before the heading screenshot
const RENDER_SETTLE: Duration = Duration::from_secs(2);

/// A named, hard-coded verification of one page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    VerifyUx,
    ImageCard,
    ActivityLog,
    FileToggle,
}

impl Scenario {
    pub const ALL: [Scenario; 4] = [
        Scenario::VerifyUx,
        Scenario::ImageCard,
        Scenario::ActivityLog,
        Scenario::FileToggle,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::VerifyUx => "verify-ux",
            Self::ImageCard => "image-card",
            Self::ActivityLog => "activity-log",
            Self::FileToggle => "file-toggle",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::VerifyUx => "\"Unselected\" heading renders on /verify-ux",
            Self::ImageCard => "image card exposes its variant assignment as a button",
            Self::ActivityLog => "seeded log entry shows up and Clear asks for confirmation",
            Self::FileToggle => "file list entry toggles aria-pressed on click",
        }
    }

    /// Build the run (and fixture, if any) for this scenario
    pub fn plan(&self, config: &ProbeConfig) -> ScenarioPlan {
        let (run, seed) = match self {
            Self::VerifyUx => (
                VerificationRun::new(self.name(), config.url_for("/verify-ux"))
                    .expect(Locator::role("heading", "Unselected"), Condition::Visible)
                    .pause(RENDER_SETTLE),
                None,
            ),
            Self::ImageCard => (
                VerificationRun::new(self.name(), config.url_for("/verify-ux"))
                    .expect(Locator::role("checkbox", "Select image 123"), Condition::Visible)
                    .expect(
                        Locator::role("button", "Assigned to 2 variant(s)"),
                        Condition::Visible,
                    ),
                None,
            ),
            Self::ActivityLog => {
                let entry = LogEntry::unique("uxprobe activity check");
                let fixture = ActivityLogFixture::new(&config.app_root);
                (activity_log_run(config, &fixture, &entry), Some((fixture, entry)))
            }
            Self::FileToggle => {
                let file = Locator::role("button", TOGGLE_FILE_NAME);
                (
                    VerificationRun::new(self.name(), config.url_for("/"))
                        .expect(file.clone(), Condition::Visible)
                        .expect(file.clone(), Condition::attribute("type", "button"))
                        .expect(file.clone(), Condition::attribute("aria-pressed", "false"))
                        .click(file.clone())
                        .expect(file, Condition::attribute("aria-pressed", "true")),
                    None,
                )
            }
        };

        ScenarioPlan {
            run: run.with_screenshot_dir(&config.screenshot_dir),
            seed: seed.map(|(fixture, entry)| SeededLog {
                fixture,
                entry,
                previous: None,
            }),
        }
    }
}

/// A button inside the in-page confirmation dialog
pub fn dialog_button(label: &str) -> Locator {
    Locator::within(Locator::any_role(DIALOG_ROLE), Locator::role("button", label))
}

/// Clear asks for confirmation; Cancel keeps the log, Continue empties it.
///
/// Works with a native `confirm()` as well as an in-page dialog: the native
/// one never matches the dialog locator, so its `Hidden` checks pass at once.
fn activity_log_run(
    config: &ProbeConfig,
    fixture: &ActivityLogFixture,
    entry: &LogEntry,
) -> VerificationRun {
    let seeded = Locator::text(entry.id.clone());
    let clear = Locator::role("button", CLEAR_LABEL);
    let dialog = Locator::any_role(DIALOG_ROLE);
    let log_file = fixture.path().to_path_buf();

    VerificationRun::new(Scenario::ActivityLog.name(), config.url_for("/"))
        .expect_within(seeded.clone(), Condition::Visible, LOG_POLL_TIMEOUT)
        .expect(clear.clone(), Condition::Enabled)
        // Dismissing keeps the data
        .click(clear.clone())
        .dismiss_dialog(Some(dialog_button(CANCEL_LABEL)))
        .expect(dialog.clone(), Condition::Hidden)
        .expect(seeded.clone(), Condition::Visible)
        .expect_file(log_file.clone(), FileCondition::contains(entry.id.clone()))
        // Confirming removes it
        .click(clear.clone())
        .accept_dialog(Some(dialog_button(CONFIRM_LABEL)))
        .expect(dialog, Condition::Hidden)
        .expect(seeded, Condition::Hidden)
        .expect(clear, Condition::Disabled)
        .expect_file(log_file, FileCondition::lacks(entry.id.clone()))
}

impl std::fmt::Display for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for Scenario {
    type Err = BrowserError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|scenario| scenario.name() == s.to_lowercase())
            .ok_or_else(|| BrowserError::UnknownScenario(s.to_string()))
    }
}

#[derive(Debug)]
struct SeededLog {
    fixture: ActivityLogFixture,
    entry: LogEntry,
    /// File contents before seeding, restored afterwards
    previous: Option<Option<String>>,
}

/// A scenario's run plus the fixture work around it
///
/// [`execute`](Self::execute) wraps a run in its fixture work. Driving the
/// run by hand means calling [`prepare`](Self::prepare) first and
/// [`finish`](Self::finish) with the resulting report.
#[derive(Debug)]
pub struct ScenarioPlan {
    pub run: VerificationRun,
    seed: Option<SeededLog>,
}

impl ScenarioPlan {
    /// The log entry this plan seeds, if any
    pub fn seeded_entry(&self) -> Option<&LogEntry> {
        self.seed.as_ref().map(|seed| &seed.entry)
    }

    /// Seed fixtures the run depends on
    ///
    /// Call [`finish`](Self::finish) even if this fails: a snapshot taken
    /// before a failed seed is still restored.
    pub async fn prepare(&mut self) -> Result<()> {
        if let Some(seed) = self.seed.as_mut() {
            seed.previous = Some(seed.fixture.snapshot().await?);
            seed.fixture.seed(&seed.entry).await?;
        }
        Ok(())
    }

    /// Prepare fixtures, hand the run to `execute` and restore fixtures
    ///
    /// A fixture that cannot be prepared fails this run only; `execute` is
    /// not called.
    pub async fn execute<F, Fut>(mut self, execute: F) -> RunReport
    where
        F: FnOnce(VerificationRun) -> Fut,
        Fut: std::future::Future<Output = RunReport>,
    {
        let report = match self.prepare().await {
            Ok(()) => execute(self.run.clone()).await,
            Err(e) => {
                error!("Verification '{}' failed: {}", self.run.name, e);
                RunReport::not_started(&self.run, format!("Failed to prepare fixtures: {}", e))
            }
        };
        self.finish(report).await
    }

    /// Restore fixture files and return the report
    pub async fn finish(self, report: RunReport) -> RunReport {
        if let Some(SeededLog {
            fixture,
            previous: Some(previous),
            ..
        }) = self.seed
        {
            if fail_open("restore activity log", || fixture.restore(previous))
                .await
                .is_some()
            {
                info!("Restored {}", fixture.path().display());
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use uxprobe_core::{Interaction, RunOutcome, Step};

    #[test]
    fn test_scenario_names_round_trip() {
        for scenario in Scenario::ALL {
            assert_eq!(scenario.name().parse::<Scenario>().unwrap(), scenario);
        }
        assert_eq!("Verify-UX".parse::<Scenario>().unwrap(), Scenario::VerifyUx);
        assert!(matches!(
            "nope".parse::<Scenario>(),
            Err(BrowserError::UnknownScenario(_))
        ));
    }

    #[test]
    fn test_plans_target_configured_app() {
        let mut config = ProbeConfig::default();
        config.base_url = "http://127.0.0.1:3000".to_string();
        config.screenshot_dir = PathBuf::from("shots");

        let plan = Scenario::VerifyUx.plan(&config);
        assert_eq!(plan.run.url, "http://127.0.0.1:3000/verify-ux");
        assert_eq!(plan.run.success_screenshot, Some(PathBuf::from("shots/verify-ux.png")));
        assert_eq!(
            plan.run.failure_screenshot,
            Some(PathBuf::from("shots/verify-ux-error.png"))
        );
        assert!(plan.seeded_entry().is_none());
    }

    #[test]
    fn test_verify_ux_settles_before_screenshot() {
        let plan = Scenario::VerifyUx.plan(&ProbeConfig::default());
        assert_eq!(
            plan.run.steps.last(),
            Some(&Step::Interact(Interaction::Pause { millis: 2000 }))
        );
    }

    #[test]
    fn test_activity_log_plan_looks_for_seeded_id() {
        let plan = Scenario::ActivityLog.plan(&ProbeConfig::default());
        let entry = plan.seeded_entry().unwrap();

        match &plan.run.steps[0] {
            Step::Assert(a) => {
                assert_eq!(a.locator, Locator::text(entry.id.clone()));
                assert_eq!(a.timeout_ms, Some(15_000));
            }
            other => panic!("unexpected first step {:?}", other),
        }

        let clicks = plan
            .run
            .steps
            .iter()
            .filter(|s| matches!(s, Step::Interact(Interaction::Click { .. })))
            .count();
        assert_eq!(clicks, 2);

        // Each Clear click is directly followed by its dialog answer
        let answers: Vec<_> = plan
            .run
            .steps
            .windows(2)
            .filter(|pair| matches!(pair[0], Step::Interact(Interaction::Click { .. })))
            .map(|pair| pair[1].dialog_answer())
            .collect();
        assert_eq!(answers, vec![Some(false), Some(true)]);
    }

    #[test]
    fn test_activity_log_plan_checks_log_file() {
        let mut config = ProbeConfig::default();
        config.app_root = PathBuf::from("/srv/app");
        let plan = Scenario::ActivityLog.plan(&config);
        let id = plan.seeded_entry().unwrap().id.clone();
        let log_file = PathBuf::from("/srv/app/.cache/activity-logs.json");

        let file_checks: Vec<_> = plan
            .run
            .steps
            .iter()
            .filter_map(|s| match s {
                Step::File(a) => Some(a),
                _ => None,
            })
            .collect();
        assert_eq!(file_checks.len(), 2);
        assert_eq!(file_checks[0].path, log_file);
        assert_eq!(file_checks[0].condition, FileCondition::contains(id.clone()));
        assert_eq!(file_checks[1].condition, FileCondition::lacks(id));
        assert_eq!(
            plan.run.steps.last(),
            Some(&Step::File(file_checks[1].clone()))
        );
    }

    #[test]
    fn test_dialog_buttons_are_scoped_to_the_dialog() {
        assert_eq!(
            dialog_button(CANCEL_LABEL).to_string(),
            "role=alertdialog >> role=button[name=\"Cancel\"]"
        );
    }

    #[tokio::test]
    async fn test_unwritable_fixture_fails_only_this_run() {
        let dir = tempfile::TempDir::new().unwrap();
        // A file where the app directory should be makes `.cache` uncreatable
        let app_root = dir.path().join("app");
        std::fs::write(&app_root, "not a directory").unwrap();

        let mut config = ProbeConfig::default();
        config.app_root = app_root.clone();

        let mut started = false;
        let report = Scenario::ActivityLog
            .plan(&config)
            .execute(|run| {
                started = true;
                async move { RunReport::not_started(&run, "started") }
            })
            .await;

        assert!(!started);
        match &report.outcome {
            RunOutcome::Failed { step, reason } => {
                assert_eq!(*step, None);
                assert!(reason.contains("Failed to prepare fixtures"), "{}", reason);
            }
            RunOutcome::Passed => panic!("run should fail"),
        }
        assert_eq!(std::fs::read_to_string(&app_root).unwrap(), "not a directory");
    }

    #[test]
    fn test_file_toggle_clicks_once() {
        let plan = Scenario::FileToggle.plan(&ProbeConfig::default());
        let clicks: Vec<_> = plan
            .run
            .steps
            .iter()
            .filter_map(|s| match s {
                Step::Interact(Interaction::Click { locator }) => Some(locator),
                _ => None,
            })
            .collect();
        assert_eq!(clicks, vec![&Locator::role("button", TOGGLE_FILE_NAME)]);
    }
}
