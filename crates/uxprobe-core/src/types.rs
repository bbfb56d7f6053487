//! Core type definitions for page verification runs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// A query used to find a DOM element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "by", rename_all = "snake_case")]
pub enum Locator {
    /// CSS selector, first match wins
    Css { selector: String },
    /// ARIA role (explicit or implicit) with an optional accessible-name filter.
    /// Name matching is case-insensitive substring matching.
    Role { role: String, name: Option<String> },
    /// Innermost element whose text contains the given substring
    Text { text: String },
    /// Element carrying an attribute with an exact value
    Attribute { name: String, value: String },
    /// `target` searched only inside the first element matching `scope`
    Within {
        scope: Box<Locator>,
        target: Box<Locator>,
    },
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css {
            selector: selector.into(),
        }
    }

    pub fn role(role: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Role {
            role: role.into(),
            name: Some(name.into()),
        }
    }

    pub fn any_role(role: impl Into<String>) -> Self {
        Self::Role {
            role: role.into(),
            name: None,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn attribute(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Attribute {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn within(scope: Locator, target: Locator) -> Self {
        Self::Within {
            scope: Box::new(scope),
            target: Box::new(target),
        }
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Css { selector } => write!(f, "css={}", selector),
            Self::Role {
                role,
                name: Some(name),
            } => write!(f, "role={}[name=\"{}\"]", role, name),
            Self::Role { role, name: None } => write!(f, "role={}", role),
            Self::Text { text } => write!(f, "text=\"{}\"", text),
            Self::Attribute { name, value } => write!(f, "[{}=\"{}\"]", name, value),
            Self::Within { scope, target } => write!(f, "{} >> {}", scope, target),
        }
    }
}

/// Snapshot of the first element matching a locator
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementState {
    /// At least one element matched
    pub found: bool,
    /// Number of matching elements
    pub count: usize,
    /// Rendered with a non-empty box and not hidden by style
    pub visible: bool,
    /// Not disabled (native `disabled` or `aria-disabled="true"`)
    pub enabled: bool,
    /// Trimmed text content
    pub text: String,
    /// All attributes of the element
    pub attributes: BTreeMap<String, String>,
}

impl ElementState {
    /// State for a locator with no matches
    pub fn absent() -> Self {
        Self::default()
    }

    /// Short human-readable description used in failure messages
    pub fn summary(&self) -> String {
        if !self.found {
            return "not found".to_string();
        }

        let mut text = self.text.clone();
        if text.chars().count() > 60 {
            text = text.chars().take(57).collect::<String>() + "...";
        }

        format!(
            "{} match(es), {}, {}, text \"{}\"",
            self.count,
            if self.visible { "visible" } else { "not visible" },
            if self.enabled { "enabled" } else { "disabled" },
            text
        )
    }
}

/// Expected state of a located element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Condition {
    Visible,
    /// Absent from the DOM or not rendered
    Hidden,
    Enabled,
    Disabled,
    AttributeEquals { name: String, value: String },
    ContainsText { text: String },
}

impl Condition {
    pub fn attribute(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::AttributeEquals {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn contains_text(text: impl Into<String>) -> Self {
        Self::ContainsText { text: text.into() }
    }

    /// Evaluate this condition against an element snapshot
    pub fn is_satisfied(&self, state: &ElementState) -> bool {
        match self {
            Self::Visible => state.found && state.visible,
            Self::Hidden => !state.found || !state.visible,
            Self::Enabled => state.found && state.enabled,
            Self::Disabled => state.found && !state.enabled,
            Self::AttributeEquals { name, value } => {
                state.found && state.attributes.get(name) == Some(value)
            }
            Self::ContainsText { text } => state.found && state.text.contains(text.as_str()),
        }
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Visible => write!(f, "visible"),
            Self::Hidden => write!(f, "hidden"),
            Self::Enabled => write!(f, "enabled"),
            Self::Disabled => write!(f, "disabled"),
            Self::AttributeEquals { name, value } => write!(f, "{}=\"{}\"", name, value),
            Self::ContainsText { text } => write!(f, "containing \"{}\"", text),
        }
    }
}

/// A bounded-wait assertion on one element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionStep {
    pub locator: Locator,
    pub condition: Condition,
    /// Per-step timeout; falls back to the configured default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

impl AssertionStep {
    pub fn new(locator: Locator, condition: Condition) -> Self {
        Self {
            locator,
            condition,
            timeout_ms: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    pub fn timeout(&self, default: Duration) -> Duration {
        self.timeout_ms.map(Duration::from_millis).unwrap_or(default)
    }
}

/// A side-effecting step against the page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Interaction {
    Click { locator: Locator },
    Fill { locator: Locator, value: String },
    /// Fixed settle time, e.g. to let client-side rendering finish
    Pause { millis: u64 },
    /// Press OK on the dialog opened by the preceding click.
    ///
    /// A native `alert`/`confirm`/`prompt` is answered directly; otherwise
    /// `button` (the in-page dialog's OK control) is clicked.
    AcceptDialog {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        button: Option<Locator>,
    },
    /// Cancel the dialog opened by the preceding click, see [`Interaction::AcceptDialog`]
    DismissDialog {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        button: Option<Locator>,
    },
}

impl Interaction {
    /// Target element, if the interaction has one
    pub fn locator(&self) -> Option<&Locator> {
        match self {
            Self::Click { locator } | Self::Fill { locator, .. } => Some(locator),
            Self::AcceptDialog { button } | Self::DismissDialog { button } => button.as_ref(),
            Self::Pause { .. } => None,
        }
    }

    /// `Some(accept)` for dialog answers
    pub fn dialog_answer(&self) -> Option<bool> {
        match self {
            Self::AcceptDialog { .. } => Some(true),
            Self::DismissDialog { .. } => Some(false),
            _ => None,
        }
    }
}

/// Expected content of a file written by the application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FileCondition {
    Contains { text: String },
    /// Missing files lack everything
    Lacks { text: String },
}

impl FileCondition {
    pub fn contains(text: impl Into<String>) -> Self {
        Self::Contains { text: text.into() }
    }

    pub fn lacks(text: impl Into<String>) -> Self {
        Self::Lacks { text: text.into() }
    }

    /// Evaluate against file contents, `None` for a missing file
    pub fn is_satisfied(&self, content: Option<&str>) -> bool {
        match self {
            Self::Contains { text } => content.is_some_and(|c| c.contains(text.as_str())),
            Self::Lacks { text } => !content.is_some_and(|c| c.contains(text.as_str())),
        }
    }
}

impl std::fmt::Display for FileCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Contains { text } => write!(f, "containing \"{}\"", text),
            Self::Lacks { text } => write!(f, "without \"{}\"", text),
        }
    }
}

/// A bounded-wait assertion on a file the application persists its data to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAssertion {
    pub path: PathBuf,
    pub condition: FileCondition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

impl FileAssertion {
    pub fn new(path: impl Into<PathBuf>, condition: FileCondition) -> Self {
        Self {
            path: path.into(),
            condition,
            timeout_ms: None,
        }
    }

    pub fn timeout(&self, default: Duration) -> Duration {
        self.timeout_ms.map(Duration::from_millis).unwrap_or(default)
    }
}

/// One entry in a run's ordered step list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Assert(AssertionStep),
    Interact(Interaction),
    File(FileAssertion),
}

impl Step {
    pub fn describe(&self) -> String {
        match self {
            Step::Assert(a) => format!("expect {} to be {}", a.locator, a.condition),
            Step::Interact(Interaction::Click { locator }) => format!("click {}", locator),
            Step::Interact(Interaction::Fill { locator, value }) => {
                format!("fill {} with \"{}\"", locator, value)
            }
            Step::Interact(Interaction::Pause { millis }) => format!("pause {}ms", millis),
            Step::Interact(Interaction::AcceptDialog { .. }) => "accept dialog".to_string(),
            Step::Interact(Interaction::DismissDialog { .. }) => "dismiss dialog".to_string(),
            Step::File(a) => format!("expect {} to be {}", a.path.display(), a.condition),
        }
    }

    /// `Some(accept)` if this step answers a dialog
    pub fn dialog_answer(&self) -> Option<bool> {
        match self {
            Step::Interact(interaction) => interaction.dialog_answer(),
            _ => None,
        }
    }
}

/// A single verification of one page
///
/// Constructed per invocation, executed once, then discarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationRun {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub steps: Vec<Step>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_screenshot: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_screenshot: Option<PathBuf>,
}

impl VerificationRun {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            steps: Vec::new(),
            success_screenshot: None,
            failure_screenshot: None,
        }
    }

    /// Append an assertion using the default timeout
    pub fn expect(mut self, locator: Locator, condition: Condition) -> Self {
        self.steps
            .push(Step::Assert(AssertionStep::new(locator, condition)));
        self
    }

    /// Append an assertion with an explicit timeout
    pub fn expect_within(mut self, locator: Locator, condition: Condition, timeout: Duration) -> Self {
        self.steps.push(Step::Assert(
            AssertionStep::new(locator, condition).with_timeout(timeout),
        ));
        self
    }

    pub fn click(mut self, locator: Locator) -> Self {
        self.steps.push(Step::Interact(Interaction::Click { locator }));
        self
    }

    pub fn fill(mut self, locator: Locator, value: impl Into<String>) -> Self {
        self.steps.push(Step::Interact(Interaction::Fill {
            locator,
            value: value.into(),
        }));
        self
    }

    pub fn pause(mut self, duration: Duration) -> Self {
        self.steps.push(Step::Interact(Interaction::Pause {
            millis: duration.as_millis() as u64,
        }));
        self
    }

    pub fn accept_dialog(mut self, button: Option<Locator>) -> Self {
        self.steps
            .push(Step::Interact(Interaction::AcceptDialog { button }));
        self
    }

    pub fn dismiss_dialog(mut self, button: Option<Locator>) -> Self {
        self.steps
            .push(Step::Interact(Interaction::DismissDialog { button }));
        self
    }

    /// Append a check on a file the application writes
    pub fn expect_file(mut self, path: impl Into<PathBuf>, condition: FileCondition) -> Self {
        self.steps.push(Step::File(FileAssertion::new(path, condition)));
        self
    }

    /// Set `<dir>/<name>.png` and `<dir>/<name>-error.png` unless already set
    pub fn with_screenshot_dir(mut self, dir: &Path) -> Self {
        if self.success_screenshot.is_none() {
            self.success_screenshot = Some(dir.join(format!("{}.png", self.name)));
        }
        if self.failure_screenshot.is_none() {
            self.failure_screenshot = Some(dir.join(format!("{}-error.png", self.name)));
        }
        self
    }
}

/// Metadata for a screenshot written to disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Screenshot {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub captured_at: DateTime<Utc>,
}

/// Final outcome of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    Passed,
    Failed {
        /// Zero-based index of the failing step, `None` if the run failed before any step
        step: Option<usize>,
        reason: String,
    },
}

/// What happened during a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub name: String,
    pub url: String,
    pub outcome: RunOutcome,
    pub steps_completed: usize,
    pub steps_total: usize,
    pub screenshot: Option<Screenshot>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    /// Report for a run that failed before its page was opened
    pub fn not_started(run: &VerificationRun, reason: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            name: run.name.clone(),
            url: run.url.clone(),
            outcome: RunOutcome::Failed {
                step: None,
                reason: reason.into(),
            },
            steps_completed: 0,
            steps_total: run.steps.len(),
            screenshot: None,
            started_at: now,
            finished_at: now,
        }
    }

    pub fn passed(&self) -> bool {
        matches!(self.outcome, RunOutcome::Passed)
    }

    pub fn failure_reason(&self) -> Option<&str> {
        match &self.outcome {
            RunOutcome::Passed => None,
            RunOutcome::Failed { reason, .. } => Some(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn found(text: &str) -> ElementState {
        ElementState {
            found: true,
            count: 1,
            visible: true,
            enabled: true,
            text: text.to_string(),
            attributes: BTreeMap::new(),
        }
    }

    #[test]
    fn test_visibility_conditions() {
        let absent = ElementState::absent();
        assert!(!Condition::Visible.is_satisfied(&absent));
        assert!(Condition::Hidden.is_satisfied(&absent));

        let mut el = found("Clear");
        assert!(Condition::Visible.is_satisfied(&el));
        assert!(!Condition::Hidden.is_satisfied(&el));

        el.visible = false;
        assert!(Condition::Hidden.is_satisfied(&el));
    }

    #[test]
    fn test_enabled_conditions_require_element() {
        let absent = ElementState::absent();
        assert!(!Condition::Enabled.is_satisfied(&absent));
        assert!(!Condition::Disabled.is_satisfied(&absent));

        let mut el = found("Clear");
        assert!(Condition::Enabled.is_satisfied(&el));
        el.enabled = false;
        assert!(Condition::Disabled.is_satisfied(&el));
    }

    #[test]
    fn test_attribute_condition() {
        let mut el = found("test-file-1.csv");
        el.attributes.insert("type".to_string(), "button".to_string());
        el.attributes
            .insert("aria-pressed".to_string(), "false".to_string());

        assert!(Condition::attribute("type", "button").is_satisfied(&el));
        assert!(Condition::attribute("aria-pressed", "false").is_satisfied(&el));
        assert!(!Condition::attribute("aria-pressed", "true").is_satisfied(&el));
        assert!(!Condition::attribute("data-missing", "x").is_satisfied(&el));
    }

    #[test]
    fn test_contains_text() {
        let el = found("Seeded entry 1234-abcd");
        assert!(Condition::contains_text("1234-abcd").is_satisfied(&el));
        assert!(!Condition::contains_text("zzz").is_satisfied(&el));
    }

    #[test]
    fn test_locator_display() {
        assert_eq!(
            Locator::role("button", "Clear").to_string(),
            "role=button[name=\"Clear\"]"
        );
        assert_eq!(Locator::any_role("alertdialog").to_string(), "role=alertdialog");
        assert_eq!(Locator::css("#main").to_string(), "css=#main");
        assert_eq!(
            Locator::attribute("aria-pressed", "true").to_string(),
            "[aria-pressed=\"true\"]"
        );
        assert_eq!(
            Locator::within(Locator::any_role("alertdialog"), Locator::role("button", "Cancel"))
                .to_string(),
            "role=alertdialog >> role=button[name=\"Cancel\"]"
        );
    }

    #[test]
    fn test_file_conditions() {
        let content = r#"[{"id":"abc-123"}]"#;
        assert!(FileCondition::contains("abc-123").is_satisfied(Some(content)));
        assert!(!FileCondition::lacks("abc-123").is_satisfied(Some(content)));

        assert!(FileCondition::lacks("abc-123").is_satisfied(Some("[]")));
        assert!(FileCondition::lacks("abc-123").is_satisfied(None));
        assert!(!FileCondition::contains("abc-123").is_satisfied(None));
    }

    #[test]
    fn test_dialog_steps() {
        let cancel = Locator::role("button", "Cancel");
        let run = VerificationRun::new("dialog", "http://localhost:9002/")
            .click(Locator::role("button", "Clear"))
            .dismiss_dialog(Some(cancel.clone()))
            .accept_dialog(None);

        assert_eq!(run.steps[0].dialog_answer(), None);
        assert_eq!(run.steps[1].dialog_answer(), Some(false));
        assert_eq!(run.steps[2].dialog_answer(), Some(true));
        assert_eq!(run.steps[1].describe(), "dismiss dialog");
        match &run.steps[1] {
            Step::Interact(interaction) => assert_eq!(interaction.locator(), Some(&cancel)),
            other => panic!("unexpected step {:?}", other),
        }
    }

    #[test]
    fn test_not_started_report() {
        let run = VerificationRun::new("activity-log", "http://localhost:9002/")
            .expect(Locator::css("body"), Condition::Visible);
        let report = RunReport::not_started(&run, "Fixture error: read-only");

        assert!(!report.passed());
        assert_eq!(report.steps_total, 1);
        assert_eq!(report.steps_completed, 0);
        assert_eq!(
            report.outcome,
            RunOutcome::Failed {
                step: None,
                reason: "Fixture error: read-only".to_string()
            }
        );
    }

    #[test]
    fn test_summary_truncates_long_text() {
        let el = found(&"x".repeat(100));
        let summary = el.summary();
        assert!(summary.ends_with("...\""));
        assert_eq!(ElementState::absent().summary(), "not found");
    }

    #[test]
    fn test_run_builder_orders_steps() {
        let run = VerificationRun::new("file-toggle", "http://localhost:9002/")
            .expect(Locator::role("button", "test-file-1.csv"), Condition::Visible)
            .click(Locator::role("button", "test-file-1.csv"))
            .expect_within(
                Locator::role("button", "test-file-1.csv"),
                Condition::attribute("aria-pressed", "true"),
                Duration::from_secs(2),
            );

        assert_eq!(run.steps.len(), 3);
        assert!(matches!(run.steps[0], Step::Assert(_)));
        assert!(matches!(run.steps[1], Step::Interact(Interaction::Click { .. })));
        match &run.steps[2] {
            Step::Assert(a) => {
                assert_eq!(a.timeout(Duration::from_secs(5)), Duration::from_secs(2))
            }
            other => panic!("unexpected step {:?}", other),
        }
    }

    #[test]
    fn test_screenshot_dir_does_not_override_explicit_paths() {
        let mut run = VerificationRun::new("verify-ux", "http://localhost:9002/verify-ux");
        run.success_screenshot = Some(PathBuf::from("/tmp/custom.png"));
        let run = run.with_screenshot_dir(Path::new("shots"));

        assert_eq!(run.success_screenshot, Some(PathBuf::from("/tmp/custom.png")));
        assert_eq!(
            run.failure_screenshot,
            Some(PathBuf::from("shots/verify-ux-error.png"))
        );
    }

    #[test]
    fn test_run_deserializes_from_toml() {
        let plan = r#"
            name = "image-card"
            url = "http://localhost:9002/verify-ux"

            [[steps]]
            assert = { locator = { by = "role", role = "checkbox", name = "Select image 123" }, condition = { state = "visible" }, timeout_ms = 10000 }

            [[steps]]
            interact = { action = "pause", millis = 250 }

            [[steps]]
            interact = { action = "dismiss_dialog", button = { by = "within", scope = { by = "role", role = "alertdialog" }, target = { by = "role", role = "button", name = "Cancel" } } }

            [[steps]]
            file = { path = ".cache/activity-logs.json", condition = { state = "lacks", text = "abc" } }
        "#;

        let run: VerificationRun = toml::from_str(plan).unwrap();
        assert_eq!(run.name, "image-card");
        assert_eq!(run.steps.len(), 4);
        match &run.steps[0] {
            Step::Assert(a) => {
                assert_eq!(a.locator, Locator::role("checkbox", "Select image 123"));
                assert_eq!(a.condition, Condition::Visible);
                assert_eq!(a.timeout_ms, Some(10_000));
            }
            other => panic!("unexpected step {:?}", other),
        }
        assert_eq!(
            run.steps[1],
            Step::Interact(Interaction::Pause { millis: 250 })
        );
        assert_eq!(
            run.steps[2],
            Step::Interact(Interaction::DismissDialog {
                button: Some(Locator::within(
                    Locator::any_role("alertdialog"),
                    Locator::role("button", "Cancel")
                )),
            })
        );
        assert_eq!(
            run.steps[3],
            Step::File(FileAssertion::new(
                ".cache/activity-logs.json",
                FileCondition::lacks("abc")
            ))
        );
    }
}
