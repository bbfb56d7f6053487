//! In-page locator resolution
//!
//! Locators are resolved by a small script evaluated in the page. Every call
//! returns a JSON string so the result comes back by value over CDP.

use crate::error::{BrowserError, Result};
use serde::Deserialize;
use serde_json::Value;
use uxprobe_core::{ElementState, Locator};

const DOM_SCRIPT: &str = include_str!("js/dom.js");

/// What the script should do with the first match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomAction {
    Probe,
    Click,
    Fill,
}

impl DomAction {
    fn as_str(&self) -> &'static str {
        match self {
            DomAction::Probe => "probe",
            DomAction::Click => "click",
            DomAction::Fill => "fill",
        }
    }
}

/// Build the expression to evaluate for `action` on `locator`
pub fn expression(locator: &Locator, action: DomAction, value: Option<&str>) -> Result<String> {
    Ok(format!(
        "{}({}, {}, {})",
        DOM_SCRIPT.trim_end(),
        serde_json::to_string(locator)?,
        serde_json::to_string(action.as_str())?,
        serde_json::to_string(&value)?
    ))
}

#[derive(Debug, Deserialize)]
struct ActionOutcome {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

fn unwrap_json(raw: Value) -> Result<Value> {
    match raw {
        Value::String(s) => Ok(serde_json::from_str(&s)?),
        other => Err(BrowserError::Browser(format!(
            "DOM script returned non-string value: {}",
            other
        ))),
    }
}

/// Decode the result of a [`DomAction::Probe`] evaluation
pub fn parse_state(raw: Value) -> Result<ElementState> {
    let value = unwrap_json(raw)?;
    if let Some(error) = value.get("error").and_then(Value::as_str) {
        return Err(BrowserError::Browser(format!("Locator evaluation failed: {}", error)));
    }
    Ok(serde_json::from_value(value)?)
}

/// Decode the result of a click/fill evaluation
pub fn parse_action(locator: &Locator, raw: Value) -> Result<()> {
    let outcome: ActionOutcome = serde_json::from_value(unwrap_json(raw)?)?;
    if outcome.ok {
        Ok(())
    } else {
        Err(BrowserError::Interaction {
            locator: locator.to_string(),
            reason: outcome.error.unwrap_or_else(|| "unknown error".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_expression_embeds_locator_and_action() {
        let expr = expression(&Locator::role("button", "Clear"), DomAction::Click, None).unwrap();

        assert!(expr.starts_with("(function (locator, action, value)"));
        assert!(expr.ends_with(r#"({"by":"role","role":"button","name":"Clear"}, "click", null)"#));
    }

    #[test]
    fn test_expression_nests_scoped_locators() {
        let locator = Locator::within(
            Locator::any_role("alertdialog"),
            Locator::role("button", "Cancel"),
        );
        let expr = expression(&locator, DomAction::Probe, None).unwrap();

        assert!(expr.ends_with(
            r#"({"by":"within","scope":{"by":"role","role":"alertdialog","name":null},"target":{"by":"role","role":"button","name":"Cancel"}}, "probe", null)"#
        ));
    }

    #[test]
    fn test_expression_escapes_values() {
        let expr = expression(
            &Locator::css("input[name=\"q\"]"),
            DomAction::Fill,
            Some("it's \"quoted\""),
        )
        .unwrap();

        assert!(expr.contains(r#"{"by":"css","selector":"input[name=\"q\"]"}"#));
        assert!(expr.contains(r#""it's \"quoted\"""#));
    }

    #[test]
    fn test_parse_found_state() {
        let raw = json!(
            r#"{"found":true,"count":2,"visible":true,"enabled":false,"text":"Clear","attributes":{"type":"button"}}"#
        );
        let state = parse_state(raw).unwrap();

        assert!(state.found);
        assert_eq!(state.count, 2);
        assert!(!state.enabled);
        assert_eq!(state.attributes.get("type").map(String::as_str), Some("button"));
    }

    #[test]
    fn test_parse_absent_state() {
        let state = parse_state(json!(r#"{"found":false,"count":0}"#)).unwrap();
        assert_eq!(state, ElementState::absent());
    }

    #[test]
    fn test_parse_state_reports_script_errors() {
        let err = parse_state(json!(r#"{"ok":false,"error":"SyntaxError: bad selector"}"#))
            .unwrap_err();
        assert!(err.to_string().contains("bad selector"));

        assert!(parse_state(json!(42)).is_err());
    }

    #[test]
    fn test_parse_action_failure_names_locator() {
        let locator = Locator::role("button", "Cancel");
        assert!(parse_action(&locator, json!(r#"{"ok":true}"#)).is_ok());

        let err = parse_action(&locator, json!(r#"{"ok":false,"error":"no element matches"}"#))
            .unwrap_err();
        match err {
            BrowserError::Interaction { locator, reason } => {
                assert_eq!(locator, "role=button[name=\"Cancel\"]");
                assert_eq!(reason, "no element matches");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }
}
