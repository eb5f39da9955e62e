//! Field validation contract.
//!
//! The contract is a JSON document mapping field names to rule sets:
//!
//! ```json
//! {
//!   "version": "1.0.0",
//!   "fields": {
//!     "sessionId": {
//!       "required": true,
//!       "type": "string",
//!       "pattern": "^\\d{4}-\\d{2}-\\d{2}-.+$",
//!       "minLength": 12,
//!       "message": "Session ID must be format: YYYY-MM-DD-description"
//!     }
//!   }
//! }
//! ```
//!
//! Validation collects every violation across every rule rather than
//! stopping at the first, so one pass reports everything wrong with a
//! session. Rules address the scalar session fields by their JSON names.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use regex::Regex;
use serde::Deserialize;

use crate::config::Config;
use crate::models::Session;
use crate::store;

/// Contract applied when none is supplied. Mirrors the checks the source
/// log was curated against by hand.
pub const DEFAULT_CONTRACT: &str = r#"{
  "version": "1.0.0",
  "fields": {
    "sessionId": {
      "required": true,
      "type": "string",
      "pattern": "^\\d{4}-\\d{2}-\\d{2}-.+$",
      "minLength": 12,
      "message": "Session ID must be format: YYYY-MM-DD-description (e.g., 2025-05-26-feature-work)"
    },
    "timestamp": {
      "required": true,
      "type": "string",
      "pattern": "^\\d{4}-\\d{2}-\\d{2}T\\d{2}:\\d{2}:\\d{2}Z$",
      "message": "Timestamp must be ISO format: YYYY-MM-DDTHH:MM:SSZ (e.g., 2025-05-26T14:30:00Z)"
    },
    "developer": {
      "required": true,
      "type": "string",
      "minLength": 2,
      "message": "Developer name must be at least 2 characters"
    },
    "status": {
      "required": true,
      "type": "string",
      "allowedValues": ["completed", "in_progress", "blocked"],
      "message": "Status must be: completed, in_progress, or blocked"
    },
    "focus": {
      "required": true,
      "type": "string",
      "minLength": 5,
      "message": "Focus description must be at least 5 characters"
    },
    "duration": {
      "required": true,
      "type": "number",
      "min": 1,
      "max": 600,
      "message": "Duration must be a number between 1 and 600 minutes"
    }
  }
}"#;

/// Sessions running longer than this draw a warning, not an error.
const LONG_SESSION_MINUTES: u32 = 300;

#[derive(Debug, Deserialize)]
struct RawContract {
    version: String,
    fields: BTreeMap<String, RawRule>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRule {
    #[serde(default)]
    required: bool,
    #[serde(rename = "type")]
    kind: Option<String>,
    pattern: Option<String>,
    allowed_values: Option<Vec<String>>,
    min_length: Option<usize>,
    min: Option<i64>,
    max: Option<i64>,
    message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    String,
    Number,
}

/// One compiled per-field rule set.
#[derive(Debug)]
pub struct FieldRule {
    pub field: String,
    required: bool,
    kind: Option<FieldKind>,
    pattern: Option<Regex>,
    allowed: Vec<String>,
    min_length: Option<usize>,
    min: Option<i64>,
    max: Option<i64>,
    message: String,
}

/// Compiled validation contract. Rules apply in field-name order.
#[derive(Debug)]
pub struct Contract {
    pub version: String,
    rules: Vec<FieldRule>,
}

/// Outcome of validating one session.
#[derive(Debug)]
pub struct Validation {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Scalar view of a session field, for rule checks.
enum FieldValue<'a> {
    Str(&'a str),
    Num(i64),
}

fn field_value<'a>(session: &'a Session, field: &str) -> Option<FieldValue<'a>> {
    match field {
        "sessionId" => Some(FieldValue::Str(&session.session_id)),
        "timestamp" => Some(FieldValue::Str(&session.timestamp)),
        "developer" => Some(FieldValue::Str(&session.developer)),
        "status" => Some(FieldValue::Str(&session.status)),
        "focus" => Some(FieldValue::Str(&session.focus)),
        "notes" => Some(FieldValue::Str(&session.notes)),
        "duration" => Some(FieldValue::Num(i64::from(session.duration))),
        _ => None,
    }
}

impl Contract {
    /// Load and compile a contract from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read contract file: {}", path.display()))?;
        Self::from_str(&text)
            .with_context(|| format!("Invalid contract file: {}", path.display()))
    }

    pub fn from_str(text: &str) -> Result<Self> {
        let raw: RawContract =
            serde_json::from_str(text).context("Contract is not valid JSON")?;

        let mut rules = Vec::with_capacity(raw.fields.len());
        for (field, rule) in raw.fields {
            let kind = match rule.kind.as_deref() {
                None => None,
                Some("string") => Some(FieldKind::String),
                Some("number") => Some(FieldKind::Number),
                Some(other) => bail!("unsupported field type '{}' for {}", other, field),
            };
            let pattern = match rule.pattern {
                None => None,
                Some(p) => Some(
                    Regex::new(&p)
                        .with_context(|| format!("invalid pattern for {}", field))?,
                ),
            };
            rules.push(FieldRule {
                field,
                required: rule.required,
                kind,
                pattern,
                allowed: rule.allowed_values.unwrap_or_default(),
                min_length: rule.min_length,
                min: rule.min,
                max: rule.max,
                message: rule.message,
            });
        }

        Ok(Self {
            version: raw.version,
            rules,
        })
    }

    /// Check one session against every rule, collecting all violations.
    pub fn validate(&self, session: &Session) -> Validation {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        for rule in &self.rules {
            let value = match field_value(session, &rule.field) {
                Some(v) => v,
                None => {
                    if rule.required {
                        errors.push(format!("{}: {}", rule.field, rule.message));
                    }
                    continue;
                }
            };

            if let FieldValue::Str(s) = value {
                if s.is_empty() {
                    if rule.required {
                        errors.push(format!("{}: {}", rule.field, rule.message));
                    }
                    continue;
                }
            }

            match (rule.kind, &value) {
                (Some(FieldKind::String), FieldValue::Num(_)) => {
                    errors.push(format!("{}: Must be a string. {}", rule.field, rule.message));
                    continue;
                }
                (Some(FieldKind::Number), FieldValue::Str(_)) => {
                    errors.push(format!("{}: Must be a number. {}", rule.field, rule.message));
                    continue;
                }
                _ => {}
            }

            match value {
                FieldValue::Str(s) => {
                    if let Some(pattern) = &rule.pattern {
                        if !pattern.is_match(s) {
                            errors.push(format!("{}: {}", rule.field, rule.message));
                        }
                    }
                    if !rule.allowed.is_empty() && !rule.allowed.iter().any(|a| a == s) {
                        errors.push(format!("{}: {}. Got: {}", rule.field, rule.message, s));
                    }
                    if let Some(min_length) = rule.min_length {
                        let length = s.chars().count();
                        if length < min_length {
                            errors.push(format!(
                                "{}: {}. Current length: {}",
                                rule.field, rule.message, length
                            ));
                        }
                    }
                }
                FieldValue::Num(n) => {
                    if let Some(min) = rule.min {
                        if n < min {
                            errors.push(format!("{}: {}. Got: {}", rule.field, rule.message, n));
                        }
                    }
                    if let Some(max) = rule.max {
                        if n > max {
                            errors.push(format!("{}: {}. Got: {}", rule.field, rule.message, n));
                        }
                    }
                }
            }
        }

        if session.duration > LONG_SESSION_MINUTES {
            warnings.push(format!(
                "duration: {} minutes is unusually long, verify the value",
                session.duration
            ));
        }

        Validation {
            valid: errors.is_empty(),
            errors,
            warnings,
        }
    }
}

/// Validate every session in the store against the contract.
///
/// Returns `Ok(false)` when any session fails, after printing the
/// itemized violations.
pub fn run_validate(config: &Config) -> Result<bool> {
    let contract = Contract::load(&config.paths.contract)?;
    let sessions = store::load_store(&config.paths.store)?;

    println!("validate {}", config.paths.store.display());

    let mut bad = 0usize;
    for session in &sessions {
        let result = contract.validate(session);
        for warning in &result.warnings {
            eprintln!("warning: {}: {}", session.session_id, warning);
        }
        if !result.valid {
            bad += 1;
            println!("  {} failed:", session.session_id);
            for error in &result.errors {
                println!("    - {}", error);
            }
        }
    }

    if bad == 0 {
        println!("  {} sessions valid", sessions.len());
        println!("ok");
        Ok(true)
    } else {
        println!("{} of {} sessions failed validation", bad, sessions.len());
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Complexity, Priority, SessionMetadata};

    fn valid_session() -> Session {
        Session {
            session_id: "2025-05-26-feature-work".to_string(),
            timestamp: "2025-05-26T14:30:00Z".to_string(),
            developer: "priya".to_string(),
            status: "completed".to_string(),
            focus: "Implement the record parser".to_string(),
            achievements: vec!["Added tokenizer".to_string()],
            blockers: Vec::new(),
            next_steps: Vec::new(),
            files_changed: Vec::new(),
            learnings: Vec::new(),
            notes: String::new(),
            duration: 95,
            tags: Vec::new(),
            priority: Priority::Medium,
            complexity: Complexity::Moderate,
            tools_used: Vec::new(),
            related_sessions: Vec::new(),
            metadata: SessionMetadata {
                version: "2.0.0".to_string(),
                tools_used: Vec::new(),
                environment: "development".to_string(),
                codebase_size: 100,
                tests_covered: false,
            },
        }
    }

    fn default_contract() -> Contract {
        Contract::from_str(DEFAULT_CONTRACT).unwrap()
    }

    #[test]
    fn test_default_contract_compiles() {
        let contract = default_contract();
        assert_eq!(contract.version, "1.0.0");
        assert_eq!(contract.rules.len(), 6);
    }

    #[test]
    fn test_valid_session_passes() {
        let result = default_contract().validate(&valid_session());
        assert!(result.valid, "errors: {:?}", result.errors);
        assert!(result.errors.is_empty());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_pattern_violation() {
        let mut session = valid_session();
        session.session_id = "feature-work-without-date".to_string();
        let result = default_contract().validate(&session);
        assert!(!result.valid);
        assert_eq!(
            result.errors,
            vec![
                "sessionId: Session ID must be format: YYYY-MM-DD-description \
                 (e.g., 2025-05-26-feature-work)"
                    .to_string()
            ]
        );
    }

    #[test]
    fn test_allowed_values_reports_offending_value() {
        let mut session = valid_session();
        session.status = "paused".to_string();
        let result = default_contract().validate(&session);
        assert_eq!(
            result.errors,
            vec![
                "status: Status must be: completed, in_progress, or blocked. Got: paused"
                    .to_string()
            ]
        );
    }

    #[test]
    fn test_min_length_reports_current_length() {
        let mut session = valid_session();
        session.focus = "Fix".to_string();
        let result = default_contract().validate(&session);
        assert_eq!(
            result.errors,
            vec![
                "focus: Focus description must be at least 5 characters. Current length: 3"
                    .to_string()
            ]
        );
    }

    #[test]
    fn test_numeric_range_reports_value() {
        let mut session = valid_session();
        session.duration = 900;
        let result = default_contract().validate(&session);
        assert_eq!(
            result.errors,
            vec![
                "duration: Duration must be a number between 1 and 600 minutes. Got: 900"
                    .to_string()
            ]
        );
    }

    #[test]
    fn test_required_empty_string() {
        let mut session = valid_session();
        session.developer = String::new();
        let result = default_contract().validate(&session);
        assert_eq!(
            result.errors,
            vec!["developer: Developer name must be at least 2 characters".to_string()]
        );
    }

    #[test]
    fn test_all_violations_collected() {
        let mut session = valid_session();
        session.session_id = "short".to_string();
        session.status = "paused".to_string();
        session.focus = "Fix".to_string();
        let result = default_contract().validate(&session);
        // short id trips pattern and minLength, plus status and focus
        assert_eq!(result.errors.len(), 4);
    }

    #[test]
    fn test_long_session_warning() {
        let mut session = valid_session();
        session.duration = 480;
        let result = default_contract().validate(&session);
        assert!(result.valid);
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("480"));
    }

    #[test]
    fn test_unknown_required_field_errors() {
        let contract = Contract::from_str(
            r#"{
              "version": "1.0.0",
              "fields": {
                "reviewer": { "required": true, "message": "Reviewer is required" }
              }
            }"#,
        )
        .unwrap();
        let result = contract.validate(&valid_session());
        assert_eq!(result.errors, vec!["reviewer: Reviewer is required".to_string()]);
    }

    #[test]
    fn test_unknown_optional_field_ignored() {
        let contract = Contract::from_str(
            r#"{
              "version": "1.0.0",
              "fields": {
                "reviewer": { "message": "Reviewer should be set" }
              }
            }"#,
        )
        .unwrap();
        assert!(contract.validate(&valid_session()).valid);
    }

    #[test]
    fn test_type_mismatch_from_custom_contract() {
        let contract = Contract::from_str(
            r#"{
              "version": "1.0.0",
              "fields": {
                "duration": { "type": "string", "message": "Duration note" }
              }
            }"#,
        )
        .unwrap();
        let result = contract.validate(&valid_session());
        assert_eq!(
            result.errors,
            vec!["duration: Must be a string. Duration note".to_string()]
        );
    }

    #[test]
    fn test_bad_field_type_rejected() {
        let err = Contract::from_str(
            r#"{
              "version": "1.0.0",
              "fields": {
                "focus": { "type": "boolean", "message": "nope" }
              }
            }"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("unsupported field type"));
    }
}
