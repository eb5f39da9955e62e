//! Raw row to typed session conversion.
//!
//! Maps one tokenized source row onto a [`Session`], applying per-field
//! coercion rules and then deriving the enrichment fields (tags, priority,
//! complexity, tool usage). Conversion is fail-fast per row: the first bad
//! field aborts that row with an error naming the offending column.
//! Enrichment never fails; it runs only after every raw field converted.
//!
//! All inference lookup tables live in one explicit [`InferenceRules`]
//! value handed to the converter, so tests can swap or extend them without
//! touching any ambient state.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use thiserror::Error;

use crate::models::{Complexity, FileChange, Priority, Session, SessionMetadata};

/// Source columns in declared order, with the session field each feeds.
pub const SOURCE_COLUMNS: &[&str] = &[
    "session_id",
    "timestamp",
    "developer",
    "status",
    "focus",
    "achievements",
    "blockers",
    "next_steps",
    "files_changed",
    "learnings",
    "notes",
    "duration_mins",
];

/// Version tag stamped into every converted session's metadata block.
const METADATA_VERSION: &str = "2.0.0";

/// Environment label for records that came through the migration path.
const ENVIRONMENT: &str = "development";

/// Raw values that mean "no blockers", matched case-insensitively as
/// substrings.
const NO_BLOCKER_PHRASES: &[&str] = &["none", "all objectives achieved"];

/// Conversion failure for a single row, naming the offending column.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("missing required column: {0}")]
    MissingColumn(String),
    #[error("invalid duration: '{0}'")]
    InvalidDuration(String),
    #[error("invalid timestamp: '{0}'")]
    InvalidTimestamp(String),
}

/// One keyword set mapping to a label. A label applies when any of its
/// keywords appears as a substring of the (lower-cased) session content.
#[derive(Debug, Clone)]
pub struct KeywordRule {
    pub label: String,
    pub keywords: Vec<String>,
}

impl KeywordRule {
    fn new(label: &str, keywords: &[&str]) -> Self {
        Self {
            label: label.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }

    fn matches(&self, content: &str) -> bool {
        self.keywords.iter().any(|k| content.contains(k.as_str()))
    }
}

/// Priority tier keyed by content keywords; evaluated in order, first
/// match wins, no match falls back to medium.
#[derive(Debug, Clone)]
pub struct PriorityRule {
    pub priority: Priority,
    pub keywords: Vec<String>,
}

/// Complexity tier with its promotion floors. A session promotes into the
/// tier when it exceeds any one floor; tiers are evaluated in order and
/// the first hit wins, no hit falls back to simple.
#[derive(Debug, Clone)]
pub struct ComplexityTier {
    pub complexity: Complexity,
    pub duration_over: u32,
    pub achievements_over: usize,
    pub files_over: usize,
}

/// Codebase-size estimate step: more files changed implies a bigger
/// working set. No step hit falls back to the 100-file baseline.
#[derive(Debug, Clone)]
pub struct SizeStep {
    pub files_over: usize,
    pub estimate: u32,
}

/// Inference lookup tables used to derive the enrichment fields.
#[derive(Debug, Clone)]
pub struct InferenceRules {
    pub tags: Vec<KeywordRule>,
    pub tools: Vec<KeywordRule>,
    pub priorities: Vec<PriorityRule>,
    pub complexity_tiers: Vec<ComplexityTier>,
    pub size_steps: Vec<SizeStep>,
}

impl Default for InferenceRules {
    fn default() -> Self {
        Self {
            tags: vec![
                KeywordRule::new("feature", &["feature", "new", "add", "implement", "create"]),
                KeywordRule::new("bugfix", &["fix", "bug", "error", "resolve", "debug"]),
                KeywordRule::new("refactor", &["refactor", "clean", "improve", "optimize"]),
                KeywordRule::new("documentation", &["doc", "readme", "guide", "documentation"]),
                KeywordRule::new("testing", &["test", "validation", "verify", "coverage"]),
                KeywordRule::new("deployment", &["deploy", "publish", "release", "npm"]),
                KeywordRule::new("analysis", &["analysis", "analyze", "review", "assess"]),
                KeywordRule::new("research", &["research", "investigate", "explore"]),
                KeywordRule::new("optimization", &["performance", "optimize", "speed", "efficiency"]),
                KeywordRule::new("security", &["security", "validation", "auth", "token"]),
                KeywordRule::new("integration", &["integration", "connect", "api", "mcp"]),
                KeywordRule::new("setup", &["setup", "install", "configure", "init"]),
                KeywordRule::new("migration", &["migration", "migrate", "convert"]),
                KeywordRule::new("automation", &["automation", "workflow", "github actions", "ci/cd"]),
            ],
            tools: vec![
                KeywordRule::new("TypeScript", &["typescript", "ts"]),
                KeywordRule::new("JavaScript", &["javascript", "js"]),
                KeywordRule::new("Node.js", &["node", "npm"]),
                KeywordRule::new("React", &["react", "jsx"]),
                KeywordRule::new("Git", &["git", "commit", "push"]),
                KeywordRule::new("GitHub", &["github", "actions"]),
                KeywordRule::new("JSON", &["json"]),
                KeywordRule::new("CSV", &["csv"]),
                KeywordRule::new("HuggingFace", &["huggingface", "hf"]),
                KeywordRule::new("Pinecone", &["pinecone"]),
                KeywordRule::new("MCP", &["mcp", "inspector"]),
                KeywordRule::new("SSE", &["sse", "server-sent"]),
                KeywordRule::new("API", &["api", "endpoint"]),
                KeywordRule::new("Testing", &["test", "jest"]),
            ],
            priorities: vec![
                PriorityRule {
                    priority: Priority::Critical,
                    keywords: str_vec(&["critical", "urgent", "security"]),
                },
                PriorityRule {
                    priority: Priority::High,
                    keywords: str_vec(&["important", "major", "complete"]),
                },
                PriorityRule {
                    priority: Priority::Low,
                    keywords: str_vec(&["minor", "small", "simple"]),
                },
            ],
            complexity_tiers: vec![
                ComplexityTier {
                    complexity: Complexity::Expert,
                    duration_over: 120,
                    achievements_over: 5,
                    files_over: 10,
                },
                ComplexityTier {
                    complexity: Complexity::Complex,
                    duration_over: 90,
                    achievements_over: 3,
                    files_over: 5,
                },
                ComplexityTier {
                    complexity: Complexity::Moderate,
                    duration_over: 60,
                    achievements_over: 2,
                    files_over: 2,
                },
            ],
            size_steps: vec![
                SizeStep { files_over: 10, estimate: 200 },
                SizeStep { files_over: 5, estimate: 150 },
                SizeStep { files_over: 2, estimate: 115 },
            ],
        }
    }
}

fn str_vec(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Converts tokenized rows into typed sessions.
pub struct Converter {
    rules: InferenceRules,
}

impl Converter {
    pub fn new(rules: InferenceRules) -> Self {
        Self { rules }
    }

    /// Convert one row, positionally matched against `columns`.
    ///
    /// Fails fast on the first bad field. The caller is expected to have
    /// checked the row's field count against the header already.
    pub fn convert(&self, row: &[String], columns: &[String]) -> Result<Session, ConvertError> {
        let session_id = field(row, columns, "session_id")?.trim().to_string();
        let timestamp = parse_timestamp(field(row, columns, "timestamp")?)?;
        let developer = field(row, columns, "developer")?.trim().to_string();
        let status = field(row, columns, "status")?.trim().to_string();
        let focus = field(row, columns, "focus")?.trim().to_string();
        let achievements = split_list(field(row, columns, "achievements")?);
        let blockers = parse_blockers(field(row, columns, "blockers")?);
        let next_steps = split_list(field(row, columns, "next_steps")?);
        let files_changed = parse_files_changed(field(row, columns, "files_changed")?);
        let learnings = parse_learnings(field(row, columns, "learnings")?);
        let notes = field(row, columns, "notes")?.trim().to_string();
        let duration = parse_duration(field(row, columns, "duration_mins")?)?;

        // Derived fields operate on the converted values, never the raw row
        let content = format!("{} {} {}", focus, achievements.join(" "), notes).to_lowercase();
        let tags = self.match_labels(&content, &self.rules.tags);
        let priority = self.infer_priority(&content);
        let complexity = self.infer_complexity(duration, achievements.len(), files_changed.len());
        let tools_used = self.match_labels(&content, &self.rules.tools);
        let codebase_size = self.estimate_codebase_size(files_changed.len());
        let tests_covered = has_test_coverage(&focus, &achievements, &files_changed);

        Ok(Session {
            session_id,
            timestamp,
            developer,
            status,
            focus,
            achievements,
            blockers,
            next_steps,
            files_changed,
            learnings,
            notes,
            duration,
            tags,
            priority,
            complexity,
            tools_used: tools_used.clone(),
            related_sessions: Vec::new(),
            metadata: SessionMetadata {
                version: METADATA_VERSION.to_string(),
                tools_used,
                environment: ENVIRONMENT.to_string(),
                codebase_size,
                tests_covered,
            },
        })
    }

    fn match_labels(&self, content: &str, rules: &[KeywordRule]) -> Vec<String> {
        rules
            .iter()
            .filter(|rule| rule.matches(content))
            .map(|rule| rule.label.clone())
            .collect()
    }

    fn infer_priority(&self, content: &str) -> Priority {
        for rule in &self.rules.priorities {
            if rule.keywords.iter().any(|k| content.contains(k.as_str())) {
                return rule.priority;
            }
        }
        Priority::Medium
    }

    fn infer_complexity(&self, duration: u32, achievements: usize, files: usize) -> Complexity {
        for tier in &self.rules.complexity_tiers {
            if duration > tier.duration_over
                || achievements > tier.achievements_over
                || files > tier.files_over
            {
                return tier.complexity;
            }
        }
        Complexity::Simple
    }

    fn estimate_codebase_size(&self, files: usize) -> u32 {
        self.rules
            .size_steps
            .iter()
            .find(|step| files > step.files_over)
            .map(|step| step.estimate)
            .unwrap_or(100)
    }
}

fn field<'a>(
    row: &'a [String],
    columns: &[String],
    name: &str,
) -> Result<&'a str, ConvertError> {
    columns
        .iter()
        .position(|c| c == name)
        .and_then(|i| row.get(i))
        .map(String::as_str)
        .ok_or_else(|| ConvertError::MissingColumn(name.to_string()))
}

/// Split on commas, trim, drop empty entries.
fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect()
}

fn parse_blockers(value: &str) -> Vec<String> {
    let lower = value.to_lowercase();
    if value.trim().is_empty() || NO_BLOCKER_PHRASES.iter().any(|p| lower.contains(p)) {
        return Vec::new();
    }
    split_list(value)
}

fn parse_files_changed(value: &str) -> Vec<FileChange> {
    split_list(value)
        .into_iter()
        .map(|path| FileChange {
            path,
            change_type: "modified".to_string(),
            description: String::new(),
        })
        .collect()
}

/// Segment on sentence terminators, keeping fragments longer than 10
/// characters. A non-empty value with no qualifying fragment falls back
/// to the whole trimmed value.
fn parse_learnings(value: &str) -> Vec<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    let fragments: Vec<String> = trimmed
        .split(|c| matches!(c, '.' | '!' | '?'))
        .map(str::trim)
        .filter(|s| s.chars().count() > 10)
        .map(String::from)
        .collect();

    if fragments.is_empty() {
        vec![trimmed.to_string()]
    } else {
        fragments
    }
}

fn parse_duration(value: &str) -> Result<u32, ConvertError> {
    match value.trim().parse::<i64>() {
        Ok(n) if n > 0 && n <= i64::from(u32::MAX) => Ok(n as u32),
        _ => Err(ConvertError::InvalidDuration(value.to_string())),
    }
}

/// Parse a calendar instant and normalize it to `YYYY-MM-DDTHH:MM:SSZ`.
///
/// Accepted forms: RFC 3339, `YYYY-MM-DD HH:MM:SS` (UTC assumed), and a
/// bare `YYYY-MM-DD` (midnight UTC).
fn parse_timestamp(value: &str) -> Result<String, ConvertError> {
    let v = value.trim();

    let instant: DateTime<Utc> = if let Ok(dt) = DateTime::parse_from_rfc3339(v) {
        dt.with_timezone(&Utc)
    } else if let Ok(naive) = NaiveDateTime::parse_from_str(v, "%Y-%m-%d %H:%M:%S") {
        naive.and_utc()
    } else if let Ok(date) = NaiveDate::parse_from_str(v, "%Y-%m-%d") {
        date.and_hms_opt(0, 0, 0).unwrap().and_utc()
    } else {
        return Err(ConvertError::InvalidTimestamp(value.to_string()));
    };

    Ok(instant.format("%Y-%m-%dT%H:%M:%SZ").to_string())
}

fn has_test_coverage(focus: &str, achievements: &[String], files: &[FileChange]) -> bool {
    let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
    let content = format!("{} {} {}", focus, achievements.join(" "), paths.join(" ")).to_lowercase();
    ["test", "spec", "coverage"].iter().any(|k| content.contains(k))
}
