//! Core data models for the session record store.
//!
//! These types represent the typed session records that flow through the
//! migration pipeline and land in the persisted JSON store.

use serde::{Deserialize, Serialize};

/// One changed file within a session.
///
/// The tabular source only carries paths, so `change_type` defaults to
/// `"modified"` and `description` stays empty at conversion time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileChange {
    pub path: String,
    pub change_type: String,
    pub description: String,
}

/// Derived priority tier, inferred from session content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Critical => "critical",
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

/// Derived complexity tier, inferred from duration and scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Simple,
    Moderate,
    Complex,
    Expert,
}

impl Complexity {
    /// Ordinal used for averaging and trend math.
    pub fn score(&self) -> u32 {
        match self {
            Complexity::Simple => 1,
            Complexity::Moderate => 2,
            Complexity::Complex => 3,
            Complexity::Expert => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Complexity::Simple => "simple",
            Complexity::Moderate => "moderate",
            Complexity::Complex => "complex",
            Complexity::Expert => "expert",
        }
    }
}

/// Fixed-shape enrichment block attached to every session at conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMetadata {
    pub version: String,
    pub tools_used: Vec<String>,
    pub environment: String,
    pub codebase_size: u32,
    pub tests_covered: bool,
}

/// One typed, validated development-activity record (the persisted unit).
///
/// `status` stays a plain string on purpose: enumerated membership is a
/// business rule the structural contract checks, so a record can convert
/// and still fail the validation gate. The derived fields (`tags`,
/// `priority`, `complexity`, `tools_used`) are computed during conversion
/// and never edited by the source row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub session_id: String,
    pub timestamp: String,
    pub developer: String,
    pub status: String,
    pub focus: String,
    pub achievements: Vec<String>,
    pub blockers: Vec<String>,
    pub next_steps: Vec<String>,
    pub files_changed: Vec<FileChange>,
    pub learnings: Vec<String>,
    pub notes: String,
    pub duration: u32,
    pub tags: Vec<String>,
    pub priority: Priority,
    pub complexity: Complexity,
    pub tools_used: Vec<String>,
    pub related_sessions: Vec<String>,
    pub metadata: SessionMetadata,
}
