//! Analytics over the session store.
//!
//! Everything here is a pure recomputation over the full session list;
//! no intermediate state is persisted between runs. Determinism rules:
//! calendar bucketing is UTC, frequency tables are `BTreeMap`s so the
//! serialized report is stable, and "most frequent" ties break toward
//! the smallest key.
//!
//! Sessions whose timestamp no longer parses (hand-edited stores) are
//! skipped by the time-derived metrics rather than failing the run.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Timelike, Utc};
use serde::Serialize;

use crate::config::Config;
use crate::models::{Complexity, Session};
use crate::store;

/// Version stamp for the report schema.
const DATA_VERSION: &str = "2.0.0";

const STOP_WORDS: &[&str] = &[
    "the", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by", "from", "a",
    "an",
];

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport {
    pub metadata: ReportMetadata,
    pub productivity: ProductivityMetrics,
    pub time_analysis: TimeAnalysis,
    pub technology_stack: TechnologyStack,
    pub complexity_evolution: ComplexityEvolution,
    pub focus_areas: FocusAreas,
    pub blockers_analysis: BlockersAnalysis,
    pub file_change_patterns: FileChangePatterns,
    pub predictive_insights: PredictiveInsights,
    pub recommendations: Vec<Recommendation>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetadata {
    pub total_sessions: usize,
    pub date_range: Option<DateRange>,
    pub generated_at: String,
    pub data_version: String,
}

#[derive(Debug, Serialize)]
pub struct DateRange {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductivityMetrics {
    /// Total minutes over 60, rounded to a whole hour.
    pub total_hours: i64,
    pub total_achievements: usize,
    pub total_blockers: usize,
    /// Minutes, rounded.
    pub average_session_duration: i64,
    pub productivity_score: f64,
    pub efficiency_score: f64,
    pub blocker_rate: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeAnalysis {
    pub sessions_by_date: BTreeMap<String, usize>,
    pub sessions_by_hour: BTreeMap<u32, usize>,
    pub sessions_by_weekday: BTreeMap<String, usize>,
    pub most_productive_hour: Option<u32>,
    pub most_productive_day: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnologyStack {
    pub tools_usage: BTreeMap<String, usize>,
    pub tags_frequency: BTreeMap<String, usize>,
    pub average_complexity_by_tag: BTreeMap<String, f64>,
    pub most_used_tool: Option<String>,
    pub most_common_tag: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplexityEvolution {
    pub complexity_over_time: Vec<ComplexityPoint>,
    pub monthly_averages: BTreeMap<String, f64>,
    pub trend: Trend,
}

#[derive(Debug, Serialize)]
pub struct ComplexityPoint {
    pub date: String,
    pub complexity: Complexity,
    pub score: u32,
    pub duration: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusAreas {
    pub areas: BTreeMap<String, usize>,
    pub top_areas: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockersAnalysis {
    pub total_blockers: usize,
    pub average_per_session: f64,
    pub blocker_types: BTreeMap<String, usize>,
    /// Whole percent of sessions that hit a blocker and still completed.
    pub resolution_rate: u32,
    pub blocker_free_sessions: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileChangePatterns {
    pub file_types: BTreeMap<String, usize>,
    pub directories: BTreeMap<String, usize>,
    pub change_types: BTreeMap<String, usize>,
    pub most_changed_file_type: Option<String>,
    pub most_changed_directory: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictiveInsights {
    pub complexity_trend: Trend,
    pub duration_trend: Trend,
    pub predicted_next_complexity: f64,
    pub predicted_next_duration: f64,
    pub risk: Risk,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Risk {
    Low,
    Medium,
    High,
}

#[derive(Debug, Serialize)]
pub struct Recommendation {
    #[serde(rename = "type")]
    pub kind: String,
    pub priority: String,
    pub title: String,
    pub description: String,
    pub metric: String,
}

/// Compute the full report. `window` bounds the most-recent-session slice
/// used for prediction and risk.
pub fn compute(sessions: &[Session], window: usize) -> AnalyticsReport {
    if sessions.is_empty() {
        return empty_report();
    }

    let productivity = productivity_metrics(sessions);
    let blockers = blockers_for(sessions);
    let evolution = complexity_evolution(sessions);
    let recommendations = recommendations_for(&productivity, &blockers, &evolution);

    AnalyticsReport {
        metadata: metadata(sessions),
        productivity,
        time_analysis: time_analysis(sessions),
        technology_stack: technology_stack(sessions),
        complexity_evolution: evolution,
        focus_areas: focus_areas(sessions),
        blockers_analysis: blockers,
        file_change_patterns: file_change_patterns(sessions),
        predictive_insights: predictive_insights(sessions, window),
        recommendations,
    }
}

/// Compute the report for the configured store and write it out, or dump
/// it on stdout with `to_stdout`.
pub fn run_analyze(config: &Config, to_stdout: bool) -> Result<()> {
    let sessions = store::load_store(&config.paths.store)?;
    let report = compute(&sessions, config.analytics.recent_window);
    let json =
        serde_json::to_string_pretty(&report).context("Failed to serialize analytics report")?;

    if to_stdout {
        println!("{}", json);
    } else {
        let path = &config.paths.analytics_report;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create analytics directory: {}", parent.display())
                })?;
            }
        }
        fs::write(path, json)
            .with_context(|| format!("Failed to write analytics report: {}", path.display()))?;
        eprintln!(
            "Wrote analytics for {} sessions to {}",
            sessions.len(),
            path.display()
        );
    }
    Ok(())
}

fn metadata(sessions: &[Session]) -> ReportMetadata {
    let mut range: Option<(DateTime<Utc>, &str, DateTime<Utc>, &str)> = None;
    for session in sessions {
        if let Some(instant) = parse_instant(&session.timestamp) {
            let ts = session.timestamp.as_str();
            range = Some(match range {
                None => (instant, ts, instant, ts),
                Some((min_i, min_s, max_i, max_s)) => {
                    let (min_i, min_s) = if instant < min_i { (instant, ts) } else { (min_i, min_s) };
                    let (max_i, max_s) = if instant > max_i { (instant, ts) } else { (max_i, max_s) };
                    (min_i, min_s, max_i, max_s)
                }
            });
        }
    }

    ReportMetadata {
        total_sessions: sessions.len(),
        date_range: range.map(|(_, start, _, end)| DateRange {
            start: start.to_string(),
            end: end.to_string(),
        }),
        generated_at: Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        data_version: DATA_VERSION.to_string(),
    }
}

fn productivity_metrics(sessions: &[Session]) -> ProductivityMetrics {
    let total_duration: u64 = sessions.iter().map(|s| u64::from(s.duration)).sum();
    let total_achievements: usize = sessions.iter().map(|s| s.achievements.len()).sum();
    let total_blockers: usize = sessions.iter().map(|s| s.blockers.len()).sum();

    let hours = total_duration as f64 / 60.0;
    ProductivityMetrics {
        total_hours: hours.round() as i64,
        total_achievements,
        total_blockers,
        average_session_duration: (total_duration as f64 / sessions.len() as f64).round() as i64,
        productivity_score: round1(total_achievements as f64 / (total_blockers as f64 + 1.0)),
        efficiency_score: round1(total_achievements as f64 / hours),
        blocker_rate: round2(total_blockers as f64 / sessions.len() as f64),
    }
}

fn time_analysis(sessions: &[Session]) -> TimeAnalysis {
    let mut by_date: BTreeMap<String, usize> = BTreeMap::new();
    let mut by_hour: BTreeMap<u32, usize> = BTreeMap::new();
    let mut by_weekday: BTreeMap<String, usize> = BTreeMap::new();

    for session in sessions {
        let instant = match parse_instant(&session.timestamp) {
            Some(i) => i,
            None => continue,
        };
        *by_date
            .entry(instant.format("%Y-%m-%d").to_string())
            .or_insert(0) += 1;
        *by_hour.entry(instant.hour()).or_insert(0) += 1;
        *by_weekday
            .entry(instant.format("%A").to_string())
            .or_insert(0) += 1;
    }

    TimeAnalysis {
        most_productive_hour: most_frequent(&by_hour),
        most_productive_day: most_frequent(&by_weekday),
        sessions_by_date: by_date,
        sessions_by_hour: by_hour,
        sessions_by_weekday: by_weekday,
    }
}

fn technology_stack(sessions: &[Session]) -> TechnologyStack {
    let mut tools_usage: BTreeMap<String, usize> = BTreeMap::new();
    let mut tags_frequency: BTreeMap<String, usize> = BTreeMap::new();
    let mut scores_by_tag: BTreeMap<String, Vec<u32>> = BTreeMap::new();

    for session in sessions {
        for tool in &session.tools_used {
            *tools_usage.entry(tool.clone()).or_insert(0) += 1;
        }
        for tag in &session.tags {
            *tags_frequency.entry(tag.clone()).or_insert(0) += 1;
            scores_by_tag
                .entry(tag.clone())
                .or_default()
                .push(session.complexity.score());
        }
    }

    let average_complexity_by_tag: BTreeMap<String, f64> = scores_by_tag
        .into_iter()
        .map(|(tag, scores)| {
            let mean = scores.iter().sum::<u32>() as f64 / scores.len() as f64;
            (tag, round1(mean))
        })
        .collect();

    TechnologyStack {
        most_used_tool: most_frequent(&tools_usage),
        most_common_tag: most_frequent(&tags_frequency),
        tools_usage,
        tags_frequency,
        average_complexity_by_tag,
    }
}

fn complexity_evolution(sessions: &[Session]) -> ComplexityEvolution {
    let mut points = Vec::with_capacity(sessions.len());
    let mut monthly: BTreeMap<String, Vec<u32>> = BTreeMap::new();

    for session in sessions {
        let date: String = session
            .timestamp
            .split('T')
            .next()
            .unwrap_or("")
            .to_string();
        let score = session.complexity.score();
        points.push(ComplexityPoint {
            date: date.clone(),
            complexity: session.complexity,
            score,
            duration: session.duration,
        });
        let month: String = date.chars().take(7).collect();
        monthly.entry(month).or_default().push(score);
    }

    let monthly_averages: BTreeMap<String, f64> = monthly
        .into_iter()
        .map(|(month, scores)| {
            let mean = scores.iter().sum::<u32>() as f64 / scores.len() as f64;
            (month, round1(mean))
        })
        .collect();

    let series: Vec<f64> = monthly_averages.values().copied().collect();
    ComplexityEvolution {
        trend: calculate_trend(&series),
        complexity_over_time: points,
        monthly_averages,
    }
}

fn focus_areas(sessions: &[Session]) -> FocusAreas {
    let mut areas: BTreeMap<String, usize> = BTreeMap::new();
    for session in sessions {
        for keyword in focus_keywords(&session.focus) {
            *areas.entry(keyword).or_insert(0) += 1;
        }
    }
    let top_areas = top_keys(&areas, 10);
    FocusAreas { areas, top_areas }
}

/// Lower-cased whitespace tokens over 3 chars that are not stop words,
/// capped at 3 per session.
fn focus_keywords(focus: &str) -> Vec<String> {
    let lower = focus.to_lowercase();
    lower
        .split_whitespace()
        .filter(|w| w.chars().count() > 3 && !STOP_WORDS.contains(w))
        .take(3)
        .map(String::from)
        .collect()
}

fn blockers_for(sessions: &[Session]) -> BlockersAnalysis {
    let total_blockers: usize = sessions.iter().map(|s| s.blockers.len()).sum();
    let mut blocker_types: BTreeMap<String, usize> = BTreeMap::new();
    let mut resolved = 0usize;

    for session in sessions {
        for blocker in &session.blockers {
            *blocker_types
                .entry(classify_blocker(blocker).to_string())
                .or_insert(0) += 1;
        }
        if !session.blockers.is_empty() && session.status == "completed" {
            resolved += 1;
        }
    }

    BlockersAnalysis {
        total_blockers,
        average_per_session: round1(total_blockers as f64 / sessions.len() as f64),
        blocker_types,
        resolution_rate: ((resolved as f64 / sessions.len() as f64) * 100.0).round() as u32,
        blocker_free_sessions: sessions.iter().filter(|s| s.blockers.is_empty()).count(),
    }
}

fn classify_blocker(blocker: &str) -> &'static str {
    const PATTERNS: &[(&str, &[&str])] = &[
        ("api", &["api", "endpoint", "request", "response"]),
        ("build", &["build", "compile", "webpack", "typescript"]),
        ("testing", &["test", "jest", "coverage", "validation"]),
        ("integration", &["integration", "mcp", "github", "actions"]),
        ("infrastructure", &["server", "deployment", "npm", "package"]),
    ];

    let lower = blocker.to_lowercase();
    for (label, keywords) in PATTERNS {
        if keywords.iter().any(|k| lower.contains(k)) {
            return label;
        }
    }
    "other"
}

fn file_change_patterns(sessions: &[Session]) -> FileChangePatterns {
    let mut file_types: BTreeMap<String, usize> = BTreeMap::new();
    let mut directories: BTreeMap<String, usize> = BTreeMap::new();
    let mut change_types: BTreeMap<String, usize> = BTreeMap::new();

    for session in sessions {
        for file in &session.files_changed {
            *file_types.entry(extension_of(&file.path)).or_insert(0) += 1;
            *directories.entry(top_directory(&file.path)).or_insert(0) += 1;
            *change_types.entry(file.change_type.clone()).or_insert(0) += 1;
        }
    }

    FileChangePatterns {
        most_changed_file_type: most_frequent(&file_types),
        most_changed_directory: most_frequent(&directories),
        file_types,
        directories,
        change_types,
    }
}

fn extension_of(path: &str) -> String {
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .unwrap_or("no-extension")
        .to_string()
}

/// First path segment, or "." for bare filenames.
fn top_directory(path: &str) -> String {
    match Path::new(path).parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent
            .components()
            .next()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .unwrap_or_else(|| ".".to_string()),
        _ => ".".to_string(),
    }
}

fn predictive_insights(sessions: &[Session], window: usize) -> PredictiveInsights {
    let start = sessions.len().saturating_sub(window);
    let recent = &sessions[start..];

    let complexity_series: Vec<f64> = recent
        .iter()
        .map(|s| f64::from(s.complexity.score()))
        .collect();
    let duration_series: Vec<f64> = recent.iter().map(|s| f64::from(s.duration)).collect();

    PredictiveInsights {
        complexity_trend: calculate_trend(&complexity_series),
        duration_trend: calculate_trend(&duration_series),
        predicted_next_complexity: predict_next(&complexity_series),
        predicted_next_duration: predict_next(&duration_series),
        risk: assess_risk(recent),
    }
}

fn assess_risk(recent: &[Session]) -> Risk {
    let blockers: usize = recent.iter().map(|s| s.blockers.len()).sum();
    let avg_complexity = recent
        .iter()
        .map(|s| f64::from(s.complexity.score()))
        .sum::<f64>()
        / recent.len() as f64;

    if blockers > 5 || avg_complexity > 3.0 {
        Risk::High
    } else if blockers > 2 || avg_complexity > 2.5 {
        Risk::Medium
    } else {
        Risk::Low
    }
}

/// Relative change of last vs first, with a 10% dead band. A zero first
/// value falls through the comparisons: +inf reads as increasing, NaN as
/// stable.
fn calculate_trend(values: &[f64]) -> Trend {
    if values.len() < 2 {
        return Trend::Stable;
    }
    let first = values[0];
    let last = values[values.len() - 1];
    let change = (last - first) / first;

    if change > 0.1 {
        Trend::Increasing
    } else if change < -0.1 {
        Trend::Decreasing
    } else {
        Trend::Stable
    }
}

/// First-difference extrapolation: last + (last - previous), rounded to
/// one decimal. Series shorter than 2 return the sole value or 0.
fn predict_next(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return values.first().copied().unwrap_or(0.0);
    }
    let last = values[values.len() - 1];
    let prev = values[values.len() - 2];
    round1(last + (last - prev))
}

fn recommendations_for(
    productivity: &ProductivityMetrics,
    blockers: &BlockersAnalysis,
    evolution: &ComplexityEvolution,
) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();

    if productivity.efficiency_score < 1.0 {
        recommendations.push(Recommendation {
            kind: "productivity".to_string(),
            priority: "high".to_string(),
            title: "Improve Achievement Rate".to_string(),
            description: "Consider breaking down larger tasks into smaller, achievable goals."
                .to_string(),
            metric: format!(
                "Current efficiency: {} achievements/hour",
                productivity.efficiency_score
            ),
        });
    }

    if blockers.average_per_session > 1.0 {
        recommendations.push(Recommendation {
            kind: "blockers".to_string(),
            priority: "medium".to_string(),
            title: "Reduce Blocker Frequency".to_string(),
            description: "Focus on proactive planning to minimize development blockers."
                .to_string(),
            metric: format!(
                "Average {} blockers per session",
                blockers.average_per_session
            ),
        });
    }

    if evolution.trend == Trend::Increasing {
        recommendations.push(Recommendation {
            kind: "complexity".to_string(),
            priority: "low".to_string(),
            title: "Monitor Complexity Growth".to_string(),
            description: "Task complexity is increasing. Consider balancing with simpler tasks."
                .to_string(),
            metric: "Complexity trend: increasing".to_string(),
        });
    }

    recommendations
}

fn parse_instant(timestamp: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(timestamp)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Largest count wins; ties keep the smallest key.
fn most_frequent<K: Ord + Clone>(map: &BTreeMap<K, usize>) -> Option<K> {
    let mut best: Option<(&K, usize)> = None;
    for (key, count) in map {
        match best {
            Some((_, best_count)) if *count <= best_count => {}
            _ => best = Some((key, *count)),
        }
    }
    best.map(|(k, _)| k.clone())
}

/// Keys ordered by count descending, ties ascending by key.
fn top_keys(map: &BTreeMap<String, usize>, limit: usize) -> Vec<String> {
    let mut entries: Vec<(&String, usize)> = map.iter().map(|(k, v)| (k, *v)).collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    entries
        .into_iter()
        .take(limit)
        .map(|(k, _)| k.clone())
        .collect()
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn empty_report() -> AnalyticsReport {
    AnalyticsReport {
        metadata: ReportMetadata {
            total_sessions: 0,
            date_range: None,
            generated_at: Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            data_version: DATA_VERSION.to_string(),
        },
        productivity: ProductivityMetrics {
            total_hours: 0,
            total_achievements: 0,
            total_blockers: 0,
            average_session_duration: 0,
            productivity_score: 0.0,
            efficiency_score: 0.0,
            blocker_rate: 0.0,
        },
        time_analysis: TimeAnalysis {
            sessions_by_date: BTreeMap::new(),
            sessions_by_hour: BTreeMap::new(),
            sessions_by_weekday: BTreeMap::new(),
            most_productive_hour: None,
            most_productive_day: None,
        },
        technology_stack: TechnologyStack {
            tools_usage: BTreeMap::new(),
            tags_frequency: BTreeMap::new(),
            average_complexity_by_tag: BTreeMap::new(),
            most_used_tool: None,
            most_common_tag: None,
        },
        complexity_evolution: ComplexityEvolution {
            complexity_over_time: Vec::new(),
            monthly_averages: BTreeMap::new(),
            trend: Trend::Stable,
        },
        focus_areas: FocusAreas {
            areas: BTreeMap::new(),
            top_areas: Vec::new(),
        },
        blockers_analysis: BlockersAnalysis {
            total_blockers: 0,
            average_per_session: 0.0,
            blocker_types: BTreeMap::new(),
            resolution_rate: 0,
            blocker_free_sessions: 0,
        },
        file_change_patterns: FileChangePatterns {
            file_types: BTreeMap::new(),
            directories: BTreeMap::new(),
            change_types: BTreeMap::new(),
            most_changed_file_type: None,
            most_changed_directory: None,
        },
        predictive_insights: PredictiveInsights {
            complexity_trend: Trend::Stable,
            duration_trend: Trend::Stable,
            predicted_next_complexity: 0.0,
            predicted_next_duration: 0.0,
            risk: Risk::Low,
        },
        recommendations: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Priority, SessionMetadata};

    fn make_session(id: &str, timestamp: &str, duration: u32, complexity: Complexity) -> Session {
        Session {
            session_id: id.to_string(),
            timestamp: timestamp.to_string(),
            developer: "priya".to_string(),
            status: "completed".to_string(),
            focus: "Implement the record parser".to_string(),
            achievements: vec!["one".to_string()],
            blockers: Vec::new(),
            next_steps: Vec::new(),
            files_changed: Vec::new(),
            learnings: Vec::new(),
            notes: String::new(),
            duration,
            tags: Vec::new(),
            priority: Priority::Medium,
            complexity,
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

    #[test]
    fn test_productivity_metrics() {
        let mut a = make_session("2025-05-26-a", "2025-05-26T09:00:00Z", 60, Complexity::Simple);
        a.achievements = vec!["x".to_string(), "y".to_string()];
        let mut b = make_session("2025-05-27-b", "2025-05-27T10:00:00Z", 30, Complexity::Simple);
        b.blockers = vec!["api limit".to_string()];

        let p = productivity_metrics(&[a, b]);
        assert_eq!(p.total_hours, 2); // 90 min rounds up
        assert_eq!(p.total_achievements, 3);
        assert_eq!(p.total_blockers, 1);
        assert_eq!(p.average_session_duration, 45);
        assert_eq!(p.productivity_score, 1.5);
        assert_eq!(p.efficiency_score, 2.0);
        assert_eq!(p.blocker_rate, 0.5);
    }

    #[test]
    fn test_trend_classification() {
        assert_eq!(calculate_trend(&[1.0, 1.0, 1.5]), Trend::Increasing);
        assert_eq!(calculate_trend(&[2.0, 2.0, 2.0]), Trend::Stable);
        assert_eq!(calculate_trend(&[2.0, 1.0]), Trend::Decreasing);
        assert_eq!(calculate_trend(&[10.0, 10.5]), Trend::Stable); // within the 10% band
        assert_eq!(calculate_trend(&[5.0]), Trend::Stable);
        assert_eq!(calculate_trend(&[]), Trend::Stable);
    }

    #[test]
    fn test_predict_next() {
        assert_eq!(predict_next(&[3.0, 5.0]), 7.0);
        assert_eq!(predict_next(&[4.0]), 4.0);
        assert_eq!(predict_next(&[]), 0.0);
        assert_eq!(predict_next(&[2.0, 1.0]), 0.0); // falling series
    }

    #[test]
    fn test_risk_tiers() {
        let mut blocked = make_session("2025-05-26-a", "2025-05-26T09:00:00Z", 60, Complexity::Simple);
        blocked.blockers = (0..6).map(|i| format!("blocker {}", i)).collect();
        assert_eq!(assess_risk(&[blocked]), Risk::High);

        let experts: Vec<Session> = (0..3)
            .map(|i| make_session(&format!("2025-05-2{}-x", i), "2025-05-26T09:00:00Z", 150, Complexity::Expert))
            .collect();
        assert_eq!(assess_risk(&experts), Risk::High);

        let mut medium = make_session("2025-05-26-b", "2025-05-26T09:00:00Z", 60, Complexity::Simple);
        medium.blockers = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        assert_eq!(assess_risk(&[medium]), Risk::Medium);

        let calm = make_session("2025-05-26-c", "2025-05-26T09:00:00Z", 30, Complexity::Simple);
        assert_eq!(assess_risk(&[calm]), Risk::Low);
    }

    #[test]
    fn test_risk_window_applies() {
        // Old blockers fall outside the window and stop counting.
        let mut old = make_session("2025-05-01-a", "2025-05-01T09:00:00Z", 60, Complexity::Simple);
        old.blockers = (0..6).map(|i| format!("blocker {}", i)).collect();
        let mut sessions = vec![old];
        for i in 0..3 {
            sessions.push(make_session(
                &format!("2025-05-2{}-b", i),
                "2025-05-26T09:00:00Z",
                30,
                Complexity::Simple,
            ));
        }
        let insights = predictive_insights(&sessions, 3);
        assert_eq!(insights.risk, Risk::Low);
    }

    #[test]
    fn test_most_frequent_tie_breaks_to_smallest_key() {
        let mut map: BTreeMap<u32, usize> = BTreeMap::new();
        map.insert(14, 2);
        map.insert(9, 2);
        map.insert(11, 1);
        assert_eq!(most_frequent(&map), Some(9));
    }

    #[test]
    fn test_time_buckets_are_utc() {
        let sessions = vec![
            make_session("2025-05-26-a", "2025-05-26T14:30:00Z", 60, Complexity::Simple),
            make_session("2025-05-26-b", "2025-05-26T14:05:00Z", 60, Complexity::Simple),
            make_session("2025-05-27-c", "2025-05-27T09:00:00Z", 60, Complexity::Simple),
        ];
        let t = time_analysis(&sessions);
        assert_eq!(t.sessions_by_date.get("2025-05-26"), Some(&2));
        assert_eq!(t.sessions_by_hour.get(&14), Some(&2));
        // 2025-05-26 is a Monday
        assert_eq!(t.sessions_by_weekday.get("Monday"), Some(&2));
        assert_eq!(t.sessions_by_weekday.get("Tuesday"), Some(&1));
        assert_eq!(t.most_productive_hour, Some(14));
        assert_eq!(t.most_productive_day, Some("Monday".to_string()));
    }

    #[test]
    fn test_unparsable_timestamps_skipped_in_buckets() {
        let sessions = vec![
            make_session("2025-05-26-a", "2025-05-26T14:30:00Z", 60, Complexity::Simple),
            make_session("2025-05-26-b", "not a timestamp", 60, Complexity::Simple),
        ];
        let t = time_analysis(&sessions);
        assert_eq!(t.sessions_by_date.len(), 1);
        let m = metadata(&sessions);
        assert_eq!(m.total_sessions, 2);
        let range = m.date_range.unwrap();
        assert_eq!(range.start, "2025-05-26T14:30:00Z");
        assert_eq!(range.end, "2025-05-26T14:30:00Z");
    }

    #[test]
    fn test_date_range_is_min_max() {
        let sessions = vec![
            make_session("2025-05-27-a", "2025-05-27T10:00:00Z", 60, Complexity::Simple),
            make_session("2025-05-25-b", "2025-05-25T10:00:00Z", 60, Complexity::Simple),
            make_session("2025-05-26-c", "2025-05-26T10:00:00Z", 60, Complexity::Simple),
        ];
        let range = metadata(&sessions).date_range.unwrap();
        assert_eq!(range.start, "2025-05-25T10:00:00Z");
        assert_eq!(range.end, "2025-05-27T10:00:00Z");
    }

    #[test]
    fn test_monthly_averages_and_points() {
        let sessions = vec![
            make_session("2025-05-26-a", "2025-05-26T10:00:00Z", 60, Complexity::Simple),
            make_session("2025-05-27-b", "2025-05-27T10:00:00Z", 60, Complexity::Complex),
            make_session("2025-06-02-c", "2025-06-02T10:00:00Z", 60, Complexity::Expert),
        ];
        let evolution = complexity_evolution(&sessions);
        assert_eq!(evolution.complexity_over_time.len(), 3);
        assert_eq!(evolution.complexity_over_time[0].date, "2025-05-26");
        assert_eq!(evolution.complexity_over_time[0].score, 1);
        assert_eq!(evolution.monthly_averages.get("2025-05"), Some(&2.0));
        assert_eq!(evolution.monthly_averages.get("2025-06"), Some(&4.0));
        assert_eq!(evolution.trend, Trend::Increasing);
    }

    #[test]
    fn test_technology_stack_counts() {
        let mut a = make_session("2025-05-26-a", "2025-05-26T10:00:00Z", 60, Complexity::Simple);
        a.tags = vec!["bugfix".to_string()];
        a.tools_used = vec!["Git".to_string(), "JSON".to_string()];
        let mut b = make_session("2025-05-27-b", "2025-05-27T10:00:00Z", 60, Complexity::Complex);
        b.tags = vec!["bugfix".to_string(), "testing".to_string()];
        b.tools_used = vec!["Git".to_string()];

        let stack = technology_stack(&[a, b]);
        assert_eq!(stack.tools_usage.get("Git"), Some(&2));
        assert_eq!(stack.tags_frequency.get("bugfix"), Some(&2));
        // bugfix saw scores 1 and 3
        assert_eq!(stack.average_complexity_by_tag.get("bugfix"), Some(&2.0));
        assert_eq!(stack.most_used_tool, Some("Git".to_string()));
        assert_eq!(stack.most_common_tag, Some("bugfix".to_string()));
    }

    #[test]
    fn test_focus_keywords_filter_stop_words() {
        assert_eq!(
            focus_keywords("Fix the tokenizer quoting and tests"),
            vec!["tokenizer", "quoting", "tests"]
        );
        // capped at three keywords
        assert_eq!(
            focus_keywords("alpha bravo charlie delta echo").len(),
            3
        );
    }

    #[test]
    fn test_blocker_classification() {
        assert_eq!(classify_blocker("API rate limit"), "api");
        assert_eq!(classify_blocker("webpack refused to compile"), "build");
        assert_eq!(classify_blocker("jest flake again"), "testing");
        assert_eq!(classify_blocker("GitHub actions outage"), "integration");
        assert_eq!(classify_blocker("npm registry down"), "infrastructure");
        assert_eq!(classify_blocker("mysterious hang"), "other");
    }

    #[test]
    fn test_blockers_analysis_rates() {
        let mut a = make_session("2025-05-26-a", "2025-05-26T10:00:00Z", 60, Complexity::Simple);
        a.blockers = vec!["api limit".to_string(), "npm outage".to_string()];
        a.status = "completed".to_string();
        let b = make_session("2025-05-27-b", "2025-05-27T10:00:00Z", 60, Complexity::Simple);

        let analysis = blockers_for(&[a, b]);
        assert_eq!(analysis.total_blockers, 2);
        assert_eq!(analysis.average_per_session, 1.0);
        assert_eq!(analysis.blocker_types.get("api"), Some(&1));
        assert_eq!(analysis.blocker_types.get("infrastructure"), Some(&1));
        assert_eq!(analysis.resolution_rate, 50);
        assert_eq!(analysis.blocker_free_sessions, 1);
    }

    #[test]
    fn test_file_change_patterns() {
        use crate::models::FileChange;
        let mut session =
            make_session("2025-05-26-a", "2025-05-26T10:00:00Z", 60, Complexity::Simple);
        session.files_changed = vec![
            FileChange {
                path: "src/tokenize.rs".to_string(),
                change_type: "modified".to_string(),
                description: String::new(),
            },
            FileChange {
                path: "src/convert.rs".to_string(),
                change_type: "created".to_string(),
                description: String::new(),
            },
            FileChange {
                path: "README.md".to_string(),
                change_type: "modified".to_string(),
                description: String::new(),
            },
        ];

        let patterns = file_change_patterns(&[session]);
        assert_eq!(patterns.file_types.get("rs"), Some(&2));
        assert_eq!(patterns.file_types.get("md"), Some(&1));
        assert_eq!(patterns.directories.get("src"), Some(&2));
        assert_eq!(patterns.directories.get("."), Some(&1));
        assert_eq!(patterns.change_types.get("modified"), Some(&2));
        assert_eq!(patterns.most_changed_file_type, Some("rs".to_string()));
        assert_eq!(patterns.most_changed_directory, Some("src".to_string()));
    }

    #[test]
    fn test_empty_store_yields_zeroed_report() {
        let report = compute(&[], 10);
        assert_eq!(report.metadata.total_sessions, 0);
        assert!(report.metadata.date_range.is_none());
        assert_eq!(report.productivity.total_hours, 0);
        assert_eq!(report.complexity_evolution.trend, Trend::Stable);
        assert_eq!(report.predictive_insights.risk, Risk::Low);
        assert!(report.recommendations.is_empty());
    }

    #[test]
    fn test_recommendations_fire_independently() {
        // Low efficiency, high blocker average, and rising complexity all
        // at once: three recommendations.
        let mut early = make_session("2025-04-01-a", "2025-04-01T10:00:00Z", 240, Complexity::Simple);
        early.achievements = vec!["one".to_string()];
        early.blockers = vec!["api limit".to_string(), "build broke".to_string()];
        let mut late = make_session("2025-05-01-b", "2025-05-01T10:00:00Z", 240, Complexity::Expert);
        late.achievements = vec!["two".to_string()];
        late.blockers = vec!["npm outage".to_string()];

        let report = compute(&[early, late], 10);
        assert_eq!(report.recommendations.len(), 3);
        assert_eq!(report.recommendations[0].kind, "productivity");
        assert_eq!(report.recommendations[0].priority, "high");
        assert_eq!(report.recommendations[1].kind, "blockers");
        assert_eq!(report.recommendations[2].kind, "complexity");
    }

    #[test]
    fn test_top_keys_orders_by_count_then_key() {
        let mut map: BTreeMap<String, usize> = BTreeMap::new();
        map.insert("parser".to_string(), 3);
        map.insert("store".to_string(), 1);
        map.insert("analytics".to_string(), 3);
        assert_eq!(
            top_keys(&map, 2),
            vec!["analytics".to_string(), "parser".to_string()]
        );
    }
}
