//! Migration progress reporting.
//!
//! Reports observable progress during `sesh migrate` so users see which
//! phase the pipeline is in and how many rows are left. Progress is
//! emitted on **stderr** so stdout remains parseable for scripts.

use std::io::Write;

/// A single progress event for migration.
#[derive(Clone, Debug)]
pub enum MigrateProgressEvent {
    /// Pipeline entered a named phase (backup, validate, persist).
    Phase { name: &'static str },
    /// Conversion phase: n rows converted out of total.
    Converting { n: u64, total: u64 },
}

/// Reports migration progress. Implementations write to stderr (human or JSON).
pub trait MigrateProgressReporter: Send + Sync {
    /// Emit a progress event. Called from the migration pipeline.
    fn report(&self, event: MigrateProgressEvent);
}

/// Human-friendly progress on stderr: "migrate  converting  1,234 / 5,000 rows".
pub struct StderrProgress;

impl MigrateProgressReporter for StderrProgress {
    fn report(&self, event: MigrateProgressEvent) {
        let line = match &event {
            MigrateProgressEvent::Phase { name } => {
                format!("migrate  {}...\n", name)
            }
            MigrateProgressEvent::Converting { n, total } => {
                let n_fmt = format_number(*n);
                let total_fmt = format_number(*total);
                format!("migrate  converting  {} / {} rows\n", n_fmt, total_fmt)
            }
        };
        let _ = std::io::stderr().lock().write_all(line.as_bytes());
        let _ = std::io::stderr().lock().flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl MigrateProgressReporter for JsonProgress {
    fn report(&self, event: MigrateProgressEvent) {
        let obj = match &event {
            MigrateProgressEvent::Phase { name } => serde_json::json!({
                "event": "progress",
                "phase": name
            }),
            MigrateProgressEvent::Converting { n, total } => serde_json::json!({
                "event": "progress",
                "phase": "converting",
                "n": n,
                "total": total
            }),
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let _ = writeln!(std::io::stderr().lock(), "{}", line);
            let _ = std::io::stderr().lock().flush();
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl MigrateProgressReporter for NoProgress {
    fn report(&self, _event: MigrateProgressEvent) {}
}

pub(crate) fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + (s.len() - 1) / 3);
    let chars: Vec<char> = s.chars().rev().collect();
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(*c);
    }
    result.chars().rev().collect()
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    /// Build a reporter for this mode. Caller can pass it to migrate.
    pub fn reporter(&self) -> Box<dyn MigrateProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_number_comma() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(1), "1");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1234), "1,234");
        assert_eq!(format_number(1_234_567), "1,234,567");
    }
}
