//! Migration pipeline.
//!
//! Orchestrates one run over the source table: back up the source, read
//! and tokenize it, convert rows to typed sessions, validate the batch
//! against the contract, then persist the store atomically. Validation
//! is all-or-nothing: a single invalid session aborts the run and the
//! existing store is left exactly as it was.
//!
//! A migration report is written for every non-dry run, success or abort,
//! so failed runs leave an audit trail.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::config::Config;
use crate::contract::Contract;
use crate::convert::{Converter, InferenceRules};
use crate::models::Session;
use crate::progress::{MigrateProgressEvent, MigrateProgressReporter};
use crate::store;
use crate::tokenize;

/// One failed record: which row and what went wrong.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordError {
    pub record_id: String,
    pub error: String,
}

/// Counters accumulated over one migration run.
#[derive(Debug)]
pub struct MigrationStats {
    pub total_records: usize,
    pub successful: usize,
    pub failed: usize,
    pub errors: Vec<RecordError>,
    started: DateTime<Utc>,
    finished: Option<DateTime<Utc>>,
}

impl MigrationStats {
    pub fn new() -> Self {
        Self {
            total_records: 0,
            successful: 0,
            failed: 0,
            errors: Vec::new(),
            started: Utc::now(),
            finished: None,
        }
    }

    pub fn record_success(&mut self) {
        self.successful += 1;
    }

    pub fn record_failure(&mut self, record_id: String, error: String) {
        self.failed += 1;
        self.errors.push(RecordError { record_id, error });
    }

    /// A record that converted cleanly but failed the contract moves
    /// from the success tally to the failure tally.
    pub fn record_validation_failure(&mut self, record_id: String, error: String) {
        self.successful = self.successful.saturating_sub(1);
        self.record_failure(record_id, error);
    }

    pub fn finish(&mut self) {
        self.finished = Some(Utc::now());
    }

    pub fn report(&self) -> MigrationReport {
        let finished = self.finished.unwrap_or_else(Utc::now);
        let success_rate = if self.total_records == 0 {
            0
        } else {
            ((self.successful as f64 / self.total_records as f64) * 100.0).round() as u32
        };
        let elapsed_ms = (finished - self.started).num_milliseconds();
        MigrationReport {
            total_records: self.total_records,
            successful: self.successful,
            failed: self.failed,
            success_rate,
            duration: (elapsed_ms as f64 / 1000.0).round() as i64,
            errors: self.errors.clone(),
            timestamp: finished.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        }
    }
}

/// Serialized run summary, written next to the store after every run.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationReport {
    pub total_records: usize,
    pub successful: usize,
    pub failed: usize,
    /// Whole percent, rounded.
    pub success_rate: u32,
    /// Wall-clock seconds, rounded.
    pub duration: i64,
    pub errors: Vec<RecordError>,
    pub timestamp: String,
}

/// Run the full pipeline. Returns `Ok(false)` when the run was aborted
/// by validation failures (the store is untouched in that case).
///
/// With `dry_run` the pipeline stops after the validation gate and
/// writes nothing: no backup, no store, no report.
pub fn run_migrate(
    config: &Config,
    dry_run: bool,
    progress: &dyn MigrateProgressReporter,
) -> Result<bool> {
    let source = &config.paths.source;
    if !source.exists() {
        bail!("source file not found: {}", source.display());
    }
    if !config.paths.contract.exists() {
        bail!("contract file not found: {}", config.paths.contract.display());
    }
    let contract = Contract::load(&config.paths.contract)?;

    // Backup comes before anything transforms, so a bad run can always
    // be replayed from the copy.
    let backup = if dry_run {
        None
    } else {
        progress.report(MigrateProgressEvent::Phase { name: "backup" });
        Some(create_backup(source, &config.paths.backup_dir)?)
    };

    let text = fs::read_to_string(source)
        .with_context(|| format!("Failed to read source file: {}", source.display()))?;
    let table = tokenize::read_table(&text, config.migration.delimiter)?;

    let mut stats = MigrationStats::new();
    stats.total_records = table.rows.len();

    let converter = Converter::new(InferenceRules::default());
    let id_column = table.columns.iter().position(|c| c == "session_id");
    let total = table.rows.len() as u64;

    let mut converted: Vec<Session> = Vec::with_capacity(table.rows.len());
    for (index, row) in table.rows.iter().enumerate() {
        progress.report(MigrateProgressEvent::Converting {
            n: (index + 1) as u64,
            total,
        });
        let row_id = record_id(row, id_column, index);
        if row.len() != table.columns.len() {
            stats.record_failure(
                row_id,
                format!(
                    "column count mismatch: expected {}, got {}",
                    table.columns.len(),
                    row.len()
                ),
            );
            continue;
        }
        match converter.convert(row, &table.columns) {
            Ok(session) => {
                converted.push(session);
                stats.record_success();
            }
            Err(e) => stats.record_failure(row_id, e.to_string()),
        }
    }

    progress.report(MigrateProgressEvent::Phase { name: "validate" });
    let mut invalid = 0usize;
    for session in &converted {
        let result = contract.validate(session);
        for warning in &result.warnings {
            eprintln!("warning: {}: {}", session.session_id, warning);
        }
        if !result.valid {
            invalid += 1;
            stats.record_validation_failure(session.session_id.clone(), result.errors.join("; "));
        }
    }

    if invalid > 0 {
        rollback(&config.paths.store);
        stats.finish();
        let report = stats.report();
        if !dry_run {
            write_report(&config.paths.migration_report, &report)?;
        }
        print_summary(source, dry_run, &report, backup.as_deref());
        println!("migration aborted: {} records failed validation", invalid);
        return Ok(false);
    }

    if !dry_run {
        progress.report(MigrateProgressEvent::Phase { name: "persist" });
        if let Err(e) = store::save_store(&config.paths.store, &converted) {
            rollback(&config.paths.store);
            stats.finish();
            let _ = write_report(&config.paths.migration_report, &stats.report());
            return Err(e.context("migration failed while persisting the store"));
        }
    }

    stats.finish();
    let report = stats.report();
    if !dry_run {
        write_report(&config.paths.migration_report, &report)?;
    }
    print_summary(source, dry_run, &report, backup.as_deref());
    println!("ok");
    Ok(true)
}

fn record_id(row: &[String], id_column: Option<usize>, index: usize) -> String {
    id_column
        .and_then(|i| row.get(i))
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(String::from)
        // header occupies row 1 of the file
        .unwrap_or_else(|| format!("row {}", index + 2))
}

/// Copy the source into the backup directory under a timestamped name,
/// then verify the copy by content hash.
pub fn create_backup(source: &Path, backup_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(backup_dir)
        .with_context(|| format!("Failed to create backup directory: {}", backup_dir.display()))?;

    let stem = source
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("source");
    let stamp = Utc::now().format("%Y-%m-%dT%H-%M-%SZ");
    let name = match source.extension().and_then(|s| s.to_str()) {
        Some(ext) => format!("{}-backup-{}.{}", stem, stamp, ext),
        None => format!("{}-backup-{}", stem, stamp),
    };
    let backup_path = backup_dir.join(name);

    fs::copy(source, &backup_path)
        .with_context(|| format!("Failed to copy backup to {}", backup_path.display()))?;

    if sha256_file(source)? != sha256_file(&backup_path)? {
        bail!("backup verification failed for {}", backup_path.display());
    }
    Ok(backup_path)
}

fn sha256_file(path: &Path) -> Result<[u8; 32]> {
    let bytes =
        fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(hasher.finalize().into())
}

/// Undo a partial persist. The store itself only ever changes via an
/// atomic rename, so rollback just clears any leftover temp file.
fn rollback(store_path: &Path) {
    let tmp = store::temp_path(store_path);
    if tmp.exists() {
        let _ = fs::remove_file(&tmp);
    }
}

fn write_report(path: &Path, report: &MigrationReport) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create report directory: {}", parent.display())
            })?;
        }
    }
    let json = serde_json::to_string_pretty(report).context("Failed to serialize report")?;
    fs::write(path, json)
        .with_context(|| format!("Failed to write migration report: {}", path.display()))?;
    Ok(())
}

fn print_summary(source: &Path, dry_run: bool, report: &MigrationReport, backup: Option<&Path>) {
    if dry_run {
        println!("migrate {} (dry-run)", source.display());
    } else {
        println!("migrate {}", source.display());
    }
    println!("  total records: {}", report.total_records);
    println!("  successful:    {}", report.successful);
    println!("  failed:        {}", report.failed);
    println!("  success rate:  {}%", report.success_rate);
    println!("  duration:      {}s", report.duration);
    if let Some(path) = backup {
        println!("  backup:        {}", path.display());
    }
    if !report.errors.is_empty() {
        println!("  errors:");
        for e in &report.errors {
            println!("    {}: {}", e.record_id, e.error);
        }
    }
}
