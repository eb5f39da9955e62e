use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub paths: PathsConfig,
    #[serde(default)]
    pub migration: MigrationConfig,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PathsConfig {
    pub source: PathBuf,
    pub store: PathBuf,
    #[serde(default = "default_backup_dir")]
    pub backup_dir: PathBuf,
    pub contract: PathBuf,
    #[serde(default = "default_migration_report")]
    pub migration_report: PathBuf,
    #[serde(default = "default_analytics_report")]
    pub analytics_report: PathBuf,
}

fn default_backup_dir() -> PathBuf {
    PathBuf::from("backups")
}
fn default_migration_report() -> PathBuf {
    PathBuf::from("migration-report.json")
}
fn default_analytics_report() -> PathBuf {
    PathBuf::from("analysis/analytics.json")
}

#[derive(Debug, Deserialize, Clone)]
pub struct MigrationConfig {
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
        }
    }
}

fn default_delimiter() -> char {
    ','
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnalyticsConfig {
    #[serde(default = "default_recent_window")]
    pub recent_window: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            recent_window: default_recent_window(),
        }
    }
}

fn default_recent_window() -> usize {
    10
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    // Validate migration
    if config.migration.delimiter == '"' {
        anyhow::bail!("migration.delimiter must not be the quote character");
    }

    if !config.migration.delimiter.is_ascii() {
        anyhow::bail!(
            "migration.delimiter must be a single ASCII character, got '{}'",
            config.migration.delimiter
        );
    }

    // Validate analytics
    if config.analytics.recent_window == 0 {
        anyhow::bail!("analytics.recent_window must be >= 1");
    }

    Ok(config)
}
