//! Workspace scaffolding.
//!
//! `sesh init` writes a starter config plus the default contract next to
//! it, and `sesh template` prints a blank session for hand-editing and
//! `sesh add`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::Utc;

use crate::contract::DEFAULT_CONTRACT;
use crate::models::{Complexity, Priority, Session, SessionMetadata};

/// Write a starter config and default contract. Refuses to overwrite.
pub fn scaffold_workspace(config_path: &Path) -> Result<()> {
    if config_path.exists() {
        bail!("config already exists: {}", config_path.display());
    }

    let dir = config_path.parent().filter(|p| !p.as_os_str().is_empty());
    if let Some(dir) = dir {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;
    }

    let contract_path = match dir {
        Some(d) => d.join("contract.json"),
        None => PathBuf::from("contract.json"),
    };
    if contract_path.exists() {
        bail!("contract already exists: {}", contract_path.display());
    }

    let template = format!(
        r#"# Session ledger configuration.
#
# Paths are resolved relative to the working directory.

[paths]
# Human-edited source table (CSV).
source = "logs/SESSIONS.csv"
# Typed record store produced by `sesh migrate`.
store = "data/sessions.json"
# Backups of the source, one per migration run.
backup_dir = "backups"
# Validation contract applied to every record.
contract = "{contract}"
# Where each migration run writes its statistics.
migration_report = "migration-report.json"
# Where `sesh analyze` writes its report.
analytics_report = "analysis/analytics.json"

[migration]
# Field delimiter in the source table.
delimiter = ","

[analytics]
# How many recent sessions feed prediction and risk.
recent_window = 10
"#,
        contract = contract_path.display()
    );

    fs::write(config_path, template)
        .with_context(|| format!("Failed to write config: {}", config_path.display()))?;
    fs::write(&contract_path, format!("{}\n", DEFAULT_CONTRACT))
        .with_context(|| format!("Failed to write contract: {}", contract_path.display()))?;

    println!("Created config:   {}", config_path.display());
    println!("Created contract: {}", contract_path.display());
    println!();
    println!("Point [paths] at your source table, then run:");
    println!();
    println!("  sesh migrate --config {}", config_path.display());

    Ok(())
}

/// A blank session that passes the default contract, for hand-editing.
pub fn template_session() -> Session {
    let now = Utc::now();
    Session {
        session_id: format!("{}-your-session-description", now.format("%Y-%m-%d")),
        timestamp: now.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        developer: "your-name".to_string(),
        status: "completed".to_string(),
        focus: "Brief description of what you worked on".to_string(),
        achievements: Vec::new(),
        blockers: Vec::new(),
        next_steps: Vec::new(),
        files_changed: Vec::new(),
        learnings: Vec::new(),
        notes: String::new(),
        duration: 60,
        tags: Vec::new(),
        priority: Priority::Medium,
        complexity: Complexity::Simple,
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

/// Print the template as JSON, ready for `sesh add`.
pub fn run_template() -> Result<()> {
    let session = template_session();
    let json =
        serde_json::to_string_pretty(&session).context("Failed to serialize template")?;
    println!("{}", json);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::Contract;
    use tempfile::TempDir;

    #[test]
    fn test_template_passes_default_contract() {
        let contract = Contract::from_str(DEFAULT_CONTRACT).unwrap();
        let result = contract.validate(&template_session());
        assert!(result.valid, "errors: {:?}", result.errors);
    }

    #[test]
    fn test_scaffold_writes_config_and_contract() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config/sesh.toml");

        scaffold_workspace(&config_path).unwrap();

        assert!(config_path.exists());
        let contract_path = dir.path().join("config/contract.json");
        assert!(contract_path.exists());

        let written = std::fs::read_to_string(&config_path).unwrap();
        assert!(written.contains("[paths]"));
        assert!(written.contains(&contract_path.display().to_string()));
        Contract::load(&contract_path).unwrap();
    }

    #[test]
    fn test_scaffold_refuses_overwrite() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config/sesh.toml");
        scaffold_workspace(&config_path).unwrap();

        let err = scaffold_workspace(&config_path).unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }
}
