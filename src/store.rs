//! JSON record store.
//!
//! The store is a single pretty-printed JSON array of sessions. Writes go
//! through a temp file in the same directory followed by a rename, so a
//! crash mid-write leaves the previous store intact.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::Config;
use crate::contract::Contract;
use crate::models::Session;

/// Load the full store. Errors if the file is missing or malformed.
pub fn load_store(path: &Path) -> Result<Vec<Session>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read record store: {}", path.display()))?;
    let sessions: Vec<Session> =
        serde_json::from_str(&text).context("Record store is not valid JSON")?;
    Ok(sessions)
}

/// Load the store, treating a missing file as empty.
pub fn load_store_or_empty(path: &Path) -> Result<Vec<Session>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    load_store(path)
}

/// Write the store atomically: serialize to `<path>.tmp`, then rename
/// over the target.
pub fn save_store(path: &Path, sessions: &[Session]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create store directory: {}", parent.display()))?;
        }
    }

    let json = serde_json::to_string_pretty(sessions).context("Failed to serialize store")?;
    let tmp = temp_path(path);
    fs::write(&tmp, json)
        .with_context(|| format!("Failed to write store temp file: {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("Failed to move store into place: {}", path.display()))?;
    Ok(())
}

/// Sibling temp file used for the write-then-rename dance.
pub(crate) fn temp_path(path: &Path) -> PathBuf {
    let mut os: OsString = path.as_os_str().to_os_string();
    os.push(".tmp");
    PathBuf::from(os)
}

/// Append one session, supplied as a JSON file, to the store.
///
/// The session must pass the contract and carry an id not already
/// present. Returns `Ok(false)` on rejection, after printing why.
pub fn run_add(config: &Config, file: &Path) -> Result<bool> {
    let text = fs::read_to_string(file)
        .with_context(|| format!("Failed to read session file: {}", file.display()))?;
    let session: Session =
        serde_json::from_str(&text).context("Session file is not valid JSON")?;

    let contract = Contract::load(&config.paths.contract)?;
    let result = contract.validate(&session);
    for warning in &result.warnings {
        eprintln!("warning: {}", warning);
    }
    if !result.valid {
        println!("session {} failed validation:", session.session_id);
        for error in &result.errors {
            println!("  - {}", error);
        }
        return Ok(false);
    }

    let mut sessions = load_store_or_empty(&config.paths.store)?;
    if sessions.iter().any(|s| s.session_id == session.session_id) {
        println!("session id already exists: {}", session.session_id);
        return Ok(false);
    }

    let id = session.session_id.clone();
    sessions.push(session);
    save_store(&config.paths.store, &sessions)?;

    println!("added {}", id);
    println!("  total sessions: {}", sessions.len());
    Ok(true)
}
