//! Store statistics and health overview.
//!
//! Provides a quick summary of what's in the record store: session counts,
//! time totals, and status/complexity breakdowns. Used by `sesh stats` to
//! give confidence that migrations landed as expected.

use std::collections::BTreeMap;

use anyhow::Result;

use crate::config::Config;
use crate::store;

/// Run the stats command: read the store and print a summary.
pub fn run_stats(config: &Config) -> Result<()> {
    let sessions = store::load_store_or_empty(&config.paths.store)?;

    let store_size = std::fs::metadata(&config.paths.store)
        .map(|m| m.len())
        .unwrap_or(0);

    let total_minutes: u64 = sessions.iter().map(|s| u64::from(s.duration)).sum();
    let total_achievements: usize = sessions.iter().map(|s| s.achievements.len()).sum();
    let total_blockers: usize = sessions.iter().map(|s| s.blockers.len()).sum();

    let mut by_status: BTreeMap<&str, usize> = BTreeMap::new();
    let mut by_complexity: BTreeMap<&str, usize> = BTreeMap::new();
    let mut tag_counts: BTreeMap<&str, usize> = BTreeMap::new();
    for session in &sessions {
        *by_status.entry(session.status.as_str()).or_insert(0) += 1;
        *by_complexity.entry(session.complexity.as_str()).or_insert(0) += 1;
        for tag in &session.tags {
            *tag_counts.entry(tag.as_str()).or_insert(0) += 1;
        }
    }

    println!("Session Ledger — Store Stats");
    println!("============================");
    println!();
    println!("  Store:        {}", config.paths.store.display());
    println!("  Size:         {}", format_bytes(store_size));
    println!();
    println!("  Sessions:     {}", sessions.len());
    println!(
        "  Total time:   {} min ({:.1} h)",
        total_minutes,
        total_minutes as f64 / 60.0
    );
    println!("  Achievements: {}", total_achievements);
    println!("  Blockers:     {}", total_blockers);

    // Normalized timestamps sort lexicographically in date order
    let first = sessions.iter().map(|s| s.timestamp.as_str()).min();
    let last = sessions.iter().map(|s| s.timestamp.as_str()).max();
    if let (Some(first), Some(last)) = (first, last) {
        println!("  Range:        {} .. {}", first, last);
    }

    if !by_status.is_empty() {
        println!();
        println!("  By status:");
        for (status, count) in &by_status {
            println!("    {:<16} {:>6}", status, count);
        }
    }

    if !by_complexity.is_empty() {
        println!();
        println!("  By complexity:");
        for (complexity, count) in &by_complexity {
            println!("    {:<16} {:>6}", complexity, count);
        }
    }

    let mut tags: Vec<(&str, usize)> = tag_counts.into_iter().collect();
    tags.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    if !tags.is_empty() {
        println!();
        println!("  Top tags:");
        for (tag, count) in tags.iter().take(5) {
            println!("    {:<16} {:>6}", tag, count);
        }
    }

    println!();
    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}
