//! Session retrieval by ID.
//!
//! Looks up a full session in the record store and prints it. Used by the
//! `sesh show` CLI command.

use anyhow::{bail, Result};

use crate::config::Config;
use crate::models::Session;
use crate::store;

/// Core lookup returning the typed session.
pub fn find_session(config: &Config, id: &str) -> Result<Session> {
    let sessions = store::load_store(&config.paths.store)?;
    match sessions.into_iter().find(|s| s.session_id == id) {
        Some(session) => Ok(session),
        None => bail!("session not found: {}", id),
    }
}

/// CLI entry point — calls find_session and prints to stdout.
pub fn run_show(config: &Config, id: &str) -> Result<()> {
    let session = match find_session(config, id) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    println!("--- Session ---");
    println!("id:         {}", session.session_id);
    println!("timestamp:  {}", session.timestamp);
    println!("developer:  {}", session.developer);
    println!("status:     {}", session.status);
    println!("focus:      {}", session.focus);
    println!("duration:   {} min", session.duration);
    println!("priority:   {}", session.priority.as_str());
    println!("complexity: {}", session.complexity.as_str());
    if !session.tags.is_empty() {
        println!("tags:       {}", session.tags.join(", "));
    }
    if !session.tools_used.is_empty() {
        println!("tools:      {}", session.tools_used.join(", "));
    }
    println!();

    if !session.achievements.is_empty() {
        println!("--- Achievements ({}) ---", session.achievements.len());
        for achievement in &session.achievements {
            println!("- {}", achievement);
        }
        println!();
    }

    if !session.blockers.is_empty() {
        println!("--- Blockers ({}) ---", session.blockers.len());
        for blocker in &session.blockers {
            println!("- {}", blocker);
        }
        println!();
    }

    if !session.next_steps.is_empty() {
        println!("--- Next steps ({}) ---", session.next_steps.len());
        for step in &session.next_steps {
            println!("- {}", step);
        }
        println!();
    }

    if !session.files_changed.is_empty() {
        println!("--- Files changed ({}) ---", session.files_changed.len());
        for file in &session.files_changed {
            println!("- {} ({})", file.path, file.change_type);
        }
        println!();
    }

    if !session.learnings.is_empty() {
        println!("--- Learnings ({}) ---", session.learnings.len());
        for learning in &session.learnings {
            println!("- {}", learning);
        }
        println!();
    }

    if !session.notes.is_empty() {
        println!("--- Notes ---");
        println!("{}", session.notes);
        println!();
    }

    Ok(())
}
