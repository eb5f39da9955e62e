//! # Session Ledger CLI (`sesh`)
//!
//! The `sesh` binary is the primary interface for Session Ledger. It
//! provides commands for scaffolding a workspace, migrating a CSV session
//! log into the typed record store, validating and extending the store,
//! and computing analytics.
//!
//! ## Usage
//!
//! ```bash
//! sesh --config ./config/sesh.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `sesh init` | Scaffold the config file and default validation contract |
//! | `sesh migrate` | Migrate the CSV source into the JSON record store |
//! | `sesh analyze` | Compute analytics and write the report |
//! | `sesh validate` | Validate every stored session against the contract |
//! | `sesh add <file>` | Add one session from a JSON file |
//! | `sesh show <id>` | Print one session by id |
//! | `sesh stats` | Print store statistics |
//! | `sesh template` | Print a blank session JSON skeleton |
//!
//! ## Examples
//!
//! ```bash
//! # Scaffold a new workspace
//! sesh init --config ./config/sesh.toml
//!
//! # Check a source file without writing anything
//! sesh migrate --dry-run --config ./config/sesh.toml
//!
//! # Full migration with machine-readable progress
//! sesh migrate --progress json --config ./config/sesh.toml
//!
//! # Analytics on stdout
//! sesh analyze --stdout --config ./config/sesh.toml
//! ```

mod analytics;
mod config;
mod contract;
mod convert;
mod migrate;
mod models;
mod progress;
mod scaffold;
mod show;
mod stats;
mod store;
mod tokenize;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use progress::ProgressMode;

/// Session Ledger CLI — migrate a CSV session log into a typed, validated
/// JSON record store and derive analytics from it.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. `sesh init` generates one to start from.
#[derive(Parser)]
#[command(
    name = "sesh",
    about = "Session Ledger — migrate CSV session logs into a typed JSON store and analyze them",
    version,
    long_about = "Session Ledger converts a human-edited CSV session log into a typed, validated \
    JSON record store, keeping a verified backup of every source file it touches, and derives \
    productivity analytics from the resulting corpus."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/sesh.toml`. All source, store, backup, and
    /// analytics settings are read from this file.
    #[arg(long, global = true, default_value = "./config/sesh.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Scaffold the config file and default validation contract.
    ///
    /// Writes a TOML config at the `--config` path and a `contract.json`
    /// next to it. Refuses to overwrite either file.
    Init,

    /// Migrate the CSV source into the typed record store.
    ///
    /// Backs up the source, tokenizes and converts every row, validates
    /// the whole batch against the contract, then atomically replaces the
    /// store. Any validation failure aborts the run and leaves the store
    /// untouched. A migration report is written either way.
    Migrate {
        /// Stop after the validation gate without writing anything:
        /// no backup, no store change, no report.
        #[arg(long)]
        dry_run: bool,

        /// Progress output on stderr: `off`, `human`, or `json`.
        /// Defaults to `human` when stderr is a TTY, otherwise `off`.
        #[arg(long)]
        progress: Option<String>,
    },

    /// Compute analytics over the record store.
    ///
    /// Recomputes every metric from scratch on each invocation and writes
    /// the report to the configured path.
    Analyze {
        /// Print the report on stdout instead of writing the file.
        #[arg(long)]
        stdout: bool,
    },

    /// Validate every stored session against the contract.
    ///
    /// Prints itemized violations per session and exits non-zero when any
    /// session fails.
    Validate,

    /// Add one session, given as a JSON file, to the store.
    ///
    /// The session must pass the contract and carry an id not already in
    /// the store. `sesh template` prints a starting point.
    Add {
        /// Path to the session JSON file.
        file: PathBuf,
    },

    /// Print one session by its id.
    Show {
        /// Session id (e.g. `2025-05-26-feature-work`).
        id: String,
    },

    /// Print store statistics.
    ///
    /// Session counts, time totals, and status/complexity breakdowns.
    Stats,

    /// Print a blank session JSON skeleton for `sesh add`.
    Template,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Commands that don't require config
    match &cli.command {
        Commands::Init => {
            scaffold::scaffold_workspace(&cli.config)?;
            return Ok(());
        }
        Commands::Template => {
            scaffold::run_template()?;
            return Ok(());
        }
        _ => {}
    }

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Migrate { dry_run, progress } => {
            let mode = match progress.as_deref() {
                None => ProgressMode::default_for_tty(),
                Some("off") => ProgressMode::Off,
                Some("human") => ProgressMode::Human,
                Some("json") => ProgressMode::Json,
                Some(other) => anyhow::bail!(
                    "Unknown progress mode: '{}'. Must be off, human, or json.",
                    other
                ),
            };
            let reporter = mode.reporter();
            if !migrate::run_migrate(&cfg, dry_run, reporter.as_ref())? {
                std::process::exit(1);
            }
        }
        Commands::Analyze { stdout } => {
            analytics::run_analyze(&cfg, stdout)?;
        }
        Commands::Validate => {
            if !contract::run_validate(&cfg)? {
                std::process::exit(1);
            }
        }
        Commands::Add { file } => {
            if !store::run_add(&cfg, &file)? {
                std::process::exit(1);
            }
        }
        Commands::Show { id } => {
            show::run_show(&cfg, &id)?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg)?;
        }
        Commands::Init | Commands::Template => {
            // Handled above (before config loading)
            unreachable!()
        }
    }

    Ok(())
}
