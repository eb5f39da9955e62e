//! # Session Ledger
//!
//! A migration and analytics pipeline for development session logs.
//!
//! Session Ledger converts a human-edited CSV session log into a typed,
//! validated JSON record store, keeping a verified backup of every source
//! file it touches, and derives productivity analytics from the resulting
//! corpus via a CLI.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌──────────────────────┐   ┌────────────┐
//! │ CSV source │──▶│  Migration pipeline  │──▶│ JSON store │
//! │ (sessions) │   │ backup ▸ convert ▸   │   │ (typed     │
//! └────────────┘   │ validate ▸ persist   │   │  records)  │
//!                  └──────────────────────┘   └─────┬──────┘
//!                                                   │
//!                                ┌──────────────────┤
//!                                ▼                  ▼
//!                          ┌──────────┐      ┌───────────┐
//!                          │   CLI    │      │ Analytics │
//!                          │  (sesh)  │      │  reports  │
//!                          └──────────┘      └───────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! sesh init                     # scaffold config + default contract
//! sesh migrate                  # CSV -> typed JSON store (with backup)
//! sesh analyze                  # write the analytics report
//! sesh stats                    # store overview
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`tokenize`] | Quote-aware source tokenizer |
//! | [`convert`] | Row to typed session conversion |
//! | [`contract`] | Field validation contract |
//! | [`migrate`] | Migration pipeline |
//! | [`store`] | JSON record store |
//! | [`analytics`] | Analytics engine and reports |
//! | [`progress`] | Migration progress reporting |
//! | [`scaffold`] | Config and session-template scaffolding |
//! | [`show`] | Session lookup |
//! | [`stats`] | Store statistics |

pub mod analytics;
pub mod config;
pub mod contract;
pub mod convert;
pub mod migrate;
pub mod models;
pub mod progress;
pub mod scaffold;
pub mod show;
pub mod stats;
pub mod store;
pub mod tokenize;
