//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

/// Cashlens - Classify transactions and summarize where the money went
#[derive(Parser)]
#[command(name = "cashlens")]
#[command(about = "Transaction classifier and spending report generator", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Report config file (defaults to ~/.local/share/cashlens/config/report.toml,
    /// then built-in defaults)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Custom category rule set (TOML with [[rules]] tables)
    #[arg(long, global = true)]
    pub rules: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a report from a normalized transaction file
    Report {
        /// CSV (date,amount,description,raw_type) or JSON array of records
        #[arg(short, long)]
        file: PathBuf,

        /// Print the report model as JSON
        #[arg(long)]
        json: bool,

        /// Number of entries in the top-N lists (overrides config)
        #[arg(short, long)]
        top: Option<usize>,

        /// Large-payment threshold (overrides config)
        #[arg(long)]
        threshold: Option<Decimal>,

        /// Only report transactions on or after this date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Only report transactions on or before this date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,

        /// Only report the last N months (ending at --to or the latest transaction)
        #[arg(long, conflicts_with = "from")]
        months: Option<u32>,
    },

    /// Classify every transaction in a file and list the result
    Classify {
        /// CSV (date,amount,description,raw_type) or JSON array of records
        #[arg(short, long)]
        file: PathBuf,

        /// Print the classified transactions as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the category registry
    Categories,

    /// Inspect the category rule set (list, test)
    Rules {
        #[command(subcommand)]
        action: Option<RulesAction>,
    },
}

#[derive(Subcommand)]
pub enum RulesAction {
    /// List rules in precedence order
    List,

    /// Show every rule matching a description, and the final category
    Test {
        /// Transaction description to test
        description: String,

        /// Raw transaction type (e.g. "Savings", "Bitcoin Buy")
        #[arg(long)]
        raw_type: Option<String>,

        /// Signed amount (large inflows are relabelled)
        #[arg(long, allow_hyphen_values = true)]
        amount: Option<Decimal>,
    },
}
