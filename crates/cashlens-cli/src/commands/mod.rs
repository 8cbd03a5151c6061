//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `input` - Loading normalized transaction files (CSV, JSON)
//! - `report` - Report and classify commands
//! - `rules` - Category registry and rule set inspection

pub mod input;
pub mod report;
pub mod rules;

use std::path::Path;

use anyhow::{Context, Result};
use cashlens_core::{ReportConfig, ReportGenerator, RuleSet};
use rust_decimal::Decimal;

// Re-export command functions for main.rs
pub use input::*;
pub use report::*;
pub use rules::*;

/// Load the report config from an explicit path, or the default resolution
pub fn load_config(path: Option<&Path>) -> Result<ReportConfig> {
    match path {
        Some(path) => ReportConfig::from_path(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => ReportConfig::load().context("Failed to load report config"),
    }
}

/// Custom rule set if a path was given, otherwise the built-in one
pub fn load_rules(path: Option<&Path>, config: &ReportConfig) -> Result<RuleSet> {
    match path {
        Some(path) => RuleSet::from_path(path)
            .with_context(|| format!("Failed to load rules from {}", path.display())),
        None => Ok(RuleSet::standard(config)),
    }
}

pub fn build_generator(config: &ReportConfig, rules_path: Option<&Path>) -> Result<ReportGenerator> {
    let rules = load_rules(rules_path, config)?;
    Ok(ReportGenerator::with_rules(rules, config))
}

/// Format a currency amount with two decimals
pub fn format_amount(amount: Decimal) -> String {
    format!("{:.2}", amount.round_dp(2))
}

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
