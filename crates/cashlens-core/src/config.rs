//! Report configuration
//!
//! Config is loaded with a two-layer resolution:
//! 1. Check for an override (explicit path, or ~/.local/share/cashlens/config/report.toml)
//! 2. Fall back to embedded defaults (compiled into binary)
//!
//! Override files only need the keys they change; everything else keeps its
//! default.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::models::Category;

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/report.toml");

/// Thresholds for the recurring-transfer (Potential DCA) heuristic
#[derive(Debug, Clone, PartialEq)]
pub struct RecurrenceConfig {
    /// Amounts within this distance are treated as the same amount
    pub amount_tolerance: Decimal,
    /// Maximum day-of-month drift between occurrences
    pub day_tolerance: u32,
    /// Minimum occurrences, each in a distinct calendar month
    pub min_occurrences: usize,
}

impl Default for RecurrenceConfig {
    fn default() -> Self {
        Self {
            amount_tolerance: Decimal::new(1, 2),
            day_tolerance: 3,
            min_occurrences: 2,
        }
    }
}

/// Everything a report run can be tuned with
#[derive(Debug, Clone, PartialEq)]
pub struct ReportConfig {
    /// Inflows at or above this are relabelled as large payments
    pub large_amount_threshold: Decimal,
    /// Description keywords that turn a large inflow into a bonus
    pub bonus_keywords: Vec<String>,
    pub top_n: usize,
    /// Categories left out of the top-expenses view
    pub excluded_expense_categories: BTreeSet<Category>,
    /// Description keywords left out of the top-expenses view (housing, rent)
    pub excluded_expense_keywords: Vec<String>,
    /// Categories that are neither income nor expense
    pub internal_transfer_categories: BTreeSet<Category>,
    pub savings_transfer_raw_types: Vec<String>,
    pub bitcoin_raw_types: Vec<String>,
    pub recurrence: RecurrenceConfig,
}

impl Default for ReportConfig {
    fn default() -> Self {
        let mut excluded_expense_categories = BTreeSet::from([Category::Transfer]);
        excluded_expense_categories.extend(Category::INVESTMENTS);

        Self {
            large_amount_threshold: Decimal::from(10_000),
            bonus_keywords: strings(&["bonus", "commission", "award", "incentive"]),
            top_n: 5,
            excluded_expense_categories,
            excluded_expense_keywords: strings(&["rent", "housing", "mortgage", "lease"]),
            internal_transfer_categories: BTreeSet::from([Category::Transfer]),
            savings_transfer_raw_types: strings(&["Savings", "Savings Internal Transfer"]),
            bitcoin_raw_types: strings(&["Bitcoin Buy", "Bitcoin Recurring Buy"]),
            recurrence: RecurrenceConfig::default(),
        }
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

impl ReportConfig {
    /// Load from the default override location, or the embedded defaults
    pub fn load() -> Result<Self> {
        load_config(None)
    }

    /// Load from an explicit path; a missing file falls back to defaults
    pub fn from_path(path: &Path) -> Result<Self> {
        load_config(Some(path))
    }

    /// Parse TOML content, merged over the defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        parse_config(content)
    }

    pub fn is_savings_transfer(&self, raw_type: Option<&str>) -> bool {
        matches_raw_type(&self.savings_transfer_raw_types, raw_type)
    }

    pub fn is_bitcoin_buy(&self, raw_type: Option<&str>) -> bool {
        matches_raw_type(&self.bitcoin_raw_types, raw_type)
    }

    pub fn is_internal_transfer(&self, category: Category) -> bool {
        self.internal_transfer_categories.contains(&category)
    }
}

fn matches_raw_type(types: &[String], raw_type: Option<&str>) -> bool {
    match raw_type {
        Some(raw) => types.iter().any(|t| t.trim() == raw.trim()),
        None => false,
    }
}

/// Get the default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("cashlens").join("config").join("report.toml"))
}

/// Load configuration (override first, then default)
fn load_config(override_path: Option<&Path>) -> Result<ReportConfig> {
    let path = match override_path {
        Some(path) => Some(path.to_path_buf()),
        None => default_config_path(),
    };

    let content = match path {
        Some(path) if path.exists() => fs::read_to_string(&path).map_err(|e| {
            Error::Config(format!("Failed to read config {}: {}", path.display(), e))
        })?,
        _ => DEFAULT_CONFIG.to_string(),
    };

    parse_config(&content)
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    classification: Option<RawClassification>,
    reporting: Option<RawReporting>,
    recurrence: Option<RawRecurrence>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawClassification {
    large_amount_threshold: Option<Decimal>,
    bonus_keywords: Option<Vec<String>>,
    savings_transfer_raw_types: Option<Vec<String>>,
    bitcoin_raw_types: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawReporting {
    top_n: Option<usize>,
    excluded_expense_categories: Option<Vec<String>>,
    excluded_expense_keywords: Option<Vec<String>>,
    internal_transfer_categories: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRecurrence {
    amount_tolerance: Option<Decimal>,
    day_tolerance: Option<u32>,
    min_occurrences: Option<usize>,
}

/// Parse config from TOML content
fn parse_config(content: &str) -> Result<ReportConfig> {
    let raw: RawConfig = toml::from_str(content)
        .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

    let mut config = ReportConfig::default();

    if let Some(classification) = raw.classification {
        if let Some(threshold) = classification.large_amount_threshold {
            if threshold <= Decimal::ZERO {
                return Err(Error::Config(format!(
                    "large_amount_threshold must be positive, got {}",
                    threshold
                )));
            }
            config.large_amount_threshold = threshold;
        }
        if let Some(keywords) = classification.bonus_keywords {
            config.bonus_keywords = keywords;
        }
        if let Some(types) = classification.savings_transfer_raw_types {
            config.savings_transfer_raw_types = types;
        }
        if let Some(types) = classification.bitcoin_raw_types {
            config.bitcoin_raw_types = types;
        }
    }

    if let Some(reporting) = raw.reporting {
        if let Some(top_n) = reporting.top_n {
            config.top_n = top_n;
        }
        if let Some(labels) = reporting.excluded_expense_categories {
            config.excluded_expense_categories = parse_categories(&labels)?;
        }
        if let Some(keywords) = reporting.excluded_expense_keywords {
            config.excluded_expense_keywords = keywords;
        }
        if let Some(labels) = reporting.internal_transfer_categories {
            config.internal_transfer_categories = parse_categories(&labels)?;
        }
    }

    if let Some(recurrence) = raw.recurrence {
        if let Some(tolerance) = recurrence.amount_tolerance {
            config.recurrence.amount_tolerance = tolerance.abs();
        }
        if let Some(days) = recurrence.day_tolerance {
            config.recurrence.day_tolerance = days;
        }
        if let Some(min) = recurrence.min_occurrences {
            config.recurrence.min_occurrences = min.max(2);
        }
    }

    Ok(config)
}

fn parse_categories(labels: &[String]) -> Result<BTreeSet<Category>> {
    labels
        .iter()
        .map(|label| label.parse::<Category>().map_err(Error::Config))
        .collect()
}
