//! Cashlens Core Library
//!
//! Classification and reporting for personal-finance transaction exports:
//! - Canonical category registry
//! - Ordered, first-match-wins category rule set (built in or from TOML)
//! - Classifier with investment refinement and large-inflow override
//! - Recurring-transfer (Potential DCA) detection
//! - Aggregation into category, monthly and income/expense/investment totals,
//!   cash-flow and savings-rate figures
//! - Deterministic top-N ranking
//! - Zero-filled monthly trend series
//! - Report assembly into a single read-only model, optionally for a date window
//!
//! The pipeline is a pure function of the records and the configuration; it
//! does no I/O apart from loading configuration files on request.

pub mod aggregate;
pub mod classify;
pub mod config;
pub mod error;
pub mod investment;
pub mod models;
pub mod rank;
pub mod report;
pub mod rules;
pub mod trend;

pub use aggregate::{aggregate, Flow};
pub use classify::{Classification, Classifier};
pub use config::{default_config_path, RecurrenceConfig, ReportConfig};
pub use error::{Error, Result};
pub use investment::{detect_recurring, InvestmentClassifier, RecurrenceCandidate};
pub use models::*;
pub use rank::{large_inflows, top_categories, top_expense_transactions, top_n, Exclusion};
pub use report::{assemble, generate_report, ReportGenerator};
pub use rules::{PatternType, Predicate, Rule, RuleSet};
pub use trend::{build_trend, month_window, standard_trends, SeriesSelector};
