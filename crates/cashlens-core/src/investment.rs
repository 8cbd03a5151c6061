//! Investment sub-classifier
//!
//! Refines a generic savings transfer (or a Bitcoin raw type) into one of the
//! investment categories. Marker phrases are checked before raw types, so a
//! savings transfer "for purchase of BTC" is Bitcoin Savings and never DCA
//! Savings.
//!
//! Transfers that carry no marker get a second look in [`detect_recurring`]:
//! the same amount moved on roughly the same day of the month, in several
//! months, is most likely a manual DCA schedule. That label is a guess and is
//! reported as such.

use std::collections::{BTreeSet, HashSet};

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use tracing::debug;

use crate::config::{RecurrenceConfig, ReportConfig};
use crate::models::{Category, Month, TransactionRecord};
use crate::rules::{Predicate, Rule};

/// Marker phrase for savings transfers that fund a Bitcoin purchase
pub const BITCOIN_SAVINGS_MARKER: &str = "purchase of BTC";
/// Marker phrase for plain savings transfers
pub const SAVINGS_MARKER: &str = "Savings";

/// Marker-and-raw-type refinement, evaluated with the rule-set matcher
#[derive(Debug, Clone)]
pub struct InvestmentClassifier {
    rules: Vec<Rule>,
}

impl InvestmentClassifier {
    pub fn new(config: &ReportConfig) -> Self {
        Self {
            rules: vec![
                Rule::new(
                    "bitcoin-savings",
                    Predicate::contains_any(&[BITCOIN_SAVINGS_MARKER]),
                    Category::InvestmentBitcoinSavings,
                ),
                Rule::new(
                    "dca-savings",
                    Predicate::contains_any(&[SAVINGS_MARKER]),
                    Category::InvestmentDcaSavings,
                ),
                Rule::new(
                    "bitcoin",
                    Predicate::raw_type_in(&config.bitcoin_raw_types),
                    Category::InvestmentBitcoin,
                ),
            ],
        }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// The refinement rule for this record, or `None` if only the
    /// recurrence heuristic can decide
    pub fn refine(&self, record: &TransactionRecord) -> Option<&Rule> {
        let rule = self.rules.iter().find(|rule| rule.matches(record));
        if let Some(rule) = rule {
            debug!(
                "Investment rule '{}' matched for '{}': {}",
                rule.id, record.description, rule.category
            );
        }
        rule
    }
}

impl Default for InvestmentClassifier {
    fn default() -> Self {
        Self::new(&ReportConfig::default())
    }
}

/// A transfer waiting on the recurrence check
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecurrenceCandidate {
    pub index: usize,
    pub date: NaiveDate,
    pub amount: Decimal,
}

/// Indices of candidates that look like part of a recurring schedule
///
/// A candidate qualifies when at least `min_occurrences` candidates (itself
/// included) share its sign, sit within `amount_tolerance` of its amount and
/// within `day_tolerance` of its day of month, spread over that many distinct
/// calendar months.
pub fn detect_recurring(
    candidates: &[RecurrenceCandidate],
    config: &RecurrenceConfig,
) -> HashSet<usize> {
    let mut recurring = HashSet::new();

    for candidate in candidates {
        let months: BTreeSet<Month> = candidates
            .iter()
            .filter(|other| is_repeat_of(candidate, other, config))
            .map(|other| Month::of(other.date))
            .collect();

        if months.len() >= config.min_occurrences {
            debug!(
                "Recurring transfer of {} on day {} seen in {} months",
                candidate.amount,
                candidate.date.day(),
                months.len()
            );
            recurring.insert(candidate.index);
        }
    }

    recurring
}

fn is_repeat_of(
    a: &RecurrenceCandidate,
    b: &RecurrenceCandidate,
    config: &RecurrenceConfig,
) -> bool {
    a.amount.is_sign_negative() == b.amount.is_sign_negative()
        && (a.amount - b.amount).abs() <= config.amount_tolerance
        && day_of_month_distance(a.date, b.date) <= config.day_tolerance
}

/// Distance between two days of month, wrapping at month end (30th vs 1st is 1-2 days)
fn day_of_month_distance(a: NaiveDate, b: NaiveDate) -> u32 {
    let diff = a.day().abs_diff(b.day());
    diff.min(31 - diff)
}
