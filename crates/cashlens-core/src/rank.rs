//! Top-N ranking
//!
//! Rows are ranked by their own magnitude (`|amount|`), largest first. Ties
//! go to the earlier date, then to import order, so the same input always
//! ranks the same way. Asking for more rows than are eligible returns every
//! eligible row.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use regex::{Regex, RegexBuilder};
use rust_decimal::Decimal;

use crate::config::ReportConfig;
use crate::error::Result;
use crate::models::{Category, ClassifiedSet, RankedCategory, RankedList, RankedTransaction, Transaction};

/// Transactions a ranking should skip
#[derive(Debug, Clone, Default)]
pub struct Exclusion {
    pub categories: BTreeSet<Category>,
    /// Any keyword as a whole word, case-insensitive ("rent" but not "Current")
    description_pattern: Option<Regex>,
}

impl Exclusion {
    /// Excludes nothing
    pub fn none() -> Self {
        Self::default()
    }

    pub fn new(categories: BTreeSet<Category>, description_keywords: &[String]) -> Result<Self> {
        let keywords: Vec<String> = description_keywords
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .map(regex::escape)
            .collect();

        let description_pattern = if keywords.is_empty() {
            None
        } else {
            let pattern = format!(r"\b(?:{})\b", keywords.join("|"));
            Some(RegexBuilder::new(&pattern).case_insensitive(true).build()?)
        };

        Ok(Self {
            categories,
            description_pattern,
        })
    }

    /// The top-expenses exclusion: transfer/investment categories plus housing keywords
    pub fn for_expenses(config: &ReportConfig) -> Result<Self> {
        Self::new(
            config.excluded_expense_categories.clone(),
            &config.excluded_expense_keywords,
        )
    }

    pub fn excludes(&self, transaction: &Transaction) -> bool {
        if self.categories.contains(&transaction.category) {
            return true;
        }
        match &self.description_pattern {
            Some(pattern) => pattern.is_match(&transaction.description),
            None => false,
        }
    }
}

/// Ordering for ranked rows: |amount| desc, then date asc, then import order
pub(crate) fn by_magnitude(a: &Transaction, b: &Transaction) -> Ordering {
    b.magnitude()
        .cmp(&a.magnitude())
        .then_with(|| a.date.cmp(&b.date))
        .then_with(|| a.index.cmp(&b.index))
}

fn rank<'a>(rows: impl Iterator<Item = &'a Transaction>, n: usize) -> RankedList {
    let mut rows: Vec<&Transaction> = rows.collect();
    rows.sort_by(|a, b| by_magnitude(a, b));

    rows.into_iter()
        .take(n)
        .enumerate()
        .map(|(i, tx)| RankedTransaction {
            rank: i + 1,
            transaction: tx.clone(),
        })
        .collect()
}

/// Top `n` transactions of any sign not covered by `exclude`
pub fn top_n(set: &ClassifiedSet, n: usize, exclude: &Exclusion) -> RankedList {
    rank(set.iter().filter(|tx| !exclude.excludes(tx)), n)
}

/// Top `n` outflows not covered by `exclude`
pub fn top_expense_transactions(set: &ClassifiedSet, n: usize, exclude: &Exclusion) -> RankedList {
    rank(
        set.iter()
            .filter(|tx| tx.amount < Decimal::ZERO && !exclude.excludes(tx)),
        n,
    )
}

/// Inflows at or above `threshold`, largest first
pub fn large_inflows(set: &ClassifiedSet, threshold: Decimal) -> RankedList {
    rank(
        set.iter().filter(|tx| tx.amount >= threshold && tx.amount > Decimal::ZERO),
        usize::MAX,
    )
}

/// Top `n` expense categories by `|Σ outflows|`; ties go to registry order
pub fn top_categories(set: &ClassifiedSet, n: usize, exclude: &Exclusion) -> Vec<RankedCategory> {
    let mut sums: BTreeMap<Category, (Decimal, usize)> = BTreeMap::new();
    for tx in set
        .iter()
        .filter(|tx| tx.amount < Decimal::ZERO && !exclude.excludes(tx))
    {
        let entry = sums.entry(tx.category).or_default();
        entry.0 += tx.amount;
        entry.1 += 1;
    }

    let mut ranked: Vec<(Category, Decimal, usize)> = sums
        .into_iter()
        .map(|(category, (sum, count))| (category, sum.abs(), count))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    ranked
        .into_iter()
        .take(n)
        .enumerate()
        .map(|(i, (category, total, transaction_count))| RankedCategory {
            rank: i + 1,
            category,
            total,
            transaction_count,
        })
        .collect()
}
