//! Monthly trend series
//!
//! Every series covers the full window of the classified set, first month to
//! last month inclusive, so series from the same report line up point for
//! point. Months with no matching rows are zero.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::aggregate::Flow;
use crate::config::ReportConfig;
use crate::models::{Category, ClassifiedSet, Month, Transaction, TrendPoint, TrendSeries};

/// Which rows a series sums
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesSelector {
    /// Signed sum of every row
    Net,
    /// |Σ| of income rows
    Income,
    /// |Σ| of expense rows
    Expenses,
    /// |Σ| of investment rows
    Investments,
    /// Signed sum of one category's rows
    Category(Category),
}

impl SeriesSelector {
    pub fn name(&self) -> String {
        match self {
            Self::Net => "net".to_string(),
            Self::Income => "income".to_string(),
            Self::Expenses => "expenses".to_string(),
            Self::Investments => "investments".to_string(),
            Self::Category(category) => category.label().to_string(),
        }
    }

    fn selects(&self, tx: &Transaction, config: &ReportConfig) -> bool {
        match self {
            Self::Net => true,
            Self::Income => Flow::of(tx, config) == Some(Flow::Income),
            Self::Expenses => Flow::of(tx, config) == Some(Flow::Expense),
            Self::Investments => Flow::of(tx, config) == Some(Flow::Investment),
            Self::Category(category) => tx.category == *category,
        }
    }

    fn is_scalar(&self) -> bool {
        matches!(self, Self::Income | Self::Expenses | Self::Investments)
    }
}

impl std::str::FromStr for SeriesSelector {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "net" => Ok(Self::Net),
            "income" => Ok(Self::Income),
            "expenses" => Ok(Self::Expenses),
            "investments" => Ok(Self::Investments),
            _ => s
                .parse::<Category>()
                .map(Self::Category)
                .map_err(|_| format!("Unknown series: {}", s)),
        }
    }
}

/// Months from the set's first to last transaction, inclusive
pub fn month_window(set: &ClassifiedSet) -> Vec<Month> {
    match (set.first_date(), set.last_date()) {
        (Some(first), Some(last)) => Month::range_inclusive(Month::of(first), Month::of(last)),
        _ => Vec::new(),
    }
}

/// Build one zero-filled monthly series
pub fn build_trend(set: &ClassifiedSet, selector: SeriesSelector, config: &ReportConfig) -> TrendSeries {
    let mut sums: BTreeMap<Month, (Decimal, usize)> = BTreeMap::new();
    for tx in set.iter().filter(|tx| selector.selects(tx, config)) {
        let entry = sums.entry(tx.month()).or_default();
        entry.0 += tx.amount;
        entry.1 += 1;
    }

    let points = month_window(set)
        .into_iter()
        .map(|period| {
            let (sum, transaction_count) = sums.get(&period).copied().unwrap_or_default();
            let value = if selector.is_scalar() { sum.abs() } else { sum };
            TrendPoint {
                period,
                value,
                transaction_count,
            }
        })
        .collect();

    TrendSeries::new(selector.name(), points)
}

/// The series every report carries: the four summary views plus one per
/// category present in the set
pub fn standard_trends(set: &ClassifiedSet, config: &ReportConfig) -> Vec<TrendSeries> {
    let mut selectors = vec![
        SeriesSelector::Net,
        SeriesSelector::Income,
        SeriesSelector::Expenses,
        SeriesSelector::Investments,
    ];
    selectors.extend(
        Category::ALL
            .iter()
            .filter(|category| set.iter().any(|tx| tx.category == **category))
            .map(|category| SeriesSelector::Category(*category)),
    );

    selectors
        .into_iter()
        .map(|selector| build_trend(set, selector, config))
        .collect()
}
