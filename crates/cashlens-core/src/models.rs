//! Domain models for Cashlens

use std::collections::BTreeMap;

use chrono::{Datelike, Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};

/// Version of the closed category label set.
///
/// Bump when a label is added, removed or renamed; labels are used as keys by
/// presentation layers, so renaming one is a breaking change.
pub const CATEGORY_SET_VERSION: u32 = 1;

/// The closed set of transaction categories
///
/// Declaration order is the canonical registry order: it drives listing,
/// breakdown ordering and tie-breaks between categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Food & Dining")]
    FoodDining,
    #[serde(rename = "Shopping")]
    Shopping,
    #[serde(rename = "Transportation")]
    Transportation,
    #[serde(rename = "Bills & Utilities")]
    BillsUtilities,
    #[serde(rename = "Entertainment")]
    Entertainment,
    #[serde(rename = "Transfer")]
    Transfer,
    #[serde(rename = "ATM")]
    Atm,
    #[serde(rename = "Income")]
    Income,
    #[serde(rename = "Health & Medical")]
    HealthMedical,
    #[serde(rename = "Education")]
    Education,
    #[serde(rename = "Personal Care")]
    PersonalCare,
    #[serde(rename = "Investment (Bitcoin)")]
    InvestmentBitcoin,
    #[serde(rename = "Investment (DCA Savings)")]
    InvestmentDcaSavings,
    #[serde(rename = "Investment (Bitcoin Savings)")]
    InvestmentBitcoinSavings,
    #[serde(rename = "Investment (Potential DCA)")]
    InvestmentPotentialDca,
    #[serde(rename = "Bonus/Large Payment")]
    BonusLargePayment,
    #[serde(rename = "Large Income/Payment")]
    LargeIncomePayment,
    #[serde(rename = "Other")]
    Other,
}

impl Category {
    /// Every category, in registry order
    pub const ALL: [Category; 18] = [
        Self::FoodDining,
        Self::Shopping,
        Self::Transportation,
        Self::BillsUtilities,
        Self::Entertainment,
        Self::Transfer,
        Self::Atm,
        Self::Income,
        Self::HealthMedical,
        Self::Education,
        Self::PersonalCare,
        Self::InvestmentBitcoin,
        Self::InvestmentDcaSavings,
        Self::InvestmentBitcoinSavings,
        Self::InvestmentPotentialDca,
        Self::BonusLargePayment,
        Self::LargeIncomePayment,
        Self::Other,
    ];

    /// The four investment categories, always reported together
    pub const INVESTMENTS: [Category; 4] = [
        Self::InvestmentBitcoin,
        Self::InvestmentDcaSavings,
        Self::InvestmentBitcoinSavings,
        Self::InvestmentPotentialDca,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::FoodDining => "Food & Dining",
            Self::Shopping => "Shopping",
            Self::Transportation => "Transportation",
            Self::BillsUtilities => "Bills & Utilities",
            Self::Entertainment => "Entertainment",
            Self::Transfer => "Transfer",
            Self::Atm => "ATM",
            Self::Income => "Income",
            Self::HealthMedical => "Health & Medical",
            Self::Education => "Education",
            Self::PersonalCare => "Personal Care",
            Self::InvestmentBitcoin => "Investment (Bitcoin)",
            Self::InvestmentDcaSavings => "Investment (DCA Savings)",
            Self::InvestmentBitcoinSavings => "Investment (Bitcoin Savings)",
            Self::InvestmentPotentialDca => "Investment (Potential DCA)",
            Self::BonusLargePayment => "Bonus/Large Payment",
            Self::LargeIncomePayment => "Large Income/Payment",
            Self::Other => "Other",
        }
    }

    pub fn is_investment(&self) -> bool {
        Self::INVESTMENTS.contains(self)
    }

    /// Whether this label comes from a heuristic rather than a deterministic rule
    pub fn is_probabilistic(&self) -> bool {
        matches!(self, Self::InvestmentPotentialDca)
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("Unknown category: {}", s))
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A calendar month, used as the bucket key for monthly totals and trends
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Month {
    year: i32,
    month: u32,
}

impl Month {
    /// Returns `None` if `month` is outside 1..=12
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// Every month from `first` to `last` inclusive (empty if `last < first`)
    pub fn range_inclusive(first: Month, last: Month) -> Vec<Month> {
        let mut months = Vec::new();
        let mut current = first;
        while current <= last {
            months.push(current);
            current = current.next();
        }
        months
    }
}

impl std::fmt::Display for Month {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl std::str::FromStr for Month {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (year, month) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| format!("Invalid month (use YYYY-MM): {}", s))?;
        let year: i32 = year
            .parse()
            .map_err(|_| format!("Invalid month (use YYYY-MM): {}", s))?;
        let month: u32 = month
            .parse()
            .map_err(|_| format!("Invalid month (use YYYY-MM): {}", s))?;
        Month::new(year, month).ok_or_else(|| format!("Invalid month (use YYYY-MM): {}", s))
    }
}

impl Serialize for Month {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Month {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Parse a plain numeric amount (e.g. "-12.50")
///
/// The core does not strip currency symbols or thousands separators; those
/// belong to the upstream normalizer. Anything that is not a number is
/// rejected.
pub fn parse_amount(text: &str) -> Result<Decimal> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInput("amount is empty".to_string()));
    }
    trimmed
        .parse::<Decimal>()
        .map_err(|_| Error::InvalidInput(format!("amount is not numeric: {:?}", text)))
}

/// A normalized transaction record, before classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub date: NaiveDate,
    /// Negative = outflow, positive = inflow. `None` is rejected at classification.
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub description: String,
    /// Source-system transaction type (e.g. "Bitcoin Buy", "Savings")
    #[serde(default)]
    pub raw_type: Option<String>,
}

impl TransactionRecord {
    /// Build a record; an empty `raw_type` is stored as absent
    pub fn new(
        date: NaiveDate,
        amount: Decimal,
        description: impl Into<String>,
        raw_type: impl Into<String>,
    ) -> Self {
        let raw_type = raw_type.into();
        Self {
            date,
            amount: Some(amount),
            description: description.into(),
            raw_type: if raw_type.trim().is_empty() {
                None
            } else {
                Some(raw_type)
            },
        }
    }

    pub fn raw_type(&self) -> Option<&str> {
        self.raw_type
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

/// How a transaction's category was decided
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CategoryBasis {
    /// A rule in the category rule set matched
    Rule { rule_id: String },
    /// Refined by the investment sub-classifier
    Investment { rule_id: String },
    /// Recurring-transfer heuristic (best effort)
    Recurrence,
    /// Large inflow override
    Magnitude,
    /// Nothing matched
    Fallback,
}

/// A classified transaction. Immutable once part of a [`ClassifiedSet`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Position in the imported input
    pub index: usize,
    pub date: NaiveDate,
    /// Negative = outflow, positive = inflow
    pub amount: Decimal,
    pub description: String,
    pub raw_type: Option<String>,
    pub category: Category,
    pub basis: CategoryBasis,
}

impl Transaction {
    /// Absolute value of this single row
    pub fn magnitude(&self) -> Decimal {
        self.amount.abs()
    }

    pub fn month(&self) -> Month {
        Month::of(self.date)
    }
}

/// Classified transactions in import order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ClassifiedSet {
    transactions: Vec<Transaction>,
}

impl ClassifiedSet {
    pub fn new(transactions: Vec<Transaction>) -> Self {
        Self { transactions }
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Transaction> {
        self.transactions.iter()
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.transactions.iter().map(|t| t.date).min()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.transactions.iter().map(|t| t.date).max()
    }

    /// Transactions dated inside `window`; each keeps its import index
    pub fn within(&self, window: &ReportPeriod) -> ClassifiedSet {
        Self::new(
            self.transactions
                .iter()
                .filter(|t| window.contains(t.date))
                .cloned()
                .collect(),
        )
    }
}

impl<'a> IntoIterator for &'a ClassifiedSet {
    type Item = &'a Transaction;
    type IntoIter = std::slice::Iter<'a, Transaction>;

    fn into_iter(self) -> Self::IntoIter {
        self.transactions.iter()
    }
}

// ========== Report Models ==========

/// Date span covered by a report, inclusive at both ends
///
/// Also used as a report window; a missing bound is open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportPeriod {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl ReportPeriod {
    pub fn between(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
        }
    }

    /// The `months` calendar months ending on `end`
    pub fn months_back(end: NaiveDate, months: u32) -> Self {
        Self {
            from: end.checked_sub_months(Months::new(months)),
            to: Some(end),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.map_or(true, |from| date >= from) && self.to.map_or(true, |to| date <= to)
    }
}

/// Headline totals
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryTotals {
    /// |sum| of income rows
    pub income_total: Decimal,
    /// |sum| of expense rows
    pub expense_total: Decimal,
    /// |sum| of rows in any investment category
    pub investment_total: Decimal,
    /// Signed sum of every row
    pub net_total: Decimal,
    /// income - expenses
    pub net_cash_flow_excluding_investments: Decimal,
    /// income - expenses - investments
    pub net_cash_flow_including_investments: Decimal,
    /// Percentages of income; `None` when there is no income
    pub cash_savings_rate: Option<f64>,
    pub investment_rate: Option<f64>,
    /// Cash savings rate plus investment rate
    pub total_savings_rate: Option<f64>,
    /// Category with the most transactions; ties go to registry order
    pub most_frequent_category: Option<Category>,
    /// Most negative expense row
    pub largest_expense: Option<Transaction>,
    /// Most positive income row
    pub largest_income: Option<Transaction>,
}

/// One category's share of the report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryShare {
    pub category: Category,
    /// Signed total
    pub total: Decimal,
    /// |total| as a percentage of the sum of every category's |total|
    pub percentage: f64,
    pub transaction_count: usize,
    /// Signed total per transaction
    pub average: Decimal,
}

/// One line of the investment breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentLine {
    pub category: Category,
    /// |sum| of the category's rows
    pub total: Decimal,
    pub transaction_count: usize,
    /// True for heuristic categories (Potential DCA)
    pub probabilistic: bool,
}

/// Output of the aggregator
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregateResult {
    pub period: ReportPeriod,
    pub transaction_count: usize,
    /// Signed total per category present in the input
    pub category_totals: BTreeMap<Category, Decimal>,
    pub category_counts: BTreeMap<Category, usize>,
    pub category_breakdown: Vec<CategoryShare>,
    /// Signed total per calendar month present in the input
    pub monthly_totals: BTreeMap<Month, Decimal>,
    /// All four investment categories, zero when absent
    pub investment_breakdown: Vec<InvestmentLine>,
    pub summary: SummaryTotals,
}

/// A transaction and its 1-based rank
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedTransaction {
    pub rank: usize,
    pub transaction: Transaction,
}

/// Transactions ordered by descending magnitude
pub type RankedList = Vec<RankedTransaction>;

/// A category ranked by the magnitude of its summed expense rows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedCategory {
    pub rank: usize,
    pub category: Category,
    /// |sum| of the category's eligible rows
    pub total: Decimal,
    pub transaction_count: usize,
}

/// Every eligible row of each ranked view, fully ordered
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RankedLists {
    pub transactions: RankedList,
    /// Outflows with housing/rent and transfer/investment categories excluded
    pub expense_transactions: RankedList,
    pub expense_categories: Vec<RankedCategory>,
    /// Inflows at or above the large-amount threshold
    pub large_inflows: RankedList,
}

/// A single data point in a trend series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub period: Month,
    pub value: Decimal,
    pub transaction_count: usize,
}

/// A contiguous monthly series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendSeries {
    pub name: String,
    pub points: Vec<TrendPoint>,
    /// Exactly one period: render as a bar, not a line
    pub is_single_point: bool,
}

impl TrendSeries {
    pub fn new(name: impl Into<String>, points: Vec<TrendPoint>) -> Self {
        let is_single_point = points.len() == 1;
        Self {
            name: name.into(),
            points,
            is_single_point,
        }
    }

    pub fn is_single_point(&self) -> bool {
        self.is_single_point
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// The assembled report; the only contract presentation layers consume
///
/// The `top_*` fields hold the first `top_n` entries of each view; the
/// accessors of the same name slice the full ranking, so any `n` works.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReportModel {
    pub period: ReportPeriod,
    pub transaction_count: usize,
    pub summary_totals: SummaryTotals,
    pub category_totals: BTreeMap<Category, Decimal>,
    pub category_breakdown: Vec<CategoryShare>,
    pub monthly_totals: BTreeMap<Month, Decimal>,
    /// All categories, unfiltered
    pub top_transactions: RankedList,
    /// Expense rows with housing/rent and transfer/investment categories excluded
    pub top_expense_transactions: RankedList,
    pub top_expense_categories: Vec<RankedCategory>,
    pub investment_breakdown: Vec<InvestmentLine>,
    /// Inflows at or above the large-amount threshold
    pub large_inflows: RankedList,
    pub trends: Vec<TrendSeries>,
    #[serde(skip)]
    pub(crate) ranked: RankedLists,
}

impl ReportModel {
    pub fn category_totals(&self) -> &BTreeMap<Category, Decimal> {
        &self.category_totals
    }

    pub fn summary_totals(&self) -> &SummaryTotals {
        &self.summary_totals
    }

    /// The `n` largest rows of any sign (fewer if fewer exist)
    pub fn top_transactions(&self, n: usize) -> &[RankedTransaction] {
        head(&self.ranked.transactions, n)
    }

    pub fn top_expense_transactions(&self, n: usize) -> &[RankedTransaction] {
        head(&self.ranked.expense_transactions, n)
    }

    pub fn top_expense_categories(&self, n: usize) -> &[RankedCategory] {
        head(&self.ranked.expense_categories, n)
    }

    /// Look up a trend by series name ("net", "income", "expenses",
    /// "investments" or a category label). Exact names win over
    /// case-insensitive ones, so "Income" is the category and "income" the
    /// summary view.
    pub fn monthly_trend(&self, series_name: &str) -> Option<&TrendSeries> {
        let wanted = series_name.trim();
        self.trends
            .iter()
            .find(|s| s.name == wanted)
            .or_else(|| self.trends.iter().find(|s| s.name.eq_ignore_ascii_case(wanted)))
    }
}

fn head<T>(items: &[T], n: usize) -> &[T] {
    &items[..n.min(items.len())]
}
