//! Aggregation of classified transactions
//!
//! Two reductions are used and never swapped:
//! - scalar totals take the absolute value of a signed sum (`|Σ rows|`)
//! - per-row views (ranking) take the absolute value of each row (`|row|`)
//!
//! Income, expense and investment are disjoint views. Internal transfers
//! (money moved between the user's own accounts) belong to none of them.
//!
//! Sums use plain `+=`: [`Classifier::classify_all`](crate::Classifier::classify_all)
//! rejects imports whose `Σ|amount|` does not fit in a `Decimal`, and every
//! total here is bounded by that sum.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::config::ReportConfig;
use crate::models::{
    AggregateResult, Category, CategoryShare, ClassifiedSet, InvestmentLine, Month,
    ReportPeriod, SummaryTotals, Transaction,
};
use crate::rank::by_magnitude;

/// Which summary view a transaction counts toward
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Income,
    Expense,
    Investment,
}

impl Flow {
    /// `None` for internal transfers and zero-amount rows
    pub fn of(transaction: &Transaction, config: &ReportConfig) -> Option<Flow> {
        if transaction.category.is_investment() {
            return Some(Flow::Investment);
        }
        if config.is_internal_transfer(transaction.category) {
            return None;
        }
        if transaction.amount > Decimal::ZERO {
            Some(Flow::Income)
        } else if transaction.amount < Decimal::ZERO {
            Some(Flow::Expense)
        } else {
            None
        }
    }
}

/// Fold a classified set into totals
pub fn aggregate(set: &ClassifiedSet, config: &ReportConfig) -> AggregateResult {
    let mut category_totals: BTreeMap<Category, Decimal> = BTreeMap::new();
    let mut category_counts: BTreeMap<Category, usize> = BTreeMap::new();
    let mut monthly_totals: BTreeMap<Month, Decimal> = BTreeMap::new();

    let mut income = Decimal::ZERO;
    let mut expense = Decimal::ZERO;
    let mut investment = Decimal::ZERO;
    let mut net = Decimal::ZERO;
    let mut largest_expense: Option<&Transaction> = None;
    let mut largest_income: Option<&Transaction> = None;

    for tx in set {
        *category_totals.entry(tx.category).or_default() += tx.amount;
        *category_counts.entry(tx.category).or_default() += 1;
        *monthly_totals.entry(tx.month()).or_default() += tx.amount;
        net += tx.amount;

        match Flow::of(tx, config) {
            Some(Flow::Income) => {
                income += tx.amount;
                keep_larger(&mut largest_income, tx);
            }
            Some(Flow::Expense) => {
                expense += tx.amount;
                keep_larger(&mut largest_expense, tx);
            }
            Some(Flow::Investment) => investment += tx.amount,
            None => {}
        }
    }

    let income_total = income.abs();
    let expense_total = expense.abs();
    let investment_total = investment.abs();
    let net_excluding = income_total - expense_total;

    let (cash_savings_rate, investment_rate) = if income_total > Decimal::ZERO {
        (
            percent_of(net_excluding, income_total),
            percent_of(investment_total, income_total),
        )
    } else {
        (None, None)
    };
    let total_savings_rate = cash_savings_rate.zip(investment_rate).map(|(cash, inv)| cash + inv);

    // Ties go to the earlier category in registry order
    let most_frequent_category = category_counts
        .iter()
        .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
        .map(|(category, _)| *category);

    let category_breakdown = category_breakdown(&category_totals, &category_counts);
    let investment_breakdown = Category::INVESTMENTS
        .iter()
        .map(|category| InvestmentLine {
            category: *category,
            total: category_totals.get(category).copied().unwrap_or_default().abs(),
            transaction_count: category_counts.get(category).copied().unwrap_or_default(),
            probabilistic: category.is_probabilistic(),
        })
        .collect();

    AggregateResult {
        period: ReportPeriod {
            from: set.first_date(),
            to: set.last_date(),
        },
        transaction_count: set.len(),
        category_totals,
        category_counts,
        category_breakdown,
        monthly_totals,
        investment_breakdown,
        summary: SummaryTotals {
            income_total,
            expense_total,
            investment_total,
            net_total: net,
            net_cash_flow_excluding_investments: net_excluding,
            net_cash_flow_including_investments: net_excluding - investment_total,
            cash_savings_rate,
            investment_rate,
            total_savings_rate,
            most_frequent_category,
            largest_expense: largest_expense.cloned(),
            largest_income: largest_income.cloned(),
        },
    }
}

/// Largest by magnitude, ranked the same way as the top-N lists
fn keep_larger<'a>(best: &mut Option<&'a Transaction>, candidate: &'a Transaction) {
    let replace = match best {
        Some(current) => by_magnitude(candidate, *current) == Ordering::Less,
        None => true,
    };
    if replace {
        *best = Some(candidate);
    }
}

/// `part / whole` as a percentage; `None` if it does not fit
fn percent_of(part: Decimal, whole: Decimal) -> Option<f64> {
    part.checked_div(whole)?
        .checked_mul(Decimal::ONE_HUNDRED)?
        .to_f64()
}

/// Per-category share of `Σ_k |total(k)|`, in registry order
fn category_breakdown(
    totals: &BTreeMap<Category, Decimal>,
    counts: &BTreeMap<Category, usize>,
) -> Vec<CategoryShare> {
    let denominator: Decimal = totals.values().map(|total| total.abs()).sum();

    totals
        .iter()
        .map(|(category, total)| {
            let percentage = if denominator.is_zero() {
                0.0
            } else {
                (total.abs() / denominator * Decimal::ONE_HUNDRED)
                    .to_f64()
                    .unwrap_or_default()
            };
            let transaction_count = counts.get(category).copied().unwrap_or_default();
            CategoryShare {
                category: *category,
                total: *total,
                percentage,
                transaction_count,
                average: total
                    .checked_div(Decimal::from(transaction_count))
                    .unwrap_or_default(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CategoryBasis;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn tx(index: usize, date: (i32, u32, u32), amount: Decimal, category: Category) -> Transaction {
        Transaction {
            index,
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            amount,
            description: format!("tx {}", index),
            raw_type: None,
            category,
            basis: CategoryBasis::Fallback,
        }
    }

    #[test]
    fn test_partition_is_lossless() {
        let set = ClassifiedSet::new(vec![
            tx(0, (2024, 1, 5), dec!(-50.25), Category::FoodDining),
            tx(1, (2024, 1, 10), dec!(2000), Category::Income),
            tx(2, (2024, 2, 1), dec!(-19.99), Category::FoodDining),
            tx(3, (2024, 2, 3), dec!(-300), Category::Transfer),
            tx(4, (2024, 3, 3), dec!(-100), Category::InvestmentBitcoin),
        ]);

        let result = aggregate(&set, &ReportConfig::default());
        let partition: Decimal = result.category_totals.values().copied().sum();
        let all: Decimal = set.iter().map(|t| t.amount).sum();
        assert_eq!(partition, all);
        assert_eq!(result.summary.net_total, all);

        let monthly: Decimal = result.monthly_totals.values().copied().sum();
        assert_eq!(monthly, all);
        assert_eq!(result.category_totals[&Category::FoodDining], dec!(-70.24));
        assert_eq!(result.category_counts[&Category::FoodDining], 2);
    }

    #[test]
    fn test_views_are_disjoint() {
        let set = ClassifiedSet::new(vec![
            tx(0, (2024, 1, 5), dec!(-50), Category::FoodDining),
            tx(1, (2024, 1, 10), dec!(2000), Category::Income),
            tx(2, (2024, 1, 11), dec!(-300), Category::Transfer),
            tx(3, (2024, 1, 12), dec!(300), Category::Transfer),
            tx(4, (2024, 1, 15), dec!(-500), Category::InvestmentDcaSavings),
            tx(5, (2024, 1, 16), dec!(100), Category::InvestmentBitcoin),
        ]);

        let summary = aggregate(&set, &ReportConfig::default()).summary;
        assert_eq!(summary.income_total, dec!(2000));
        assert_eq!(summary.expense_total, dec!(50));
        // |(-500) + 100|: scalar semantics, not Σ|row|
        assert_eq!(summary.investment_total, dec!(400));
        assert_eq!(summary.net_total, dec!(1550));
    }

    #[test]
    fn test_cash_flow_and_savings_rates() {
        let set = ClassifiedSet::new(vec![
            tx(0, (2024, 1, 5), dec!(-50), Category::FoodDining),
            tx(1, (2024, 1, 10), dec!(2000), Category::Income),
            tx(2, (2024, 1, 15), dec!(-500), Category::InvestmentDcaSavings),
            tx(3, (2024, 1, 20), dec!(-500), Category::InvestmentBitcoinSavings),
            tx(4, (2024, 1, 21), dec!(-150), Category::Shopping),
            tx(5, (2024, 1, 22), dec!(-900), Category::Transfer),
        ]);

        let summary = aggregate(&set, &ReportConfig::default()).summary;
        assert_eq!(summary.net_cash_flow_excluding_investments, dec!(1800));
        assert_eq!(summary.net_cash_flow_including_investments, dec!(800));
        assert!((summary.cash_savings_rate.unwrap() - 90.0).abs() < 1e-9);
        assert!((summary.investment_rate.unwrap() - 50.0).abs() < 1e-9);
        assert!((summary.total_savings_rate.unwrap() - 140.0).abs() < 1e-9);

        // Transfers are neither expense nor income
        assert_eq!(summary.largest_expense.as_ref().unwrap().index, 4);
        assert_eq!(summary.largest_income.as_ref().unwrap().index, 1);
    }

    #[test]
    fn test_rates_absent_without_income() {
        let set = ClassifiedSet::new(vec![tx(0, (2024, 1, 5), dec!(-50), Category::FoodDining)]);
        let summary = aggregate(&set, &ReportConfig::default()).summary;
        assert_eq!(summary.cash_savings_rate, None);
        assert_eq!(summary.total_savings_rate, None);
        assert_eq!(summary.largest_income, None);
        assert_eq!(summary.net_cash_flow_excluding_investments, dec!(-50));
    }

    #[test]
    fn test_largest_rows_tie_break_on_date() {
        let set = ClassifiedSet::new(vec![
            tx(0, (2024, 1, 9), dec!(-80), Category::Shopping),
            tx(1, (2024, 1, 2), dec!(-80), Category::FoodDining),
            tx(2, (2024, 1, 3), dec!(-10), Category::FoodDining),
        ]);
        let summary = aggregate(&set, &ReportConfig::default()).summary;
        assert_eq!(summary.largest_expense.unwrap().index, 1);
    }

    #[test]
    fn test_most_frequent_category_and_average() {
        let set = ClassifiedSet::new(vec![
            tx(0, (2024, 1, 5), dec!(-50.25), Category::Shopping),
            tx(1, (2024, 1, 6), dec!(-19.75), Category::FoodDining),
            tx(2, (2024, 1, 7), dec!(-10), Category::FoodDining),
            tx(3, (2024, 1, 8), dec!(-30), Category::Shopping),
        ]);

        let result = aggregate(&set, &ReportConfig::default());
        // Two each: registry order puts Food & Dining first
        assert_eq!(result.summary.most_frequent_category, Some(Category::FoodDining));

        let food = &result.category_breakdown[0];
        assert_eq!(food.average, dec!(-14.875));
        let shopping = &result.category_breakdown[1];
        assert_eq!(shopping.average, dec!(-40.125));
    }

    #[test]
    fn test_refund_reduces_expense_total() {
        let set = ClassifiedSet::new(vec![
            tx(0, (2024, 1, 5), dec!(-80), Category::Shopping),
            tx(1, (2024, 1, 6), dec!(-20), Category::Shopping),
        ]);
        let result = aggregate(&set, &ReportConfig::default());
        assert_eq!(result.summary.expense_total, dec!(100));
        assert_eq!(result.category_totals[&Category::Shopping], dec!(-100));
    }

    #[test]
    fn test_investment_breakdown_lists_all_four() {
        let set = ClassifiedSet::new(vec![tx(
            0,
            (2024, 1, 5),
            dec!(-500),
            Category::InvestmentDcaSavings,
        )]);

        let result = aggregate(&set, &ReportConfig::default());
        assert_eq!(result.investment_breakdown.len(), 4);
        let dca = &result.investment_breakdown[1];
        assert_eq!(dca.category, Category::InvestmentDcaSavings);
        assert_eq!(dca.total, dec!(500));
        assert_eq!(dca.transaction_count, 1);

        let potential = &result.investment_breakdown[3];
        assert_eq!(potential.total, Decimal::ZERO);
        assert!(potential.probabilistic);
    }

    #[test]
    fn test_percentages() {
        let set = ClassifiedSet::new(vec![
            tx(0, (2024, 1, 5), dec!(-25), Category::FoodDining),
            tx(1, (2024, 1, 10), dec!(75), Category::Income),
        ]);

        let result = aggregate(&set, &ReportConfig::default());
        let food = &result.category_breakdown[0];
        assert_eq!(food.category, Category::FoodDining);
        assert!((food.percentage - 25.0).abs() < 1e-9);
        let total: f64 = result.category_breakdown.iter().map(|s| s.percentage).sum();
        assert!((total - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_set_is_all_zero() {
        let result = aggregate(&ClassifiedSet::default(), &ReportConfig::default());
        assert!(result.category_totals.is_empty());
        assert!(result.category_breakdown.is_empty());
        assert_eq!(result.summary, SummaryTotals::default());
        assert_eq!(result.transaction_count, 0);
        assert_eq!(result.period, ReportPeriod::default());
        assert_eq!(result.investment_breakdown.len(), 4);
    }

    #[test]
    fn test_zero_total_category_has_zero_percentage() {
        let set = ClassifiedSet::new(vec![
            tx(0, (2024, 1, 5), dec!(-10), Category::Transfer),
            tx(1, (2024, 1, 6), dec!(10), Category::Transfer),
        ]);
        let result = aggregate(&set, &ReportConfig::default());
        assert_eq!(result.category_breakdown[0].percentage, 0.0);
    }
}
