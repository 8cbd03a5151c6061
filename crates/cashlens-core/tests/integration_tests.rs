//! Integration tests for cashlens-core
//!
//! These tests exercise the full classify → aggregate/rank/trend → report workflow.

use cashlens_core::{
    build_trend, generate_report, Category, CategoryBasis, Classifier, Error, ReportConfig,
    ReportGenerator, ReportPeriod, RuleSet, SeriesSelector, TransactionRecord,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

fn record(d: NaiveDate, amount: Decimal, description: &str, raw_type: &str) -> TransactionRecord {
    TransactionRecord::new(d, amount, description, raw_type)
}

/// Coffee, payroll, and two savings transfers (one funding a BTC purchase)
fn january_records() -> Vec<TransactionRecord> {
    vec![
        record(date(2024, 1, 5), dec!(-50), "Coffee Shop", ""),
        record(date(2024, 1, 10), dec!(2000), "Payroll", ""),
        record(date(2024, 1, 15), dec!(-500), "Savings transfer", "Savings"),
        record(
            date(2024, 1, 20),
            dec!(-500),
            "Savings transfer for purchase of BTC",
            "Savings",
        ),
    ]
}

/// Six months of mixed activity
fn half_year_records() -> Vec<TransactionRecord> {
    vec![
        record(date(2024, 1, 1), dec!(3200), "Payroll ACME Corp", "Direct Deposit"),
        record(date(2024, 1, 2), dec!(-1450), "Monthly Rent", "Cash Card"),
        record(date(2024, 1, 4), dec!(-62.40), "Whole Foods grocery", "Cash Card"),
        record(date(2024, 1, 12), dec!(-250), "Internal move", "Savings Internal Transfer"),
        record(date(2024, 1, 18), dec!(-25), "BTC", "Bitcoin Recurring Buy"),
        record(date(2024, 2, 1), dec!(3200), "Payroll ACME Corp", "Direct Deposit"),
        record(date(2024, 2, 2), dec!(-1450), "Monthly Rent", "Cash Card"),
        record(date(2024, 2, 11), dec!(-250), "Internal move", "Savings Internal Transfer"),
        record(date(2024, 2, 14), dec!(-89.99), "Concert ticket", "Cash Card"),
        record(date(2024, 2, 18), dec!(-25), "BTC", "Bitcoin Recurring Buy"),
        record(date(2024, 4, 1), dec!(3200), "Payroll ACME Corp", "Direct Deposit"),
        record(date(2024, 4, 9), dec!(-38.10), "Uber trip", "Cash Card"),
        record(date(2024, 4, 13), dec!(-250), "Internal move", "Savings Internal Transfer"),
        record(date(2024, 5, 3), dec!(15000), "Annual bonus", "Direct Deposit"),
        record(date(2024, 5, 7), dec!(-300), "Sent to Sam", "P2P"),
        record(date(2024, 6, 20), dec!(-12000), "Used car", "Cash Card"),
    ]
}

// =============================================================================
// End-to-End
// =============================================================================

#[test]
fn test_end_to_end_january() {
    let report = generate_report(&january_records(), &ReportConfig::default())
        .expect("report should build");

    let totals = report.category_totals();
    assert_eq!(totals.len(), 4);
    assert_eq!(totals[&Category::FoodDining], dec!(-50));
    assert_eq!(totals[&Category::Income], dec!(2000));
    assert_eq!(totals[&Category::InvestmentDcaSavings], dec!(-500));
    assert_eq!(totals[&Category::InvestmentBitcoinSavings], dec!(-500));

    let summary = report.summary_totals();
    assert_eq!(summary.net_total, dec!(950));
    assert_eq!(summary.income_total, dec!(2000));
    assert_eq!(summary.expense_total, dec!(50));
    assert_eq!(summary.investment_total, dec!(1000));

    let top: Vec<(NaiveDate, Decimal)> = report
        .top_transactions(5)
        .iter()
        .map(|r| (r.transaction.date, r.transaction.amount))
        .collect();
    assert_eq!(
        top,
        vec![
            (date(2024, 1, 10), dec!(2000)),
            (date(2024, 1, 15), dec!(-500)),
            (date(2024, 1, 20), dec!(-500)),
            (date(2024, 1, 5), dec!(-50)),
        ]
    );

    let net = report.monthly_trend("net").expect("net series");
    assert!(net.is_single_point());
    assert_eq!(net.points[0].value, dec!(950));
}

#[test]
fn test_end_to_end_january_summary_figures() {
    let report = generate_report(&january_records(), &ReportConfig::default()).unwrap();
    let summary = report.summary_totals();

    assert_eq!(summary.net_cash_flow_excluding_investments, dec!(1950));
    assert_eq!(summary.net_cash_flow_including_investments, dec!(950));
    assert!((summary.cash_savings_rate.unwrap() - 97.5).abs() < 1e-9);
    assert!((summary.investment_rate.unwrap() - 50.0).abs() < 1e-9);
    assert!((summary.total_savings_rate.unwrap() - 147.5).abs() < 1e-9);
    assert_eq!(summary.most_frequent_category, Some(Category::FoodDining));
    assert_eq!(
        summary.largest_expense.as_ref().map(|t| t.description.as_str()),
        Some("Coffee Shop")
    );
    assert_eq!(
        summary.largest_income.as_ref().map(|t| t.description.as_str()),
        Some("Payroll")
    );
}

#[test]
fn test_report_serializes_with_labels() {
    let report = generate_report(&january_records(), &ReportConfig::default()).unwrap();
    let json = serde_json::to_value(&report).expect("report serializes");

    assert_eq!(json["category_totals"]["Food & Dining"], "-50");
    assert_eq!(json["summary_totals"]["net_total"], "950");
    assert_eq!(json["monthly_totals"]["2024-01"], "950");
    assert_eq!(
        json["top_transactions"][0]["transaction"]["category"],
        "Income"
    );
    assert_eq!(
        json["top_transactions"][0]["transaction"]["basis"]["kind"],
        "rule"
    );
    assert_eq!(
        json["summary_totals"]["most_frequent_category"],
        "Food & Dining"
    );
    assert!(json.get("ranked").is_none());
}

// =============================================================================
// Classification Properties
// =============================================================================

#[test]
fn test_every_record_gets_one_category() {
    let classifier = Classifier::default();
    let set = classifier
        .classify_all(&half_year_records())
        .expect("classification succeeds");

    assert_eq!(set.len(), half_year_records().len());
    for tx in &set {
        assert!(Category::ALL.contains(&tx.category));
    }
}

#[test]
fn test_btc_marker_never_dca() {
    let classifier = Classifier::default();
    for raw_type in ["Savings", "Savings Internal Transfer"] {
        let btc = record(date(2024, 3, 1), dec!(-100), "Savings transfer for purchase of BTC", raw_type);
        let plain = record(date(2024, 3, 1), dec!(-100), "Savings transfer", raw_type);
        assert_eq!(classifier.classify(&btc), Category::InvestmentBitcoinSavings);
        assert_eq!(classifier.classify(&plain), Category::InvestmentDcaSavings);
    }
}

#[test]
fn test_large_negative_never_bonus() {
    let classifier = Classifier::default();
    for amount in [dec!(-10000), dec!(-50000)] {
        let tx = record(date(2024, 3, 1), amount, "Bonus commission clawback", "");
        let category = classifier.classify(&tx);
        assert_ne!(category, Category::BonusLargePayment);
        assert_ne!(category, Category::LargeIncomePayment);
    }
}

#[test]
fn test_half_year_classification() {
    let set = Classifier::default()
        .classify_all(&half_year_records())
        .unwrap();
    let category_of = |index: usize| set.transactions()[index].category;

    assert_eq!(category_of(0), Category::Income);
    assert_eq!(category_of(1), Category::BillsUtilities);
    assert_eq!(category_of(2), Category::FoodDining);
    // Three 250 transfers on the 11th-13th of different months
    assert_eq!(category_of(3), Category::InvestmentPotentialDca);
    assert_eq!(category_of(7), Category::InvestmentPotentialDca);
    assert_eq!(category_of(12), Category::InvestmentPotentialDca);
    assert_eq!(set.transactions()[3].basis, CategoryBasis::Recurrence);
    assert_eq!(category_of(4), Category::InvestmentBitcoin);
    assert_eq!(category_of(8), Category::Entertainment);
    assert_eq!(category_of(11), Category::Transportation);
    assert_eq!(category_of(13), Category::BonusLargePayment);
    assert_eq!(category_of(14), Category::Transfer);
    assert_eq!(category_of(15), Category::Other);
}

// =============================================================================
// Aggregation, Ranking and Trends
// =============================================================================

#[test]
fn test_partition_matches_overall_sum() {
    let records = half_year_records();
    let report = generate_report(&records, &ReportConfig::default()).unwrap();

    let partition: Decimal = report.category_totals().values().copied().sum();
    let overall: Decimal = records.iter().filter_map(|r| r.amount).sum();
    assert_eq!(partition, overall);
    assert_eq!(report.summary_totals().net_total, overall);
}

#[test]
fn test_half_year_report() {
    let report = generate_report(&half_year_records(), &ReportConfig::default()).unwrap();

    assert_eq!(report.transaction_count, 16);
    assert_eq!(report.period.from, Some(date(2024, 1, 1)));
    assert_eq!(report.period.to, Some(date(2024, 6, 20)));

    // Rent is excluded from the top-expenses view; the used car leads it
    let expenses = report.top_expense_transactions(5);
    assert_eq!(expenses[0].transaction.description, "Used car");
    assert!(expenses
        .iter()
        .all(|r| !r.transaction.description.contains("Rent")));
    assert!(expenses
        .iter()
        .all(|r| !r.transaction.category.is_investment() && r.transaction.category != Category::Transfer));

    // Unfiltered view still sees the bonus first
    assert_eq!(report.top_transactions(1)[0].transaction.amount, dec!(15000));

    assert_eq!(report.large_inflows.len(), 1);

    let potential = report
        .investment_breakdown
        .iter()
        .find(|line| line.category == Category::InvestmentPotentialDca)
        .expect("potential DCA line");
    assert!(potential.probabilistic);
    assert_eq!(potential.total, dec!(750));
    assert_eq!(potential.transaction_count, 3);
}

#[test]
fn test_top_expenses_keep_words_containing_housing_keywords() {
    let records = vec![
        record(date(2024, 1, 2), dec!(-300), "Current Electric bill", ""),
        record(date(2024, 1, 3), dec!(-200), "Parenting workshop", ""),
        record(date(2024, 1, 4), dec!(-150), "Please Parking garage", ""),
        record(date(2024, 1, 5), dec!(-20), "Coffee", ""),
        record(date(2024, 1, 6), dec!(-1450), "Monthly Rent", ""),
    ];
    let report = generate_report(&records, &ReportConfig::default()).unwrap();

    let descriptions: Vec<&str> = report
        .top_expense_transactions(5)
        .iter()
        .map(|r| r.transaction.description.as_str())
        .collect();
    assert_eq!(
        descriptions,
        vec![
            "Current Electric bill",
            "Parenting workshop",
            "Please Parking garage",
            "Coffee"
        ]
    );
}

#[test]
fn test_top_n_beyond_configured_default() {
    let records: Vec<TransactionRecord> = (1..=8)
        .map(|day| record(date(2024, 1, day), Decimal::from(-(day as i64)), "Lunch", ""))
        .collect();
    let report = generate_report(&records, &ReportConfig::default()).unwrap();

    assert_eq!(report.top_transactions.len(), 5);
    assert_eq!(report.top_transactions(8).len(), 8);
    assert_eq!(report.top_expense_transactions(10).len(), 8);
}

#[test]
fn test_large_savings_withdrawal_is_large_income() {
    let records = vec![record(date(2024, 1, 5), dec!(20000), "Savings withdrawal", "Savings")];
    let report = generate_report(&records, &ReportConfig::default()).unwrap();

    assert_eq!(report.summary_totals().investment_total, Decimal::ZERO);
    assert_eq!(report.large_inflows.len(), 1);
    assert_eq!(
        report.large_inflows[0].transaction.category,
        Category::LargeIncomePayment
    );
}

#[test]
fn test_report_for_last_months() {
    let generator = ReportGenerator::new(&ReportConfig::default());
    let window = ReportPeriod::months_back(date(2024, 6, 30), 2);
    let report = generator
        .generate_within(&half_year_records(), &window)
        .unwrap();

    // May and June rows only
    assert_eq!(report.transaction_count, 3);
    assert_eq!(report.period.from, Some(date(2024, 5, 3)));
    assert!(report.trends.iter().all(|s| s.len() == 2));
    assert_eq!(report.summary_totals().net_total, dec!(2700));
}

#[test]
fn test_overflowing_amounts_are_rejected() {
    let records = vec![
        record(date(2024, 1, 1), Decimal::MAX, "Payroll", ""),
        record(date(2024, 1, 2), Decimal::MAX, "Payroll", ""),
    ];
    let result = generate_report(&records, &ReportConfig::default());
    assert!(matches!(result, Err(Error::InvalidInput(_))));
}

#[test]
fn test_trend_contiguity() {
    let records = vec![
        record(date(2024, 1, 10), dec!(-40), "Lunch", ""),
        record(date(2024, 3, 10), dec!(-60), "Dinner", ""),
    ];
    let set = Classifier::default().classify_all(&records).unwrap();
    let series = build_trend(&set, SeriesSelector::Expenses, &ReportConfig::default());

    assert_eq!(series.len(), 3);
    assert!(!series.is_single_point());
    let values: Vec<Decimal> = series.points.iter().map(|p| p.value).collect();
    assert_eq!(values, vec![dec!(40), Decimal::ZERO, dec!(60)]);
}

#[test]
fn test_all_series_share_window() {
    let report = generate_report(&half_year_records(), &ReportConfig::default()).unwrap();
    assert!(report.trends.iter().all(|s| s.len() == 6));
    let march = &report.monthly_trend("net").unwrap().points[2];
    assert_eq!(march.value, Decimal::ZERO);
    assert_eq!(march.transaction_count, 0);
}

#[test]
fn test_ranker_is_deterministic() {
    let records = vec![
        record(date(2024, 2, 2), dec!(-75), "Store A", ""),
        record(date(2024, 2, 1), dec!(75), "Payment received", ""),
        record(date(2024, 2, 1), dec!(-75), "Store B", ""),
    ];
    let generator = ReportGenerator::new(&ReportConfig::default());

    let first = generator.generate(&records).unwrap();
    let second = generator.generate(&records).unwrap();
    assert_eq!(first.top_transactions, second.top_transactions);

    let order: Vec<&str> = first
        .top_transactions(3)
        .iter()
        .map(|r| r.transaction.description.as_str())
        .collect();
    assert_eq!(order, vec!["Payment received", "Store B", "Store A"]);
}

// =============================================================================
// Configuration and Custom Rules
// =============================================================================

#[test]
fn test_config_override_changes_pipeline() {
    let config = ReportConfig::from_toml_str(
        r#"
        [classification]
        large_amount_threshold = 1000
        bonus_keywords = ["payroll"]

        [reporting]
        top_n = 2
        "#,
    )
    .expect("config parses");

    let report = generate_report(&january_records(), &config).unwrap();
    assert_eq!(
        report.category_totals().get(&Category::BonusLargePayment),
        Some(&dec!(2000))
    );
    assert_eq!(report.top_transactions.len(), 2);
    assert_eq!(report.top_transactions(5).len(), 4);
}

#[test]
fn test_custom_rule_set_precedence() {
    // Shopping placed before Food: "Buy coffee" becomes Shopping
    let rules = RuleSet::from_toml(
        r#"
        [[rules]]
        id = "shopping"
        category = "Shopping"
        match = "contains"
        patterns = ["buy"]

        [[rules]]
        id = "food"
        category = "Food & Dining"
        match = "contains"
        patterns = ["coffee"]
        "#,
    )
    .unwrap();

    let classifier = Classifier::with_rules(rules, &ReportConfig::default());
    let tx = record(date(2024, 1, 1), dec!(-4), "Buy coffee", "");
    assert_eq!(classifier.classify(&tx), Category::Shopping);

    let explained = classifier.rules().explain(&tx);
    assert_eq!(explained.len(), 2);
}
