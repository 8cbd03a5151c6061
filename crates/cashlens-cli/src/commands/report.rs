//! Report and classify command implementations

use std::path::Path;

use anyhow::{Context, Result};
use cashlens_core::{RankedTransaction, ReportConfig, ReportModel, ReportPeriod, TransactionRecord};
use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::{build_generator, format_amount, load_records, truncate};

/// Flags of the `report` command that shape a run
#[derive(Debug, Clone, Default)]
pub struct ReportOptions {
    pub top: Option<usize>,
    pub threshold: Option<Decimal>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    /// Calendar months ending at `to`, or at the latest record
    pub months: Option<u32>,
}

impl ReportOptions {
    /// Config with `--top` and `--threshold` applied
    pub fn apply(&self, mut config: ReportConfig) -> Result<ReportConfig> {
        if let Some(top) = self.top {
            config.top_n = top;
        }
        if let Some(threshold) = self.threshold {
            if threshold <= Decimal::ZERO {
                anyhow::bail!("--threshold must be positive, got {}", threshold);
            }
            config.large_amount_threshold = threshold;
        }
        Ok(config)
    }

    /// Date window to report on; `None` reports everything
    pub fn window(&self, records: &[TransactionRecord]) -> Result<Option<ReportPeriod>> {
        if let (Some(from), Some(to)) = (self.from, self.to) {
            if from > to {
                anyhow::bail!("--from {} is after --to {}", from, to);
            }
        }

        if let Some(months) = self.months {
            let end = self.to.or_else(|| records.iter().map(|r| r.date).max());
            return Ok(end.map(|end| ReportPeriod::months_back(end, months)));
        }

        if self.from.is_none() && self.to.is_none() {
            return Ok(None);
        }
        Ok(Some(ReportPeriod {
            from: self.from,
            to: self.to,
        }))
    }
}

/// Load, classify and report on a file
pub fn build_report(
    file: &Path,
    config: ReportConfig,
    rules_path: Option<&Path>,
    options: &ReportOptions,
) -> Result<ReportModel> {
    let config = options.apply(config)?;
    let records = load_records(file)?;
    let window = options.window(&records)?;
    let generator = build_generator(&config, rules_path)?;

    let report = match window {
        Some(window) => generator.generate_within(&records, &window),
        None => generator.generate(&records),
    };
    report.with_context(|| format!("Failed to build report for {}", file.display()))
}

pub fn cmd_report(
    file: &Path,
    config: ReportConfig,
    rules_path: Option<&Path>,
    json: bool,
    options: &ReportOptions,
) -> Result<()> {
    let report = build_report(file, config, rules_path, options)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(())
}

pub fn cmd_classify(
    file: &Path,
    config: &ReportConfig,
    rules_path: Option<&Path>,
    json: bool,
) -> Result<()> {
    let records = load_records(file)?;
    let generator = build_generator(config, rules_path)?;
    let set = generator
        .classify(&records)
        .with_context(|| format!("Failed to classify {}", file.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&set)?);
        return Ok(());
    }

    println!();
    println!("🏷️  Classified Transactions ({})", set.len());
    println!("   ─────────────────────────────────────────────────────────────");

    if set.is_empty() {
        println!("   No transactions in {}", file.display());
        return Ok(());
    }

    println!(
        "   {:>4} │ {:10} │ {:>10} │ {:28} │ {}",
        "#", "Date", "Amount", "Category", "Description"
    );
    println!("   ─────┼────────────┼────────────┼──────────────────────────────┼────────────");

    for tx in &set {
        let marker = if tx.category.is_probabilistic() { "~" } else { "" };
        println!(
            "   {:>4} │ {:10} │ {:>10} │ {:28} │ {}",
            tx.index,
            tx.date,
            format_amount(tx.amount),
            format!("{}{}", marker, tx.category),
            truncate(&tx.description, 40)
        );
    }

    Ok(())
}

fn print_report(report: &ReportModel) {
    println!();
    println!("📊 Cashlens Report");
    match (report.period.from, report.period.to) {
        (Some(from), Some(to)) => println!("   Period: {} to {}", from, to),
        _ => println!("   Period: (no transactions)"),
    }
    println!("   Transactions: {}", report.transaction_count);
    println!("   ─────────────────────────────────────────────────────────────");

    let summary = report.summary_totals();
    println!();
    println!("💰 Summary");
    println!("   Income:       ${:>12}", format_amount(summary.income_total));
    println!("   Expenses:     ${:>12}", format_amount(summary.expense_total));
    println!("   Investments:  ${:>12}", format_amount(summary.investment_total));
    println!("   Net:          ${:>12}", format_amount(summary.net_total));

    if report.transaction_count == 0 {
        println!();
        println!("   No transactions to report.");
        return;
    }

    println!();
    println!(
        "   Net cash flow (excluding investments): ${}",
        format_amount(summary.net_cash_flow_excluding_investments)
    );
    println!(
        "   Net cash flow (including investments): ${}",
        format_amount(summary.net_cash_flow_including_investments)
    );
    if let (Some(cash), Some(invested), Some(total)) = (
        summary.cash_savings_rate,
        summary.investment_rate,
        summary.total_savings_rate,
    ) {
        println!("   Cash savings rate: {:.1}%", cash);
        println!("   Investment rate:   {:.1}%", invested);
        println!("   Total savings rate: {:.1}%", total);
    }
    if let Some(category) = summary.most_frequent_category {
        let count = report
            .category_breakdown
            .iter()
            .find(|share| share.category == category)
            .map(|share| share.transaction_count)
            .unwrap_or_default();
        println!("   Most frequent: {} ({} transactions)", category, count);
    }
    if let Some(tx) = &summary.largest_expense {
        println!(
            "   Largest expense: ${} - {}",
            format_amount(tx.amount.abs()),
            truncate(&tx.description, 40)
        );
    }
    if let Some(tx) = &summary.largest_income {
        println!(
            "   Largest income:  ${} - {}",
            format_amount(tx.amount),
            truncate(&tx.description, 40)
        );
    }

    println!();
    println!("📂 Categories");
    println!(
        "   {:28} │ {:>12} │ {:>6} │ {:>5} │ {:>10}",
        "Category", "Amount", "%", "Count", "Average"
    );
    println!("   ─────────────────────────────┼──────────────┼────────┼───────┼────────────");
    for share in &report.category_breakdown {
        println!(
            "   {:28} │ {:>12} │ {:>5.1}% │ {:>5} │ {:>10}",
            share.category.label(),
            format_amount(share.total),
            share.percentage,
            share.transaction_count,
            format_amount(share.average)
        );
    }

    print_ranked("🏆 Top Transactions", &report.top_transactions);
    print_ranked(
        "💸 Top Expenses (excluding rent, transfers, investments)",
        &report.top_expense_transactions,
    );

    if !report.top_expense_categories.is_empty() {
        println!();
        println!("🗂️  Top Expense Categories");
        for entry in &report.top_expense_categories {
            println!(
                "   {:>2}. {:28} ${:>12}  ({} transactions)",
                entry.rank,
                entry.category.label(),
                format_amount(entry.total),
                entry.transaction_count
            );
        }
    }

    println!();
    println!("📈 Investments");
    for line in &report.investment_breakdown {
        let note = if line.probabilistic { "  (estimated)" } else { "" };
        println!(
            "   {:28} ${:>12}  {:>3} tx{}",
            line.category.label(),
            format_amount(line.total),
            line.transaction_count,
            note
        );
    }

    if !report.large_inflows.is_empty() {
        print_ranked("🎁 Large Inflows", &report.large_inflows);
    }

    println!();
    println!("📅 Monthly");
    println!(
        "   {:7} │ {:>12} │ {:>12} │ {:>12}",
        "Month", "Income", "Expenses", "Net"
    );
    println!("   ────────┼──────────────┼──────────────┼──────────────");
    if let (Some(net), Some(income), Some(expenses)) = (
        report.monthly_trend("net"),
        report.monthly_trend("income"),
        report.monthly_trend("expenses"),
    ) {
        for ((n, i), e) in net.points.iter().zip(&income.points).zip(&expenses.points) {
            println!(
                "   {:7} │ {:>12} │ {:>12} │ {:>12}",
                n.period.to_string(),
                format_amount(i.value),
                format_amount(e.value),
                format_amount(n.value)
            );
        }
    }
}

fn print_ranked(title: &str, entries: &[RankedTransaction]) {
    if entries.is_empty() {
        return;
    }

    println!();
    println!("{}", title);
    for entry in entries {
        let tx = &entry.transaction;
        println!(
            "   {:>2}. {} {:>12}  {:30} [{}]",
            entry.rank,
            tx.date,
            format_amount(tx.amount),
            truncate(&tx.description, 30),
            tx.category
        );
    }
}
