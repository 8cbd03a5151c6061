//! Category registry and rule set commands

use std::path::Path;

use anyhow::Result;
use cashlens_core::{
    Category, CategoryBasis, Classifier, ReportConfig, TransactionRecord, CATEGORY_SET_VERSION,
};
use chrono::Utc;
use rust_decimal::Decimal;

use super::{load_rules, truncate};

pub fn cmd_categories() -> Result<()> {
    println!();
    println!("📋 Categories (set version {})", CATEGORY_SET_VERSION);
    println!("   ─────────────────────────────────────────────────────────────");

    for category in Category::ALL {
        let note = if category.is_probabilistic() {
            "investment, estimated"
        } else if category.is_investment() {
            "investment"
        } else {
            ""
        };
        println!("   {:30} {}", category.label(), note);
    }

    Ok(())
}

pub fn cmd_rules_list(config: &ReportConfig, rules_path: Option<&Path>) -> Result<()> {
    let rules = load_rules(rules_path, config)?;

    if rules.is_empty() {
        println!("No rules defined.");
        return Ok(());
    }

    println!();
    println!("📋 Category Rules (first match wins)");
    println!("   ─────────────────────────────────────────────────────────────");
    println!(
        "   {:>3} │ {:16} │ {:20} │ {:8} │ {}",
        "#", "ID", "Category", "Type", "Patterns"
    );
    println!("   ────┼──────────────────┼──────────────────────┼──────────┼─────────────────");

    for (position, rule) in rules.rules().iter().enumerate() {
        println!(
            "   {:>3} │ {:16} │ {:20} │ {:8} │ {}",
            position + 1,
            truncate(&rule.id, 16),
            truncate(rule.category.label(), 20),
            rule.predicate.pattern_type().as_str(),
            truncate(&rule.predicate.describe(), 40)
        );
    }

    Ok(())
}

pub fn cmd_rules_test(
    config: &ReportConfig,
    rules_path: Option<&Path>,
    description: &str,
    raw_type: Option<&str>,
    amount: Option<Decimal>,
) -> Result<()> {
    let rules = load_rules(rules_path, config)?;
    let classifier = Classifier::with_rules(rules, config);

    let record = TransactionRecord {
        date: Utc::now().date_naive(),
        amount,
        description: description.to_string(),
        raw_type: raw_type.map(str::to_string),
    };

    let matches = classifier.rules().explain(&record);

    println!();
    println!("🔍 Rules matching \"{}\":", description);
    println!("   ─────────────────────────────────────────────────────────────");

    if matches.is_empty() {
        println!("   No rules match");
    }
    for (position, rule) in matches.iter().enumerate() {
        let marker = if position == 0 { "→" } else { " " };
        println!(
            "   {} {} -> {} ({}: {})",
            marker,
            rule.id,
            rule.category,
            rule.predicate.pattern_type().as_str(),
            truncate(&rule.predicate.describe(), 40)
        );
    }

    let classification = classifier.classify_record(&record);
    let basis = match &classification.basis {
        CategoryBasis::Rule { rule_id } => format!("rule '{}'", rule_id),
        CategoryBasis::Investment { rule_id } => format!("investment rule '{}'", rule_id),
        CategoryBasis::Recurrence => "recurring transfer".to_string(),
        CategoryBasis::Magnitude => "large inflow".to_string(),
        CategoryBasis::Fallback => "no match".to_string(),
    };

    println!();
    println!("   Category: {} ({})", classification.category, basis);
    if classification.recurrence_candidate {
        println!("   Repeats in other months would make this Investment (Potential DCA)");
    }

    Ok(())
}
