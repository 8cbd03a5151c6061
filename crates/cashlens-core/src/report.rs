//! Report assembly
//!
//! [`assemble`] only composes; every number in the report is computed by the
//! aggregator, ranker or trend builder. [`ReportGenerator`] wires the whole
//! pipeline: classify, then aggregate/rank/trend, then assemble.

use tracing::info;

use crate::aggregate::aggregate;
use crate::classify::Classifier;
use crate::config::ReportConfig;
use crate::error::Result;
use crate::models::{
    AggregateResult, ClassifiedSet, RankedLists, ReportModel, ReportPeriod, TransactionRecord,
    TrendSeries,
};
use crate::rank::{self, Exclusion};
use crate::rules::RuleSet;
use crate::trend::standard_trends;

impl RankedLists {
    /// Rank every eligible row of a classified set
    pub fn build(set: &ClassifiedSet, config: &ReportConfig) -> Result<Self> {
        let expenses = Exclusion::for_expenses(config)?;
        Ok(Self {
            transactions: rank::top_n(set, usize::MAX, &Exclusion::none()),
            expense_transactions: rank::top_expense_transactions(set, usize::MAX, &expenses),
            expense_categories: rank::top_categories(set, usize::MAX, &expenses),
            large_inflows: rank::large_inflows(set, config.large_amount_threshold),
        })
    }
}

/// Compose the report model; the `top_*` fields take the first `top_n` entries
pub fn assemble(
    aggregate: AggregateResult,
    ranked: RankedLists,
    trends: Vec<TrendSeries>,
    top_n: usize,
) -> ReportModel {
    ReportModel {
        period: aggregate.period,
        transaction_count: aggregate.transaction_count,
        summary_totals: aggregate.summary,
        category_totals: aggregate.category_totals,
        category_breakdown: aggregate.category_breakdown,
        monthly_totals: aggregate.monthly_totals,
        top_transactions: ranked.transactions.iter().take(top_n).cloned().collect(),
        top_expense_transactions: ranked
            .expense_transactions
            .iter()
            .take(top_n)
            .cloned()
            .collect(),
        top_expense_categories: ranked.expense_categories.iter().take(top_n).cloned().collect(),
        investment_breakdown: aggregate.investment_breakdown,
        large_inflows: ranked.large_inflows.clone(),
        trends,
        ranked,
    }
}

/// Runs the full pipeline for one configuration
#[derive(Debug, Clone, Default)]
pub struct ReportGenerator {
    classifier: Classifier,
}

impl ReportGenerator {
    /// Create a generator with the built-in rule set
    pub fn new(config: &ReportConfig) -> Self {
        Self {
            classifier: Classifier::new(config),
        }
    }

    /// Create a generator with a custom rule set
    pub fn with_rules(rules: RuleSet, config: &ReportConfig) -> Self {
        Self {
            classifier: Classifier::with_rules(rules, config),
        }
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn config(&self) -> &ReportConfig {
        self.classifier.config()
    }

    pub fn classify(&self, records: &[TransactionRecord]) -> Result<ClassifiedSet> {
        self.classifier.classify_all(records)
    }

    /// Build the report for an already classified set
    pub fn report(&self, set: &ClassifiedSet) -> Result<ReportModel> {
        let config = self.config();
        let report = assemble(
            aggregate(set, config),
            RankedLists::build(set, config)?,
            standard_trends(set, config),
            config.top_n,
        );

        info!(
            "Report: {} transactions, {} categories, income {}, expenses {}, investments {}, net {}",
            report.transaction_count,
            report.category_totals.len(),
            report.summary_totals.income_total,
            report.summary_totals.expense_total,
            report.summary_totals.investment_total,
            report.summary_totals.net_total
        );

        Ok(report)
    }

    /// Report on the part of `set` dated inside `window`
    pub fn report_within(&self, set: &ClassifiedSet, window: &ReportPeriod) -> Result<ReportModel> {
        let filtered = set.within(window);
        info!(
            "Window {:?} to {:?}: {} of {} transactions",
            window.from,
            window.to,
            filtered.len(),
            set.len()
        );
        self.report(&filtered)
    }

    /// Classify and report in one step
    pub fn generate(&self, records: &[TransactionRecord]) -> Result<ReportModel> {
        let set = self.classify(records)?;
        self.report(&set)
    }

    /// Classify every record, then report on `window` only
    ///
    /// Recurring transfers are detected across the whole import, so a
    /// window that cuts a monthly series still sees it as recurring.
    pub fn generate_within(
        &self,
        records: &[TransactionRecord],
        window: &ReportPeriod,
    ) -> Result<ReportModel> {
        let set = self.classify(records)?;
        self.report_within(&set, window)
    }
}

/// Run the whole pipeline with the built-in rule set
pub fn generate_report(records: &[TransactionRecord], config: &ReportConfig) -> Result<ReportModel> {
    ReportGenerator::new(config).generate(records)
}
