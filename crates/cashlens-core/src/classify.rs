//! Transaction classifier
//!
//! Classification runs as separate stages so each one can be reasoned about
//! (and tested) on its own:
//!
//! 1. keyword pass: the rule set picks a category, first match wins
//! 2. investment refinement: Bitcoin raw types and savings transfers are
//!    narrowed to an investment category by marker phrase
//! 3. recurrence pass: savings transfers with no marker that repeat monthly
//!    become "Investment (Potential DCA)"
//! 4. magnitude override: large inflows become "Bonus/Large Payment" or
//!    "Large Income/Payment"
//!
//! Anything still unmatched is "Other". Classification itself never fails;
//! records without an amount, and imports too large to total, are rejected
//! before any stage runs.

use rust_decimal::Decimal;
use tracing::debug;

use crate::config::ReportConfig;
use crate::error::{Error, Result};
use crate::investment::{detect_recurring, InvestmentClassifier, RecurrenceCandidate};
use crate::models::{Category, CategoryBasis, ClassifiedSet, Transaction, TransactionRecord};
use crate::rules::RuleSet;

/// Result of classifying one record
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub category: Category,
    pub basis: CategoryBasis,
    /// Savings transfer with no marker; the recurrence pass decides
    pub recurrence_candidate: bool,
}

/// Applies a rule set (plus investment refinement and magnitude override)
#[derive(Debug, Clone)]
pub struct Classifier {
    rules: RuleSet,
    investment: InvestmentClassifier,
    config: ReportConfig,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(&ReportConfig::default())
    }
}

impl Classifier {
    /// Create a classifier with the built-in rule set
    pub fn new(config: &ReportConfig) -> Self {
        Self::with_rules(RuleSet::standard(config), config)
    }

    /// Create a classifier with a custom rule set
    pub fn with_rules(rules: RuleSet, config: &ReportConfig) -> Self {
        Self {
            rules,
            investment: InvestmentClassifier::new(config),
            config: config.clone(),
        }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    /// Category for a single record, without sibling context
    ///
    /// The recurrence pass needs the rest of the set, so an unmarked savings
    /// transfer stays "Transfer" here; use [`Classifier::classify_all`] for
    /// reports.
    pub fn classify(&self, record: &TransactionRecord) -> Category {
        self.classify_record(record).category
    }

    /// Stages 1, 2 and 4 for one record
    pub fn classify_record(&self, record: &TransactionRecord) -> Classification {
        let keyword = self.keyword_pass(record);
        let amount = record.amount.unwrap_or(Decimal::ZERO);
        self.magnitude_override(record, amount, keyword)
    }

    /// Classify a whole import; fails only on records without an amount
    pub fn classify_all(&self, records: &[TransactionRecord]) -> Result<ClassifiedSet> {
        let amounts = records
            .iter()
            .enumerate()
            .map(|(index, record)| {
                record.amount.ok_or_else(|| {
                    Error::InvalidInput(format!(
                        "record {} ({}, {:?}) has no amount",
                        index, record.date, record.description
                    ))
                })
            })
            .collect::<Result<Vec<Decimal>>>()?;

        // Bounds every total the aggregator and ranker compute
        let magnitude = amounts
            .iter()
            .try_fold(Decimal::ZERO, |sum, amount| sum.checked_add(amount.abs()));
        if magnitude.is_none() {
            return Err(Error::InvalidInput(format!(
                "total of {} amounts does not fit in a decimal",
                amounts.len()
            )));
        }

        let mut decisions: Vec<Classification> =
            records.iter().map(|record| self.keyword_pass(record)).collect();

        self.recurrence_pass(records, &amounts, &mut decisions);

        let transactions = records
            .iter()
            .zip(amounts)
            .zip(decisions)
            .enumerate()
            .map(|(index, ((record, amount), decision))| {
                let decision = self.magnitude_override(record, amount, decision);
                Transaction {
                    index,
                    date: record.date,
                    amount,
                    description: record.description.clone(),
                    raw_type: record.raw_type().map(str::to_string),
                    category: decision.category,
                    basis: decision.basis,
                }
            })
            .collect();

        Ok(ClassifiedSet::new(transactions))
    }

    /// Stages 1 and 2: rule set, then investment refinement
    fn keyword_pass(&self, record: &TransactionRecord) -> Classification {
        let raw_type = record.raw_type();

        if self.config.is_bitcoin_buy(raw_type) {
            if let Some(rule) = self.investment.refine(record) {
                return Classification {
                    category: rule.category,
                    basis: CategoryBasis::Investment {
                        rule_id: rule.id.clone(),
                    },
                    recurrence_candidate: false,
                };
            }
        }

        let Some(rule) = self.rules.first_match(record) else {
            debug!("Falling back to 'Other' for '{}'", record.description);
            return Classification {
                category: Category::Other,
                basis: CategoryBasis::Fallback,
                recurrence_candidate: false,
            };
        };

        debug!(
            "Rule '{}' matched for '{}': {}",
            rule.id, record.description, rule.category
        );

        if rule.category == Category::Transfer && self.config.is_savings_transfer(raw_type) {
            return match self.investment.refine(record) {
                Some(refined) => Classification {
                    category: refined.category,
                    basis: CategoryBasis::Investment {
                        rule_id: refined.id.clone(),
                    },
                    recurrence_candidate: false,
                },
                None => Classification {
                    category: Category::Transfer,
                    basis: CategoryBasis::Rule {
                        rule_id: rule.id.clone(),
                    },
                    recurrence_candidate: true,
                },
            };
        }

        Classification {
            category: rule.category,
            basis: CategoryBasis::Rule {
                rule_id: rule.id.clone(),
            },
            recurrence_candidate: false,
        }
    }

    /// Stage 3: set-level recurring-transfer check
    fn recurrence_pass(
        &self,
        records: &[TransactionRecord],
        amounts: &[Decimal],
        decisions: &mut [Classification],
    ) {
        let candidates: Vec<RecurrenceCandidate> = decisions
            .iter()
            .enumerate()
            .filter(|(_, decision)| decision.recurrence_candidate)
            .map(|(index, _)| RecurrenceCandidate {
                index,
                date: records[index].date,
                amount: amounts[index],
            })
            .collect();

        if candidates.is_empty() {
            return;
        }

        for index in detect_recurring(&candidates, &self.config.recurrence) {
            debug!(
                "Potential DCA for '{}' ({})",
                records[index].description, amounts[index]
            );
            decisions[index] = Classification {
                category: Category::InvestmentPotentialDca,
                basis: CategoryBasis::Recurrence,
                recurrence_candidate: false,
            };
        }
    }

    /// Stage 4: large inflows, applied after every other decision
    ///
    /// The threshold is positive, so outflows (including investment
    /// purchases) are never relabelled.
    fn magnitude_override(
        &self,
        record: &TransactionRecord,
        amount: Decimal,
        decision: Classification,
    ) -> Classification {
        if amount < self.config.large_amount_threshold {
            return decision;
        }

        let description = record.description.to_lowercase();
        let is_bonus = self
            .config
            .bonus_keywords
            .iter()
            .any(|keyword| description.contains(&keyword.to_lowercase()));

        let category = if is_bonus {
            Category::BonusLargePayment
        } else {
            Category::LargeIncomePayment
        };

        debug!(
            "Large inflow {} for '{}' relabelled {} (was {})",
            amount, record.description, category, decision.category
        );

        Classification {
            category,
            basis: CategoryBasis::Magnitude,
            recurrence_candidate: false,
        }
    }
}
