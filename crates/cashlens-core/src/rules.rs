//! Category rule set
//!
//! An ordered list of `(predicate, category)` rules. The first rule whose
//! predicate matches decides the category; order is the only precedence
//! mechanism, so overlapping keywords ("purchase" is both a Shopping keyword
//! and part of "purchase of BTC") are resolved by where a rule sits in the
//! list.
//!
//! The default rule set is plain data. A custom set can be loaded from TOML:
//!
//! ```toml
//! [[rules]]
//! id = "groceries"
//! category = "Food & Dining"
//! match = "contains"
//! patterns = ["grocery", "whole foods"]
//! ```

use std::fs;
use std::path::Path;

use regex::{Regex, RegexBuilder};
use serde::Deserialize;

use crate::config::ReportConfig;
use crate::error::{Error, Result};
use crate::models::{Category, TransactionRecord};

/// How a rule's patterns are compared
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternType {
    /// Raw type equals one of the patterns exactly
    RawType,
    /// Case-insensitive description substring (any pattern)
    Contains,
    /// Case-insensitive whole-description match
    Exact,
    /// Case-insensitive regular expression on the description
    Regex,
}

impl PatternType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RawType => "raw_type",
            Self::Contains => "contains",
            Self::Exact => "exact",
            Self::Regex => "regex",
        }
    }
}

impl std::str::FromStr for PatternType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "raw_type" => Ok(Self::RawType),
            "contains" => Ok(Self::Contains),
            "exact" => Ok(Self::Exact),
            "regex" => Ok(Self::Regex),
            _ => Err(format!("Unknown pattern type: {}", s)),
        }
    }
}

/// A single test against a record's description or raw type
#[derive(Debug, Clone)]
pub enum Predicate {
    RawTypeIn(Vec<String>),
    /// Keywords are stored lowercased
    DescriptionContainsAny(Vec<String>),
    DescriptionExact(String),
    DescriptionMatches(Regex),
}

impl Predicate {
    pub fn raw_type_in<S: AsRef<str>>(types: &[S]) -> Self {
        Self::RawTypeIn(types.iter().map(|t| t.as_ref().trim().to_string()).collect())
    }

    pub fn contains_any<S: AsRef<str>>(keywords: &[S]) -> Self {
        Self::DescriptionContainsAny(
            keywords
                .iter()
                .map(|k| k.as_ref().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        )
    }

    pub fn exact(description: &str) -> Self {
        Self::DescriptionExact(description.trim().to_lowercase())
    }

    pub fn matches_regex(pattern: &str) -> Result<Self> {
        let regex = RegexBuilder::new(pattern).case_insensitive(true).build()?;
        Ok(Self::DescriptionMatches(regex))
    }

    pub fn pattern_type(&self) -> PatternType {
        match self {
            Self::RawTypeIn(_) => PatternType::RawType,
            Self::DescriptionContainsAny(_) => PatternType::Contains,
            Self::DescriptionExact(_) => PatternType::Exact,
            Self::DescriptionMatches(_) => PatternType::Regex,
        }
    }

    pub fn matches(&self, record: &TransactionRecord) -> bool {
        match self {
            Self::RawTypeIn(types) => match record.raw_type() {
                Some(raw) => types.iter().any(|t| t == raw),
                None => false,
            },
            Self::DescriptionContainsAny(keywords) => {
                let description = record.description.to_lowercase();
                keywords.iter().any(|k| description.contains(k.as_str()))
            }
            Self::DescriptionExact(expected) => {
                record.description.trim().to_lowercase() == *expected
            }
            Self::DescriptionMatches(regex) => regex.is_match(&record.description),
        }
    }

    /// Human-readable pattern list, for listings and `rules test`
    pub fn describe(&self) -> String {
        match self {
            Self::RawTypeIn(types) => types.join(" | "),
            Self::DescriptionContainsAny(keywords) => keywords.join(" | "),
            Self::DescriptionExact(expected) => expected.clone(),
            Self::DescriptionMatches(regex) => regex.as_str().to_string(),
        }
    }
}

/// One entry in a rule set
#[derive(Debug, Clone)]
pub struct Rule {
    /// Stable identifier, recorded on each transaction the rule classifies
    pub id: String,
    pub predicate: Predicate,
    pub category: Category,
}

impl Rule {
    pub fn new(id: impl Into<String>, predicate: Predicate, category: Category) -> Self {
        Self {
            id: id.into(),
            predicate,
            category,
        }
    }

    pub fn matches(&self, record: &TransactionRecord) -> bool {
        self.predicate.matches(record)
    }
}

/// Ordered rules; first match wins
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::standard(&ReportConfig::default())
    }
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// The built-in rule set, with raw-type lists taken from `config`
    ///
    /// Raw-type rules come first: a "Savings" row described as a "purchase"
    /// must reach the investment sub-classifier rather than Shopping.
    pub fn standard(config: &ReportConfig) -> Self {
        use Category::*;

        let keyword_rules: [(&str, Category, &[&str]); 11] = [
            (
                "food",
                FoodDining,
                &[
                    "restaurant", "food", "coffee", "pizza", "burger", "lunch", "dinner",
                    "starbucks", "mcdonald", "chipotle", "grocery", "doordash", "grubhub",
                ],
            ),
            (
                "health",
                HealthMedical,
                &["pharmacy", "cvs", "walgreens", "doctor", "medical", "dental", "hospital", "clinic"],
            ),
            (
                "personal-care",
                PersonalCare,
                &["salon", "barber", "haircut", "massage", "nail"],
            ),
            (
                "education",
                Education,
                &["tuition", "udemy", "coursera", "school", "university", "textbook"],
            ),
            (
                "shopping",
                Shopping,
                &["amazon", "target", "walmart", "store", "shopping", "purchase", "buy"],
            ),
            (
                "transportation",
                Transportation,
                &["uber", "lyft", "gas", "fuel", "parking", "taxi", "transit"],
            ),
            (
                "entertainment",
                Entertainment,
                &["movie", "game", "spotify", "netflix", "entertainment", "ticket"],
            ),
            (
                "bills",
                BillsUtilities,
                &["bill", "utility", "electric", "water", "internet", "phone", "rent"],
            ),
            (
                "income",
                Income,
                &["payroll", "salary", "deposit", "income", "payment received", "direct dep"],
            ),
            (
                "transfer",
                Transfer,
                &["transfer", "sent", "received", "cash out", "cash in"],
            ),
            ("atm", Atm, &["atm", "withdrawal", "cash"]),
        ];

        let mut rules = vec![
            Rule::new(
                "bitcoin-buy",
                Predicate::raw_type_in(&config.bitcoin_raw_types),
                InvestmentBitcoin,
            ),
            Rule::new(
                "savings-transfer",
                Predicate::raw_type_in(&config.savings_transfer_raw_types),
                Transfer,
            ),
        ];
        rules.extend(
            keyword_rules
                .iter()
                .map(|(id, category, keywords)| {
                    Rule::new(*id, Predicate::contains_any(*keywords), *category)
                }),
        );

        Self { rules }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// The rule that decides this record's category, if any
    pub fn first_match(&self, record: &TransactionRecord) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.matches(record))
    }

    /// Every matching rule, in precedence order; the first one wins
    pub fn explain(&self, record: &TransactionRecord) -> Vec<&Rule> {
        self.rules.iter().filter(|rule| rule.matches(record)).collect()
    }

    /// Parse a rule set from TOML (`[[rules]]` tables)
    pub fn from_toml(content: &str) -> Result<Self> {
        let raw: RawRuleSet = toml::from_str(content)
            .map_err(|e| Error::Rule(format!("Invalid rules TOML: {}", e)))?;

        let mut rules = Vec::with_capacity(raw.rules.len());
        for raw_rule in raw.rules {
            rules.push(raw_rule.into_rule()?);
        }

        if rules.is_empty() {
            return Err(Error::Rule("rule set has no rules".to_string()));
        }

        Ok(Self { rules })
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRuleSet {
    #[serde(default)]
    rules: Vec<RawRule>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRule {
    id: String,
    category: String,
    #[serde(rename = "match")]
    pattern_type: String,
    patterns: Vec<String>,
}

impl RawRule {
    fn into_rule(self) -> Result<Rule> {
        let category: Category = self
            .category
            .parse()
            .map_err(|e| Error::Rule(format!("rule '{}': {}", self.id, e)))?;
        let pattern_type: PatternType = self
            .pattern_type
            .parse()
            .map_err(|e| Error::Rule(format!("rule '{}': {}", self.id, e)))?;

        if self.patterns.is_empty() {
            return Err(Error::Rule(format!("rule '{}' has no patterns", self.id)));
        }

        let predicate = match pattern_type {
            PatternType::RawType => Predicate::raw_type_in(&self.patterns),
            PatternType::Contains => Predicate::contains_any(&self.patterns),
            PatternType::Exact => {
                if self.patterns.len() != 1 {
                    return Err(Error::Rule(format!(
                        "rule '{}': exact match takes one pattern",
                        self.id
                    )));
                }
                Predicate::exact(&self.patterns[0])
            }
            PatternType::Regex => Predicate::matches_regex(&self.patterns.join("|"))?,
        };

        Ok(Rule::new(self.id, predicate, category))
    }
}
