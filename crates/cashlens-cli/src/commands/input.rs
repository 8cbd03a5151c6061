//! Loading normalized transaction files
//!
//! Only the normalized record shape is accepted: `date,amount,description,raw_type`
//! as CSV with a header row, or a JSON array of objects with the same keys.
//! Bank-specific export formats must be converted before they get here.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use cashlens_core::{parse_amount, TransactionRecord};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct CsvRow {
    date: String,
    #[serde(default)]
    amount: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    raw_type: Option<String>,
}

impl CsvRow {
    fn into_record(self) -> Result<TransactionRecord> {
        let date = NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d")
            .with_context(|| format!("Invalid date '{}' (use YYYY-MM-DD)", self.date))?;

        // A blank amount is passed through as absent; classification rejects it
        let amount = match self.amount.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => Some(parse_amount(text)?),
            _ => None,
        };

        Ok(TransactionRecord {
            date,
            amount,
            description: self.description.unwrap_or_default(),
            raw_type: self.raw_type.filter(|t| !t.trim().is_empty()),
        })
    }
}

/// Load records from a `.json` file, or CSV for anything else
pub fn load_records(path: &Path) -> Result<Vec<TransactionRecord>> {
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let records = if is_json {
        load_json(path)?
    } else {
        load_csv(path)?
    };

    debug!("Loaded {} records from {}", records.len(), path.display());
    Ok(records)
}

fn load_csv(path: &Path) -> Result<Vec<TransactionRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let mut records = Vec::new();
    for (i, row) in reader.deserialize::<CsvRow>().enumerate() {
        // Line numbers are 1-based and skip the header
        let line = i + 2;
        let row = row.with_context(|| format!("Invalid CSV row at line {}", line))?;
        let record = row
            .into_record()
            .with_context(|| format!("Invalid record at line {}", line))?;
        records.push(record);
    }

    Ok(records)
}

fn load_json(path: &Path) -> Result<Vec<TransactionRecord>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let records: Vec<TransactionRecord> = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Invalid JSON records in {}", path.display()))?;
    Ok(records)
}
