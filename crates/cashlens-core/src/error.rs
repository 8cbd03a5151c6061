//! Error types for Cashlens

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// A record the core refuses to process (e.g. missing or non-numeric amount)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Rule error: {0}")]
    Rule(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
