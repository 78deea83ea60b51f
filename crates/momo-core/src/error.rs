//! Error types for Momo

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("Import error: {0}")]
    Import(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Pattern library error: {0}")]
    Pattern(String),

    /// A wallet for this source already exists (case-insensitive)
    #[error("Wallet already exists for source: {0}")]
    DuplicateWallet(String),

    /// The proposal was already confirmed or dismissed
    #[error("Wallet proposal for {0} is already resolved")]
    ProposalResolved(String),
}

pub type Result<T> = std::result::Result<T, Error>;
