//! Momo Core Library
//!
//! Shared functionality for the Momo SMS transaction ledger:
//! - Pattern library of provider-specific SMS recognizers
//! - Message classifier (transfer detection, wallet kind inference, balances)
//! - SMS field extractor and category assigner
//! - Wallet reconciler and wallet creation workflow
//! - SMS export import and the ingestion pipeline
//! - SQLite store with connection pooling and migrations

pub mod categorize;
pub mod classify;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod import;
pub mod ingest;
pub mod models;
pub mod patterns;
pub mod reconcile;
pub mod store;
pub mod workflow;

pub use categorize::{CategoryAssigner, CategoryAssignment, CategorySource};
pub use classify::{parse_decimal, MessageClassifier};
pub use config::Settings;
pub use db::Database;
pub use error::{Error, Result};
pub use extract::{ExtractedFields, SmsExtractor};
pub use import::{parse_sms_csv, SmsFormat, SmsImport};
pub use ingest::{IngestReport, Ingestor, MessageResult, MessageStatus, ParsedSms, SmsParser};
pub use models::{
    Category, IncomingSms, NewTransaction, NewWallet, ParsedTransactionInfo, Transaction,
    TransactionType, Wallet, WalletKind,
};
pub use patterns::PatternLibrary;
pub use reconcile::{ReconciliationAction, WalletReconciler};
pub use store::{BalanceUpdate, TransactionInsertResult, TransactionStore, WalletStore};
pub use workflow::{ProposalSession, ProposalState, Resolution, WalletConfirmation, WalletProposal};
