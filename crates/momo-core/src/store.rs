//! Storage seams
//!
//! The classifier, assigner and reconciler never touch storage. The ingestion
//! pipeline and wallet workflow talk to these traits; [`Database`](crate::db::Database)
//! is the SQLite implementation.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::error::Result;
use crate::models::{NewTransaction, NewWallet, Transaction, Wallet};

/// Outcome of a conditional balance write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceUpdate {
    Applied,
    /// The stored `balance_updated_at` is newer than `as_of`, or the wallet is gone
    Conflict,
}

/// Outcome of a transaction insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionInsertResult {
    Inserted(i64),
    /// Same import hash already stored; carries the existing id
    Duplicate(i64),
}

impl TransactionInsertResult {
    pub fn id(&self) -> i64 {
        match self {
            Self::Inserted(id) | Self::Duplicate(id) => *id,
        }
    }
}

pub trait WalletStore: Send + Sync {
    fn list_wallets(&self) -> Result<Vec<Wallet>>;

    /// Case-insensitive lookup on the source label
    fn get_wallet_by_source(&self, source: &str) -> Result<Option<Wallet>>;

    /// Create a wallet; a source that already has one fails with
    /// [`Error::DuplicateWallet`](crate::Error::DuplicateWallet)
    fn create_wallet(&self, wallet: &NewWallet) -> Result<Wallet>;

    /// Set the balance only if no newer snapshot has been applied.
    ///
    /// A single atomic compare on `balance_updated_at`: the write happens when
    /// the stored timestamp is null or not after `as_of`.
    fn update_wallet_balance(
        &self,
        wallet_id: i64,
        balance: Decimal,
        as_of: DateTime<Utc>,
    ) -> Result<BalanceUpdate>;
}

pub trait TransactionStore: Send + Sync {
    fn create_transaction(&self, tx: &NewTransaction) -> Result<TransactionInsertResult>;

    /// Most recent first
    fn list_transactions(&self, limit: i64) -> Result<Vec<Transaction>>;
}
