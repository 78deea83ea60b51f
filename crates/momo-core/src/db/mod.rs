//! Database access layer with connection pooling and migrations
//!
//! This module is organized by domain:
//! - `wallets` - Wallet store (source lookup, guarded creation, conditional balance updates)
//! - `transactions` - Transaction store (hash-deduplicated inserts, listing)
//!
//! Timestamps are stored as `YYYY-MM-DD HH:MM:SS` UTC text so that SQL string
//! comparison orders them correctly. Money values are stored as decimal text.

use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::types::Type;
use rust_decimal::Decimal;
use tracing::info;

use crate::error::Result;

mod transactions;
mod wallets;

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConn = PooledConnection<SqliteConnectionManager>;

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format a timestamp for storage
pub(crate) fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.format(DATETIME_FORMAT).to_string()
}

/// Parse a SQLite datetime string into a DateTime<Utc>
pub(crate) fn parse_datetime(s: &str) -> DateTime<Utc> {
    NaiveDateTime::parse_from_str(s, DATETIME_FORMAT)
        .map(|dt| dt.and_utc())
        .unwrap_or_else(|_| Utc::now())
}

/// Read a decimal stored as text
pub(crate) fn get_decimal(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let raw: String = row.get(idx)?;
    Decimal::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn get_optional_decimal(
    row: &rusqlite::Row<'_>,
    idx: usize,
) -> rusqlite::Result<Option<Decimal>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| {
        Decimal::from_str(&s)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    })
    .transpose()
}

/// Database wrapper with connection pooling
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
    /// Path to the database file
    db_path: String,
}

impl Database {
    /// Open (or create) a database file and run migrations
    pub fn new(path: &str) -> Result<Self> {
        let manager = SqliteConnectionManager::file(path).with_init(|conn| {
            // Concurrent writers wait for the lock instead of failing with SQLITE_BUSY
            conn.busy_timeout(Duration::from_secs(5))?;
            conn.execute_batch("PRAGMA foreign_keys = ON;")?;
            Ok(())
        });

        let pool = Pool::builder().max_size(10).build(manager)?;

        let db = Self {
            pool,
            db_path: path.to_string(),
        };
        db.run_migrations()?;

        Ok(db)
    }

    /// Get the path to the database file
    pub fn path(&self) -> &str {
        &self.db_path
    }

    /// Create an in-memory database (for testing)
    ///
    /// Note: Uses a temporary file rather than `:memory:` because every pooled
    /// connection to `:memory:` would see its own empty database.
    pub fn in_memory() -> Result<Self> {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);

        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = std::env::temp_dir().join(format!(
            "momo_test_{}_{}.db",
            std::process::id(),
            id
        ));
        let path = path.to_string_lossy().to_string();

        // Remove any existing file
        let _ = std::fs::remove_file(&path);

        Self::new(&path)
    }

    /// Get a connection from the pool
    pub fn conn(&self) -> Result<DbConn> {
        Ok(self.pool.get()?)
    }

    /// Row counts as (wallets, transactions)
    pub fn counts(&self) -> Result<(i64, i64)> {
        let conn = self.conn()?;
        let wallets: i64 = conn.query_row("SELECT COUNT(*) FROM wallets", [], |row| row.get(0))?;
        let transactions: i64 =
            conn.query_row("SELECT COUNT(*) FROM transactions", [], |row| row.get(0))?;
        Ok((wallets, transactions))
    }

    /// Run database migrations
    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            -- WAL mode: readers don't block the single writer
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;

            -- Wallets (one per provider source label)
            CREATE TABLE IF NOT EXISTS wallets (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                source TEXT NOT NULL,
                kind TEXT NOT NULL,                        -- momo, bank, cash, other
                balance TEXT NOT NULL DEFAULT '0',         -- decimal text
                is_income_source BOOLEAN NOT NULL DEFAULT 0,
                balance_updated_at DATETIME,               -- message time of the last applied snapshot
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            -- One wallet per source, case-insensitive
            CREATE UNIQUE INDEX IF NOT EXISTS idx_wallets_source ON wallets(source COLLATE NOCASE);

            -- Transactions (immutable once stored)
            CREATE TABLE IF NOT EXISTS transactions (
                id INTEGER PRIMARY KEY,
                transaction_date DATETIME NOT NULL,
                amount TEXT NOT NULL,                      -- unsigned decimal text
                tx_type TEXT NOT NULL,                     -- debit, credit
                source TEXT NOT NULL,
                description TEXT NOT NULL,
                counterparty TEXT,
                balance TEXT,                              -- snapshot, NULL when unknown
                category TEXT NOT NULL,
                is_transfer BOOLEAN NOT NULL DEFAULT 0,
                raw_sms TEXT NOT NULL,
                import_hash TEXT NOT NULL UNIQUE,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(transaction_date);
            CREATE INDEX IF NOT EXISTS idx_transactions_source ON transactions(source COLLATE NOCASE);
            CREATE INDEX IF NOT EXISTS idx_transactions_category ON transactions(category);
            "#,
        )?;

        info!("Database schema initialized");
        Ok(())
    }
}

#[cfg(test)]
mod tests;
