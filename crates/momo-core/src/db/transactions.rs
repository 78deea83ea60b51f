//! Transaction operations

use rusqlite::{params, OptionalExtension, Row};

use super::{format_datetime, get_decimal, get_optional_decimal, parse_datetime, Database};
use crate::error::Result;
use crate::models::{Category, NewTransaction, Transaction, TransactionType};
use crate::store::{TransactionInsertResult, TransactionStore};

const TRANSACTION_COLUMNS: &str = "id, transaction_date, amount, tx_type, source, description, \
     counterparty, balance, category, is_transfer, raw_sms, import_hash, created_at";

fn row_to_transaction(row: &Row<'_>) -> rusqlite::Result<Transaction> {
    let date_str: String = row.get(1)?;
    let tx_type_str: String = row.get(3)?;
    let category_str: String = row.get(8)?;
    let created_at_str: String = row.get(12)?;

    Ok(Transaction {
        id: row.get(0)?,
        transaction_date: parse_datetime(&date_str),
        amount: get_decimal(row, 2)?,
        tx_type: tx_type_str.parse().unwrap_or(TransactionType::Debit),
        source: row.get(4)?,
        description: row.get(5)?,
        counterparty: row.get(6)?,
        balance: get_optional_decimal(row, 7)?,
        category: Category::resolve(&category_str),
        is_transfer: row.get(9)?,
        raw_sms: row.get(10)?,
        import_hash: row.get(11)?,
        created_at: parse_datetime(&created_at_str),
    })
}

impl Database {
    /// Get a transaction by ID
    pub fn get_transaction(&self, id: i64) -> Result<Option<Transaction>> {
        let conn = self.conn()?;
        let tx = conn
            .query_row(
                &format!("SELECT {} FROM transactions WHERE id = ?", TRANSACTION_COLUMNS),
                params![id],
                row_to_transaction,
            )
            .optional()?;
        Ok(tx)
    }

    /// Transactions recorded for one source, oldest first
    pub fn list_transactions_for_source(&self, source: &str) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM transactions WHERE source = ? COLLATE NOCASE ORDER BY transaction_date, id",
            TRANSACTION_COLUMNS
        ))?;

        let transactions = stmt
            .query_map(params![source.trim()], row_to_transaction)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(transactions)
    }
}

impl TransactionStore for Database {
    /// Insert a transaction (skips duplicates based on import_hash)
    fn create_transaction(&self, tx: &NewTransaction) -> Result<TransactionInsertResult> {
        let conn = self.conn()?;

        let changed = conn.execute(
            r#"
            INSERT INTO transactions (transaction_date, amount, tx_type, source, description,
                                      counterparty, balance, category, is_transfer, raw_sms, import_hash)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(import_hash) DO NOTHING
            "#,
            params![
                format_datetime(&tx.transaction_date),
                tx.amount.to_string(),
                tx.tx_type.as_str(),
                tx.source,
                tx.description,
                tx.counterparty,
                tx.balance.map(|b| b.to_string()),
                tx.category.name(),
                tx.is_transfer,
                tx.raw_sms,
                tx.import_hash,
            ],
        )?;

        if changed == 1 {
            return Ok(TransactionInsertResult::Inserted(conn.last_insert_rowid()));
        }

        let existing_id: i64 = conn.query_row(
            "SELECT id FROM transactions WHERE import_hash = ?",
            params![tx.import_hash],
            |row| row.get(0),
        )?;
        Ok(TransactionInsertResult::Duplicate(existing_id))
    }

    fn list_transactions(&self, limit: i64) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM transactions ORDER BY transaction_date DESC, id DESC LIMIT ?",
            TRANSACTION_COLUMNS
        ))?;

        let transactions = stmt
            .query_map(params![limit], row_to_transaction)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(transactions)
    }
}
