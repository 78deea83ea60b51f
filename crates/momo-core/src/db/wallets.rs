//! Wallet operations

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use rust_decimal::Decimal;
use tracing::{debug, info};

use super::{format_datetime, get_decimal, parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{NewWallet, Wallet, WalletKind};
use crate::store::{BalanceUpdate, WalletStore};

const WALLET_COLUMNS: &str =
    "id, name, source, kind, balance, is_income_source, balance_updated_at, created_at";

fn row_to_wallet(row: &Row<'_>) -> rusqlite::Result<Wallet> {
    let kind_str: String = row.get(3)?;
    let updated_str: Option<String> = row.get(6)?;
    let created_at_str: String = row.get(7)?;

    Ok(Wallet {
        id: row.get(0)?,
        name: row.get(1)?,
        source: row.get(2)?,
        kind: kind_str.parse().unwrap_or(WalletKind::Other),
        balance: get_decimal(row, 4)?,
        is_income_source: row.get(5)?,
        balance_updated_at: updated_str.as_deref().map(parse_datetime),
        created_at: parse_datetime(&created_at_str),
    })
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

impl Database {
    /// Get a wallet by ID
    pub fn get_wallet(&self, id: i64) -> Result<Option<Wallet>> {
        let conn = self.conn()?;
        let wallet = conn
            .query_row(
                &format!("SELECT {} FROM wallets WHERE id = ?", WALLET_COLUMNS),
                params![id],
                row_to_wallet,
            )
            .optional()?;
        Ok(wallet)
    }
}

impl WalletStore for Database {
    fn list_wallets(&self) -> Result<Vec<Wallet>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM wallets ORDER BY name COLLATE NOCASE",
            WALLET_COLUMNS
        ))?;

        let wallets = stmt
            .query_map([], row_to_wallet)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(wallets)
    }

    fn get_wallet_by_source(&self, source: &str) -> Result<Option<Wallet>> {
        let conn = self.conn()?;
        let wallet = conn
            .query_row(
                &format!(
                    "SELECT {} FROM wallets WHERE source = ? COLLATE NOCASE",
                    WALLET_COLUMNS
                ),
                params![source.trim()],
                row_to_wallet,
            )
            .optional()?;
        Ok(wallet)
    }

    fn create_wallet(&self, wallet: &NewWallet) -> Result<Wallet> {
        let source = wallet.source.trim();
        if source.is_empty() {
            return Err(Error::InvalidData("Wallet source cannot be empty".to_string()));
        }
        let name = if wallet.name.trim().is_empty() {
            source
        } else {
            wallet.name.trim()
        };

        let conn = self.conn()?;
        let inserted = conn.execute(
            r#"
            INSERT INTO wallets (name, source, kind, balance, is_income_source, balance_updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
            params![
                name,
                source,
                wallet.kind.as_str(),
                wallet.opening_balance.to_string(),
                wallet.is_income_source,
                wallet.opening_balance_as_of.as_ref().map(format_datetime),
            ],
        );

        match inserted {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => {
                debug!("Wallet for source '{}' already exists", source);
                return Err(Error::DuplicateWallet(source.to_string()));
            }
            Err(e) => return Err(e.into()),
        }

        let id = conn.last_insert_rowid();
        info!("Created {} wallet '{}' for source '{}'", wallet.kind, name, source);

        let created = conn.query_row(
            &format!("SELECT {} FROM wallets WHERE id = ?", WALLET_COLUMNS),
            params![id],
            row_to_wallet,
        )?;
        Ok(created)
    }

    fn update_wallet_balance(
        &self,
        wallet_id: i64,
        balance: Decimal,
        as_of: DateTime<Utc>,
    ) -> Result<BalanceUpdate> {
        let conn = self.conn()?;
        let as_of = format_datetime(&as_of);

        let changed = conn.execute(
            r#"
            UPDATE wallets
            SET balance = ?1, balance_updated_at = ?2
            WHERE id = ?3
              AND (balance_updated_at IS NULL OR balance_updated_at <= ?2)
            "#,
            params![balance.to_string(), as_of, wallet_id],
        )?;

        if changed == 1 {
            debug!("Wallet {} balance set to {} as of {}", wallet_id, balance, as_of);
            Ok(BalanceUpdate::Applied)
        } else {
            debug!("Wallet {} balance update as of {} lost the race", wallet_id, as_of);
            Ok(BalanceUpdate::Conflict)
        }
    }
}
