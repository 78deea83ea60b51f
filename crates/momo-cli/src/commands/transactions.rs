//! Transaction command implementations

use anyhow::Result;
use momo_core::{Database, TransactionStore, TransactionType};

use super::truncate;

pub fn cmd_transactions_list(db: &Database, limit: i64, source: Option<&str>) -> Result<()> {
    let transactions = match source {
        Some(source) => {
            let mut history = db.list_transactions_for_source(source)?;
            history.reverse();
            history.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
            history
        }
        None => db.list_transactions(limit)?,
    };

    if transactions.is_empty() {
        println!("No transactions found. Ingest some with:");
        println!("  momo ingest --file sms.csv");
        return Ok(());
    }

    println!();
    println!("📝 Recent Transactions");
    println!("   ─────────────────────────────────────────────────────────────");

    for tx in transactions {
        let amount_str = match tx.tx_type {
            TransactionType::Debit => format!("\x1b[31m-{:.2}\x1b[0m", tx.amount), // Red for debits
            TransactionType::Credit => format!("\x1b[32m+{:.2}\x1b[0m", tx.amount), // Green for credits
        };
        let transfer = if tx.is_transfer { " ⇄" } else { "" };

        println!(
            "   {} │ {:>12} │ {:<16} │ {:<14} │ {}{}",
            tx.transaction_date.format("%Y-%m-%d %H:%M"),
            amount_str,
            tx.category.name(),
            truncate(&tx.source, 14),
            truncate(&tx.description, 36),
            transfer
        );
    }

    Ok(())
}
