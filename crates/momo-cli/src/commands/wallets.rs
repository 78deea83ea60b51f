//! Wallet command implementations

use anyhow::{Context, Result};
use momo_core::{parse_decimal, Database, Error, NewWallet, WalletKind, WalletStore};

use super::truncate;

pub fn cmd_wallets_list(db: &Database) -> Result<()> {
    let wallets = db.list_wallets()?;

    if wallets.is_empty() {
        println!("No wallets yet. They are proposed while ingesting, or add one with:");
        println!("  momo wallets add --source MobileMoney --kind momo");
        return Ok(());
    }

    println!();
    println!("🪙 Wallets");
    println!("   ─────────────────────────────────────────────────────────────");

    for wallet in wallets {
        let updated = wallet
            .balance_updated_at
            .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "never".to_string());
        let income = if wallet.is_income_source { " 💰" } else { "" };

        println!(
            "   [{}] {:<20} │ {:<6} │ {:>12} │ {} │ {}{}",
            wallet.id,
            truncate(&wallet.name, 20),
            wallet.kind.as_str(),
            wallet.balance,
            updated,
            truncate(&wallet.source, 20),
            income
        );
    }

    Ok(())
}

pub fn cmd_wallets_add(
    db: &Database,
    source: &str,
    kind: &str,
    name: Option<&str>,
    balance: &str,
    income: bool,
) -> Result<()> {
    let kind: WalletKind = kind.parse().map_err(|e: String| anyhow::anyhow!(e))?;
    let opening_balance = parse_decimal(balance)
        .with_context(|| format!("Invalid opening balance: {}", balance))?;

    let mut new_wallet = NewWallet::from_source(source, kind);
    if let Some(name) = name {
        new_wallet.name = name.to_string();
    }
    new_wallet.opening_balance = opening_balance;
    new_wallet.is_income_source = income;

    match db.create_wallet(&new_wallet) {
        Ok(wallet) => {
            println!(
                "✅ Created wallet '{}' (id {}) for source {}",
                wallet.name, wallet.id, wallet.source
            );
            Ok(())
        }
        Err(Error::DuplicateWallet(source)) => {
            anyhow::bail!("A wallet for source '{}' already exists", source)
        }
        Err(e) => Err(e).context("Failed to create wallet"),
    }
}
