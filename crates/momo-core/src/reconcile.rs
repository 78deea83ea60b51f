//! Wallet reconciliation
//!
//! Decides what a parsed message means for the user's wallets. The result is
//! advisory: the reconciler reads the known wallets it is handed and never
//! writes. The caller applies `UpdateBalance` through
//! [`WalletStore::update_wallet_balance`](crate::store::WalletStore) and
//! surfaces `ProposeWalletCreation` to the user.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use crate::models::{ParsedTransactionInfo, Wallet, WalletKind};
use crate::patterns::PatternLibrary;

/// What the caller should do about wallets after a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ReconciliationAction {
    NoAction,
    /// The source has no wallet yet
    ProposeWalletCreation {
        source: String,
        suggested_kind: Option<WalletKind>,
    },
    /// Set the wallet balance to the snapshot taken at `as_of`
    UpdateBalance {
        wallet_id: i64,
        balance: Decimal,
        as_of: DateTime<Utc>,
    },
    /// The wallet already reflects a newer message; the snapshot is ignored
    StaleBalance {
        wallet_id: i64,
        snapshot_at: DateTime<Utc>,
        last_updated_at: DateTime<Utc>,
    },
}

pub struct WalletReconciler<'a> {
    library: &'a PatternLibrary,
}

impl<'a> WalletReconciler<'a> {
    pub fn new(library: &'a PatternLibrary) -> Self {
        Self { library }
    }

    pub fn reconcile(
        &self,
        info: &ParsedTransactionInfo,
        source: &str,
        transaction_date: DateTime<Utc>,
        wallets: &[Wallet],
    ) -> ReconciliationAction {
        let Some(wallet) = wallets.iter().find(|w| w.matches_source(source)) else {
            let suggested_kind = self.library.infer_source_kind(source);
            debug!(
                "Unknown source '{}', proposing wallet (kind hint: {:?})",
                source, suggested_kind
            );
            return ReconciliationAction::ProposeWalletCreation {
                source: source.trim().to_string(),
                suggested_kind,
            };
        };

        let Some(balance) = info.balance_snapshot else {
            return ReconciliationAction::NoAction;
        };

        match wallet.balance_updated_at {
            Some(last) if last > transaction_date => {
                debug!(
                    "Ignoring stale snapshot for wallet {} ({} < {})",
                    wallet.id, transaction_date, last
                );
                ReconciliationAction::StaleBalance {
                    wallet_id: wallet.id,
                    snapshot_at: transaction_date,
                    last_updated_at: last,
                }
            }
            _ => ReconciliationAction::UpdateBalance {
                wallet_id: wallet.id,
                balance,
                as_of: transaction_date,
            },
        }
    }
}
