//! Wallet creation workflow
//!
//! A [`WalletProposal`] is raised when a message arrives from a source with no
//! wallet. It waits for the user and then resolves exactly once: the wallet is
//! created, turns out to exist already, or the proposal is dismissed.
//!
//! ```text
//! AwaitingConfirmation --confirm--> Resolved(Created | AlreadyExists)
//!                      --dismiss--> Resolved(Dismissed)
//! ```
//!
//! Duplicate creation cannot happen: confirmation looks the source up first and
//! treats the store's unique-source rejection as "already exists", so two
//! confirmations racing for the same source end with one wallet.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::models::{display_name_for_source, NewWallet, Wallet, WalletKind};
use crate::store::WalletStore;

/// Terminal outcome of a proposal
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "wallet", rename_all = "snake_case")]
pub enum Resolution {
    Created(Wallet),
    /// Another confirmation (or the user, elsewhere) created it first
    AlreadyExists(Wallet),
    Dismissed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalState {
    AwaitingConfirmation,
    Resolved(Resolution),
}

/// What the user chose when accepting a proposal
#[derive(Debug, Clone, PartialEq)]
pub struct WalletConfirmation {
    pub name: String,
    pub kind: WalletKind,
    pub opening_balance: Decimal,
    pub is_income_source: bool,
}

/// A suggested wallet for a newly observed source
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WalletProposal {
    pub source: String,
    pub suggested_kind: Option<WalletKind>,
    /// Newest balance snapshot seen for this source while pending
    pub latest_balance: Option<Decimal>,
    pub latest_balance_at: Option<DateTime<Utc>>,
    state: ProposalState,
}

impl WalletProposal {
    pub fn new(source: &str, suggested_kind: Option<WalletKind>) -> Self {
        Self {
            source: source.trim().to_string(),
            suggested_kind,
            latest_balance: None,
            latest_balance_at: None,
            state: ProposalState::AwaitingConfirmation,
        }
    }

    pub fn state(&self) -> &ProposalState {
        &self.state
    }

    pub fn is_pending(&self) -> bool {
        self.state == ProposalState::AwaitingConfirmation
    }

    /// Record a balance snapshot; only a newer one replaces the current
    pub fn observe_balance(&mut self, balance: Decimal, at: DateTime<Utc>) {
        if self.latest_balance_at.map_or(true, |prev| at >= prev) {
            self.latest_balance = Some(balance);
            self.latest_balance_at = Some(at);
        }
    }

    /// Confirmation pre-filled from the proposal
    ///
    /// Name from the source label, suggested kind (else `other`), opening
    /// balance from the latest snapshot (else zero), not an income source.
    pub fn default_confirmation(&self) -> WalletConfirmation {
        WalletConfirmation {
            name: display_name_for_source(&self.source),
            kind: self.suggested_kind.unwrap_or(WalletKind::Other),
            opening_balance: self.latest_balance.unwrap_or(Decimal::ZERO),
            is_income_source: false,
        }
    }

    /// Accept the proposal and materialize the wallet
    ///
    /// Store errors other than a duplicate leave the proposal pending so the
    /// caller can retry.
    pub fn confirm<S: WalletStore + ?Sized>(
        &mut self,
        store: &S,
        confirmation: WalletConfirmation,
    ) -> Result<Resolution> {
        self.ensure_pending()?;

        let resolution = match store.get_wallet_by_source(&self.source)? {
            Some(existing) => {
                debug!("Wallet for '{}' already exists (id {})", self.source, existing.id);
                Resolution::AlreadyExists(existing)
            }
            None => self.create(store, confirmation)?,
        };

        Ok(self.resolve(resolution))
    }

    /// Decline the proposal
    pub fn dismiss(&mut self) -> Result<()> {
        self.ensure_pending()?;
        info!("Dismissed wallet proposal for '{}'", self.source);
        self.resolve(Resolution::Dismissed);
        Ok(())
    }

    fn create<S: WalletStore + ?Sized>(
        &self,
        store: &S,
        confirmation: WalletConfirmation,
    ) -> Result<Resolution> {
        // A balance taken from a snapshot keeps that snapshot's time, so older
        // messages ingested later cannot overwrite it
        let opening_balance_as_of = match (self.latest_balance, self.latest_balance_at) {
            (Some(latest), Some(at)) if latest == confirmation.opening_balance => Some(at),
            _ => None,
        };

        let new_wallet = NewWallet {
            name: confirmation.name,
            source: self.source.clone(),
            kind: confirmation.kind,
            opening_balance: confirmation.opening_balance,
            opening_balance_as_of,
            is_income_source: confirmation.is_income_source,
        };

        match store.create_wallet(&new_wallet) {
            Ok(wallet) => Ok(Resolution::Created(wallet)),
            Err(Error::DuplicateWallet(_)) => {
                let existing = store.get_wallet_by_source(&self.source)?.ok_or_else(|| {
                    Error::NotFound(format!("wallet for source {}", self.source))
                })?;
                debug!("Lost creation race for '{}' to wallet {}", self.source, existing.id);
                Ok(Resolution::AlreadyExists(existing))
            }
            Err(e) => Err(e),
        }
    }

    fn ensure_pending(&self) -> Result<()> {
        if self.is_pending() {
            Ok(())
        } else {
            Err(Error::ProposalResolved(self.source.clone()))
        }
    }

    fn resolve(&mut self, resolution: Resolution) -> Resolution {
        self.state = ProposalState::Resolved(resolution.clone());
        resolution
    }
}

fn source_key(source: &str) -> String {
    source.trim().to_ascii_lowercase()
}

/// Proposals raised during one session (an ingest run, a UI session)
///
/// Offering a source twice is idempotent, and a dismissed source is not
/// offered again for the rest of the session.
#[derive(Debug, Default)]
pub struct ProposalSession {
    proposals: Vec<WalletProposal>,
    dismissed: HashSet<String>,
}

impl ProposalSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer a proposal; returns true if it is new to this session
    pub fn offer(
        &mut self,
        source: &str,
        suggested_kind: Option<WalletKind>,
        balance: Option<(Decimal, DateTime<Utc>)>,
    ) -> bool {
        let key = source_key(source);
        if key.is_empty() || self.dismissed.contains(&key) {
            return false;
        }

        if let Some(existing) = self.find_mut(source) {
            if existing.is_pending() {
                if let Some((amount, at)) = balance {
                    existing.observe_balance(amount, at);
                }
                if existing.suggested_kind.is_none() {
                    existing.suggested_kind = suggested_kind;
                }
            }
            return false;
        }

        let mut proposal = WalletProposal::new(source, suggested_kind);
        if let Some((amount, at)) = balance {
            proposal.observe_balance(amount, at);
        }
        info!("New wallet proposal for source '{}'", proposal.source);
        self.proposals.push(proposal);
        true
    }

    /// All proposals in the order they were first offered
    pub fn proposals(&self) -> &[WalletProposal] {
        &self.proposals
    }

    pub fn pending(&self) -> impl Iterator<Item = &WalletProposal> {
        self.proposals.iter().filter(|p| p.is_pending())
    }

    pub fn get(&self, source: &str) -> Option<&WalletProposal> {
        let key = source_key(source);
        self.proposals.iter().find(|p| source_key(&p.source) == key)
    }

    fn find_mut(&mut self, source: &str) -> Option<&mut WalletProposal> {
        let key = source_key(source);
        self.proposals
            .iter_mut()
            .find(|p| source_key(&p.source) == key)
    }

    pub fn confirm<S: WalletStore + ?Sized>(
        &mut self,
        store: &S,
        source: &str,
        confirmation: WalletConfirmation,
    ) -> Result<Resolution> {
        let proposal = self
            .find_mut(source)
            .ok_or_else(|| Error::NotFound(format!("wallet proposal for {}", source)))?;
        proposal.confirm(store, confirmation)
    }

    pub fn dismiss(&mut self, source: &str) -> Result<()> {
        let proposal = self
            .find_mut(source)
            .ok_or_else(|| Error::NotFound(format!("wallet proposal for {}", source)))?;
        proposal.dismiss()?;
        self.dismissed.insert(source_key(source));
        Ok(())
    }
}
