//! Ingestion pipeline
//!
//! Runs a batch of messages through extraction, classification and category
//! assignment, stores the resulting transactions and applies the reconciler's
//! balance decisions. Wallet creation proposals are collected into the
//! caller's [`ProposalSession`]; the pipeline never creates wallets itself.
//!
//! Messages are processed in `received_at` order so that the last balance
//! applied comes from the newest message. A balance write that loses the
//! compare-and-set is re-decided against freshly fetched wallets, up to
//! `max_conflict_retries` times. One failing message never stops the batch.

use chrono::{DateTime, Timelike, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::categorize::{CategoryAssigner, CategorySource};
use crate::classify::MessageClassifier;
use crate::error::Result;
use crate::extract::SmsExtractor;
use crate::import::compute_import_hash;
use crate::models::{Category, IncomingSms, NewTransaction, ParsedTransactionInfo, Wallet};
use crate::patterns::PatternLibrary;
use crate::reconcile::{ReconciliationAction, WalletReconciler};
use crate::store::{BalanceUpdate, TransactionInsertResult, TransactionStore, WalletStore};
use crate::workflow::ProposalSession;

/// Everything the pure stages derive from one message
#[derive(Debug, Clone)]
pub struct ParsedSms {
    pub info: ParsedTransactionInfo,
    /// `None` when the message carries no transaction amount
    pub transaction: Option<NewTransaction>,
    pub category_source: Option<CategorySource>,
}

/// Extractor, classifier and assigner over one pattern library
pub struct SmsParser<'a> {
    classifier: MessageClassifier<'a>,
    extractor: SmsExtractor<'a>,
    assigner: CategoryAssigner<'a>,
}

impl<'a> SmsParser<'a> {
    pub fn new(library: &'a PatternLibrary) -> Self {
        Self {
            classifier: MessageClassifier::new(library),
            extractor: SmsExtractor::new(library),
            assigner: CategoryAssigner::new(library),
        }
    }

    pub fn parse(&self, sms: &IncomingSms) -> ParsedSms {
        let info = self.classifier.classify(&sms.body);

        let Some(fields) = self.extractor.extract(&sms.body) else {
            return ParsedSms {
                info,
                transaction: None,
                category_source: None,
            };
        };

        let assignment = self.assigner.assign_transaction(
            &fields.description,
            fields.counterparty.as_deref(),
            &info,
        );

        let transaction = NewTransaction {
            transaction_date: sms.received_at,
            amount: fields.amount,
            tx_type: fields.tx_type,
            source: sms.source.trim().to_string(),
            description: fields.description,
            counterparty: fields.counterparty,
            balance: info.balance_snapshot,
            category: assignment.category,
            is_transfer: info.is_transfer_likely,
            raw_sms: sms.body.clone(),
            import_hash: compute_import_hash(sms),
        };

        ParsedSms {
            info,
            transaction: Some(transaction),
            category_source: Some(assignment.source),
        }
    }
}

/// What happened to one message
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum MessageStatus {
    Recorded(i64),
    /// Already stored by an earlier ingest; carries the existing id
    Duplicate(i64),
    /// Parsed but not stored (dry run)
    Previewed,
    /// No amount in the message (OTP, promotion, notice)
    NotATransaction,
    Failed(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageResult {
    pub source: String,
    pub received_at: DateTime<Utc>,
    pub description: Option<String>,
    pub category: Option<Category>,
    pub status: MessageStatus,
    pub action: Option<ReconciliationAction>,
    /// The balance write kept conflicting after every retry
    pub unresolved_conflict: bool,
}

/// Per-message outcomes of one batch, in processing order
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestReport {
    pub results: Vec<MessageResult>,
}

impl IngestReport {
    fn count(&self, pred: impl Fn(&MessageResult) -> bool) -> usize {
        self.results.iter().filter(|r| pred(r)).count()
    }

    pub fn recorded(&self) -> usize {
        self.count(|r| matches!(r.status, MessageStatus::Recorded(_)))
    }

    pub fn duplicates(&self) -> usize {
        self.count(|r| matches!(r.status, MessageStatus::Duplicate(_)))
    }

    pub fn previewed(&self) -> usize {
        self.count(|r| r.status == MessageStatus::Previewed)
    }

    pub fn not_transactions(&self) -> usize {
        self.count(|r| r.status == MessageStatus::NotATransaction)
    }

    pub fn failed(&self) -> usize {
        self.count(|r| matches!(r.status, MessageStatus::Failed(_)))
    }

    pub fn balance_updates(&self) -> usize {
        self.count(|r| {
            !r.unresolved_conflict
                && matches!(r.action, Some(ReconciliationAction::UpdateBalance { .. }))
        })
    }

    pub fn stale_balances(&self) -> usize {
        self.count(|r| matches!(r.action, Some(ReconciliationAction::StaleBalance { .. })))
    }

    pub fn unresolved_conflicts(&self) -> usize {
        self.count(|r| r.unresolved_conflict)
    }
}

pub struct Ingestor<'a, S: ?Sized> {
    library: &'a PatternLibrary,
    store: &'a S,
    max_conflict_retries: u32,
    dry_run: bool,
}

impl<'a, S> Ingestor<'a, S>
where
    S: WalletStore + TransactionStore + ?Sized,
{
    pub fn new(library: &'a PatternLibrary, store: &'a S) -> Self {
        Self {
            library,
            store,
            max_conflict_retries: 3,
            dry_run: false,
        }
    }

    pub fn with_max_conflict_retries(mut self, retries: u32) -> Self {
        self.max_conflict_retries = retries;
        self
    }

    /// Parse and reconcile without writing transactions or balances
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Ingest a batch, offering wallet proposals to `session`
    ///
    /// Fails only if the wallet list cannot be read up front; everything after
    /// that is reported per message.
    pub fn ingest(
        &self,
        mut messages: Vec<IncomingSms>,
        session: &mut ProposalSession,
    ) -> Result<IngestReport> {
        // Stored timestamps have whole seconds; decide on the same values
        for sms in &mut messages {
            sms.received_at = sms.received_at.with_nanosecond(0).unwrap_or(sms.received_at);
        }
        messages.sort_by_key(|m| m.received_at);

        let parser = SmsParser::new(self.library);
        let mut wallets = self.store.list_wallets()?;
        let mut report = IngestReport::default();

        for sms in &messages {
            let result = match self.process(&parser, sms, &mut wallets, session) {
                Ok(result) => result,
                Err(e) => {
                    warn!(
                        "Failed to ingest message from {} at {}: {}",
                        sms.source, sms.received_at, e
                    );
                    MessageResult {
                        source: sms.source.clone(),
                        received_at: sms.received_at,
                        description: None,
                        category: None,
                        status: MessageStatus::Failed(e.to_string()),
                        action: None,
                        unresolved_conflict: false,
                    }
                }
            };
            report.results.push(result);
        }

        info!(
            "Ingested {} messages: {} recorded, {} duplicates, {} not transactions, {} failed",
            report.results.len(),
            report.recorded(),
            report.duplicates(),
            report.not_transactions(),
            report.failed()
        );
        if report.unresolved_conflicts() > 0 {
            warn!(
                "{} balance updates could not be applied after {} retries",
                report.unresolved_conflicts(),
                self.max_conflict_retries
            );
        }

        Ok(report)
    }

    fn process(
        &self,
        parser: &SmsParser<'_>,
        sms: &IncomingSms,
        wallets: &mut Vec<Wallet>,
        session: &mut ProposalSession,
    ) -> Result<MessageResult> {
        let parsed = parser.parse(sms);

        let Some(tx) = parsed.transaction else {
            debug!("Not a transaction: {:?}", sms.body);
            return self.process_notice(&parsed.info, sms, wallets, session);
        };

        let status = if self.dry_run {
            MessageStatus::Previewed
        } else {
            match self.store.create_transaction(&tx)? {
                TransactionInsertResult::Inserted(id) => MessageStatus::Recorded(id),
                TransactionInsertResult::Duplicate(id) => MessageStatus::Duplicate(id),
            }
        };

        let (action, unresolved_conflict) = self.reconcile(&parsed.info, sms, wallets)?;

        offer_proposal(&action, &parsed.info, sms, session);

        Ok(MessageResult {
            source: tx.source,
            received_at: sms.received_at,
            description: Some(tx.description),
            category: Some(tx.category),
            status,
            action: Some(action),
            unresolved_conflict,
        })
    }

    /// A message with no amount still carries a balance worth reconciling
    ///
    /// Without a snapshot there is nothing to learn from it, so it never
    /// proposes a wallet (OTPs, promotions).
    fn process_notice(
        &self,
        info: &ParsedTransactionInfo,
        sms: &IncomingSms,
        wallets: &mut Vec<Wallet>,
        session: &mut ProposalSession,
    ) -> Result<MessageResult> {
        let (action, unresolved_conflict) = match info.balance_snapshot {
            Some(_) => self.reconcile(info, sms, wallets)?,
            None => (ReconciliationAction::NoAction, false),
        };

        offer_proposal(&action, info, sms, session);

        Ok(MessageResult {
            source: sms.source.clone(),
            received_at: sms.received_at,
            description: None,
            category: None,
            status: MessageStatus::NotATransaction,
            action: Some(action),
            unresolved_conflict,
        })
    }

    /// Decide and apply; returns the final action and whether a conflict is left
    fn reconcile(
        &self,
        info: &ParsedTransactionInfo,
        sms: &IncomingSms,
        wallets: &mut Vec<Wallet>,
    ) -> Result<(ReconciliationAction, bool)> {
        let reconciler = WalletReconciler::new(self.library);
        let mut attempt = 0;

        loop {
            let action = reconciler.reconcile(info, &sms.source, sms.received_at, wallets);

            let (wallet_id, balance, as_of) = match action {
                ReconciliationAction::UpdateBalance {
                    wallet_id,
                    balance,
                    as_of,
                } => (wallet_id, balance, as_of),
                other => return Ok((other, false)),
            };
            let action = ReconciliationAction::UpdateBalance {
                wallet_id,
                balance,
                as_of,
            };

            if self.dry_run {
                return Ok((action, false));
            }

            match self.store.update_wallet_balance(wallet_id, balance, as_of)? {
                BalanceUpdate::Applied => {
                    if let Some(wallet) = wallets.iter_mut().find(|w| w.id == wallet_id) {
                        wallet.balance = balance;
                        wallet.balance_updated_at = Some(as_of);
                    }
                    return Ok((action, false));
                }
                BalanceUpdate::Conflict if attempt < self.max_conflict_retries => {
                    attempt += 1;
                    debug!(
                        "Balance conflict on wallet {}, re-fetching (attempt {})",
                        wallet_id, attempt
                    );
                    *wallets = self.store.list_wallets()?;
                }
                BalanceUpdate::Conflict => {
                    warn!(
                        "Giving up on balance update for wallet {} as of {} after {} retries",
                        wallet_id, as_of, attempt
                    );
                    return Ok((action, true));
                }
            }
        }
    }
}

fn offer_proposal(
    action: &ReconciliationAction,
    info: &ParsedTransactionInfo,
    sms: &IncomingSms,
    session: &mut ProposalSession,
) {
    if let ReconciliationAction::ProposeWalletCreation {
        source,
        suggested_kind,
    } = action
    {
        let balance = info.balance_snapshot.map(|b| (b, sms.received_at));
        session.offer(source, *suggested_kind, balance);
    }
}
