//! Integration tests for momo-core
//!
//! These tests exercise the full import → ingest → reconcile → wallet creation workflow.

use std::sync::{Arc, Barrier};
use std::thread;

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use momo_core::{
    import::parse_sms_csv, Category, Database, IncomingSms, Ingestor, NewWallet, PatternLibrary,
    ProposalSession, ReconciliationAction, Resolution, TransactionStore, WalletConfirmation,
    WalletKind, WalletProposal, WalletStore,
};

fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, hour, minute, 0).unwrap()
}

fn sms(source: &str, received_at: DateTime<Utc>, body: &str) -> IncomingSms {
    IncomingSms {
        source: source.to_string(),
        body: body.to_string(),
        received_at,
    }
}

/// A morning of MoMo and bank notifications, deliberately out of order
fn sms_export_csv() -> &'static str {
    r#"date,sender,body
2024-03-01 12:00:00,MobileMoney,"Payment made for GHS 45.50 to SHOPRITE ACCRA MALL. Current Balance: GHS 1,154.50."
2024-03-01 09:30:00,MobileMoney,"Payment received GHS 500.00 from Emergent. Current balance: GHS 1,200.00"
2024-03-01 10:15:00,GCB,"Your account 1234XXXX has been credited with GHS 300.00 from MTN MoMo. Avail Bal: GHS 2,450.75"
2024-03-01 11:00:00,MobileMoney,Your OTP is 482913. Do not share it.
2024-03-01 11:45:00,AirtelTigo_Money,"You bought airtime for GHS 10.00. Current Balance: GHS 90.00""#
}

// =============================================================================
// Classification scenarios
// =============================================================================

#[test]
fn test_aggregator_payment_scenario() {
    let library = PatternLibrary::builtin().unwrap();
    let info = momo_core::MessageClassifier::new(&library)
        .classify("Payment received GHS 500.00 from Emergent. Current balance: GHS 1,200.00");

    assert!(info.is_transfer_likely);
    assert_eq!(info.suggested_source_type, Some(WalletKind::Bank));
    assert_eq!(info.suggested_dest_type, Some(WalletKind::Momo));
    assert_eq!(info.balance_snapshot, Some(dec!(1200.00)));
}

#[test]
fn test_airtime_scenario() {
    let library = PatternLibrary::builtin().unwrap();
    let text = "You bought airtime for GHS 10.00";
    let info = momo_core::MessageClassifier::new(&library).classify(text);

    assert!(!info.is_transfer_likely);
    assert_eq!(info.suggested_source_type, None);
    assert_eq!(info.suggested_dest_type, None);
    assert_eq!(info.balance_snapshot, None);

    let category = momo_core::CategoryAssigner::new(&library).assign(text);
    assert_eq!(category, Category::AirtimeAndData);
}

// =============================================================================
// Full pipeline
// =============================================================================

#[test]
fn test_full_import_workflow() {
    let db = Database::in_memory().expect("Failed to create in-memory database");
    let library = PatternLibrary::builtin().unwrap();

    db.create_wallet(&NewWallet::from_source("MobileMoney", WalletKind::Momo))
        .unwrap();
    db.create_wallet(&NewWallet::from_source("GCB", WalletKind::Bank))
        .unwrap();

    let import = parse_sms_csv(sms_export_csv().as_bytes(), None).expect("Failed to parse CSV");
    assert_eq!(import.messages.len(), 5);

    let mut session = ProposalSession::new();
    let report = Ingestor::new(&library, &db)
        .ingest(import.messages, &mut session)
        .unwrap();

    assert_eq!(report.recorded(), 4);
    assert_eq!(report.not_transactions(), 1);
    assert_eq!(report.failed(), 0);

    // Processed oldest first
    let dates: Vec<_> = report.results.iter().map(|r| r.received_at).collect();
    let mut sorted = dates.clone();
    sorted.sort();
    assert_eq!(dates, sorted);

    let momo = db.get_wallet_by_source("MobileMoney").unwrap().unwrap();
    assert_eq!(momo.balance, dec!(1154.50));
    assert_eq!(momo.balance_updated_at, Some(at(12, 0)));

    let gcb = db.get_wallet_by_source("gcb").unwrap().unwrap();
    assert_eq!(gcb.balance, dec!(2450.75));

    let transactions = db.list_transactions(10).unwrap();
    assert_eq!(transactions.len(), 4);
    let shoprite = &transactions[0];
    assert_eq!(shoprite.category, Category::Shopping);
    assert_eq!(shoprite.amount, dec!(45.50));
    let emergent = transactions
        .iter()
        .find(|t| t.counterparty.as_deref() == Some("Emergent"))
        .unwrap();
    assert_eq!(emergent.category, Category::Transfers);
    assert!(emergent.is_transfer);

    // The unknown source becomes exactly one pending proposal
    let pending: Vec<_> = session.pending().collect();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].source, "AirtelTigo_Money");
    assert_eq!(pending[0].suggested_kind, Some(WalletKind::Momo));
    assert_eq!(pending[0].latest_balance, Some(dec!(90.00)));
}

#[test]
fn test_out_of_order_batch_ends_at_newest_balance() {
    let db = Database::in_memory().unwrap();
    let library = PatternLibrary::builtin().unwrap();
    db.create_wallet(&NewWallet::from_source("MobileMoney", WalletKind::Momo))
        .unwrap();

    let batch = vec![
        sms("MobileMoney", at(11, 0), "Cash Out made for GHS 50.00. Current Balance: GHS 30.00"),
        sms("MobileMoney", at(9, 0), "Cash In received for GHS 100.00. Current Balance: GHS 100.00"),
        sms("MobileMoney", at(10, 0), "You bought airtime for GHS 20.00. Current Balance: GHS 80.00"),
    ];

    let mut session = ProposalSession::new();
    Ingestor::new(&library, &db)
        .ingest(batch, &mut session)
        .unwrap();

    let wallet = db.get_wallet_by_source("MobileMoney").unwrap().unwrap();
    assert_eq!(wallet.balance, dec!(30.00));
    assert_eq!(wallet.balance_updated_at, Some(at(11, 0)));
}

#[test]
fn test_older_batch_after_newer_is_stale() {
    let db = Database::in_memory().unwrap();
    let library = PatternLibrary::builtin().unwrap();
    db.create_wallet(&NewWallet::from_source("MobileMoney", WalletKind::Momo))
        .unwrap();
    let mut session = ProposalSession::new();

    Ingestor::new(&library, &db)
        .ingest(
            vec![sms("MobileMoney", at(12, 0), "Cash Out made for GHS 5.00. Current Balance: GHS 15.00")],
            &mut session,
        )
        .unwrap();

    let report = Ingestor::new(&library, &db)
        .ingest(
            vec![sms("MobileMoney", at(8, 0), "Cash In received for GHS 20.00. Current Balance: GHS 20.00")],
            &mut session,
        )
        .unwrap();

    assert_eq!(report.recorded(), 1);
    assert_eq!(report.stale_balances(), 1);
    assert!(matches!(
        report.results[0].action,
        Some(ReconciliationAction::StaleBalance { .. })
    ));

    let wallet = db.get_wallet_by_source("MobileMoney").unwrap().unwrap();
    assert_eq!(wallet.balance, dec!(15.00));
}

#[test]
fn test_android_backup_import() {
    let db = Database::in_memory().unwrap();
    let library = PatternLibrary::builtin().unwrap();
    let csv = "address,date,body\nMobileMoney,1709285400000,Cash In received for GHS 50.00. Current Balance: GHS 50.00\n";

    let import = parse_sms_csv(csv.as_bytes(), None).unwrap();
    let mut session = ProposalSession::new();
    let report = Ingestor::new(&library, &db)
        .ingest(import.messages, &mut session)
        .unwrap();

    assert_eq!(report.recorded(), 1);
    let tx = &db.list_transactions(1).unwrap()[0];
    assert_eq!(tx.transaction_date, at(9, 30));
    assert_eq!(tx.amount, dec!(50.00));
}

// =============================================================================
// Wallet creation workflow
// =============================================================================

fn zero_confirmation() -> WalletConfirmation {
    WalletConfirmation {
        name: "AirtelTigo Money".to_string(),
        kind: WalletKind::Momo,
        opening_balance: Decimal::ZERO,
        is_income_source: false,
    }
}

#[test]
fn test_new_source_proposal_and_confirmation() {
    let db = Database::in_memory().unwrap();
    let library = PatternLibrary::builtin().unwrap();
    let mut session = ProposalSession::new();

    let report = Ingestor::new(&library, &db)
        .ingest(
            vec![sms("AirtelTigo_Money", at(9, 0), "You bought airtime for GHS 10.00")],
            &mut session,
        )
        .unwrap();

    assert!(matches!(
        report.results[0].action,
        Some(ReconciliationAction::ProposeWalletCreation { ref source, .. }) if source == "AirtelTigo_Money"
    ));

    let resolution = session
        .confirm(&db, "AirtelTigo_Money", zero_confirmation())
        .unwrap();
    let wallet = match resolution {
        Resolution::Created(wallet) => wallet,
        other => panic!("expected Created, got {:?}", other),
    };
    assert_eq!(wallet.balance, Decimal::ZERO);
    assert!(!wallet.is_income_source);
    assert_eq!(db.list_wallets().unwrap().len(), 1);

    // A second confirmation from another session finds the existing wallet
    let mut other = WalletProposal::new("AirtelTigo_Money", Some(WalletKind::Momo));
    let resolution = other.confirm(&db, zero_confirmation()).unwrap();
    assert!(matches!(resolution, Resolution::AlreadyExists(w) if w.id == wallet.id));
    assert_eq!(db.list_wallets().unwrap().len(), 1);

    // Later messages from the source no longer propose anything
    let report = Ingestor::new(&library, &db)
        .ingest(
            vec![sms("AirtelTigo_Money", at(10, 0), "You bought airtime for GHS 5.00")],
            &mut session,
        )
        .unwrap();
    assert_eq!(report.results[0].action, Some(ReconciliationAction::NoAction));
}

#[test]
fn test_concurrent_confirmations_create_one_wallet() {
    let db = Database::in_memory().unwrap();
    let threads = 4;
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let db = db.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let mut proposal = WalletProposal::new("AirtelTigo_Money", Some(WalletKind::Momo));
                barrier.wait();
                proposal.confirm(&db, zero_confirmation()).unwrap()
            })
        })
        .collect();

    let resolutions: Vec<Resolution> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let created = resolutions
        .iter()
        .filter(|r| matches!(r, Resolution::Created(_)))
        .count();
    let existing = resolutions
        .iter()
        .filter(|r| matches!(r, Resolution::AlreadyExists(_)))
        .count();

    assert_eq!(created, 1);
    assert_eq!(existing, threads - 1);
    assert_eq!(db.list_wallets().unwrap().len(), 1);
}

#[test]
fn test_concurrent_balance_writers_keep_newest() {
    let db = Database::in_memory().unwrap();
    let wallet = db
        .create_wallet(&NewWallet::from_source("MobileMoney", WalletKind::Momo))
        .unwrap();

    let handles: Vec<_> = (0..8u32)
        .map(|i| {
            let db = db.clone();
            thread::spawn(move || {
                let library = PatternLibrary::builtin().unwrap();
                let body = format!(
                    "Cash In received for GHS 1.00. Current Balance: GHS {}.00",
                    i + 1
                );
                let mut session = ProposalSession::new();
                Ingestor::new(&library, &db)
                    .ingest(vec![sms("MobileMoney", at(9, i), &body)], &mut session)
                    .unwrap()
            })
        })
        .collect();

    for handle in handles {
        let report = handle.join().unwrap();
        assert_eq!(report.unresolved_conflicts(), 0);
    }

    let wallet = db.get_wallet(wallet.id).unwrap().unwrap();
    assert_eq!(wallet.balance, dec!(8.00));
    assert_eq!(wallet.balance_updated_at, Some(at(9, 7)));
    assert_eq!(db.list_transactions(20).unwrap().len(), 8);
}
