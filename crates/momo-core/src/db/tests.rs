//! Database tests

use super::*;
use crate::models::*;
use crate::store::*;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, hour, minute, 0).unwrap()
    }

    fn sample_tx(hash: &str) -> NewTransaction {
        NewTransaction {
            transaction_date: at(9, 30),
            amount: dec!(500.00),
            tx_type: TransactionType::Credit,
            source: "MobileMoney".to_string(),
            description: "Payment received GHS 500.00 from Emergent".to_string(),
            counterparty: Some("Emergent".to_string()),
            balance: Some(dec!(1200.00)),
            category: Category::Transfers,
            is_transfer: true,
            raw_sms: "Payment received GHS 500.00 from Emergent. Current balance: GHS 1,200.00"
                .to_string(),
            import_hash: hash.to_string(),
        }
    }

    #[test]
    fn test_in_memory_db() {
        let db = Database::in_memory().unwrap();
        assert!(db.list_wallets().unwrap().is_empty());
        assert!(db.list_transactions(10).unwrap().is_empty());
        assert_eq!(db.counts().unwrap(), (0, 0));
    }

    #[test]
    fn test_migrations_are_idempotent() {
        let db = Database::in_memory().unwrap();
        db.create_wallet(&NewWallet::from_source("GCB", WalletKind::Bank))
            .unwrap();

        // Re-opening runs migrations again without touching data
        let reopened = Database::new(db.path()).unwrap();
        assert_eq!(reopened.list_wallets().unwrap().len(), 1);
    }

    #[test]
    fn test_schema_columns() {
        let db = Database::in_memory().unwrap();
        let conn = db.conn().unwrap();

        let result: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM pragma_table_info('wallets') WHERE name IN ('id', 'name', 'source', 'kind', 'balance', 'is_income_source', 'balance_updated_at', 'created_at')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(result, 8, "wallets table should have 8 expected columns");

        let result: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM pragma_table_info('transactions') WHERE name IN ('transaction_date', 'amount', 'tx_type', 'source', 'counterparty', 'balance', 'category', 'is_transfer', 'raw_sms', 'import_hash')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(result, 10, "transactions table should have 10 expected columns");
    }

    #[test]
    fn test_wallet_create_and_lookup() {
        let db = Database::in_memory().unwrap();

        let mut new_wallet = NewWallet::from_source(" AirtelTigo_Money ", WalletKind::Momo);
        new_wallet.opening_balance = dec!(25.50);
        new_wallet.is_income_source = true;
        let wallet = db.create_wallet(&new_wallet).unwrap();

        assert!(wallet.id > 0);
        assert_eq!(wallet.name, "AirtelTigo Money");
        assert_eq!(wallet.source, "AirtelTigo_Money");
        assert_eq!(wallet.kind, WalletKind::Momo);
        assert_eq!(wallet.balance, dec!(25.50));
        assert!(wallet.is_income_source);
        assert!(wallet.balance_updated_at.is_none());

        let found = db.get_wallet_by_source("AIRTELTIGO_MONEY").unwrap().unwrap();
        assert_eq!(found.id, wallet.id);
        assert!(db.get_wallet_by_source("MTN").unwrap().is_none());
        assert_eq!(db.get_wallet(wallet.id).unwrap(), Some(wallet));
    }

    #[test]
    fn test_duplicate_wallet_rejected_case_insensitive() {
        let db = Database::in_memory().unwrap();
        db.create_wallet(&NewWallet::from_source("MobileMoney", WalletKind::Momo))
            .unwrap();

        let err = db
            .create_wallet(&NewWallet::from_source("MOBILEMONEY", WalletKind::Momo))
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateWallet(ref s) if s == "MOBILEMONEY"));
        assert_eq!(db.list_wallets().unwrap().len(), 1);
    }

    #[test]
    fn test_empty_source_rejected() {
        let db = Database::in_memory().unwrap();
        let err = db
            .create_wallet(&NewWallet::from_source("   ", WalletKind::Cash))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidData(_)));
    }

    #[test]
    fn test_balance_update_compare_and_set() {
        let db = Database::in_memory().unwrap();
        let wallet = db
            .create_wallet(&NewWallet::from_source("MobileMoney", WalletKind::Momo))
            .unwrap();

        // First snapshot applies to a never-updated wallet
        assert_eq!(
            db.update_wallet_balance(wallet.id, dec!(100), at(10, 0)).unwrap(),
            BalanceUpdate::Applied
        );

        // Older snapshot conflicts and leaves the balance alone
        assert_eq!(
            db.update_wallet_balance(wallet.id, dec!(40), at(9, 0)).unwrap(),
            BalanceUpdate::Conflict
        );
        let current = db.get_wallet(wallet.id).unwrap().unwrap();
        assert_eq!(current.balance, dec!(100));
        assert_eq!(current.balance_updated_at, Some(at(10, 0)));

        // Same timestamp applies (last write wins)
        assert_eq!(
            db.update_wallet_balance(wallet.id, dec!(90), at(10, 0)).unwrap(),
            BalanceUpdate::Applied
        );

        // Newer applies
        assert_eq!(
            db.update_wallet_balance(wallet.id, dec!(1234.56), at(11, 15)).unwrap(),
            BalanceUpdate::Applied
        );
        let current = db.get_wallet(wallet.id).unwrap().unwrap();
        assert_eq!(current.balance, dec!(1234.56));
        assert_eq!(current.balance_updated_at, Some(at(11, 15)));
    }

    #[test]
    fn test_balance_update_missing_wallet_conflicts() {
        let db = Database::in_memory().unwrap();
        assert_eq!(
            db.update_wallet_balance(999, dec!(1), at(9, 0)).unwrap(),
            BalanceUpdate::Conflict
        );
    }

    #[test]
    fn test_opening_balance_as_of_is_stored() {
        let db = Database::in_memory().unwrap();
        let mut new_wallet = NewWallet::from_source("GCB", WalletKind::Bank);
        new_wallet.opening_balance = dec!(2450.75);
        new_wallet.opening_balance_as_of = Some(at(12, 0));
        let wallet = db.create_wallet(&new_wallet).unwrap();

        assert_eq!(wallet.balance_updated_at, Some(at(12, 0)));
        assert_eq!(
            db.update_wallet_balance(wallet.id, dec!(1), at(11, 0)).unwrap(),
            BalanceUpdate::Conflict
        );
    }

    #[test]
    fn test_transaction_insert_and_dedupe() {
        let db = Database::in_memory().unwrap();

        let first = db.create_transaction(&sample_tx("hash-1")).unwrap();
        let id = match first {
            TransactionInsertResult::Inserted(id) => id,
            other => panic!("expected Inserted, got {:?}", other),
        };

        let second = db.create_transaction(&sample_tx("hash-1")).unwrap();
        assert_eq!(second, TransactionInsertResult::Duplicate(id));
        assert_eq!(second.id(), id);

        let third = db.create_transaction(&sample_tx("hash-2")).unwrap();
        assert!(matches!(third, TransactionInsertResult::Inserted(other) if other != id));
    }

    #[test]
    fn test_transaction_roundtrip_fields() {
        let db = Database::in_memory().unwrap();
        let id = db.create_transaction(&sample_tx("hash-1")).unwrap().id();

        let tx = db.get_transaction(id).unwrap().unwrap();
        assert_eq!(tx.transaction_date, at(9, 30));
        assert_eq!(tx.amount, dec!(500.00));
        assert_eq!(tx.tx_type, TransactionType::Credit);
        assert_eq!(tx.balance, Some(dec!(1200.00)));
        assert_eq!(tx.category, Category::Transfers);
        assert_eq!(tx.counterparty.as_deref(), Some("Emergent"));
        assert!(tx.is_transfer);
        assert!(tx.raw_sms.contains("GHS 1,200.00"));
    }

    #[test]
    fn test_unknown_category_resolves_to_other() {
        let db = Database::in_memory().unwrap();
        let id = db.create_transaction(&sample_tx("hash-1")).unwrap().id();

        let conn = db.conn().unwrap();
        conn.execute(
            "UPDATE transactions SET category = 'Gambling' WHERE id = ?",
            rusqlite::params![id],
        )
        .unwrap();

        let tx = db.get_transaction(id).unwrap().unwrap();
        assert_eq!(tx.category, Category::Other);
    }

    #[test]
    fn test_list_transactions_newest_first() {
        let db = Database::in_memory().unwrap();
        for (hash, hour) in [("a", 8), ("b", 12), ("c", 10)] {
            let mut tx = sample_tx(hash);
            tx.transaction_date = at(hour, 0);
            db.create_transaction(&tx).unwrap();
        }

        let listed = db.list_transactions(2).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].import_hash, "b");
        assert_eq!(listed[1].import_hash, "c");

        let by_source = db.list_transactions_for_source("mobilemoney").unwrap();
        assert_eq!(
            by_source.iter().map(|t| t.import_hash.as_str()).collect::<Vec<_>>(),
            vec!["a", "c", "b"]
        );
    }
}
