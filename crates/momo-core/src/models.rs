//! Domain models for Momo

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Direction of money relative to the account that sent the SMS
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Debit,
    Credit,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debit => "debit",
            Self::Credit => "credit",
        }
    }
}

impl std::str::FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "debit" => Ok(Self::Debit),
            "credit" => Ok(Self::Credit),
            _ => Err(format!("Unknown transaction type: {}", s)),
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kind of money holder a wallet represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WalletKind {
    /// Mobile-money wallet (telecom-operated stored value)
    Momo,
    Bank,
    Cash,
    Other,
}

impl WalletKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Momo => "momo",
            Self::Bank => "bank",
            Self::Cash => "cash",
            Self::Other => "other",
        }
    }
}

impl std::str::FromStr for WalletKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "momo" | "mobile_money" | "mobilemoney" => Ok(Self::Momo),
            "bank" => Ok(Self::Bank),
            "cash" => Ok(Self::Cash),
            "other" => Ok(Self::Other),
            _ => Err(format!("Unknown wallet kind: {}", s)),
        }
    }
}

impl std::fmt::Display for WalletKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Fixed category taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    FoodAndDining,
    Transportation,
    Shopping,
    Utilities,
    AirtimeAndData,
    Income,
    Transfers,
    CashWithdrawal,
    FeesAndCharges,
    Other,
}

/// Static display entry for a category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CategoryConfig {
    pub category: Category,
    pub name: &'static str,
    /// Display colour (hex)
    pub color: &'static str,
}

static CATEGORY_CONFIGS: [CategoryConfig; 10] = [
    CategoryConfig {
        category: Category::FoodAndDining,
        name: "Food & Dining",
        color: "#f59e0b",
    },
    CategoryConfig {
        category: Category::Transportation,
        name: "Transportation",
        color: "#ef4444",
    },
    CategoryConfig {
        category: Category::Shopping,
        name: "Shopping",
        color: "#14b8a6",
    },
    CategoryConfig {
        category: Category::Utilities,
        name: "Utilities",
        color: "#8b5cf6",
    },
    CategoryConfig {
        category: Category::AirtimeAndData,
        name: "Airtime & Data",
        color: "#06b6d4",
    },
    CategoryConfig {
        category: Category::Income,
        name: "Income",
        color: "#22c55e",
    },
    CategoryConfig {
        category: Category::Transfers,
        name: "Transfers",
        color: "#6366f1",
    },
    CategoryConfig {
        category: Category::CashWithdrawal,
        name: "Cash Withdrawal",
        color: "#84cc16",
    },
    CategoryConfig {
        category: Category::FeesAndCharges,
        name: "Fees & Charges",
        color: "#64748b",
    },
    CategoryConfig {
        category: Category::Other,
        name: "Other",
        color: "#9ca3af",
    },
];

impl Category {
    /// All categories in display order
    pub fn all() -> &'static [CategoryConfig] {
        &CATEGORY_CONFIGS
    }

    pub fn config(&self) -> &'static CategoryConfig {
        // The table is indexed in declaration order
        &CATEGORY_CONFIGS[*self as usize]
    }

    /// Display name, as stored on transactions
    pub fn name(&self) -> &'static str {
        self.config().name
    }

    /// Resolve a stored name, falling back to `Other` for anything unknown
    pub fn resolve(s: &str) -> Self {
        s.parse().unwrap_or(Self::Other)
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let needle = s.trim();
        CATEGORY_CONFIGS
            .iter()
            .find(|c| {
                c.name.eq_ignore_ascii_case(needle)
                    || serde_key(c.category).eq_ignore_ascii_case(needle)
            })
            .map(|c| c.category)
            .ok_or_else(|| format!("Unknown category: {}", s))
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

fn serde_key(category: Category) -> &'static str {
    match category {
        Category::FoodAndDining => "food_and_dining",
        Category::Transportation => "transportation",
        Category::Shopping => "shopping",
        Category::Utilities => "utilities",
        Category::AirtimeAndData => "airtime_and_data",
        Category::Income => "income",
        Category::Transfers => "transfers",
        Category::CashWithdrawal => "cash_withdrawal",
        Category::FeesAndCharges => "fees_and_charges",
        Category::Other => "other",
    }
}

/// A raw message as received from the phone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomingSms {
    /// Sender ID / provider label (e.g. "MobileMoney", "GCB")
    pub source: String,
    pub body: String,
    pub received_at: DateTime<Utc>,
}

/// Output of the message classifier. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedTransactionInfo {
    pub is_transfer_likely: bool,
    pub suggested_source_type: Option<WalletKind>,
    pub suggested_dest_type: Option<WalletKind>,
    /// `None` means the message carried no balance; zero is a real balance
    pub balance_snapshot: Option<Decimal>,
}

impl ParsedTransactionInfo {
    /// True when no recognizer contributed anything
    pub fn is_miss(&self) -> bool {
        !self.is_transfer_likely
            && self.suggested_source_type.is_none()
            && self.suggested_dest_type.is_none()
            && self.balance_snapshot.is_none()
    }
}

/// A stored transaction. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub transaction_date: DateTime<Utc>,
    /// Unsigned magnitude; direction lives in `tx_type`
    pub amount: Decimal,
    pub tx_type: TransactionType,
    pub source: String,
    pub description: String,
    pub counterparty: Option<String>,
    pub balance: Option<Decimal>,
    pub category: Category,
    pub is_transfer: bool,
    /// Original message text, kept for audit and re-parsing
    pub raw_sms: String,
    pub import_hash: String,
    pub created_at: DateTime<Utc>,
}

/// A new transaction to be stored (before DB insertion)
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub transaction_date: DateTime<Utc>,
    pub amount: Decimal,
    pub tx_type: TransactionType,
    pub source: String,
    pub description: String,
    pub counterparty: Option<String>,
    pub balance: Option<Decimal>,
    pub category: Category,
    pub is_transfer: bool,
    pub raw_sms: String,
    /// Hash for deduplication
    pub import_hash: String,
}

/// A money holder tracked by the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wallet {
    pub id: i64,
    pub name: String,
    /// Provider label this wallet is matched by (case-insensitive)
    pub source: String,
    pub kind: WalletKind,
    pub balance: Decimal,
    pub is_income_source: bool,
    /// Timestamp of the message whose snapshot last set `balance`
    pub balance_updated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Wallet {
    pub fn matches_source(&self, source: &str) -> bool {
        self.source.trim().eq_ignore_ascii_case(source.trim())
    }
}

/// A wallet to be created
#[derive(Debug, Clone, PartialEq)]
pub struct NewWallet {
    pub name: String,
    pub source: String,
    pub kind: WalletKind,
    pub opening_balance: Decimal,
    /// Message time the opening balance was read from, if it came from a snapshot
    pub opening_balance_as_of: Option<DateTime<Utc>>,
    pub is_income_source: bool,
}

impl NewWallet {
    /// Wallet named after its source label ("AirtelTigo_Money" -> "AirtelTigo Money")
    pub fn from_source(source: &str, kind: WalletKind) -> Self {
        Self {
            name: display_name_for_source(source),
            source: source.trim().to_string(),
            kind,
            opening_balance: Decimal::ZERO,
            opening_balance_as_of: None,
            is_income_source: false,
        }
    }
}

pub fn display_name_for_source(source: &str) -> String {
    source
        .trim()
        .split(['_', '-'])
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_config_table_matches_enum_order() {
        for config in Category::all() {
            assert_eq!(config.category.config().name, config.name);
        }
    }

    #[test]
    fn test_category_colors() {
        assert_eq!(Category::Transfers.config().color, "#6366f1");
        for config in Category::all() {
            assert!(config.color.starts_with('#') && config.color.len() == 7, "{}", config.name);
        }
    }

    #[test]
    fn test_category_parse_name_and_key() {
        assert_eq!("Food & Dining".parse::<Category>(), Ok(Category::FoodAndDining));
        assert_eq!("airtime_and_data".parse::<Category>(), Ok(Category::AirtimeAndData));
        assert_eq!("fees & charges".parse::<Category>(), Ok(Category::FeesAndCharges));
        assert!("Groceries".parse::<Category>().is_err());
    }

    #[test]
    fn test_category_resolve_falls_back_to_other() {
        assert_eq!(Category::resolve("Transfers"), Category::Transfers);
        assert_eq!(Category::resolve("Gambling"), Category::Other);
        assert_eq!(Category::resolve(""), Category::Other);
    }

    #[test]
    fn test_wallet_kind_roundtrip_names() {
        assert_eq!("MoMo".parse::<WalletKind>(), Ok(WalletKind::Momo));
        assert_eq!("bank".parse::<WalletKind>(), Ok(WalletKind::Bank));
        assert!("crypto".parse::<WalletKind>().is_err());
        assert_eq!(WalletKind::Cash.to_string(), "cash");
    }

    #[test]
    fn test_display_name_for_source() {
        assert_eq!(display_name_for_source("AirtelTigo_Money"), "AirtelTigo Money");
        assert_eq!(display_name_for_source(" MTN-MoMo "), "MTN MoMo");
        assert_eq!(display_name_for_source("GCB"), "GCB");
    }

    #[test]
    fn test_wallet_matches_source_case_insensitive() {
        let wallet = Wallet {
            id: 1,
            name: "MTN MoMo".into(),
            source: "MTN_MoMo".into(),
            kind: WalletKind::Momo,
            balance: Decimal::ZERO,
            is_income_source: false,
            balance_updated_at: None,
            created_at: Utc::now(),
        };
        assert!(wallet.matches_source("mtn_momo"));
        assert!(wallet.matches_source(" MTN_MOMO "));
        assert!(!wallet.matches_source("MTN"));
    }

    #[test]
    fn test_parsed_info_default_is_miss() {
        assert!(ParsedTransactionInfo::default().is_miss());
        let info = ParsedTransactionInfo {
            balance_snapshot: Some(Decimal::ZERO),
            ..Default::default()
        };
        assert!(!info.is_miss());
    }
}
