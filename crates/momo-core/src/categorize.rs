//! Category assignment for parsed transactions
//!
//! Keyword rules from the pattern library are tried in order and the first one
//! that matches decides. A message whose transfer route is known is always
//! categorized as Transfers, ahead of any keyword rule. Text no rule matches
//! falls back to Other.

use tracing::debug;

use crate::models::{Category, ParsedTransactionInfo};
use crate::patterns::PatternLibrary;

/// How a category was chosen
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategorySource {
    /// Classifier found a wallet-to-wallet route
    TransferRoute,
    /// Named keyword rule matched
    Rule(String),
    /// Nothing matched
    Fallback,
}

/// Result of assigning a category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryAssignment {
    pub category: Category,
    pub source: CategorySource,
}

pub struct CategoryAssigner<'a> {
    library: &'a PatternLibrary,
}

impl<'a> CategoryAssigner<'a> {
    pub fn new(library: &'a PatternLibrary) -> Self {
        Self { library }
    }

    /// Category for free text; first matching rule wins, otherwise Other
    pub fn assign(&self, description: &str) -> Category {
        self.assign_text(description).category
    }

    /// Category for a parsed transaction, using the classifier's route first
    pub fn assign_transaction(
        &self,
        description: &str,
        counterparty: Option<&str>,
        info: &ParsedTransactionInfo,
    ) -> CategoryAssignment {
        if info.suggested_source_type.is_some() && info.suggested_dest_type.is_some() {
            return CategoryAssignment {
                category: Category::Transfers,
                source: CategorySource::TransferRoute,
            };
        }

        match counterparty {
            Some(name) => self.assign_text(&format!("{} {}", description, name)),
            None => self.assign_text(description),
        }
    }

    fn assign_text(&self, text: &str) -> CategoryAssignment {
        let lower = text.to_lowercase();

        for rule in self.library.category_rules() {
            if rule.matcher.is_match(&lower) {
                debug!("Category rule '{}' matched: {}", rule.name, rule.category);
                return CategoryAssignment {
                    category: rule.category,
                    source: CategorySource::Rule(rule.name.clone()),
                };
            }
        }

        CategoryAssignment {
            category: Category::Other,
            source: CategorySource::Fallback,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WalletKind;

    fn library() -> PatternLibrary {
        PatternLibrary::builtin().unwrap()
    }

    #[test]
    fn test_keyword_rules() {
        let library = library();
        let assigner = CategoryAssigner::new(&library);

        assert_eq!(assigner.assign("You bought airtime for GHS 10.00"), Category::AirtimeAndData);
        assert_eq!(assigner.assign("Payment to ECG prepaid meter 0412"), Category::Utilities);
        assert_eq!(assigner.assign("UBER TRIP ACCRA"), Category::Transportation);
        assert_eq!(assigner.assign("Payment made to KFC Osu"), Category::FoodAndDining);
        assert_eq!(assigner.assign("SHOPRITE ACCRA MALL"), Category::Shopping);
        assert_eq!(assigner.assign("Salary for March"), Category::Income);
        assert_eq!(assigner.assign("Cash Out made for GHS 200.00"), Category::CashWithdrawal);
        assert_eq!(assigner.assign("E-Levy charged GHS 1.50"), Category::FeesAndCharges);
    }

    #[test]
    fn test_unmatched_is_other() {
        let library = library();
        let assigner = CategoryAssigner::new(&library);
        assert_eq!(assigner.assign("Payment to KOFI MENSAH"), Category::Other);
        assert_eq!(assigner.assign(""), Category::Other);
    }

    #[test]
    fn test_first_rule_wins() {
        let library = library();
        let assigner = CategoryAssigner::new(&library);
        // Both cash_withdrawal and food_and_dining match; cash_withdrawal is listed first
        assert_eq!(
            assigner.assign("Cash Out at KFC agent"),
            Category::CashWithdrawal
        );
    }

    #[test]
    fn test_route_takes_priority() {
        let library = library();
        let assigner = CategoryAssigner::new(&library);
        let info = ParsedTransactionInfo {
            is_transfer_likely: true,
            suggested_source_type: Some(WalletKind::Bank),
            suggested_dest_type: Some(WalletKind::Momo),
            balance_snapshot: None,
        };

        let assignment = assigner.assign_transaction("Salary payment received", None, &info);
        assert_eq!(assignment.category, Category::Transfers);
        assert_eq!(assignment.source, CategorySource::TransferRoute);
    }

    #[test]
    fn test_transfer_cue_alone_uses_rules() {
        let library = library();
        let assigner = CategoryAssigner::new(&library);
        let info = ParsedTransactionInfo {
            is_transfer_likely: true,
            ..Default::default()
        };

        let assignment =
            assigner.assign_transaction("Payment to merchant", Some("Papaye Osu"), &info);
        assert_eq!(assignment.category, Category::FoodAndDining);
        assert_eq!(
            assignment.source,
            CategorySource::Rule("food_and_dining".to_string())
        );
    }

    #[test]
    fn test_merchant_name_resembling_a_bank_is_not_a_transfer() {
        let library = library();
        let classifier = crate::classify::MessageClassifier::new(&library);
        let assigner = CategoryAssigner::new(&library);
        let text = "Payment made for GHS 30.00 to ACCESSORIES WORLD. Current Balance: GHS 70.00";

        let info = classifier.classify(text);
        let assignment = assigner.assign_transaction(
            "Payment made for GHS 30.00 to ACCESSORIES WORLD",
            Some("ACCESSORIES WORLD"),
            &info,
        );
        assert_eq!(assignment.category, Category::Other);
        assert_eq!(assignment.source, CategorySource::Fallback);
    }

    #[test]
    fn test_fallback_source() {
        let library = library();
        let assigner = CategoryAssigner::new(&library);
        let assignment =
            assigner.assign_transaction("Payment to KOFI", None, &ParsedTransactionInfo::default());
        assert_eq!(assignment.category, Category::Other);
        assert_eq!(assignment.source, CategorySource::Fallback);
    }
}
