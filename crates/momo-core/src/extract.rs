//! SMS field extraction
//!
//! Pulls the transaction amount, direction and counterparty out of a message
//! body using the pattern library's amount, cue and counterparty recognizers.
//! A message without a recognizable amount is not a transaction (OTPs,
//! promotions) and yields `None`.

use rust_decimal::Decimal;
use tracing::debug;

use crate::classify::parse_decimal;
use crate::models::TransactionType;
use crate::patterns::{PatternLibrary, Role};

/// Maximum length of a stored description
const MAX_DESCRIPTION_CHARS: usize = 160;

/// Transaction fields read from one message
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedFields {
    pub amount: Decimal,
    pub tx_type: TransactionType,
    pub counterparty: Option<String>,
    pub description: String,
}

pub struct SmsExtractor<'a> {
    library: &'a PatternLibrary,
}

impl<'a> SmsExtractor<'a> {
    pub fn new(library: &'a PatternLibrary) -> Self {
        Self { library }
    }

    /// Extract transaction fields, or `None` if the message has no amount
    pub fn extract(&self, body: &str) -> Option<ExtractedFields> {
        let amount = self.amount(body)?;
        let lower = body.to_lowercase();
        let tx_type = self.direction(&lower);
        let counterparty = self.counterparty(body, tx_type);

        Some(ExtractedFields {
            amount,
            tx_type,
            counterparty,
            description: clean_description(body),
        })
    }

    fn amount(&self, body: &str) -> Option<Decimal> {
        let balances = self.balance_positions(body);
        for recognizer in self.library.with_role(|r| *r == Role::Amount) {
            for (start, raw) in recognizer.matcher.captures_all(body) {
                if balances.contains(&start) {
                    continue;
                }
                match parse_decimal(raw) {
                    Some(amount) if amount > Decimal::ZERO => return Some(amount),
                    _ => continue,
                }
            }
        }
        None
    }

    /// Start offsets of every value a balance recognizer captures
    fn balance_positions(&self, body: &str) -> Vec<usize> {
        self.library
            .with_role(|r| *r == Role::Balance)
            .flat_map(|r| r.matcher.captures_all(body))
            .map(|(start, _)| start)
            .collect()
    }

    /// Earliest debit or credit cue decides; no cue defaults to debit
    fn direction(&self, lower: &str) -> TransactionType {
        let earliest = self
            .library
            .recognizers()
            .iter()
            .filter_map(|r| {
                let tx_type = match r.role {
                    Role::CreditCue => TransactionType::Credit,
                    Role::DebitCue => TransactionType::Debit,
                    _ => return None,
                };
                r.matcher.first_position(lower).map(|pos| (pos, tx_type))
            })
            .min_by_key(|(pos, _)| *pos);

        match earliest {
            Some((_, tx_type)) => tx_type,
            None => {
                debug!("No direction cue found, defaulting to debit");
                TransactionType::Debit
            }
        }
    }

    fn counterparty(&self, body: &str, tx_type: TransactionType) -> Option<String> {
        self.library
            .recognizers()
            .iter()
            .filter(|r| match r.role {
                Role::Counterparty(None) => true,
                Role::Counterparty(Some(only)) => only == tx_type,
                _ => false,
            })
            .find_map(|r| r.matcher.capture(body).and_then(clean_counterparty))
    }
}

fn clean_counterparty(raw: &str) -> Option<String> {
    let name = raw
        .trim()
        .trim_end_matches(|c: char| c.is_ascii_punctuation())
        .trim();
    let lower = name.to_lowercase();
    if name.is_empty() || lower.starts_with("ghs") || lower == "you" || lower == "your" {
        return None;
    }
    Some(name.to_string())
}

/// First sentence of the message with whitespace collapsed
pub fn clean_description(body: &str) -> String {
    let collapsed = body.split_whitespace().collect::<Vec<_>>().join(" ");
    let first = match collapsed.find(". ") {
        Some(end) => &collapsed[..end],
        None => collapsed.trim_end_matches('.'),
    };
    first.chars().take(MAX_DESCRIPTION_CHARS).collect()
}
