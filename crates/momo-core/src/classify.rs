//! Message classifier
//!
//! Turns message text into a [`ParsedTransactionInfo`]: transfer likelihood,
//! suggested source/destination wallet kinds and a balance snapshot. Pure and
//! deterministic; it never fails. Text no recognizer understands produces the
//! all-unknown result.

use std::str::FromStr;

use rust_decimal::Decimal;
use tracing::debug;

use crate::models::{ParsedTransactionInfo, WalletKind};
use crate::patterns::{PatternLibrary, Role};

pub struct MessageClassifier<'a> {
    library: &'a PatternLibrary,
}

impl<'a> MessageClassifier<'a> {
    pub fn new(library: &'a PatternLibrary) -> Self {
        Self { library }
    }

    /// Classify one message (SMS body or cleaned description)
    pub fn classify(&self, description: &str) -> ParsedTransactionInfo {
        let lower = description.to_lowercase();

        let route = self.transfer_route(&lower);
        let has_cue = self
            .library
            .with_role(|r| *r == Role::TransferCue)
            .any(|r| r.matcher.is_match(&lower));

        let info = ParsedTransactionInfo {
            is_transfer_likely: route.is_some() || has_cue,
            suggested_source_type: route.map(|(from, _)| from),
            suggested_dest_type: route.map(|(_, to)| to),
            balance_snapshot: self.balance_snapshot(description, &lower),
        };

        if info.is_miss() {
            debug!(
                "Classification miss (patterns v{}): {:?}",
                self.library.version(),
                description
            );
        }

        info
    }

    /// Names of every recognizer that matches, in library order
    pub fn matched_recognizers(&self, description: &str) -> Vec<&'a str> {
        let lower = description.to_lowercase();
        self.library
            .recognizers()
            .iter()
            .filter(|r| r.matcher.is_match(&lower))
            .map(|r| r.name.as_str())
            .collect()
    }

    /// First matching route wins; later routes are never consulted
    fn transfer_route(&self, lower: &str) -> Option<(WalletKind, WalletKind)> {
        self.library.recognizers().iter().find_map(|r| match r.role {
            Role::TransferRoute { from, to } if r.matcher.is_match(lower) => Some((from, to)),
            _ => None,
        })
    }

    fn balance_snapshot(&self, original: &str, lower: &str) -> Option<Decimal> {
        for recognizer in self.library.with_role(|r| *r == Role::Balance) {
            // Some providers only match on their exact currency casing
            let captured = recognizer
                .matcher
                .capture(lower)
                .or_else(|| recognizer.matcher.capture(original));

            if let Some(raw) = captured {
                let parsed = parse_decimal(raw);
                if parsed.is_none() {
                    debug!(
                        "Balance capture '{}' from '{}' is not a number",
                        raw, recognizer.name
                    );
                }
                return parsed;
            }
        }
        None
    }
}

/// Parse a captured amount, stripping thousands separators ("12,345.50")
pub fn parse_decimal(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, ',' | ' ' | '\u{a0}'))
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    Decimal::from_str(&cleaned).ok()
}
