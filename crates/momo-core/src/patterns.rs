//! Pattern library: named recognizers for provider-specific SMS phrasing
//!
//! The library is data, not control flow. Each recognizer pairs a matcher
//! (a case-insensitive regex or a list of substrings) with a role that tells
//! the classifier what a match means. New provider phrasings are added to
//! `config/patterns.toml` without touching the classifier.
//!
//! ## Resolution
//!
//! 1. Explicit path (e.g. `momo --patterns FILE`)
//! 2. Override in data dir (~/.local/share/momo/patterns.toml)
//! 3. Embedded default (compiled into binary)

use std::fs;
use std::path::{Path, PathBuf};

use regex::{Regex, RegexBuilder};
use serde::Deserialize;
use tracing::debug;

use crate::config::default_data_dir;
use crate::error::{Error, Result};
use crate::models::{Category, TransactionType, WalletKind};

/// Embedded default library (compiled into binary)
pub const DEFAULT_PATTERNS: &str = include_str!("../../../config/patterns.toml");

/// How a recognizer tests text
#[derive(Debug, Clone)]
pub enum Matcher {
    /// Case-insensitive regex; roles that extract values read capture group 1
    Regex(Regex),
    /// Lower-cased substrings; any one matching is a match
    Contains(Vec<String>),
}

impl Matcher {
    fn compile(name: &str, regex: Option<String>, contains: Option<Vec<String>>) -> Result<Self> {
        match (regex, contains) {
            (Some(pattern), None) => {
                let re = RegexBuilder::new(&pattern).case_insensitive(true).build()?;
                Ok(Self::Regex(re))
            }
            (None, Some(needles)) if !needles.is_empty() => Ok(Self::Contains(
                needles.into_iter().map(|n| n.to_lowercase()).collect(),
            )),
            (None, Some(_)) => Err(Error::Pattern(format!(
                "'{}' has an empty contains list",
                name
            ))),
            _ => Err(Error::Pattern(format!(
                "'{}' needs exactly one of `regex` or `contains`",
                name
            ))),
        }
    }

    /// Test already lower-cased text
    pub fn is_match(&self, lower: &str) -> bool {
        match self {
            Self::Regex(re) => re.is_match(lower),
            Self::Contains(needles) => needles.iter().any(|n| lower.contains(n.as_str())),
        }
    }

    /// Byte offset of the earliest match in already lower-cased text
    pub fn first_position(&self, lower: &str) -> Option<usize> {
        match self {
            Self::Regex(re) => re.find(lower).map(|m| m.start()),
            Self::Contains(needles) => needles.iter().filter_map(|n| lower.find(n.as_str())).min(),
        }
    }

    /// First capture group of the first match
    pub fn capture<'t>(&self, text: &'t str) -> Option<&'t str> {
        match self {
            Self::Regex(re) => re
                .captures(text)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str()),
            Self::Contains(_) => None,
        }
    }

    /// Every (group 1 start, group 1) pair, in order of appearance
    pub fn captures_all<'t>(&self, text: &'t str) -> Vec<(usize, &'t str)> {
        match self {
            Self::Regex(re) => re
                .captures_iter(text)
                .filter_map(|caps| caps.get(1).map(|g| (g.start(), g.as_str())))
                .collect(),
            Self::Contains(_) => Vec::new(),
        }
    }

    fn has_capture_group(&self) -> bool {
        match self {
            Self::Regex(re) => re.captures_len() > 1,
            Self::Contains(_) => false,
        }
    }
}

/// What a recognizer match means
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Money moving between two of the user's own wallet kinds
    TransferRoute { from: WalletKind, to: WalletKind },
    /// Weak transfer signal with no direction
    TransferCue,
    /// Balance snapshot in group 1
    Balance,
    /// Transaction amount in group 1
    Amount,
    CreditCue,
    DebitCue,
    /// Counterparty name in group 1, optionally only for one direction
    Counterparty(Option<TransactionType>),
}

/// A named (matcher, role) pair
#[derive(Debug, Clone)]
pub struct Recognizer {
    pub name: String,
    pub role: Role,
    pub matcher: Matcher,
}

/// Hint mapping a source label to a wallet kind
#[derive(Debug, Clone)]
pub struct SourceHint {
    pub kind: WalletKind,
    pub matcher: Matcher,
}

/// Keyword rule for the category assigner
#[derive(Debug, Clone)]
pub struct CategoryRule {
    pub name: String,
    pub category: Category,
    pub matcher: Matcher,
}

/// A versioned, ordered set of recognizers
#[derive(Debug, Clone)]
pub struct PatternLibrary {
    version: u32,
    currency: String,
    recognizers: Vec<Recognizer>,
    source_hints: Vec<SourceHint>,
    category_rules: Vec<CategoryRule>,
}

impl PatternLibrary {
    /// The embedded default library
    pub fn builtin() -> Result<Self> {
        Self::from_toml_str(DEFAULT_PATTERNS)
    }

    /// Load with override resolution (explicit path, data dir, embedded)
    pub fn load(override_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = override_path {
            debug!("Loading pattern library from {}", path.display());
            let content = fs::read_to_string(path).map_err(|e| {
                Error::Config(format!("Failed to read {}: {}", path.display(), e))
            })?;
            return Self::from_toml_str(&content);
        }

        if let Some(path) = default_patterns_path() {
            if path.exists() {
                debug!("Loading pattern library override {}", path.display());
                let content = fs::read_to_string(&path).map_err(|e| {
                    Error::Config(format!("Failed to read {}: {}", path.display(), e))
                })?;
                return Self::from_toml_str(&content);
            }
        }

        Self::builtin()
    }

    /// Parse and compile a library from TOML
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let raw: RawLibrary = toml::from_str(content)
            .map_err(|e| Error::Pattern(format!("Invalid pattern library TOML: {}", e)))?;

        let recognizers = raw
            .recognizers
            .into_iter()
            .map(compile_recognizer)
            .collect::<Result<Vec<_>>>()?;

        let source_hints = raw
            .source_hints
            .into_iter()
            .map(|hint| {
                let label = format!("source hint ({})", hint.kind);
                Ok(SourceHint {
                    kind: hint.kind,
                    matcher: Matcher::compile(&label, hint.regex, hint.contains)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let category_rules = raw
            .category_rules
            .into_iter()
            .map(|rule| {
                let matcher = Matcher::compile(&rule.name, rule.regex, rule.contains)?;
                Ok(CategoryRule {
                    name: rule.name,
                    category: rule.category,
                    matcher,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let library = Self {
            version: raw.version,
            currency: raw.currency.unwrap_or_else(|| "GHS".to_string()),
            recognizers,
            source_hints,
            category_rules,
        };
        debug!(
            "Pattern library v{} loaded: {} recognizers, {} source hints, {} category rules",
            library.version,
            library.recognizers.len(),
            library.source_hints.len(),
            library.category_rules.len()
        );
        Ok(library)
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// Local currency code the recognizers are written for
    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn recognizers(&self) -> &[Recognizer] {
        &self.recognizers
    }

    /// Recognizers accepted by `filter`, in library order
    pub fn with_role<'a>(
        &'a self,
        filter: impl Fn(&Role) -> bool + 'a,
    ) -> impl Iterator<Item = &'a Recognizer> + 'a {
        self.recognizers.iter().filter(move |r| filter(&r.role))
    }

    pub fn category_rules(&self) -> &[CategoryRule] {
        &self.category_rules
    }

    pub fn source_hints(&self) -> &[SourceHint] {
        &self.source_hints
    }

    /// Infer a wallet kind from a source label; `None` when no hint applies
    pub fn infer_source_kind(&self, source: &str) -> Option<WalletKind> {
        let lower = source.to_lowercase();
        self.source_hints
            .iter()
            .find(|hint| hint.matcher.is_match(&lower))
            .map(|hint| hint.kind)
    }
}

/// Default pattern override path
pub fn default_patterns_path() -> Option<PathBuf> {
    default_data_dir().map(|d| d.join("patterns.toml"))
}

fn compile_recognizer(raw: RawRecognizer) -> Result<Recognizer> {
    let role = match raw.role {
        RawRole::TransferRoute => match (raw.from, raw.to) {
            (Some(from), Some(to)) => Role::TransferRoute { from, to },
            _ => {
                return Err(Error::Pattern(format!(
                    "'{}' is a transfer_route and needs `from` and `to`",
                    raw.name
                )))
            }
        },
        RawRole::TransferCue => Role::TransferCue,
        RawRole::Balance => Role::Balance,
        RawRole::Amount => Role::Amount,
        RawRole::CreditCue => Role::CreditCue,
        RawRole::DebitCue => Role::DebitCue,
        RawRole::Counterparty => Role::Counterparty(raw.tx_type),
    };

    let matcher = Matcher::compile(&raw.name, raw.regex, raw.contains)?;

    let needs_capture = matches!(role, Role::Balance | Role::Amount | Role::Counterparty(_));
    if needs_capture && !matcher.has_capture_group() {
        return Err(Error::Pattern(format!(
            "'{}' must be a regex with a capture group",
            raw.name
        )));
    }

    Ok(Recognizer {
        name: raw.name,
        role,
        matcher,
    })
}

/// Raw library structure for TOML parsing
#[derive(Debug, Deserialize)]
struct RawLibrary {
    version: u32,
    currency: Option<String>,
    #[serde(default)]
    recognizers: Vec<RawRecognizer>,
    #[serde(default)]
    source_hints: Vec<RawSourceHint>,
    #[serde(default)]
    category_rules: Vec<RawCategoryRule>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum RawRole {
    TransferRoute,
    TransferCue,
    Balance,
    Amount,
    CreditCue,
    DebitCue,
    Counterparty,
}

#[derive(Debug, Deserialize)]
struct RawRecognizer {
    name: String,
    role: RawRole,
    regex: Option<String>,
    contains: Option<Vec<String>>,
    from: Option<WalletKind>,
    to: Option<WalletKind>,
    tx_type: Option<TransactionType>,
}

#[derive(Debug, Deserialize)]
struct RawSourceHint {
    kind: WalletKind,
    regex: Option<String>,
    contains: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct RawCategoryRule {
    name: String,
    category: Category,
    regex: Option<String>,
    contains: Option<Vec<String>>,
}
