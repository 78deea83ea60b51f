//! Pattern library inspection

use std::path::Path;

use anyhow::Result;
use momo_core::patterns::{default_patterns_path, Matcher, Role};
use momo_core::{Category, PatternLibrary};

use super::truncate;

pub fn cmd_patterns(library: &PatternLibrary, explicit: Option<&Path>) -> Result<()> {
    println!();
    println!("📚 Pattern Library v{}", library.version());
    println!("   Currency: {}", library.currency());

    let origin = match (explicit, default_patterns_path()) {
        (Some(path), _) => path.display().to_string(),
        (None, Some(path)) if path.exists() => path.display().to_string(),
        _ => "built-in".to_string(),
    };
    println!("   Loaded from: {}", origin);

    println!();
    println!("   Recognizers ({})", library.recognizers().len());
    println!("   ─────────────────────────────────────────────────────────────");
    for recognizer in library.recognizers() {
        println!(
            "   {:<26} │ {:<22} │ {}",
            truncate(&recognizer.name, 26),
            role_label(&recognizer.role),
            truncate(&matcher_label(&recognizer.matcher), 50)
        );
    }

    println!();
    println!("   Source hints ({})", library.source_hints().len());
    for hint in library.source_hints() {
        println!(
            "   {:<8} │ {}",
            hint.kind.as_str(),
            truncate(&matcher_label(&hint.matcher), 60)
        );
    }

    println!();
    println!("   Category rules ({})", library.category_rules().len());
    for rule in library.category_rules() {
        println!(
            "   {:<26} │ {:<16} │ {}",
            truncate(&rule.name, 26),
            rule.category.name(),
            truncate(&matcher_label(&rule.matcher), 40)
        );
    }

    println!();
    println!("   Categories");
    for config in Category::all() {
        let rules = library
            .category_rules()
            .iter()
            .filter(|r| r.category == config.category)
            .count();
        println!(
            "   {:<16} │ {} │ {} rule(s)",
            config.name, config.color, rules
        );
    }

    if explicit.is_none() {
        if let Some(path) = default_patterns_path() {
            println!();
            println!("   Override directory: {}", path.display());
        }
    }

    Ok(())
}

fn role_label(role: &Role) -> String {
    match role {
        Role::TransferRoute { from, to } => format!("route {} → {}", from, to),
        Role::TransferCue => "transfer cue".to_string(),
        Role::Balance => "balance".to_string(),
        Role::Amount => "amount".to_string(),
        Role::CreditCue => "credit cue".to_string(),
        Role::DebitCue => "debit cue".to_string(),
        Role::Counterparty(Some(tx_type)) => format!("counterparty ({})", tx_type),
        Role::Counterparty(None) => "counterparty".to_string(),
    }
}

fn matcher_label(matcher: &Matcher) -> String {
    match matcher {
        Matcher::Regex(re) => format!("/{}/", re.as_str()),
        Matcher::Contains(needles) => needles.join(" | "),
    }
}
