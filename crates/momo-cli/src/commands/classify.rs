//! Classify command - show how one message is understood

use anyhow::Result;
use chrono::{Timelike, Utc};
use momo_core::{
    CategorySource, IncomingSms, MessageClassifier, PatternLibrary, SmsParser,
};
use serde_json::json;

pub fn cmd_classify(library: &PatternLibrary, text: &str, source: &str, json: bool) -> Result<()> {
    let now = Utc::now();
    let sms = IncomingSms {
        source: source.to_string(),
        body: text.to_string(),
        received_at: now.with_nanosecond(0).unwrap_or(now),
    };

    let parsed = SmsParser::new(library).parse(&sms);
    let matched = MessageClassifier::new(library).matched_recognizers(text);
    let category_source = parsed.category_source.as_ref().map(describe_category_source);

    if json {
        let output = json!({
            "patterns_version": library.version(),
            "info": parsed.info,
            "transaction": parsed.transaction.as_ref().map(|tx| json!({
                "amount": tx.amount,
                "type": tx.tx_type,
                "counterparty": tx.counterparty,
                "description": tx.description,
                "balance": tx.balance,
                "category": tx.category.name(),
                "is_transfer": tx.is_transfer,
            })),
            "category_source": category_source,
            "matched_recognizers": matched,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let info = &parsed.info;
    let kind = |k: Option<momo_core::WalletKind>| {
        k.map(|k| k.to_string()).unwrap_or_else(|| "unknown".to_string())
    };

    println!();
    println!("🔍 Classification (patterns v{})", library.version());
    println!("   Transfer likely:  {}", if info.is_transfer_likely { "yes" } else { "no" });
    println!("   Source kind:      {}", kind(info.suggested_source_type));
    println!("   Destination kind: {}", kind(info.suggested_dest_type));
    match info.balance_snapshot {
        Some(balance) => println!("   Balance:          {} {}", library.currency(), balance),
        None => println!("   Balance:          -"),
    }

    println!();
    match &parsed.transaction {
        Some(tx) => {
            println!("📝 Transaction");
            println!("   Amount:       {} {} ({})", library.currency(), tx.amount, tx.tx_type);
            println!(
                "   Counterparty: {}",
                tx.counterparty.as_deref().unwrap_or("-")
            );
            println!("   Description:  {}", tx.description);
            println!(
                "   Category:     {} ({})",
                tx.category.name(),
                category_source.as_deref().unwrap_or("-")
            );
        }
        None => println!("📝 Not a transaction (no amount found)"),
    }

    println!();
    if matched.is_empty() {
        println!("   No recognizers matched");
    } else {
        println!("   Matched: {}", matched.join(", "));
    }

    Ok(())
}

fn describe_category_source(source: &CategorySource) -> String {
    match source {
        CategorySource::TransferRoute => "transfer route".to_string(),
        CategorySource::Rule(name) => format!("rule {}", name),
        CategorySource::Fallback => "fallback".to_string(),
    }
}
