//! Ingest command implementation
//!
//! Parses an SMS export, runs it through the ingestion pipeline, then walks
//! the wallet proposals the batch raised. Each proposal is confirmed with its
//! defaults under `--yes`, or asked about interactively.

use std::fs::File;
use std::io::{self, BufRead, Write};
use std::path::Path;

use anyhow::{Context, Result};
use momo_core::{
    parse_decimal, parse_sms_csv, Database, IngestReport, Ingestor, MessageStatus, PatternLibrary,
    ProposalSession, ReconciliationAction, Resolution, Settings,
};
use tracing::debug;

use super::truncate;

/// Flags that shape one ingest run
#[derive(Debug, Clone, Default)]
pub struct IngestOptions {
    /// Source label applied to every message
    pub source: Option<String>,
    /// Confirm every proposal without asking
    pub yes: bool,
    pub dry_run: bool,
}

pub fn cmd_ingest(
    db: &Database,
    library: &PatternLibrary,
    settings: &Settings,
    file: &Path,
    options: &IngestOptions,
    input: &mut impl BufRead,
) -> Result<()> {
    println!("📥 Ingesting {}...", file.display());

    let reader =
        File::open(file).with_context(|| format!("Failed to open {}", file.display()))?;
    let fallback = options
        .source
        .as_deref()
        .or(settings.default_source.as_deref());
    let mut import = parse_sms_csv(reader, fallback).context("Failed to parse SMS export")?;

    if let Some(source) = &options.source {
        for sms in &mut import.messages {
            sms.source = source.clone();
        }
    }

    println!(
        "   Format: {} ({} messages)",
        import.format.as_str(),
        import.messages.len()
    );
    for row in &import.skipped {
        println!("   ⚠️  Skipped line {}: {}", row.line, row.reason);
    }

    if options.dry_run {
        println!("   Dry run: nothing will be written");
    }

    let mut session = ProposalSession::new();
    let report = Ingestor::new(library, db)
        .with_max_conflict_retries(settings.max_conflict_retries)
        .with_dry_run(options.dry_run)
        .ingest(import.messages, &mut session)
        .context("Ingest failed")?;

    print_report(&report, &settings.currency);

    if options.dry_run {
        let pending: Vec<_> = session.pending().collect();
        if !pending.is_empty() {
            println!();
            println!("🪙 Wallets that would be proposed:");
            for proposal in pending {
                let confirmation = proposal.default_confirmation();
                println!(
                    "   {} ({}, opening balance {} {})",
                    proposal.source, confirmation.kind, settings.currency, confirmation.opening_balance
                );
            }
        }
        return Ok(());
    }

    review_proposals(db, &mut session, &settings.currency, options.yes, input)
}

fn print_report(report: &IngestReport, currency: &str) {
    println!();
    println!("📝 Messages");
    println!("   ─────────────────────────────────────────────────────────────");

    for result in &report.results {
        let status = match &result.status {
            MessageStatus::Recorded(id) => format!("\x1b[32mrecorded #{}\x1b[0m", id),
            MessageStatus::Duplicate(id) => format!("duplicate #{}", id),
            MessageStatus::Previewed => "preview".to_string(),
            MessageStatus::NotATransaction => "skipped".to_string(),
            MessageStatus::Failed(reason) => format!("\x1b[31mfailed: {}\x1b[0m", reason),
        };
        let category = result.category.map(|c| c.name()).unwrap_or("-");
        let description = result.description.as_deref().unwrap_or("");

        println!(
            "   {} │ {:<14} │ {:<16} │ {}",
            result.received_at.format("%Y-%m-%d %H:%M"),
            truncate(&result.source, 14),
            category,
            truncate(description, 40)
        );
        println!("     {}", status);

        match &result.action {
            Some(ReconciliationAction::UpdateBalance { balance, .. }) => {
                if result.unresolved_conflict {
                    println!("     ⚠️  balance {} {} not applied (kept conflicting)", currency, balance);
                } else {
                    println!("     balance → {} {}", currency, balance);
                }
            }
            Some(ReconciliationAction::StaleBalance { last_updated_at, .. }) => {
                println!(
                    "     balance ignored (wallet already updated at {})",
                    last_updated_at.format("%Y-%m-%d %H:%M")
                );
            }
            _ => {}
        }
    }

    println!();
    println!("✅ Ingest complete!");
    println!("   Recorded:          {}", report.recorded());
    println!("   Duplicates:        {}", report.duplicates());
    if report.previewed() > 0 {
        println!("   Previewed:         {}", report.previewed());
    }
    println!("   Not transactions:  {}", report.not_transactions());
    println!("   Failed:            {}", report.failed());
    println!("   Balance updates:   {}", report.balance_updates());
    if report.stale_balances() > 0 {
        println!("   Stale balances:    {}", report.stale_balances());
    }
    if report.unresolved_conflicts() > 0 {
        println!("   ⚠️  Unresolved conflicts: {}", report.unresolved_conflicts());
    }
}

fn review_proposals(
    db: &Database,
    session: &mut ProposalSession,
    currency: &str,
    yes: bool,
    input: &mut impl BufRead,
) -> Result<()> {
    let sources: Vec<String> = session.pending().map(|p| p.source.clone()).collect();
    if sources.is_empty() {
        return Ok(());
    }

    println!();
    println!("🪙 {} new source(s) without a wallet", sources.len());

    for source in sources {
        let Some(proposal) = session.get(&source) else {
            continue;
        };
        let mut confirmation = proposal.default_confirmation();

        if !yes {
            println!();
            println!("   Source:          {}", source);
            println!("   Name:            {}", confirmation.name);
            println!("   Kind:            {}", confirmation.kind);
            println!("   Opening balance: {} {}", currency, confirmation.opening_balance);

            let answer = prompt(input, "   Create this wallet? [y/N] ")?;
            if !answer.eq_ignore_ascii_case("y") {
                session.dismiss(&source)?;
                println!("   Skipped.");
                continue;
            }

            let label = format!(
                "   Opening balance [{} {}]: ",
                currency, confirmation.opening_balance
            );
            let answer = prompt(input, &label)?;
            if !answer.is_empty() {
                match parse_decimal(&answer) {
                    Some(balance) => confirmation.opening_balance = balance,
                    None => println!(
                        "   ⚠️  '{}' is not an amount, keeping {} {}",
                        answer, currency, confirmation.opening_balance
                    ),
                }
            }

            let default = if confirmation.is_income_source { "Y/n" } else { "y/N" };
            let answer = prompt(input, &format!("   Income source? [{}] ", default))?;
            if !answer.is_empty() {
                confirmation.is_income_source = answer.eq_ignore_ascii_case("y");
            }
        }

        debug!("Confirming wallet proposal for '{}'", source);
        match session.confirm(db, &source, confirmation)? {
            Resolution::Created(wallet) => println!(
                "   ✅ Created wallet '{}' ({}) with balance {} {}",
                wallet.name, wallet.kind, currency, wallet.balance
            ),
            Resolution::AlreadyExists(wallet) => println!(
                "   Wallet '{}' already exists for {}",
                wallet.name, wallet.source
            ),
            Resolution::Dismissed => {}
        }
    }

    Ok(())
}

/// Print a label and read one trimmed answer; end of input reads as empty
fn prompt(input: &mut impl BufRead, label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(answer.trim().to_string())
}
