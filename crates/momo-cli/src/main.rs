//! Momo CLI - SMS-driven transaction ledger
//!
//! Usage:
//!   momo init                      Initialize database
//!   momo ingest --file sms.csv     Ingest an SMS export and review new wallets
//!   momo classify "TEXT"           Show how one message is understood
//!   momo wallets                   List wallets
//!   momo transactions -s GCB       List recent transactions for one source
//!   momo patterns                  Show the active pattern library

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Init => commands::cmd_init(&cli.db),
        Commands::Ingest {
            file,
            source,
            yes,
            dry_run,
        } => {
            let library = commands::load_patterns(cli.patterns.as_deref())?;
            let settings = commands::load_settings(cli.settings.as_deref())?;
            let db = commands::open_db(&cli.db)?;
            let options = commands::IngestOptions {
                source,
                yes,
                dry_run,
            };
            let stdin = std::io::stdin();
            commands::cmd_ingest(&db, &library, &settings, &file, &options, &mut stdin.lock())
        }
        Commands::Classify { text, source, json } => {
            let library = commands::load_patterns(cli.patterns.as_deref())?;
            commands::cmd_classify(&library, &text, &source, json)
        }
        Commands::Wallets { action } => {
            let db = commands::open_db(&cli.db)?;
            match action {
                None | Some(WalletsAction::List) => commands::cmd_wallets_list(&db),
                Some(WalletsAction::Add {
                    source,
                    kind,
                    name,
                    balance,
                    income,
                }) => commands::cmd_wallets_add(
                    &db,
                    &source,
                    &kind,
                    name.as_deref(),
                    &balance,
                    income,
                ),
            }
        }
        Commands::Transactions { limit, source } => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_transactions_list(&db, limit, source.as_deref())
        }
        Commands::Patterns => {
            let library = commands::load_patterns(cli.patterns.as_deref())?;
            commands::cmd_patterns(&library, cli.patterns.as_deref())
        }
    }
}
