//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Momo - Turn bank and mobile-money SMS into a ledger
#[derive(Parser)]
#[command(name = "momo")]
#[command(about = "SMS-driven transaction ledger for bank and mobile-money wallets", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "momo.db", global = true)]
    pub db: PathBuf,

    /// Pattern library file (defaults to the data dir override, then built-in)
    #[arg(long, global = true)]
    pub patterns: Option<PathBuf>,

    /// Settings file (defaults to the data dir override, then built-in)
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// Ingest an SMS export (CSV: date,sender,body or address,date,body)
    Ingest {
        /// CSV file to ingest
        #[arg(short, long)]
        file: PathBuf,

        /// Source label for every message (overrides the sender column)
        #[arg(short, long)]
        source: Option<String>,

        /// Confirm every wallet proposal with its defaults
        #[arg(long, short = 'y')]
        yes: bool,

        /// Parse and report without writing anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Classify a single message and show what would be recorded
    Classify {
        /// Message text
        text: String,

        /// Source label the message came from
        #[arg(short, long, default_value = "unknown")]
        source: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List or add wallets
    Wallets {
        #[command(subcommand)]
        action: Option<WalletsAction>,
    },

    /// List recent transactions
    Transactions {
        /// Maximum number of transactions to show
        #[arg(short, long, default_value = "20")]
        limit: i64,

        /// Only show transactions from this source label
        #[arg(short, long)]
        source: Option<String>,
    },

    /// Show the active pattern library
    Patterns,
}

#[derive(Subcommand)]
pub enum WalletsAction {
    /// List wallets
    List,

    /// Add a wallet for a source label
    Add {
        /// Source label (SMS sender ID) the wallet is matched by
        #[arg(long)]
        source: String,

        /// Wallet kind: momo, bank, cash, other
        #[arg(long, default_value = "other")]
        kind: String,

        /// Display name (defaults to the source label)
        #[arg(long)]
        name: Option<String>,

        /// Opening balance
        #[arg(long, default_value = "0")]
        balance: String,

        /// Mark as an income source
        #[arg(long)]
        income: bool,
    },
}
