//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `open_db` - Shared utility to open the database
//! - `load_patterns` / `load_settings` - Resolve the pattern library and settings
//! - `cmd_init` - Initialize the database

use std::path::Path;

use anyhow::{Context, Result};
use momo_core::{Database, PatternLibrary, Settings};

pub fn open_db(db_path: &Path) -> Result<Database> {
    let path_str = db_path
        .to_str()
        .context("Database path is not valid UTF-8")?;
    Database::new(path_str).context("Failed to open database")
}

/// Load the pattern library (explicit file, data dir override, then built-in)
pub fn load_patterns(path: Option<&Path>) -> Result<PatternLibrary> {
    PatternLibrary::load(path).context("Failed to load pattern library")
}

pub fn load_settings(path: Option<&Path>) -> Result<Settings> {
    Settings::load(path).context("Failed to load settings")
}

pub fn cmd_init(db_path: &Path) -> Result<()> {
    println!("🔧 Initializing database at {}...", db_path.display());

    let db = open_db(db_path)?;
    let (wallets, transactions) = db.counts().context("Failed to read database")?;
    println!("   {} wallets, {} transactions", wallets, transactions);

    println!("✅ Database initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. Export your SMS inbox to CSV (date, sender, body)");
    println!("  2. Ingest it: momo ingest --file sms.csv");

    Ok(())
}
