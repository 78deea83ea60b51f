//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Core commands (init) and shared utilities (open_db, load_patterns)
//! - `classify` - Classify a single message without storing it
//! - `ingest` - SMS export ingestion and wallet proposal review
//! - `patterns` - Pattern library inspection
//! - `transactions` - Transaction listing
//! - `wallets` - Wallet listing and manual creation

pub mod classify;
pub mod core;
pub mod ingest;
pub mod patterns;
pub mod transactions;
pub mod wallets;

// Re-export command functions for main.rs
pub use classify::*;
pub use core::*;
pub use ingest::*;
pub use patterns::*;
pub use transactions::*;
pub use wallets::*;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
