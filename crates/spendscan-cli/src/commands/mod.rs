//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Core commands (init, recompute) and shared utilities (open_db, load_categories)
//! - `ingest` - Folder scan and single file import
//! - `merchants` - Merchant totals and category overrides
//! - `serve` - Web server command
//! - `transactions` - Transaction listing, manual entry and processed documents

pub mod core;
pub mod ingest;
pub mod merchants;
pub mod serve;
pub mod transactions;

// Re-export command functions for main.rs
pub use core::*;
pub use ingest::*;
pub use merchants::*;
pub use serve::*;
pub use transactions::*;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
