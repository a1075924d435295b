//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `open_db` - Shared utility to open the database
//! - `load_categories` - Shared utility to load the category configuration
//! - `cmd_init` - Initialize the database
//! - `cmd_recompute` - Rebuild merchant totals

use std::path::Path;

use anyhow::{Context, Result};
use spendscan_core::{Aggregator, CategoryConfig, Database};

/// Open the database, creating it and running migrations if needed
pub fn open_db(db_path: &Path) -> Result<Database> {
    let path_str = db_path
        .to_str()
        .context("Database path is not valid UTF-8")?;
    Database::new(path_str).context("Failed to open database")
}

/// Load categories and the default mapping from YAML, falling back to built-ins
pub fn load_categories(
    categories_path: Option<&Path>,
    mapping_path: Option<&Path>,
) -> Result<CategoryConfig> {
    CategoryConfig::load(categories_path, mapping_path)
        .context("Failed to load category configuration")
}

pub fn cmd_init(db_path: &Path) -> Result<()> {
    println!("🔧 Initializing database at {}...", db_path.display());

    let db = open_db(db_path)?;
    let transactions = db.count_transactions()?;
    if transactions > 0 {
        println!("   Existing database with {} transactions", transactions);
    }

    println!("✅ Database initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. Save statement exports as .html into excel_files/");
    println!("  2. Ingest them: spendscan scan");
    println!("  3. Start web UI: spendscan serve");

    Ok(())
}

pub fn cmd_recompute(db: &Database, config: &CategoryConfig) -> Result<()> {
    let summary = Aggregator::new(db, config)
        .recompute()
        .context("Failed to recompute merchant totals")?;

    println!(
        "✅ {} merchants ({} updated, {} removed)",
        summary.merchants, summary.changed, summary.removed
    );
    Ok(())
}
