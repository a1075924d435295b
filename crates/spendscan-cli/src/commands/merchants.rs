//! Merchant and category commands

use anyhow::{Context, Result};
use spendscan_core::{Aggregator, CategoryConfig, Database};

use super::truncate;

pub fn cmd_merchants(db: &Database) -> Result<()> {
    let merchants = db.list_merchants()?;

    if merchants.is_empty() {
        println!("No merchants yet. Run 'spendscan scan' first.");
        return Ok(());
    }

    println!(
        "{:>5}  {:<32}  {:>12}  {:<16}  Source",
        "ID", "Merchant", "Total", "Category"
    );
    println!("{}", "-".repeat(80));
    for m in &merchants {
        println!(
            "{:>5}  {:<32}  {:>12}  {:<16}  {}",
            m.id,
            truncate(&m.merchant, 32),
            m.total_amount.round_dp(2).to_string(),
            truncate(&m.category, 16),
            m.category_source
        );
    }
    println!();
    println!("{} merchants", merchants.len());

    Ok(())
}

pub fn cmd_categories(db: &Database, config: &CategoryConfig) -> Result<()> {
    let totals = Aggregator::new(db, config).totals_by_category()?;

    println!("{:<20}  {:>12}", "Category", "Total");
    println!("{}", "-".repeat(34));
    for category in config.categories() {
        let total = totals.get(category).copied().unwrap_or_default();
        println!("{:<20}  {:>12}", category, total.round_dp(2).to_string());
    }

    // Overrides may point at labels that were later removed from the config
    for (category, total) in totals.iter().filter(|(c, _)| !config.is_known(c)) {
        println!(
            "{:<20}  {:>12}  (not configured)",
            category,
            total.round_dp(2).to_string()
        );
    }

    Ok(())
}

pub fn cmd_set_category(
    db: &Database,
    config: &CategoryConfig,
    id: i64,
    category: &str,
) -> Result<()> {
    let merchant = Aggregator::new(db, config)
        .set_category(id, category)
        .with_context(|| format!("Failed to set category for merchant {}", id))?;

    println!("✅ {} → {}", merchant.merchant, merchant.category);
    Ok(())
}

pub fn cmd_reset_category(db: &Database, config: &CategoryConfig, id: i64) -> Result<()> {
    let merchant = Aggregator::new(db, config)
        .reset_category(id)
        .with_context(|| format!("Failed to reset category for merchant {}", id))?;

    println!("✅ {} → {} (default mapping)", merchant.merchant, merchant.category);
    Ok(())
}
