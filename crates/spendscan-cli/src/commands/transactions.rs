//! Transaction and document commands

use anyhow::{bail, Context, Result};
use spendscan_core::db::TransactionInsertResult;
use spendscan_core::models::NewTransaction;
use spendscan_core::normalize::{normalize_merchant, parse_amount, parse_manual_date};
use spendscan_core::{Aggregator, CategoryConfig, Database};

use super::truncate;

pub fn cmd_transactions_list(db: &Database, limit: i64) -> Result<()> {
    let transactions = db.list_transactions(limit.max(1), 0)?;

    if transactions.is_empty() {
        println!("No transactions found.");
        return Ok(());
    }

    println!(
        "{:<10}  {:<32}  {:>12}  Source",
        "Date", "Merchant", "Amount"
    );
    println!("{}", "-".repeat(76));
    for tx in &transactions {
        println!(
            "{:<10}  {:<32}  {:>12}  {}",
            tx.date,
            truncate(&tx.merchant, 32),
            tx.amount.to_string(),
            tx.source_document.as_deref().unwrap_or("manual")
        );
    }

    let total = db.count_transactions()?;
    if total > transactions.len() as i64 {
        println!();
        println!("Showing {} of {} transactions", transactions.len(), total);
    }

    Ok(())
}

pub fn cmd_add(
    db: &Database,
    config: &CategoryConfig,
    date: &str,
    merchant: &str,
    amount: &str,
) -> Result<()> {
    let merchant = normalize_merchant(merchant);
    if merchant.is_empty() {
        bail!("Merchant is required");
    }
    let record = NewTransaction {
        date: parse_manual_date(date)?,
        merchant,
        amount: parse_amount(amount)?,
    };

    match db.insert_transaction(&record)? {
        TransactionInsertResult::Inserted(id) => {
            Aggregator::new(db, config)
                .recompute()
                .context("Failed to recompute merchant totals")?;
            println!(
                "✅ Added #{}: {} {} {}",
                id, record.date, record.merchant, record.amount
            );
        }
        TransactionInsertResult::Duplicate(id) => {
            println!("   Already recorded as #{}, nothing to do", id);
        }
    }

    Ok(())
}

pub fn cmd_documents(db: &Database) -> Result<()> {
    let documents = db.list_processed_documents()?;

    if documents.is_empty() {
        println!("No statement files processed yet.");
        return Ok(());
    }

    println!("{:<40}  {:>8}  Processed", "File", "Added");
    println!("{}", "-".repeat(72));
    for doc in &documents {
        println!(
            "{:<40}  {:>8}  {}",
            truncate(&doc.name, 40),
            doc.records_added,
            doc.processed_at.format("%Y-%m-%d %H:%M")
        );
    }

    Ok(())
}
