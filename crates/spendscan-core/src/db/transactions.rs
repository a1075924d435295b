//! Transaction operations

use std::collections::BTreeMap;

use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use rust_decimal::Decimal;
use tracing::debug;

use super::{amount_text, date_column, decimal_column, parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{NewTransaction, Transaction};

/// Result of inserting a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionInsertResult {
    /// Transaction was inserted successfully, contains new transaction ID
    Inserted(i64),
    /// Transaction was a duplicate, contains existing transaction ID
    Duplicate(i64),
}

/// Result of persisting one document's records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DocumentInsertResult {
    pub inserted: usize,
    /// Records whose natural key was already stored
    pub duplicates: usize,
}

/// Look up a stored transaction by natural key
fn find_by_key(conn: &Connection, tx: &NewTransaction) -> rusqlite::Result<Option<i64>> {
    conn.query_row(
        "SELECT id FROM transactions WHERE date = ? AND merchant = ? AND amount = ?",
        params![tx.date.to_string(), tx.merchant, amount_text(&tx.amount)],
        |row| row.get(0),
    )
    .optional()
}

/// Insert unless the natural key is already stored
fn insert_if_new(
    conn: &Connection,
    tx: &NewTransaction,
    source_document: Option<&str>,
) -> rusqlite::Result<TransactionInsertResult> {
    if let Some(existing_id) = find_by_key(conn, tx)? {
        return Ok(TransactionInsertResult::Duplicate(existing_id));
    }

    conn.execute(
        r#"
        INSERT INTO transactions (date, merchant, amount, source_document)
        VALUES (?, ?, ?, ?)
        "#,
        params![
            tx.date.to_string(),
            tx.merchant,
            amount_text(&tx.amount),
            source_document,
        ],
    )?;

    Ok(TransactionInsertResult::Inserted(conn.last_insert_rowid()))
}

/// Sum amounts per merchant over every stored transaction
///
/// Fails with `InvalidData` instead of overflowing when a merchant's total
/// does not fit a decimal.
pub(crate) fn sum_by_merchant(conn: &Connection) -> Result<BTreeMap<String, Decimal>> {
    let mut stmt = conn.prepare("SELECT merchant, amount FROM transactions")?;
    let rows = stmt.query_map([], |row| {
        let merchant: String = row.get(0)?;
        Ok((merchant, decimal_column(row, 1)?))
    })?;

    let mut totals: BTreeMap<String, Decimal> = BTreeMap::new();
    for row in rows {
        let (merchant, amount) = row?;
        let total = totals.get(&merchant).copied().unwrap_or_default();
        let total = total.checked_add(amount).ok_or_else(|| {
            Error::InvalidData(format!("Total for merchant {:?} is out of range", merchant))
        })?;
        totals.insert(merchant, total);
    }

    Ok(totals)
}

fn row_to_transaction(row: &rusqlite::Row<'_>) -> rusqlite::Result<Transaction> {
    let created_at: String = row.get(5)?;
    Ok(Transaction {
        id: row.get(0)?,
        date: date_column(row, 1)?,
        merchant: row.get(2)?,
        amount: decimal_column(row, 3)?,
        source_document: row.get(4)?,
        created_at: parse_datetime(&created_at),
    })
}

impl Database {
    /// Insert a manually entered transaction (no source document)
    pub fn insert_transaction(&self, tx: &NewTransaction) -> Result<TransactionInsertResult> {
        let conn = self.conn()?;
        Ok(insert_if_new(&conn, tx, None)?)
    }

    /// Persist one document's records and mark the document processed
    ///
    /// Runs as a single SQLite transaction: either every new record and the
    /// document marker are stored, or nothing is. Records already in the
    /// store are counted as duplicates and left untouched. A name that is
    /// already marked yields `AlreadyProcessed` and stores nothing.
    pub fn insert_document(
        &self,
        name: &str,
        records: &[NewTransaction],
    ) -> Result<DocumentInsertResult> {
        let mut conn = self.conn()?;
        // Take the write lock up front so the marker check below holds until commit
        let db_tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let marked: bool = db_tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM processed_documents WHERE name = ?)",
            params![name],
            |row| row.get(0),
        )?;
        if marked {
            return Err(Error::AlreadyProcessed(name.to_string()));
        }

        let mut result = DocumentInsertResult::default();
        for record in records {
            match insert_if_new(&db_tx, record, Some(name))? {
                TransactionInsertResult::Inserted(_) => result.inserted += 1,
                TransactionInsertResult::Duplicate(existing_id) => {
                    debug!(
                        document = name,
                        existing_id,
                        merchant = %record.merchant,
                        "Skipping record already in store"
                    );
                    result.duplicates += 1;
                }
            }
        }

        db_tx.execute(
            "INSERT INTO processed_documents (name, records_added) VALUES (?, ?)",
            params![name, result.inserted as i64],
        )?;
        db_tx.commit()?;

        Ok(result)
    }

    /// Find a stored transaction ID by natural key
    pub fn find_transaction(&self, tx: &NewTransaction) -> Result<Option<i64>> {
        let conn = self.conn()?;
        Ok(find_by_key(&conn, tx)?)
    }

    /// List transactions, newest first
    pub fn list_transactions(&self, limit: i64, offset: i64) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, date, merchant, amount, source_document, created_at
            FROM transactions
            ORDER BY date DESC, id DESC
            LIMIT ? OFFSET ?
            "#,
        )?;

        let transactions = stmt
            .query_map(params![limit, offset], row_to_transaction)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(transactions)
    }

    /// Count all stored transactions
    pub fn count_transactions(&self) -> Result<i64> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM transactions", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Sum amounts per merchant over every stored transaction
    ///
    /// Full scan; sums are exact because they are done on decimals rather
    /// than in SQL.
    pub fn merchant_totals(&self) -> Result<BTreeMap<String, Decimal>> {
        let conn = self.conn()?;
        sum_by_merchant(&conn)
    }
}
