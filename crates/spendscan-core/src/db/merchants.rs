//! Merchant aggregate operations

use rusqlite::{params, OptionalExtension, TransactionBehavior};

use super::transactions::sum_by_merchant;
use super::{amount_text, decimal_column, parse_datetime, Database};
use crate::error::Result;
use crate::models::{CategorySource, MerchantAggregate};

/// Outcome of writing a full set of merchant totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregateSync {
    /// Merchants present in the record set
    pub merchants: usize,
    /// Rows inserted or whose total/category actually changed
    pub changed: usize,
    /// Rows removed because their merchant has no records left
    pub removed: usize,
}

const MERCHANT_COLUMNS: &str = "id, merchant, total_amount, category, category_source, updated_at";

fn row_to_merchant(row: &rusqlite::Row<'_>) -> rusqlite::Result<MerchantAggregate> {
    let source: String = row.get(4)?;
    let updated_at: String = row.get(5)?;
    Ok(MerchantAggregate {
        id: row.get(0)?,
        merchant: row.get(1)?,
        total_amount: decimal_column(row, 2)?,
        category: row.get(3)?,
        category_source: source.parse().unwrap_or_default(),
        updated_at: parse_datetime(&updated_at),
    })
}

impl Database {
    /// Recompute every merchant total from the stored transactions
    ///
    /// Totals are read and written inside one transaction, so the pass sees a
    /// single snapshot of the records. New merchants get
    /// `default_category(merchant)`. Existing rows take the new total, and
    /// their category is re-resolved unless the user set it. Rows for
    /// merchants with no records left are deleted.
    pub fn recompute_merchant_totals<F>(&self, default_category: F) -> Result<AggregateSync>
    where
        F: Fn(&str) -> String,
    {
        let mut conn = self.conn()?;
        let db_tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let totals = sum_by_merchant(&db_tx)?;
        let mut sync = AggregateSync {
            merchants: totals.len(),
            ..Default::default()
        };

        {
            let mut upsert = db_tx.prepare(
                r#"
                INSERT INTO merchants (merchant, total_amount, category, category_source)
                VALUES (?1, ?2, ?3, 'default')
                ON CONFLICT(merchant) DO UPDATE SET
                    total_amount = excluded.total_amount,
                    category = CASE
                        WHEN merchants.category_source = 'user' THEN merchants.category
                        ELSE excluded.category
                    END,
                    updated_at = CURRENT_TIMESTAMP
                WHERE merchants.total_amount != excluded.total_amount
                   OR (merchants.category_source != 'user' AND merchants.category != excluded.category)
                "#,
            )?;

            for (merchant, total) in &totals {
                sync.changed += upsert.execute(params![
                    merchant,
                    amount_text(total),
                    default_category(merchant),
                ])?;
            }
        }

        sync.removed = db_tx.execute(
            "DELETE FROM merchants WHERE merchant NOT IN (SELECT DISTINCT merchant FROM transactions)",
            [],
        )?;
        db_tx.commit()?;

        Ok(sync)
    }

    /// List all merchant aggregates by name
    pub fn list_merchants(&self) -> Result<Vec<MerchantAggregate>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM merchants ORDER BY merchant",
            MERCHANT_COLUMNS
        ))?;

        let merchants = stmt
            .query_map([], row_to_merchant)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(merchants)
    }

    /// Get one merchant aggregate by ID
    pub fn get_merchant(&self, id: i64) -> Result<Option<MerchantAggregate>> {
        let conn = self.conn()?;
        let merchant = conn
            .query_row(
                &format!("SELECT {} FROM merchants WHERE id = ?", MERCHANT_COLUMNS),
                params![id],
                row_to_merchant,
            )
            .optional()?;
        Ok(merchant)
    }

    /// Get one merchant aggregate by exact merchant name
    pub fn get_merchant_by_name(&self, merchant: &str) -> Result<Option<MerchantAggregate>> {
        let conn = self.conn()?;
        let merchant = conn
            .query_row(
                &format!("SELECT {} FROM merchants WHERE merchant = ?", MERCHANT_COLUMNS),
                params![merchant],
                row_to_merchant,
            )
            .optional()?;
        Ok(merchant)
    }

    /// Set a merchant's category and record where it came from
    ///
    /// Returns None if no merchant has this ID.
    pub fn set_merchant_category(
        &self,
        id: i64,
        category: &str,
        source: CategorySource,
    ) -> Result<Option<MerchantAggregate>> {
        let conn = self.conn()?;
        let updated = conn.execute(
            r#"
            UPDATE merchants
            SET category = ?, category_source = ?, updated_at = CURRENT_TIMESTAMP
            WHERE id = ?
            "#,
            params![category, source.as_str(), id],
        )?;

        if updated == 0 {
            return Ok(None);
        }
        drop(conn);
        self.get_merchant(id)
    }
}
