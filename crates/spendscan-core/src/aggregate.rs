//! Merchant and category aggregation
//!
//! Merchant totals are a materialized view over the stored transactions.
//! Every pass recomputes them from a full scan instead of patching them,
//! so running it twice over the same records changes nothing.
//!
//! Categories come from the default mapping unless the user assigned one;
//! user assignments survive recomputation until `reset_category` is called.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::CategoryConfig;
use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::{CategorySource, MerchantAggregate};

/// Outcome of one aggregation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RecomputeSummary {
    pub merchants: usize,
    pub changed: usize,
    pub removed: usize,
}

/// Recomputes and edits merchant aggregates
pub struct Aggregator<'a> {
    db: &'a Database,
    config: &'a CategoryConfig,
}

impl<'a> Aggregator<'a> {
    pub fn new(db: &'a Database, config: &'a CategoryConfig) -> Self {
        Self { db, config }
    }

    /// Recompute every merchant total from the stored transactions
    pub fn recompute(&self) -> Result<RecomputeSummary> {
        let sync = self.db.recompute_merchant_totals(|merchant| {
            self.config.default_category(merchant).to_string()
        })?;

        info!(
            merchants = sync.merchants,
            changed = sync.changed,
            removed = sync.removed,
            "Recomputed merchant totals"
        );

        Ok(RecomputeSummary {
            merchants: sync.merchants,
            changed: sync.changed,
            removed: sync.removed,
        })
    }

    /// Sum merchant totals per category
    pub fn totals_by_category(&self) -> Result<BTreeMap<String, Decimal>> {
        let mut totals: BTreeMap<String, Decimal> = BTreeMap::new();
        for merchant in self.db.list_merchants()? {
            let total = totals.get(&merchant.category).copied().unwrap_or_default();
            let total = total.checked_add(merchant.total_amount).ok_or_else(|| {
                Error::InvalidData(format!(
                    "Total for category {:?} is out of range",
                    merchant.category
                ))
            })?;
            totals.insert(merchant.category, total);
        }
        Ok(totals)
    }

    /// Assign a category to a merchant, overriding the default mapping
    pub fn set_category(&self, merchant_id: i64, category: &str) -> Result<MerchantAggregate> {
        let category = category.trim();
        self.config.validate(category)?;

        let updated = self
            .db
            .set_merchant_category(merchant_id, category, CategorySource::User)?
            .ok_or_else(|| Error::NotFound(format!("Merchant {}", merchant_id)))?;

        debug!(merchant = %updated.merchant, category, "Category overridden");
        Ok(updated)
    }

    /// Drop a user override and go back to the default mapping
    pub fn reset_category(&self, merchant_id: i64) -> Result<MerchantAggregate> {
        let merchant = self
            .db
            .get_merchant(merchant_id)?
            .ok_or_else(|| Error::NotFound(format!("Merchant {}", merchant_id)))?;

        let category = self.config.default_category(&merchant.merchant);
        self.db
            .set_merchant_category(merchant_id, category, CategorySource::Default)?
            .ok_or_else(|| Error::NotFound(format!("Merchant {}", merchant_id)))
    }
}
