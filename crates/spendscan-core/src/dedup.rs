//! Duplicate suppression on the (date, merchant, amount) natural key
//!
//! The same key is enforced at two scopes: within one document by
//! [`DedupFilter`], and against the store by `Database::insert_document`.
//! In both cases the first record seen wins and later ones are dropped.

use std::collections::HashSet;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::models::NewTransaction;

/// Identity of a transaction independent of where it came from
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NaturalKey {
    pub date: NaiveDate,
    pub merchant: String,
    pub amount: Decimal,
}

impl NaturalKey {
    pub fn of(tx: &NewTransaction) -> Self {
        Self {
            date: tx.date,
            merchant: tx.merchant.clone(),
            amount: tx.amount.normalize(),
        }
    }
}

/// Set of keys seen so far in one pass
#[derive(Debug, Default)]
pub struct DedupFilter {
    seen: HashSet<NaturalKey>,
}

impl DedupFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true the first time a key is offered, false for every repeat
    pub fn admit(&mut self, tx: &NewTransaction) -> bool {
        self.seen.insert(NaturalKey::of(tx))
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
