//! Domain models for SpendScan

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Category label used when no mapping or override applies
pub const UNCATEGORIZED: &str = "Uncategorized";

/// A persisted transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub date: NaiveDate,
    pub merchant: String,
    pub amount: Decimal,
    /// Statement file the record came from (None for manual entries)
    pub source_document: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A normalized transaction that has not been persisted yet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub date: NaiveDate,
    pub merchant: String,
    pub amount: Decimal,
}

/// Where a merchant's category came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CategorySource {
    /// Resolved from the default mapping on each aggregation pass
    #[default]
    Default,
    /// Assigned by the user; aggregation passes leave it alone
    User,
}

impl CategorySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::User => "user",
        }
    }
}

impl std::str::FromStr for CategorySource {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "default" => Ok(Self::Default),
            "user" => Ok(Self::User),
            _ => Err(format!("Unknown category source: {}", s)),
        }
    }
}

impl std::fmt::Display for CategorySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Merchant-level rollup of spend with its assigned category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerchantAggregate {
    pub id: i64,
    pub merchant: String,
    pub total_amount: Decimal,
    pub category: String,
    pub category_source: CategorySource,
    pub updated_at: DateTime<Utc>,
}

/// Entry in the processed document index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedDocument {
    pub name: String,
    pub records_added: i64,
    pub processed_at: DateTime<Utc>,
}

/// Outcome of ingesting one statement document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentReport {
    pub document: String,
    /// Transaction blocks found in the markup
    pub entries_found: usize,
    pub records_added: usize,
    /// Blocks missing a date, merchant or amount field
    pub incomplete_entries: usize,
    /// Blocks whose sub-structure could not be read
    pub malformed_entries: usize,
    /// Entries whose date or amount failed to normalize
    pub invalid_records: usize,
    /// Repeats of an entry seen earlier in the same document
    pub duplicates_in_document: usize,
    /// Records already present in the store
    pub duplicates_existing: usize,
}

/// Outcome of a batch ingestion
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestSummary {
    pub documents_processed: usize,
    pub records_added: usize,
    /// Documents skipped because they were ingested before
    pub documents_skipped: usize,
    /// Documents that could not be read
    pub documents_failed: usize,
    pub incomplete_entries: usize,
    pub malformed_entries: usize,
    pub invalid_records: usize,
    pub duplicates_in_document: usize,
    pub duplicates_existing: usize,
}

impl IngestSummary {
    /// Fold one document's report into the batch totals
    pub fn absorb(&mut self, report: &DocumentReport) {
        self.documents_processed += 1;
        self.records_added += report.records_added;
        self.incomplete_entries += report.incomplete_entries;
        self.malformed_entries += report.malformed_entries;
        self.invalid_records += report.invalid_records;
        self.duplicates_in_document += report.duplicates_in_document;
        self.duplicates_existing += report.duplicates_existing;
    }

    /// Human-readable one-line summary
    pub fn message(&self) -> String {
        format!(
            "Processed {} files, added {} transactions.",
            self.documents_processed, self.records_added
        )
    }
}
