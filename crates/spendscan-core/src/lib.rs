//! SpendScan Core Library
//!
//! Shared functionality for the SpendScan statement tool:
//! - Markup extraction from exported statement pages
//! - Field normalization (dates, amounts, merchant names)
//! - Duplicate suppression on the (date, merchant, amount) natural key
//! - Ingestion coordination over folders and single uploads
//! - Merchant and category aggregation
//! - Category configuration loaded from YAML
//! - SQLite storage with connection pooling and migrations

pub mod aggregate;
pub mod config;
pub mod db;
pub mod dedup;
pub mod error;
pub mod extract;
pub mod ingest;
pub mod models;
pub mod normalize;

pub use aggregate::{Aggregator, RecomputeSummary};
pub use config::CategoryConfig;
pub use db::Database;
pub use error::{Error, Result};
pub use extract::{extract_entries, EntryResult, EntrySkip, Field, RawEntry, SkipReason};
pub use ingest::{DocumentSource, FolderSource, Ingestor, SourceDocument};
pub use normalize::FieldError;
