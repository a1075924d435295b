//! Ingestion of statement documents into the store
//!
//! For each document: extract entries, normalize them, drop intra-document
//! repeats, then persist the survivors together with the document marker in
//! one store transaction. Documents already in the processed index are never
//! re-opened. Aggregates are refreshed once per call, after all documents.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::aggregate::Aggregator;
use crate::config::CategoryConfig;
use crate::db::Database;
use crate::dedup::DedupFilter;
use crate::error::{Error, Result};
use crate::extract::{extract_entries, SkipReason};
use crate::models::{DocumentReport, IngestSummary, NewTransaction};
use crate::normalize::normalize_entry;

/// A named collection of statement documents
pub trait DocumentSource {
    /// Identifiers of the documents in the source, in processing order
    fn list(&self) -> Result<Vec<String>>;

    /// Raw markup of one document
    fn read(&self, name: &str) -> Result<String>;
}

/// Statement exports saved as `.html` files in one folder (not recursive)
#[derive(Debug, Clone)]
pub struct FolderSource {
    root: PathBuf,
}

impl FolderSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

fn is_html(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|s| s.eq_ignore_ascii_case("html"))
        .unwrap_or(false)
}

impl DocumentSource for FolderSource {
    fn list(&self) -> Result<Vec<String>> {
        if !self.root.is_dir() {
            return Err(Error::SourceNotFound(self.root.display().to_string()));
        }

        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if !path.is_file() || !is_html(&path) {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    fn read(&self, name: &str) -> Result<String> {
        Ok(fs::read_to_string(self.root.join(name))?)
    }
}

/// A single in-memory document, e.g. an upload
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub name: String,
    pub content: String,
}

impl SourceDocument {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

impl DocumentSource for SourceDocument {
    fn list(&self) -> Result<Vec<String>> {
        Ok(vec![self.name.clone()])
    }

    fn read(&self, name: &str) -> Result<String> {
        if name == self.name {
            Ok(self.content.clone())
        } else {
            Err(Error::NotFound(format!("Document {}", name)))
        }
    }
}

/// Drives extraction, normalization, dedup and persistence
pub struct Ingestor<'a> {
    db: &'a Database,
    config: &'a CategoryConfig,
}

impl<'a> Ingestor<'a> {
    pub fn new(db: &'a Database, config: &'a CategoryConfig) -> Self {
        Self { db, config }
    }

    /// Ingest every not-yet-processed document of a source
    ///
    /// Fails only when the source itself is unavailable or the store fails.
    /// Unreadable documents are counted and left unmarked so a later scan
    /// retries them.
    pub fn ingest_batch(&self, source: &dyn DocumentSource) -> Result<IngestSummary> {
        let names = source.list()?;
        let processed = self.db.processed_document_names()?;
        let mut summary = IngestSummary::default();

        for name in names {
            if processed.contains(&name) {
                debug!(document = %name, "Skipping already processed document");
                summary.documents_skipped += 1;
                continue;
            }

            let content = match source.read(&name) {
                Ok(content) => content,
                Err(e) => {
                    warn!(document = %name, error = %e, "Failed to read document");
                    summary.documents_failed += 1;
                    continue;
                }
            };

            match self.ingest_document(&name, &content) {
                Ok(report) => summary.absorb(&report),
                Err(Error::AlreadyProcessed(_)) => {
                    debug!(document = %name, "Document was processed concurrently");
                    summary.documents_skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }

        Aggregator::new(self.db, self.config).recompute()?;

        info!(
            processed = summary.documents_processed,
            added = summary.records_added,
            skipped = summary.documents_skipped,
            failed = summary.documents_failed,
            "Batch ingestion complete"
        );
        Ok(summary)
    }

    /// Ingest one document, refusing names that were already processed
    pub fn ingest_single(&self, document: &SourceDocument) -> Result<DocumentReport> {
        if self.db.is_document_processed(&document.name)? {
            return Err(Error::AlreadyProcessed(document.name.clone()));
        }

        let report = self.ingest_document(&document.name, &document.content)?;
        Aggregator::new(self.db, self.config).recompute()?;
        Ok(report)
    }

    /// Run one document through the pipeline and persist it as one unit
    ///
    /// The processed index is only checked when the records are written.
    /// Does not refresh aggregates.
    fn ingest_document(&self, name: &str, content: &str) -> Result<DocumentReport> {
        let mut report = DocumentReport {
            document: name.to_string(),
            ..Default::default()
        };
        let mut filter = DedupFilter::new();
        let mut records: Vec<NewTransaction> = Vec::new();

        for entry in extract_entries(content) {
            report.entries_found += 1;

            let raw = match entry {
                Ok(raw) => raw,
                Err(skip) => {
                    match skip.reason {
                        SkipReason::MissingField(_) => report.incomplete_entries += 1,
                        SkipReason::Malformed(_) => report.malformed_entries += 1,
                    }
                    continue;
                }
            };

            let record = match normalize_entry(&raw) {
                Ok(record) => record,
                Err(e) => {
                    warn!(document = name, error = %e, "Dropping entry that failed to normalize");
                    report.invalid_records += 1;
                    continue;
                }
            };

            if !filter.admit(&record) {
                debug!(document = name, merchant = %record.merchant, "Dropping repeated entry");
                report.duplicates_in_document += 1;
                continue;
            }

            records.push(record);
        }

        let stored = self.db.insert_document(name, &records)?;
        report.records_added = stored.inserted;
        report.duplicates_existing = stored.duplicates;

        info!(
            document = name,
            entries = report.entries_found,
            added = report.records_added,
            "Ingested document"
        );
        Ok(report)
    }
}
