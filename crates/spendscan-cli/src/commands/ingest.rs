//! Ingestion commands (folder scan, single file import)

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use spendscan_core::models::DocumentReport;
use spendscan_core::{CategoryConfig, Database, Error, FolderSource, Ingestor, SourceDocument};
use tracing::debug;

pub fn cmd_scan(db: &Database, config: &CategoryConfig, dir: &Path) -> Result<()> {
    println!("📂 Scanning {}...", dir.display());

    let summary = match Ingestor::new(db, config).ingest_batch(&FolderSource::new(dir)) {
        Ok(summary) => summary,
        Err(Error::SourceNotFound(path)) => bail!("Statement folder not found: {}", path),
        Err(e) => return Err(e).context("Scan failed"),
    };

    debug!(?summary, "Scan finished");
    println!("✅ {}", summary.message());
    if summary.documents_skipped > 0 {
        println!("   Already processed: {}", summary.documents_skipped);
    }
    if summary.documents_failed > 0 {
        println!("   ⚠️  Unreadable files: {}", summary.documents_failed);
    }
    let duplicates = summary.duplicates_in_document + summary.duplicates_existing;
    if duplicates > 0 {
        println!("   Duplicates dropped: {}", duplicates);
    }
    let dropped = summary.incomplete_entries + summary.malformed_entries + summary.invalid_records;
    if dropped > 0 {
        println!("   Entries dropped: {}", dropped);
    }

    Ok(())
}

pub fn cmd_import(db: &Database, config: &CategoryConfig, file: &Path) -> Result<()> {
    let name = file
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("Not a file: {}", file.display()))?;
    let content = fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    println!("📄 Importing {}...", name);

    match Ingestor::new(db, config).ingest_single(&SourceDocument::new(name, content)) {
        Ok(report) => {
            print_report(&report);
            Ok(())
        }
        Err(Error::AlreadyProcessed(name)) => {
            println!("   {} was already processed, nothing to do", name);
            Ok(())
        }
        Err(e) => Err(e).context("Import failed"),
    }
}

fn print_report(report: &DocumentReport) {
    println!(
        "✅ {} entries found, {} transactions added",
        report.entries_found, report.records_added
    );
    let duplicates = report.duplicates_in_document + report.duplicates_existing;
    if duplicates > 0 {
        println!("   Duplicates dropped: {}", duplicates);
    }
    let dropped = report.incomplete_entries + report.malformed_entries + report.invalid_records;
    if dropped > 0 {
        println!("   Entries dropped: {}", dropped);
    }
}
