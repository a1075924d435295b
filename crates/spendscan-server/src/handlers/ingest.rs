//! Statement ingestion handlers

use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::Serialize;
use tracing::info;

use crate::{AppError, AppState, MAX_UPLOAD_SIZE};
use spendscan_core::models::{DocumentReport, IngestSummary, ProcessedDocument};
use spendscan_core::{Aggregator, FolderSource, Ingestor, RecomputeSummary, SourceDocument};

#[derive(Serialize)]
pub struct ScanResponse {
    #[serde(flatten)]
    pub summary: IngestSummary,
    pub message: String,
}

/// POST /api/scan - Ingest every new statement file in the scan folder
pub async fn scan_folder(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ScanResponse>, AppError> {
    let source = FolderSource::new(&state.config.scan_dir);
    let summary = Ingestor::new(&state.db, &state.categories)
        .ingest_batch(&source)
        .map_err(AppError::from_core)?;

    Ok(Json(ScanResponse {
        message: summary.message(),
        summary,
    }))
}

#[derive(Serialize)]
pub struct UploadResponse {
    #[serde(flatten)]
    pub report: DocumentReport,
    pub message: String,
}

/// POST /api/upload - Ingest a single uploaded statement file
///
/// Expects multipart form with:
/// - file: HTML statement export (required, max 10MB)
pub async fn upload_document(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let mut document: Option<SourceDocument> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::bad_request(&format!("Failed to read form field: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        // Only the final path component is kept as the document name
        let name = field
            .file_name()
            .and_then(|n| Path::new(n).file_name())
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| AppError::bad_request("Uploaded file has no name"))?;

        let bytes = field
            .bytes()
            .await
            .map_err(|_| AppError::bad_request("Failed to read file data"))?;

        if bytes.len() > MAX_UPLOAD_SIZE {
            return Err(AppError::bad_request(&format!(
                "File too large. Maximum size is {} MB",
                MAX_UPLOAD_SIZE / 1024 / 1024
            )));
        }

        let content = String::from_utf8(bytes.to_vec())
            .map_err(|_| AppError::bad_request("File is not valid UTF-8 text"))?;

        document = Some(SourceDocument::new(name, content));
    }

    let document = document.ok_or_else(|| AppError::bad_request("Missing file field"))?;

    let report = Ingestor::new(&state.db, &state.categories)
        .ingest_single(&document)
        .map_err(AppError::from_core)?;

    let mut summary = IngestSummary::default();
    summary.absorb(&report);
    info!(document = %report.document, added = report.records_added, "Upload ingested");

    Ok(Json(UploadResponse {
        message: summary.message(),
        report,
    }))
}

/// GET /api/documents - List processed statement files
pub async fn list_documents(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ProcessedDocument>>, AppError> {
    let documents = state.db.list_processed_documents()?;
    Ok(Json(documents))
}

/// POST /api/aggregates/recompute - Rebuild merchant totals from stored transactions
pub async fn recompute_aggregates(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RecomputeSummary>, AppError> {
    let summary = Aggregator::new(&state.db, &state.categories).recompute()?;
    Ok(Json(summary))
}
