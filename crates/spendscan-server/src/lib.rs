//! SpendScan Web Server
//!
//! Axum-based REST API for the SpendScan statement tool.
//!
//! - Folder scans and single-file uploads of statement exports
//! - Merchant aggregates with category overrides
//! - Dashboard and pie chart data
//! - Restrictive CORS policy and security headers
//! - Input validation (pagination limits, file size limits)
//! - Sanitized error responses

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer, services::ServeDir, set_header::SetResponseHeaderLayer, trace::TraceLayer,
};
use tracing::{error, info, warn};

use spendscan_core::{CategoryConfig, Database};

mod handlers;

/// Maximum file upload size (10 MB)
pub const MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024;

/// Maximum pagination limit
pub const MAX_PAGE_LIMIT: i64 = 1000;

/// Folder scanned by `POST /api/scan` when none is configured
pub const DEFAULT_SCAN_DIR: &str = "excel_files";

/// Server configuration
#[derive(Clone)]
pub struct ServerConfig {
    /// Allowed CORS origins (empty = same-origin only)
    pub allowed_origins: Vec<String>,
    /// Folder of statement exports picked up by folder scans
    pub scan_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![],
            scan_dir: PathBuf::from(DEFAULT_SCAN_DIR),
        }
    }
}

/// Shared application state
pub struct AppState {
    pub db: Database,
    pub categories: CategoryConfig,
    pub config: ServerConfig,
}

/// Create the application router
pub fn create_router(
    db: Database,
    categories: CategoryConfig,
    static_dir: Option<&str>,
    config: ServerConfig,
) -> Router {
    let allowed_origins = config.allowed_origins.clone();
    let state = Arc::new(AppState {
        db,
        categories,
        config,
    });

    let api_routes = Router::new()
        // Dashboard
        .route("/dashboard", get(handlers::get_dashboard))
        .route("/pie_data", get(handlers::get_pie_data))
        .route("/categories", get(handlers::list_categories))
        // Transactions
        .route(
            "/transactions",
            get(handlers::list_transactions).post(handlers::create_transaction),
        )
        // Ingestion
        .route("/scan", post(handlers::scan_folder))
        .route("/upload", post(handlers::upload_document))
        .route("/documents", get(handlers::list_documents))
        // Merchants and categories
        .route("/merchants", get(handlers::list_merchants))
        .route(
            "/merchants/:id",
            get(handlers::get_merchant).post(handlers::set_merchant_category),
        )
        .route("/merchants/:id/reset", post(handlers::reset_merchant_category))
        .route("/aggregates/recompute", post(handlers::recompute_aggregates))
        // Leave room for multipart framing on top of the file itself
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_SIZE + 64 * 1024));

    // Build CORS layer
    let cors = if allowed_origins.is_empty() {
        // Restrictive default: only allow same-origin
        CorsLayer::new()
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE])
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE])
    };

    // CSP: same-origin scripts only, inline styles allowed for the dashboard page
    let csp_value = HeaderValue::from_static(
        "default-src 'self'; script-src 'self'; style-src 'self' 'unsafe-inline'; img-src 'self' data:; connect-src 'self'; frame-ancestors 'none'"
    );

    let mut app = Router::new()
        .nest("/api", api_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Security headers
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CONTENT_SECURITY_POLICY,
            csp_value,
        ));

    // Serve static files if directory provided
    if let Some(dir) = static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app
}

/// Start the server
pub async fn serve(
    db: Database,
    categories: CategoryConfig,
    host: &str,
    port: u16,
    static_dir: Option<&str>,
) -> anyhow::Result<()> {
    serve_with_config(
        db,
        categories,
        host,
        port,
        static_dir,
        ServerConfig::default(),
    )
    .await
}

/// Start the server with custom configuration
pub async fn serve_with_config(
    db: Database,
    categories: CategoryConfig,
    host: &str,
    port: u16,
    static_dir: Option<&str>,
    config: ServerConfig,
) -> anyhow::Result<()> {
    if !config.scan_dir.is_dir() {
        warn!(
            "Scan folder {} does not exist yet; folder scans will fail until it is created",
            config.scan_dir.display()
        );
    }

    // Bring aggregates in line with whatever is already stored
    match spendscan_core::Aggregator::new(&db, &categories).recompute() {
        Ok(summary) => info!(
            merchants = summary.merchants,
            categories = categories.categories().len(),
            "Loaded statement database {}",
            db.path()
        ),
        Err(spendscan_core::Error::InvalidData(msg)) => {
            warn!("Serving stale merchant totals from {}: {}", db.path(), msg)
        }
        Err(e) => return Err(e.into()),
    }

    let app = create_router(db, categories, static_dir, config);
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn not_found(msg: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn conflict(msg: &str) -> Self {
        Self {
            status: StatusCode::CONFLICT,
            message: msg.to_string(),
            internal: None,
        }
    }

    /// Map a domain error to its HTTP status; anything else is a 500
    pub fn from_core(err: spendscan_core::Error) -> Self {
        use spendscan_core::Error;

        match err {
            Error::NotFound(what) => Self::not_found(&format!("{} not found", what)),
            Error::SourceNotFound(path) => {
                Self::not_found(&format!("Statement folder not found: {}", path))
            }
            Error::AlreadyProcessed(name) => {
                Self::conflict(&format!("Document already processed: {}", name))
            }
            Error::InvalidCategory(category) => {
                Self::bad_request(&format!("Unknown category: {}", category))
            }
            Error::InvalidData(msg) => Self::bad_request(&msg),
            other => other.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let err = err.into();
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            // Return generic message to client
            message: "An internal error occurred".to_string(),
            // Keep full error for logging
            internal: Some(err),
        }
    }
}

#[cfg(test)]
mod tests;
