//! Server command implementation

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use spendscan_core::{CategoryConfig, Database};
use spendscan_server::ServerConfig;

pub async fn cmd_serve(
    db: Database,
    categories: CategoryConfig,
    host: &str,
    port: u16,
    static_dir: Option<&Path>,
    scan_dir: PathBuf,
    allowed_origins: Vec<String>,
) -> Result<()> {
    println!("🚀 Starting SpendScan web server...");
    println!("   Database: {}", db.path());
    println!("   Listening: http://{}:{}", host, port);
    println!("   Scan folder: {}", scan_dir.display());
    if let Some(dir) = static_dir {
        println!("   Static files: {}", dir.display());
    }
    if !allowed_origins.is_empty() {
        println!("   CORS origins: {}", allowed_origins.join(", "));
    }
    println!("   Categories: {}", categories.categories().join(", "));

    let static_dir = static_dir
        .map(|p| p.to_str().context("Static directory path is not valid UTF-8"))
        .transpose()?;

    let config = ServerConfig {
        allowed_origins,
        scan_dir,
    };

    spendscan_server::serve_with_config(db, categories, host, port, static_dir, config).await
}
