//! SpendScan CLI - Credit card statement ingestion
//!
//! Usage:
//!   spendscan init                    Initialize database
//!   spendscan scan --dir excel_files  Ingest new statement files in a folder
//!   spendscan import --file feb.html  Ingest one statement file
//!   spendscan merchants               Show merchant totals and categories
//!   spendscan serve --port 5001       Start web server

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    if let Commands::Init = cli.command {
        return commands::cmd_init(&cli.db);
    }

    let db = commands::open_db(&cli.db)?;
    let config = commands::load_categories(cli.categories.as_deref(), cli.mapping.as_deref())?;

    match cli.command {
        Commands::Init => Ok(()),
        Commands::Scan { dir } => commands::cmd_scan(&db, &config, &dir),
        Commands::Import { file } => commands::cmd_import(&db, &config, &file),
        Commands::Add {
            date,
            merchant,
            amount,
        } => commands::cmd_add(&db, &config, &date, &merchant, &amount),
        Commands::Recompute => commands::cmd_recompute(&db, &config),
        Commands::Merchants => commands::cmd_merchants(&db),
        Commands::Categories => commands::cmd_categories(&db, &config),
        Commands::SetCategory { id, category } => {
            commands::cmd_set_category(&db, &config, id, &category)
        }
        Commands::ResetCategory { id } => commands::cmd_reset_category(&db, &config, id),
        Commands::Transactions { limit } => commands::cmd_transactions_list(&db, limit),
        Commands::Documents => commands::cmd_documents(&db),
        Commands::Serve {
            port,
            host,
            static_dir,
            scan_dir,
            allowed_origins,
        } => {
            commands::cmd_serve(
                db,
                config,
                &host,
                port,
                static_dir.as_deref(),
                scan_dir,
                allowed_origins,
            )
            .await
        }
    }
}
