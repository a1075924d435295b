//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// SpendScan - Credit card statement ingestion and spend breakdown
#[derive(Parser)]
#[command(name = "spendscan")]
#[command(about = "Ingest exported card statements and break spend down by merchant and category", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "spendscan.db", global = true)]
    pub db: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// YAML file with the category list (`categories:`)
    ///
    /// Defaults to ./categories.yaml, then the user config directory.
    #[arg(long, global = true)]
    pub categories: Option<PathBuf>,

    /// YAML file with the merchant to category mapping (`default_categories:`)
    ///
    /// Defaults to ./default_categories.yaml, then the user config directory.
    #[arg(long, global = true)]
    pub mapping: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// Ingest every new statement file in a folder
    Scan {
        /// Folder of exported .html statements
        #[arg(short, long, default_value = "excel_files")]
        dir: PathBuf,
    },

    /// Ingest a single statement file
    Import {
        /// Exported .html statement
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Add a transaction by hand
    Add {
        /// Date (YYYY-MM-DD or DD/MM/YY)
        #[arg(long)]
        date: String,

        /// Merchant name
        #[arg(long)]
        merchant: String,

        /// Amount (e.g. 39.46 or 1,234.56)
        #[arg(long, allow_hyphen_values = true)]
        amount: String,
    },

    /// Recompute merchant totals from stored transactions
    Recompute,

    /// List merchant totals and categories
    Merchants,

    /// Show spend per category
    Categories,

    /// Override a merchant's category
    SetCategory {
        /// Merchant ID (see `spendscan merchants`)
        id: i64,

        /// Category label
        category: String,
    },

    /// Drop a category override and use the default mapping again
    ResetCategory {
        /// Merchant ID
        id: i64,
    },

    /// List transactions, newest first
    Transactions {
        /// Maximum number of transactions to show
        #[arg(short, long, default_value = "20")]
        limit: i64,
    },

    /// List processed statement files
    Documents,

    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "5001")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Directory with the dashboard's static files
        #[arg(long)]
        static_dir: Option<PathBuf>,

        /// Folder picked up by the scan endpoint
        #[arg(long, default_value = "excel_files")]
        scan_dir: PathBuf,

        /// Allowed CORS origins (comma-separated)
        #[arg(long, value_delimiter = ',')]
        allowed_origins: Vec<String>,
    },
}
