//! CLI argument definitions for vendora.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Vendor sales performance warehouse.
///
/// Load raw purchasing/sales/freight extracts into a local DuckDB
/// warehouse and build the `vendor_sales_summary` table from them.
#[derive(Debug, Parser)]
#[command(name = "vendora", version, about = "Vendor sales performance warehouse")]
pub struct Cli {
    /// Warehouse root directory; overrides VENDORA_HOME.
    #[arg(long, global = true)]
    pub home: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create or migrate the warehouse and print its database path.
    Init,
    /// Load every *.csv in a directory into a table named after the file
    /// stem, replacing prior contents.
    Ingest {
        /// Directory containing raw CSV extracts.
        dir: PathBuf,
    },
    /// Aggregate, clean, and persist the vendor sales summary.
    Summarize,
}
