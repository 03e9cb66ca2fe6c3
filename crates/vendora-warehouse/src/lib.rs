//! # Vendora Warehouse
//!
//! DuckDB-backed relational store for the vendor sales pipeline.
//!
//! The warehouse plays both collaborator roles the pipeline needs:
//!
//! - [`FactSource`]: typed reads over the four base relations
//!   (`purchases`, `purchase_prices`, `sales`, `vendor_invoice`)
//! - [`SummarySink`]: full-replace persistence of `vendor_sales_summary`
//!   through a staging table that is swapped in atomically, so a failed
//!   write leaves the previous summary intact
//!
//! It also owns the plumbing around the pipeline: schema migrations, raw
//! CSV ingestion with replace semantics, and an `ingest_log` audit table.

pub mod duckdb;
pub mod migrations;

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use ::duckdb::Connection;
use ::duckdb::ToSql;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use vendora_core::{
    ConfigError, DataSourceError, FactSource, FreightFact, PriceFact, PurchaseFact, SalesFact,
    SinkWriteError, SummarySink, VendorSalesSummary,
};

pub use duckdb::{ConnectionManager, PooledConnection};

/// Errors from warehouse maintenance operations (open, migrate, ingest).
///
/// Pipeline-facing failures surface through the core taxonomy
/// ([`DataSourceError`], [`SinkWriteError`]) at the trait boundary instead.
#[derive(Debug, Error)]
pub enum WarehouseError {
    /// `DuckDB` database error.
    #[error(transparent)]
    DuckDb(#[from] ::duckdb::Error),

    /// I/O error (file system operations).
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Connection parameters could not be resolved.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A table or file name that cannot be used safely in SQL.
    #[error("invalid identifier: '{0}'")]
    InvalidIdentifier(String),
}

/// Configuration for the warehouse database.
#[derive(Debug, Clone)]
pub struct WarehouseConfig {
    /// Root directory for vendora data.
    pub vendora_home: PathBuf,
    /// Path to the `DuckDB` database file.
    pub db_path: PathBuf,
    /// Maximum number of idle connections kept pooled.
    pub max_pool_size: usize,
}

impl WarehouseConfig {
    /// Build a configuration rooted at an explicit home directory.
    #[must_use]
    pub fn with_home(vendora_home: PathBuf) -> Self {
        let db_path = vendora_home.join("warehouse.duckdb");
        Self {
            vendora_home,
            db_path,
            max_pool_size: 4,
        }
    }

    /// Resolve configuration from the environment.
    ///
    /// `VENDORA_HOME` wins; otherwise `$HOME/.vendora`. With neither set
    /// there is no usable connection parameter and the pipeline must not
    /// start.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Some(path) = env::var_os("VENDORA_HOME") {
            if !path.is_empty() {
                return Ok(Self::with_home(PathBuf::from(path)));
            }
        }

        if let Some(home) = env::var_os("HOME") {
            if !home.is_empty() {
                return Ok(Self::with_home(PathBuf::from(home).join(".vendora")));
            }
        }

        Err(ConfigError::MissingHome)
    }
}

/// Report from one raw-data ingestion run.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    /// Directory that was scanned.
    pub data_dir: PathBuf,
    /// Files seen in the directory.
    pub scanned_files: usize,
    /// CSV files loaded into tables.
    pub loaded_tables: usize,
    /// Files skipped (non-CSV or unusable file name).
    pub skipped_files: usize,
    /// Total rows across all loaded tables.
    pub total_rows: i64,
}

/// The warehouse handle shared by the CLI commands and the pipeline.
#[derive(Clone)]
pub struct Warehouse {
    manager: ConnectionManager,
}

impl Warehouse {
    /// Open a warehouse using environment-resolved configuration.
    pub fn open_default() -> Result<Self, WarehouseError> {
        Self::open(WarehouseConfig::from_env()?)
    }

    /// Open a warehouse with the specified configuration.
    pub fn open(config: WarehouseConfig) -> Result<Self, WarehouseError> {
        if let Some(parent) = config.db_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let manager = ConnectionManager::new(config.db_path.clone(), config.max_pool_size);
        let warehouse = Self { manager };
        warehouse.initialize()?;
        Ok(warehouse)
    }

    /// Apply schema migrations.
    pub fn initialize(&self) -> Result<(), WarehouseError> {
        let connection = self.manager.acquire()?;
        migrations::apply_migrations(&connection)?;
        Ok(())
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn db_path(&self) -> &Path {
        self.manager.db_path()
    }

    /// Load every `*.csv` file in `data_dir` into a table named after the
    /// file stem, replacing any prior contents (ingest.py semantics).
    pub fn load_csv_dir(&self, data_dir: &Path) -> Result<IngestReport, WarehouseError> {
        let run_id = format!("ingest:{}", Uuid::new_v4());
        let mut report = IngestReport {
            data_dir: data_dir.to_path_buf(),
            scanned_files: 0,
            loaded_tables: 0,
            skipped_files: 0,
            total_rows: 0,
        };

        let mut files: Vec<PathBuf> = Vec::new();
        for entry in fs::read_dir(data_dir)? {
            let path = entry?.path();
            if path.is_file() {
                files.push(path);
            }
        }
        files.sort();

        for path in files {
            report.scanned_files += 1;
            let is_csv = path
                .extension()
                .and_then(|extension| extension.to_str())
                .is_some_and(|extension| extension.eq_ignore_ascii_case("csv"));
            let table = path.file_stem().and_then(|stem| stem.to_str());
            let Some(table) = table.filter(|_| is_csv) else {
                report.skipped_files += 1;
                continue;
            };
            if !is_valid_identifier(table) {
                warn!(file = %path.display(), "skipping file with unusable table name");
                report.skipped_files += 1;
                continue;
            }

            let rows = self.load_csv(table, path.as_path())?;
            self.log_operation(run_id.as_str(), table, rows, "replaced");
            info!(table, rows, "table replaced from csv");
            report.loaded_tables += 1;
            report.total_rows += rows;
        }

        Ok(report)
    }

    /// Replace one table from a CSV file and return its row count.
    ///
    /// Column names and types are inferred by `read_csv_auto`; the raw
    /// extracts carry their own headers.
    pub fn load_csv(&self, table: &str, csv_path: &Path) -> Result<i64, WarehouseError> {
        if !is_valid_identifier(table) {
            return Err(WarehouseError::InvalidIdentifier(table.to_string()));
        }

        let connection = self.manager.acquire()?;
        // The path comes from our own directory scan, not user SQL.
        let sql = format!(
            "CREATE OR REPLACE TABLE {table} AS SELECT * FROM read_csv_auto('{path}', header = true)",
            path = escape_sql_string(path_to_sql(csv_path).as_str())
        );
        connection.execute_batch(sql.as_str())?;

        let count_sql = format!("SELECT COUNT(*) FROM {table}");
        let rows: i64 = connection.query_row(count_sql.as_str(), [], |row| row.get(0))?;
        Ok(rows)
    }

    /// Append an audit row; best effort, never fails the calling operation.
    fn log_operation(&self, run_id: &str, table: &str, row_count: i64, status: &str) {
        let result = self.manager.acquire().and_then(|connection| {
            let params: [&dyn ToSql; 4] = [&run_id, &table, &row_count, &status];
            connection.execute(
                "INSERT INTO ingest_log (run_id, table_name, row_count, status, timestamp) \
                 VALUES (?, ?, ?, ?, CURRENT_TIMESTAMP)",
                params.as_slice(),
            )?;
            Ok(())
        });
        if let Err(error) = result {
            warn!(%error, table, "failed to append ingest_log row");
        }
    }

    /// Verify a relation exists and carries the columns a query needs.
    fn ensure_relation(&self, relation: &str, required: &[&str]) -> Result<(), DataSourceError> {
        let connection = self
            .manager
            .acquire()
            .map_err(|error| unavailable(relation, &error))?;

        let mut statement = connection
            .prepare(
                "SELECT column_name FROM information_schema.columns \
                 WHERE lower(table_name) = lower(?)",
            )
            .map_err(|error| unavailable(relation, &error))?;
        let columns = statement
            .query_map([relation], |row| row.get::<_, String>(0))
            .map_err(|error| unavailable(relation, &error))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|error| unavailable(relation, &error))?;

        if columns.is_empty() {
            return Err(DataSourceError::Unavailable {
                relation: relation.to_string(),
                message: String::from("relation does not exist"),
            });
        }
        for column in required {
            if !columns.iter().any(|name| name.eq_ignore_ascii_case(column)) {
                return Err(DataSourceError::MissingColumn {
                    relation: relation.to_string(),
                    column: (*column).to_string(),
                });
            }
        }
        Ok(())
    }

    /// Read a relation into typed rows after preflighting its schema.
    fn fetch_rows<T>(
        &self,
        relation: &str,
        required: &[&str],
        sql: &str,
        map: impl FnMut(&::duckdb::Row<'_>) -> Result<T, ::duckdb::Error>,
    ) -> Result<Vec<T>, DataSourceError> {
        self.ensure_relation(relation, required)?;

        let connection = self
            .manager
            .acquire()
            .map_err(|error| unavailable(relation, &error))?;
        let mut statement = connection
            .prepare(sql)
            .map_err(|error| read_failed(relation, &error))?;
        let rows = statement
            .query_map([], map)
            .map_err(|error| read_failed(relation, &error))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|error| read_failed(relation, &error))?;
        Ok(rows)
    }
}

impl FactSource for Warehouse {
    fn purchase_facts(&self) -> Result<Vec<PurchaseFact>, DataSourceError> {
        self.fetch_rows(
            "purchases",
            &[
                "VendorNumber",
                "VendorName",
                "Brand",
                "Description",
                "PurchasePrice",
                "Quantity",
                "Dollars",
            ],
            "SELECT COALESCE(CAST(VendorNumber AS BIGINT), 0), \
                    COALESCE(CAST(VendorName AS VARCHAR), ''), \
                    COALESCE(CAST(Brand AS BIGINT), 0), \
                    COALESCE(CAST(Description AS VARCHAR), ''), \
                    COALESCE(CAST(PurchasePrice AS DOUBLE), 0), \
                    COALESCE(CAST(Quantity AS BIGINT), 0), \
                    COALESCE(CAST(Dollars AS DOUBLE), 0) \
             FROM purchases",
            |row| {
                Ok(PurchaseFact {
                    vendor_number: row.get(0)?,
                    vendor_name: row.get(1)?,
                    brand: row.get(2)?,
                    description: row.get(3)?,
                    purchase_price: row.get(4)?,
                    quantity: row.get(5)?,
                    dollars: row.get(6)?,
                })
            },
        )
    }

    fn price_facts(&self) -> Result<Vec<PriceFact>, DataSourceError> {
        self.fetch_rows(
            "purchase_prices",
            &["Brand", "Price", "Volume"],
            "SELECT COALESCE(CAST(Brand AS BIGINT), 0), \
                    COALESCE(CAST(Price AS DOUBLE), 0), \
                    COALESCE(CAST(Volume AS VARCHAR), '') \
             FROM purchase_prices",
            |row| {
                Ok(PriceFact {
                    brand: row.get(0)?,
                    price: row.get(1)?,
                    volume: row.get(2)?,
                })
            },
        )
    }

    fn sales_facts(&self) -> Result<Vec<SalesFact>, DataSourceError> {
        self.fetch_rows(
            "sales",
            &[
                "VendorNo",
                "Brand",
                "SalesQuantity",
                "SalesDollars",
                "SalesPrice",
                "ExciseTax",
            ],
            "SELECT COALESCE(CAST(VendorNo AS BIGINT), 0), \
                    COALESCE(CAST(Brand AS BIGINT), 0), \
                    COALESCE(CAST(SalesQuantity AS DOUBLE), 0), \
                    COALESCE(CAST(SalesDollars AS DOUBLE), 0), \
                    COALESCE(CAST(SalesPrice AS DOUBLE), 0), \
                    COALESCE(CAST(ExciseTax AS DOUBLE), 0) \
             FROM sales",
            |row| {
                Ok(SalesFact {
                    vendor_no: row.get(0)?,
                    brand: row.get(1)?,
                    sales_quantity: row.get(2)?,
                    sales_dollars: row.get(3)?,
                    sales_price: row.get(4)?,
                    excise_tax: row.get(5)?,
                })
            },
        )
    }

    fn freight_facts(&self) -> Result<Vec<FreightFact>, DataSourceError> {
        self.fetch_rows(
            "vendor_invoice",
            &["VendorNumber", "Freight"],
            "SELECT COALESCE(CAST(VendorNumber AS BIGINT), 0), \
                    COALESCE(CAST(Freight AS DOUBLE), 0) \
             FROM vendor_invoice",
            |row| {
                Ok(FreightFact {
                    vendor_number: row.get(0)?,
                    freight: row.get(1)?,
                })
            },
        )
    }
}

impl SummarySink for Warehouse {
    /// Replace `table` with the given rows via an atomic staging swap.
    ///
    /// Rows are inserted in slice order, so the aggregator's descending
    /// `TotalPurchaseDollars` ordering carries into the stored table.
    fn replace_table(
        &self,
        table: &str,
        rows: &[VendorSalesSummary],
    ) -> Result<(), SinkWriteError> {
        if !is_valid_identifier(table) {
            return Err(SinkWriteError::InvalidTableName {
                table: table.to_string(),
            });
        }
        let staging = format!("{table}__staging");

        let connection = self
            .manager
            .acquire()
            .map_err(|error| replace_failed(table, &error))?;

        let result = write_staged(&connection, table, staging.as_str(), rows);
        if let Err(error) = result {
            let _ = connection.execute_batch("ROLLBACK");
            return Err(replace_failed(table, &error));
        }

        self.log_operation(
            format!("summary:{}", Uuid::new_v4()).as_str(),
            table,
            rows.len() as i64,
            "replaced",
        );
        Ok(())
    }
}

/// Stage, fill, and swap inside one transaction.
fn write_staged(
    connection: &Connection,
    table: &str,
    staging: &str,
    rows: &[VendorSalesSummary],
) -> Result<(), ::duckdb::Error> {
    connection.execute_batch(
        format!(
            "BEGIN TRANSACTION;\n\
             DROP TABLE IF EXISTS {staging};\n\
             CREATE TABLE {staging} (\n\
                 VendorNumber BIGINT,\n\
                 VendorName TEXT,\n\
                 Brand BIGINT,\n\
                 Description TEXT,\n\
                 PurchasePrice DOUBLE,\n\
                 ActualPrice DOUBLE,\n\
                 Volume DOUBLE,\n\
                 TotalPurchaseQuantity BIGINT,\n\
                 TotalPurchaseDollars DOUBLE,\n\
                 TotalSalesQuantity DOUBLE,\n\
                 TotalSalesDollars DOUBLE,\n\
                 TotalSalesPrice DOUBLE,\n\
                 TotalExciseTax DOUBLE,\n\
                 FreightCost DOUBLE,\n\
                 GrossProfit DOUBLE,\n\
                 ProfitMargin DOUBLE,\n\
                 StockTurnover DOUBLE,\n\
                 SalesToPurchaseRatio DOUBLE\n\
             );"
        )
        .as_str(),
    )?;

    let insert_sql = format!(
        "INSERT INTO {staging} VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
    );
    let mut statement = connection.prepare(insert_sql.as_str())?;
    for row in rows {
        let params: [&dyn ToSql; 18] = [
            &row.vendor_number,
            &row.vendor_name,
            &row.brand,
            &row.description,
            &row.purchase_price,
            &row.actual_price,
            &row.volume,
            &row.total_purchase_quantity,
            &row.total_purchase_dollars,
            &row.total_sales_quantity,
            &row.total_sales_dollars,
            &row.total_sales_price,
            &row.total_excise_tax,
            &row.freight_cost,
            &row.gross_profit,
            &row.profit_margin,
            &row.stock_turnover,
            &row.sales_to_purchase_ratio,
        ];
        statement.execute(params.as_slice())?;
    }

    connection.execute_batch(
        format!(
            "DROP TABLE IF EXISTS {table};\n\
             ALTER TABLE {staging} RENAME TO {table};\n\
             COMMIT;"
        )
        .as_str(),
    )
}

fn unavailable(relation: &str, error: &::duckdb::Error) -> DataSourceError {
    DataSourceError::Unavailable {
        relation: relation.to_string(),
        message: error.to_string(),
    }
}

fn read_failed(relation: &str, error: &::duckdb::Error) -> DataSourceError {
    DataSourceError::Read {
        relation: relation.to_string(),
        message: error.to_string(),
    }
}

fn replace_failed(table: &str, error: &::duckdb::Error) -> SinkWriteError {
    SinkWriteError::Replace {
        table: table.to_string(),
        message: error.to_string(),
    }
}

/// A bare SQL identifier: ASCII letter or underscore, then alphanumerics.
fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
}

/// Convert a path to a SQL-compatible string (forward slashes).
fn path_to_sql(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Escape a string for inclusion in single quotes. Only used for file
/// paths from our own directory scans; row data always goes through
/// parameters.
fn escape_sql_string(value: &str) -> String {
    value.replace('\'', "''")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;
    use vendora_core::SUMMARY_TABLE;

    fn open_warehouse(home: &Path) -> Warehouse {
        Warehouse::open(WarehouseConfig::with_home(home.to_path_buf())).expect("warehouse open")
    }

    fn summary_row(vendor: i64, dollars: f64) -> VendorSalesSummary {
        VendorSalesSummary {
            vendor_number: vendor,
            vendor_name: format!("Vendor {vendor}"),
            brand: 1,
            description: "Test".to_string(),
            purchase_price: 10.0,
            actual_price: 12.0,
            volume: 750.0,
            total_purchase_quantity: 10,
            total_purchase_dollars: dollars,
            total_sales_quantity: 8.0,
            total_sales_dollars: 200.0,
            total_sales_price: 25.0,
            total_excise_tax: 5.0,
            freight_cost: 20.0,
            gross_profit: 200.0 - dollars,
            profit_margin: (200.0 - dollars) / 200.0 * 100.0,
            stock_turnover: 0.8,
            sales_to_purchase_ratio: 200.0 / dollars,
        }
    }

    #[test]
    fn open_creates_fact_tables() {
        let temp = tempdir().expect("tempdir");
        let warehouse = open_warehouse(temp.path());

        let connection = Connection::open(warehouse.db_path()).expect("open");
        let count: i64 = connection
            .query_row(
                "SELECT COUNT(*) FROM information_schema.tables \
                 WHERE table_name IN ('purchases', 'purchase_prices', 'sales', 'vendor_invoice')",
                [],
                |row| row.get(0),
            )
            .expect("count");
        assert_eq!(count, 4);
    }

    #[test]
    fn load_csv_replaces_instead_of_appending() {
        let temp = tempdir().expect("tempdir");
        let warehouse = open_warehouse(temp.path());

        let csv_path = temp.path().join("vendor_invoice.csv");
        fs::write(&csv_path, "VendorNumber,Freight\n101,20.0\n102,1.5\n").expect("write csv");

        let first = warehouse
            .load_csv("vendor_invoice", csv_path.as_path())
            .expect("first load");
        let second = warehouse
            .load_csv("vendor_invoice", csv_path.as_path())
            .expect("second load");
        assert_eq!(first, 2);
        assert_eq!(second, 2);
    }

    #[test]
    fn load_csv_dir_skips_non_csv_files() {
        let temp = tempdir().expect("tempdir");
        let warehouse = open_warehouse(temp.path());

        let data_dir = temp.path().join("raw");
        fs::create_dir_all(&data_dir).expect("mkdir");
        fs::write(data_dir.join("vendor_invoice.csv"), "VendorNumber,Freight\n101,20.0\n")
            .expect("write csv");
        fs::write(data_dir.join("notes.txt"), "not data").expect("write txt");

        let report = warehouse.load_csv_dir(data_dir.as_path()).expect("ingest");
        assert_eq!(report.scanned_files, 2);
        assert_eq!(report.loaded_tables, 1);
        assert_eq!(report.skipped_files, 1);
        assert_eq!(report.total_rows, 1);
    }

    #[test]
    fn replace_table_swaps_without_leaving_staging() {
        let temp = tempdir().expect("tempdir");
        let warehouse = open_warehouse(temp.path());

        let rows = vec![summary_row(101, 150.0), summary_row(102, 50.0)];
        warehouse
            .replace_table(SUMMARY_TABLE, rows.as_slice())
            .expect("first replace");
        warehouse
            .replace_table(SUMMARY_TABLE, rows.as_slice())
            .expect("second replace");

        let connection = Connection::open(warehouse.db_path()).expect("open");
        let count: i64 = connection
            .query_row("SELECT COUNT(*) FROM vendor_sales_summary", [], |row| row.get(0))
            .expect("count");
        assert_eq!(count, 2);

        let staging: i64 = connection
            .query_row(
                "SELECT COUNT(*) FROM information_schema.tables \
                 WHERE table_name LIKE '%__staging'",
                [],
                |row| row.get(0),
            )
            .expect("staging count");
        assert_eq!(staging, 0);
    }

    #[test]
    fn replace_table_rejects_hostile_table_names() {
        let temp = tempdir().expect("tempdir");
        let warehouse = open_warehouse(temp.path());

        let error = warehouse
            .replace_table("summary; DROP TABLE purchases; --", &[])
            .expect_err("should reject");
        assert!(matches!(error, SinkWriteError::InvalidTableName { .. }));
    }

    #[test]
    fn missing_relation_surfaces_data_source_error() {
        let temp = tempdir().expect("tempdir");
        let warehouse = open_warehouse(temp.path());

        {
            let connection = Connection::open(warehouse.db_path()).expect("open");
            connection
                .execute_batch("DROP TABLE purchases")
                .expect("drop");
        }

        let error = warehouse.purchase_facts().expect_err("should fail");
        assert!(matches!(error, DataSourceError::Unavailable { .. }));
    }

    #[test]
    fn missing_join_key_surfaces_missing_column() {
        let temp = tempdir().expect("tempdir");
        let warehouse = open_warehouse(temp.path());

        {
            let connection = Connection::open(warehouse.db_path()).expect("open");
            connection
                .execute_batch("CREATE OR REPLACE TABLE sales AS SELECT 101 AS VendorNo")
                .expect("replace");
        }

        let error = warehouse.sales_facts().expect_err("should fail");
        assert!(matches!(
            error,
            DataSourceError::MissingColumn { ref column, .. } if column == "Brand"
        ));
    }

    #[test]
    fn non_finite_ratios_round_trip_through_the_sink() {
        let temp = tempdir().expect("tempdir");
        let warehouse = open_warehouse(temp.path());

        let mut row = summary_row(102, 150.0);
        row.total_sales_dollars = 0.0;
        row.gross_profit = -150.0;
        row.profit_margin = f64::NEG_INFINITY;
        row.stock_turnover = 0.0;
        row.sales_to_purchase_ratio = 0.0;
        warehouse
            .replace_table(SUMMARY_TABLE, &[row])
            .expect("replace");

        let connection = Connection::open(warehouse.db_path()).expect("open");
        let margin: f64 = connection
            .query_row(
                "SELECT ProfitMargin FROM vendor_sales_summary WHERE VendorNumber = 102",
                [],
                |row| row.get(0),
            )
            .expect("margin");
        assert!(margin.is_infinite() && margin < 0.0);
    }
}
