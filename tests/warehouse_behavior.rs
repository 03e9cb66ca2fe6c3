//! Behavior tests for warehouse plumbing: CSV ingestion, the audit log,
//! and failure modes of the summary pipeline against a broken store.

use std::fs;

use duckdb::Connection;
use tempfile::tempdir;

use vendora_core::{pipeline, PipelineError};
use vendora_tests::write_fixture_csvs;
use vendora_warehouse::{Warehouse, WarehouseConfig};

#[test]
fn ingest_loads_every_csv_and_records_the_audit_log() {
    let temp = tempdir().expect("tempdir");
    let data_dir = temp.path().join("raw");
    write_fixture_csvs(data_dir.as_path());

    let warehouse =
        Warehouse::open(WarehouseConfig::with_home(temp.path().to_path_buf())).expect("open");
    let report = warehouse.load_csv_dir(data_dir.as_path()).expect("ingest");

    assert_eq!(report.scanned_files, 4);
    assert_eq!(report.loaded_tables, 4);
    assert_eq!(report.skipped_files, 0);
    assert_eq!(report.total_rows, 4 + 3 + 1 + 1);

    let connection = Connection::open(warehouse.db_path()).expect("open db");
    let logged: i64 = connection
        .query_row(
            "SELECT COUNT(*) FROM ingest_log WHERE status = 'replaced'",
            [],
            |row| row.get(0),
        )
        .expect("log count");
    assert_eq!(logged, 4);
}

#[test]
fn reingesting_a_modified_csv_replaces_the_table() {
    let temp = tempdir().expect("tempdir");
    let data_dir = temp.path().join("raw");
    write_fixture_csvs(data_dir.as_path());

    let warehouse =
        Warehouse::open(WarehouseConfig::with_home(temp.path().to_path_buf())).expect("open");
    warehouse.load_csv_dir(data_dir.as_path()).expect("ingest");

    fs::write(
        data_dir.join("vendor_invoice.csv"),
        "VendorNumber,Freight\n101,20.0\n102,3.0\n103,4.5\n",
    )
    .expect("rewrite csv");
    warehouse.load_csv_dir(data_dir.as_path()).expect("reingest");

    let connection = Connection::open(warehouse.db_path()).expect("open db");
    let rows: i64 = connection
        .query_row("SELECT COUNT(*) FROM vendor_invoice", [], |row| row.get(0))
        .expect("count");
    assert_eq!(rows, 3);
}

#[test]
fn a_missing_base_relation_fails_the_run_without_partial_output() {
    let temp = tempdir().expect("tempdir");
    let data_dir = temp.path().join("raw");
    write_fixture_csvs(data_dir.as_path());

    let warehouse =
        Warehouse::open(WarehouseConfig::with_home(temp.path().to_path_buf())).expect("open");
    warehouse.load_csv_dir(data_dir.as_path()).expect("ingest");

    {
        let connection = Connection::open(warehouse.db_path()).expect("open db");
        connection.execute_batch("DROP TABLE sales").expect("drop");
    }

    let error = pipeline::run(&warehouse, &warehouse).expect_err("should fail");
    assert!(matches!(error, PipelineError::DataSource(_)));

    let connection = Connection::open(warehouse.db_path()).expect("open db");
    let summary_tables: i64 = connection
        .query_row(
            "SELECT COUNT(*) FROM information_schema.tables \
             WHERE table_name = 'vendor_sales_summary'",
            [],
            |row| row.get(0),
        )
        .expect("table count");
    assert_eq!(summary_tables, 0);
}

#[test]
fn a_failed_rerun_leaves_the_previous_summary_intact() {
    let temp = tempdir().expect("tempdir");
    let data_dir = temp.path().join("raw");
    write_fixture_csvs(data_dir.as_path());

    let warehouse =
        Warehouse::open(WarehouseConfig::with_home(temp.path().to_path_buf())).expect("open");
    warehouse.load_csv_dir(data_dir.as_path()).expect("ingest");
    pipeline::run(&warehouse, &warehouse).expect("first run");

    {
        let connection = Connection::open(warehouse.db_path()).expect("open db");
        connection
            .execute_batch("DROP TABLE purchases")
            .expect("drop");
    }

    pipeline::run(&warehouse, &warehouse).expect_err("second run fails");

    let connection = Connection::open(warehouse.db_path()).expect("open db");
    let rows: i64 = connection
        .query_row("SELECT COUNT(*) FROM vendor_sales_summary", [], |row| {
            row.get(0)
        })
        .expect("count");
    assert_eq!(rows, 2);
}
