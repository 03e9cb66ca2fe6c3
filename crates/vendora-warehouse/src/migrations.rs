use ::duckdb::Connection;

struct Migration {
    version: &'static str,
    sql: &'static str,
}

// Fact table columns keep the raw dataset's names; `vendora ingest`
// replaces these tables wholesale with whatever read_csv_auto infers, so
// the typed definitions here only guarantee a fresh warehouse is queryable
// before the first load.
const MIGRATIONS: &[Migration] = &[
    Migration {
        version: "0001_fact_tables",
        sql: r#"
CREATE TABLE IF NOT EXISTS purchases (
    VendorNumber BIGINT,
    VendorName TEXT,
    Brand BIGINT,
    Description TEXT,
    PurchasePrice DOUBLE,
    Quantity BIGINT,
    Dollars DOUBLE
);

CREATE TABLE IF NOT EXISTS purchase_prices (
    Brand BIGINT,
    Price DOUBLE,
    Volume TEXT
);

CREATE TABLE IF NOT EXISTS sales (
    VendorNo BIGINT,
    Brand BIGINT,
    SalesQuantity DOUBLE,
    SalesDollars DOUBLE,
    SalesPrice DOUBLE,
    ExciseTax DOUBLE
);

CREATE TABLE IF NOT EXISTS vendor_invoice (
    VendorNumber BIGINT,
    Freight DOUBLE
);
"#,
    },
    Migration {
        version: "0002_ingest_log",
        sql: r#"
CREATE TABLE IF NOT EXISTS ingest_log (
    run_id TEXT NOT NULL,
    table_name TEXT NOT NULL,
    row_count BIGINT NOT NULL,
    status TEXT NOT NULL,
    timestamp TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);
"#,
    },
];

pub fn apply_migrations(connection: &Connection) -> Result<(), ::duckdb::Error> {
    connection.execute_batch(
        r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version TEXT PRIMARY KEY,
    applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);
"#,
    )?;

    for migration in MIGRATIONS {
        let query = format!(
            "SELECT COUNT(*) FROM schema_migrations WHERE version = '{}'",
            escape_sql_string(migration.version)
        );
        let applied_count: i64 = connection.query_row(query.as_str(), [], |row| row.get(0))?;

        if applied_count == 0 {
            connection.execute_batch(migration.sql)?;
            let insert = format!(
                "INSERT INTO schema_migrations (version) VALUES ('{}')",
                escape_sql_string(migration.version)
            );
            connection.execute_batch(insert.as_str())?;
        }
    }

    Ok(())
}

fn escape_sql_string(value: &str) -> String {
    value.replace('\'', "''")
}
