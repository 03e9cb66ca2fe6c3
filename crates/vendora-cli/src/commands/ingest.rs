use std::path::Path;

use vendora_warehouse::{Warehouse, WarehouseConfig};

use crate::error::CliError;

pub fn run(config: WarehouseConfig, dir: &Path) -> Result<(), CliError> {
    let warehouse = Warehouse::open(config)?;
    let report = warehouse.load_csv_dir(dir)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
