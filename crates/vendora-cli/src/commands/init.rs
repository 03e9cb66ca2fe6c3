use vendora_warehouse::{Warehouse, WarehouseConfig};

use crate::error::CliError;

pub fn run(config: WarehouseConfig) -> Result<(), CliError> {
    let warehouse = Warehouse::open(config)?;
    println!("{}", warehouse.db_path().display());
    Ok(())
}
