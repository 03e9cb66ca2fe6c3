use vendora_core::pipeline;
use vendora_warehouse::{Warehouse, WarehouseConfig};

use crate::error::CliError;

pub fn run(config: WarehouseConfig) -> Result<(), CliError> {
    let warehouse = Warehouse::open(config)?;
    let report = pipeline::run(&warehouse, &warehouse)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
