mod ingest;
mod init;
mod summarize;

use vendora_warehouse::WarehouseConfig;

use crate::cli::{Cli, Command};
use crate::error::CliError;

pub fn run(cli: &Cli) -> Result<(), CliError> {
    let config = match cli.home.clone() {
        Some(home) => WarehouseConfig::with_home(home),
        None => WarehouseConfig::from_env()?,
    };

    match &cli.command {
        Command::Init => init::run(config),
        Command::Ingest { dir } => ingest::run(config, dir.as_path()),
        Command::Summarize => summarize::run(config),
    }
}
