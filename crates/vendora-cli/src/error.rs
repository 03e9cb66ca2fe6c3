use thiserror::Error;

use vendora_core::{ConfigError, DataSourceError, PipelineError, SinkWriteError};
use vendora_warehouse::WarehouseError;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    DataSource(#[from] DataSourceError),

    #[error(transparent)]
    Sink(#[from] SinkWriteError),

    #[error(transparent)]
    Warehouse(#[from] WarehouseError),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<PipelineError> for CliError {
    fn from(error: PipelineError) -> Self {
        match error {
            PipelineError::Config(inner) => Self::Config(inner),
            PipelineError::DataSource(inner) => Self::DataSource(inner),
            PipelineError::Sink(inner) => Self::Sink(inner),
        }
    }
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Warehouse(WarehouseError::Config(_)) => 2,
            Self::DataSource(_) => 3,
            Self::Sink(_) => 4,
            Self::Warehouse(_) | Self::Serialization(_) | Self::Io(_) => 10,
        }
    }
}
