use thiserror::Error;

/// Configuration problems detected before any query runs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("no home directory available; set VENDORA_HOME")]
    MissingHome,

    #[error("invalid value for {name}: '{value}'")]
    InvalidValue { name: &'static str, value: String },
}

/// The aggregation query cannot execute against a base relation.
#[derive(Debug, Error)]
pub enum DataSourceError {
    #[error("relation '{relation}' is unavailable: {message}")]
    Unavailable { relation: String, message: String },

    #[error("relation '{relation}' is missing column '{column}'")]
    MissingColumn { relation: String, column: String },

    #[error("reading relation '{relation}' failed: {message}")]
    Read { relation: String, message: String },
}

/// The replace-table write failed.
///
/// The sink writes to a staging table and swaps it in atomically, so the
/// previous contents of the destination survive a failed write.
#[derive(Debug, Error)]
pub enum SinkWriteError {
    #[error("'{table}' is not a valid table identifier")]
    InvalidTableName { table: String },

    #[error("replacing table '{table}' failed: {message}")]
    Replace { table: String, message: String },
}

/// Top-level error union for a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    DataSource(#[from] DataSourceError),

    #[error(transparent)]
    Sink(#[from] SinkWriteError),
}
