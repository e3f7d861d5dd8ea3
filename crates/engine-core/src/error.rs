use connectors::sql::base::error::{ConnectorError, DbError};
use engine_config::error::ConfigError;
use model::{
    config::data_point::UnresolvedTarget,
    core::error::ValueError,
};
use thiserror::Error;

/// Errors that abort a whole polling run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("Failed to connect to the source database: {0}")]
    Connection(#[from] ConnectorError),

    /// The source node or the channel tree could not be read.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),
}

/// Errors that abort a single channel. The run continues with the next one.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("Configuration error: {0}")]
    UnresolvedTarget(#[from] UnresolvedTarget),

    #[error("Bind error: {0}")]
    Bind(#[from] BindError),

    #[error("Query execution failed: {0}")]
    QueryExecution(#[from] DbError),

    #[error("Import failed: {0}")]
    Import(#[from] ImportError),
}

#[derive(Debug, Error)]
pub enum BindError {
    /// Skipped while binding; the slot stays unbound.
    #[error("Variable '{variable}' has unknown type '{tag}'")]
    UnknownVariableType { variable: String, tag: String },

    #[error("Variable '{variable}' has position {position}, statement has {slots} placeholder(s)")]
    PositionOutOfRange {
        variable: String,
        position: usize,
        slots: usize,
    },

    #[error("Variables '{first}' and '{second}' share position {position}")]
    DuplicatePosition {
        position: usize,
        first: String,
        second: String,
    },

    #[error("Variable '{variable}' cannot be bound: {source}")]
    Value {
        variable: String,
        #[source]
        source: ValueError,
    },

    #[error("Data point '{data_point}' has no ID to match the channel's id column")]
    MissingSourceId { data_point: String },

    #[error(transparent)]
    Statement(#[from] DbError),
}

/// Record-level problems. Logged, never propagated.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    /// The record is still produced, with the raw text as value.
    #[error("Data point '{data_point}' has unknown value type '{tag}'")]
    UnknownValueType { data_point: String, tag: String },

    #[error("Data point '{data_point}': cannot read column '{column}': {reason}")]
    RowParse {
        data_point: String,
        column: String,
        reason: String,
    },
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Importer rejected the batch: {0}")]
    Rejected(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}
