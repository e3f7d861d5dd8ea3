use std::time::Duration;
use thiserror::Error;

/// All errors coming from the database/query layer.
#[derive(Debug, Error)]
pub enum DbError {
    /// MySQL driver error.
    #[error("MySQL error: {0}")]
    MySql(#[from] mysql_async::Error),

    /// PostgreSQL driver error.
    #[error("Postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    /// The query did not complete within the read timeout.
    #[error("Query timed out after {0:?}")]
    Timeout(Duration),

    /// A placeholder of the statement was never bound.
    #[error("Parameter {0} is not bound")]
    UnboundParameter(usize),

    /// Binding to a position the statement does not have.
    #[error("Parameter position {position} is out of range, statement has {slots} placeholder(s)")]
    ParameterOutOfRange { position: usize, slots: usize },

    /// A bound value has no representation in the placeholder's type.
    #[error("Cannot bind {value} to parameter {position} of type {pg_type}")]
    ParameterType {
        position: usize,
        value: String,
        pg_type: String,
    },

    /// The adapter was used after `close`.
    #[error("Connection is closed")]
    Closed,

    #[error("Unknown error: {0}")]
    Unknown(String),
}

/// Errors happening during adapter or connection setup.
#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("MySQL connection failed: {0}")]
    MySql(#[from] mysql_async::Error),

    #[error("Postgres connection failed: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    #[error("TLS setup failed: {0}")]
    Tls(#[from] native_tls::Error),

    #[error("Connection timed out after {0:?}")]
    Timeout(Duration),
}
