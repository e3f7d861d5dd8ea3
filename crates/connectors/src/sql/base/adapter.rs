use crate::sql::base::{error::DbError, statement::PreparedQuery};
use async_trait::async_trait;
use model::records::row::RowData;
use std::{fmt, future::Future, str::FromStr, time::Duration};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseKind {
    MySql,
    Postgres,
}

impl FromStr for DatabaseKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(DatabaseKind::MySql),
            "postgres" | "postgresql" | "pg" => Ok(DatabaseKind::Postgres),
            other => Err(format!("unsupported database kind '{other}'")),
        }
    }
}

impl fmt::Display for DatabaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseKind::MySql => f.write_str("mysql"),
            DatabaseKind::Postgres => f.write_str("postgres"),
        }
    }
}

/// An open, read-only database session.
#[async_trait]
pub trait SqlAdapter: Send + Sync {
    /// Executes a fully bound statement and drains every row.
    async fn query(&self, query: &PreparedQuery) -> Result<Vec<RowData>, DbError>;

    /// Releases the session. Later queries fail with [`DbError::Closed`].
    async fn close(&self) -> Result<(), DbError>;
}

/// Runs `fut`, failing with `on_timeout` when `limit` elapses first.
pub(crate) async fn with_timeout<F, T, E>(
    limit: Option<Duration>,
    fut: F,
    on_timeout: impl FnOnce(Duration) -> E,
) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
{
    match limit {
        Some(limit) => match tokio::time::timeout(limit, fut).await {
            Ok(result) => result,
            Err(_) => Err(on_timeout(limit)),
        },
        None => fut.await,
    }
}
