use crate::sql::{
    base::{
        adapter::{DatabaseKind, SqlAdapter},
        error::ConnectorError,
    },
    mysql::adapter::MySqlAdapter,
    postgres::adapter::PgAdapter,
};
use async_trait::async_trait;
use model::config::source::SourceConfig;
use tracing::info;

/// Opens database sessions for a source.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, source: &SourceConfig) -> Result<Box<dyn SqlAdapter>, ConnectorError>;
}

/// Connects through the MySQL or PostgreSQL driver.
#[derive(Debug, Clone, Copy)]
pub struct DriverConnector {
    kind: DatabaseKind,
}

impl DriverConnector {
    pub fn new(kind: DatabaseKind) -> Self {
        DriverConnector { kind }
    }
}

#[async_trait]
impl Connector for DriverConnector {
    async fn connect(&self, source: &SourceConfig) -> Result<Box<dyn SqlAdapter>, ConnectorError> {
        info!(url = %connection_url(self.kind, source), "Opening read-only session");
        match self.kind {
            DatabaseKind::MySql => Ok(Box::new(MySqlAdapter::connect(source).await?)),
            DatabaseKind::Postgres => Ok(Box::new(PgAdapter::connect(source).await?)),
        }
    }
}

/// Connection URL of a source with the password masked.
pub fn connection_url(kind: DatabaseKind, source: &SourceConfig) -> String {
    let credentials = match (source.user.is_empty(), source.password.is_empty()) {
        (true, _) => String::new(),
        (false, true) => format!("{}@", source.user),
        (false, false) => format!("{}:***@", source.user),
    };
    format!(
        "{kind}://{credentials}{}:{}/{}",
        source.host, source.port, source.schema
    )
}
