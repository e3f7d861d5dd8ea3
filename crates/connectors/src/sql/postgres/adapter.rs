use crate::sql::{
    base::{
        adapter::{SqlAdapter, with_timeout},
        dialect,
        error::{ConnectorError, DbError},
        row::DbRow,
        statement::PreparedQuery,
    },
    postgres::{
        params::PgParamStore,
        utils::{client_config, connect_client},
    },
};
use async_trait::async_trait;
use chrono_tz::Tz;
use model::{config::source::SourceConfig, records::row::RowData};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio_postgres::Client;
use tracing::{debug, info};

pub struct PgAdapter {
    client: RwLock<Option<Client>>,
    read_timeout: Option<Duration>,
    timezone: Tz,
    dialect: dialect::Postgres,
}

impl PgAdapter {
    pub async fn connect(source: &SourceConfig) -> Result<Self, ConnectorError> {
        let config = client_config(source);
        let client = with_timeout(
            source.connection_timeout,
            connect_client(config),
            ConnectorError::Timeout,
        )
        .await?;

        info!(host = %source.host, database = %source.schema, "Connected to Postgres");

        Ok(PgAdapter {
            client: RwLock::new(Some(client)),
            read_timeout: source.read_timeout,
            timezone: source.timezone,
            dialect: dialect::Postgres,
        })
    }
}

#[async_trait]
impl SqlAdapter for PgAdapter {
    async fn query(&self, query: &PreparedQuery) -> Result<Vec<RowData>, DbError> {
        let values = query.params()?;
        let sql = query.render(&self.dialect);
        debug!(%sql, "Executing Postgres query");

        let guard = self.client.read().await;
        let client = guard.as_ref().ok_or(DbError::Closed)?;

        let rows = with_timeout(
            self.read_timeout,
            async {
                // the server infers a type per placeholder, values are converted to it
                let statement = client.prepare(sql.as_str()).await?;
                let bindings = PgParamStore::coerce(values, statement.params(), self.timezone)?;
                Ok::<_, DbError>(client.query(&statement, &bindings.as_refs()).await?)
            },
            DbError::Timeout,
        )
        .await?;

        Ok(rows
            .iter()
            .map(|row| DbRow::PostgresRow(row).to_row_data())
            .collect())
    }

    async fn close(&self) -> Result<(), DbError> {
        // dropping the client ends the spawned connection task
        if self.client.write().await.take().is_some() {
            info!("Postgres connection closed");
        }
        Ok(())
    }
}
