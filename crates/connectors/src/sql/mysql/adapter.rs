use crate::sql::{
    base::{
        adapter::{SqlAdapter, with_timeout},
        dialect,
        error::{ConnectorError, DbError},
        row::DbRow,
        statement::PreparedQuery,
    },
    mysql::params::MySqlParamStore,
};
use async_trait::async_trait;
use model::{config::source::SourceConfig, records::row::RowData};
use mysql_async::{Conn, OptsBuilder, Row, prelude::Queryable};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info};

const READ_ONLY_SESSION_SQL: &str = "SET SESSION TRANSACTION READ ONLY";

/// A single MySQL connection owned by one polling run.
pub struct MySqlAdapter {
    conn: Mutex<Option<Conn>>,
    read_timeout: Option<Duration>,
    dialect: dialect::MySql,
}

impl MySqlAdapter {
    pub async fn connect(source: &SourceConfig) -> Result<Self, ConnectorError> {
        let opts = OptsBuilder::default()
            .ip_or_hostname(source.host.clone())
            .tcp_port(source.port)
            .db_name(Some(source.schema.clone()))
            .user(Some(source.user.clone()).filter(|u| !u.is_empty()))
            .pass(Some(source.password.clone()).filter(|p| !p.is_empty()))
            .init(vec![READ_ONLY_SESSION_SQL]);

        let conn = with_timeout(
            source.connection_timeout,
            async { Ok::<_, ConnectorError>(Conn::new(opts).await?) },
            ConnectorError::Timeout,
        )
        .await?;

        info!(host = %source.host, schema = %source.schema, "Connected to MySQL");

        Ok(MySqlAdapter {
            conn: Mutex::new(Some(conn)),
            read_timeout: source.read_timeout,
            dialect: dialect::MySql,
        })
    }
}

#[async_trait]
impl SqlAdapter for MySqlAdapter {
    async fn query(&self, query: &PreparedQuery) -> Result<Vec<RowData>, DbError> {
        let params = MySqlParamStore::from_values(&query.params()?);
        let sql = query.render(&self.dialect);
        debug!(%sql, "Executing MySQL query");

        let mut guard = self.conn.lock().await;
        let conn = guard.as_mut().ok_or(DbError::Closed)?;

        let rows: Vec<Row> = with_timeout(
            self.read_timeout,
            async {
                Ok::<_, DbError>(conn.exec::<Row, _, _>(sql.as_str(), params.params()).await?)
            },
            DbError::Timeout,
        )
        .await?;

        Ok(rows
            .iter()
            .map(|row| DbRow::MySqlRow(row).to_row_data())
            .collect())
    }

    async fn close(&self) -> Result<(), DbError> {
        if let Some(conn) = self.conn.lock().await.take() {
            conn.disconnect().await?;
            info!("MySQL connection closed");
        }
        Ok(())
    }
}
