use crate::sql::base::error::ConnectorError;
use model::config::source::SourceConfig;
use native_tls::TlsConnector;
use postgres_native_tls::MakeTlsConnector;
use tokio_postgres::{Client, Config, NoTls, config::SslMode};
use tracing::{error, warn};

/// Sessions start with every transaction read-only.
const READ_ONLY_OPTIONS: &str = "-c default_transaction_read_only=on";

pub(crate) fn client_config(source: &SourceConfig) -> Config {
    let mut config = Config::new();
    config
        .host(&source.host)
        .port(source.port)
        .dbname(&source.schema)
        .options(READ_ONLY_OPTIONS)
        .ssl_mode(SslMode::Prefer);

    if !source.user.is_empty() {
        config.user(&source.user);
    }
    if !source.password.is_empty() {
        config.password(&source.password);
    }
    if let Some(timeout) = source.connection_timeout {
        config.connect_timeout(timeout);
    }

    config
}

pub(crate) async fn connect_client(config: Config) -> Result<Client, ConnectorError> {
    match config.get_ssl_mode() {
        SslMode::Disable => connect_without_tls(config).await,
        SslMode::Require => connect_with_tls(config).await,
        SslMode::Prefer => match connect_with_tls(config.clone()).await {
            Ok(client) => Ok(client),
            Err(error) => {
                warn!(%error, "Postgres TLS handshake failed, retrying without TLS");
                connect_without_tls(config).await
            }
        },
        _ => connect_with_tls(config).await,
    }
}

pub(crate) async fn connect_with_tls(config: Config) -> Result<Client, ConnectorError> {
    let connector = TlsConnector::builder().build()?;
    let tls = MakeTlsConnector::new(connector);
    let (client, connection) = config.connect(tls).await?;
    tokio::spawn(async move {
        if let Err(err) = connection.await {
            error!(%err, "Postgres connection error");
        }
    });
    Ok(client)
}

pub(crate) async fn connect_without_tls(config: Config) -> Result<Client, ConnectorError> {
    let (client, connection) = config.connect(NoTls).await?;
    tokio::spawn(async move {
        if let Err(err) = connection.await {
            error!(%err, "Postgres connection error");
        }
    });
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn config_from_source() {
        let mut source = SourceConfig::new("plant", "db.local", 5433, "metering");
        source.user = "reader".into();
        source.connection_timeout = Some(Duration::from_secs(3));

        let config = client_config(&source);
        assert_eq!(config.get_dbname(), Some("metering"));
        assert_eq!(config.get_ports(), &[5433]);
        assert_eq!(config.get_user(), Some("reader"));
        assert!(config.get_password().is_none());
        assert_eq!(config.get_connect_timeout(), Some(&Duration::from_secs(3)));
        assert_eq!(config.get_options(), Some(READ_ONLY_OPTIONS));
    }
}
