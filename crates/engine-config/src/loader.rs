use crate::{error::ConfigError, resolver::ConfigResolver, schema::Schema, store::ConfigStore};
use chrono_tz::Tz;
use model::{
    config::{
        NodeId,
        channel::{ChannelConfig, ChannelQuery, TableQuery},
        data_point::{DEFAULT_TARGET_ATTRIBUTE, DataPointConfig},
        source::SourceConfig,
        variable::{Condition, VariableConfig},
    },
    core::{
        data_type::{TimestampType, ValueType},
        pattern::{TimestampPattern, parse_timezone},
        watermark::Watermark,
    },
};
use std::{sync::Arc, time::Duration};

/// Builds typed connector configuration from tree nodes, using the attribute
/// names of a [`Schema`].
#[derive(Clone)]
pub struct ConfigLoader {
    resolver: ConfigResolver,
    schema: Schema,
}

impl ConfigLoader {
    pub fn new(store: Arc<dyn ConfigStore>, schema: Schema) -> Self {
        ConfigLoader {
            resolver: ConfigResolver::new(store),
            schema,
        }
    }

    pub async fn load_source(&self, node: NodeId) -> Result<SourceConfig, ConfigError> {
        let attrs = &self.schema.source;
        let r = &self.resolver;

        let name = r.store().node_name(node).await?;
        let host = r.string(node, &attrs.host).await?;
        let port = r.integer(node, &attrs.port).await?;
        let port = u16::try_from(port)
            .map_err(|_| ConfigError::invalid(node, &attrs.port, &port.to_string(), "port out of range"))?;
        let schema = r.string(node, &attrs.schema).await?;

        let mut source = SourceConfig::new(&name, &host, port, &schema);
        source.user = r.opt_string(node, &attrs.user).await?.unwrap_or_default();
        source.password = r.opt_string(node, &attrs.password).await?.unwrap_or_default();
        source.connection_timeout = self.seconds(node, &attrs.connection_timeout).await?;
        source.read_timeout = self.seconds(node, &attrs.read_timeout).await?;
        source.enabled = r.opt_boolean(node, &attrs.enabled).await?.unwrap_or(true);

        if let Some(zone) = r.opt_string(node, &attrs.timezone).await? {
            source.timezone = parse_timezone(&zone)
                .map_err(|e| ConfigError::invalid(node, &attrs.timezone, &zone, e))?;
        }

        Ok(source)
    }

    /// Loads a channel. A non-empty query attribute makes it templated,
    /// otherwise the table and its columns are required.
    pub async fn load_channel(&self, node: NodeId, tz: Tz) -> Result<ChannelConfig, ConfigError> {
        let attrs = &self.schema.channel;
        let r = &self.resolver;

        let name = r.store().node_name(node).await?;

        let query = match r.opt_string(node, &attrs.query).await? {
            Some(sql) => ChannelQuery::Template(sql),
            None => {
                let timestamp_format = match r.opt_string(node, &attrs.timestamp_format).await? {
                    Some(pattern) => TimestampPattern::new(&pattern).map_err(|e| {
                        ConfigError::invalid(node, &attrs.timestamp_format, &pattern, e)
                    })?,
                    None => TimestampPattern::sql_timestamp(),
                };

                ChannelQuery::Table(TableQuery {
                    table: r.string(node, &attrs.table).await?,
                    id_column: r.opt_string(node, &attrs.id_column).await?,
                    timestamp_column: r.string(node, &attrs.timestamp_column).await?,
                    value_column: r.string(node, &attrs.value_column).await?,
                    timestamp_format,
                })
            }
        };

        let watermark = match r.opt_string(node, &attrs.last_readout).await? {
            Some(sample) => Watermark::from_sample(&sample, tz)
                .map_err(|e| ConfigError::invalid(node, &attrs.last_readout, &sample, e))?,
            None => Watermark::epoch(),
        };

        Ok(ChannelConfig {
            node,
            name,
            query,
            watermark,
        })
    }

    pub async fn load_data_point(&self, node: NodeId) -> Result<DataPointConfig, ConfigError> {
        let attrs = &self.schema.data_point;
        let r = &self.resolver;

        let name = r.store().node_name(node).await?;
        let target_id = r.integer(node, &attrs.target).await?;

        let mut point = DataPointConfig::new(node, &name, target_id);
        point.source_id = r.opt_string(node, &attrs.id).await?;
        point.target_attribute = r
            .opt_string(node, &attrs.target_attribute)
            .await?
            .unwrap_or_else(|| DEFAULT_TARGET_ATTRIBUTE.to_string());
        point.timestamp_column = r.opt_string(node, &attrs.timestamp_column).await?;
        point.value_column = r.opt_string(node, &attrs.value_column).await?;

        if let Some(tag) = r.opt_string(node, &attrs.timestamp_type).await? {
            let timestamp_type = TimestampType::from_tag(&tag)
                .map_err(|e| ConfigError::invalid(node, &attrs.timestamp_type, &tag, e))?;
            point.timestamp_type = Some(timestamp_type);
        }

        // unknown tags are kept and reported when the rows are parsed
        if let Some(tag) = r.opt_string(node, &attrs.value_type).await? {
            point.value_type = ValueType::from_tag(&tag);
        }

        Ok(point)
    }

    pub async fn load_variable(&self, node: NodeId) -> Result<VariableConfig, ConfigError> {
        let attrs = &self.schema.variable;
        let r = &self.resolver;

        let name = r.store().node_name(node).await?;
        let position = r.integer(node, &attrs.position).await?;
        let position = usize::try_from(position)
            .ok()
            .filter(|p| *p >= 1)
            .ok_or_else(|| {
                ConfigError::invalid(node, &attrs.position, &position.to_string(), "positions start at 1")
            })?;

        let value_type = r
            .opt_string(node, &attrs.variable_type)
            .await?
            .map(|tag| ValueType::from_tag(&tag))
            .unwrap_or(ValueType::String);

        // condition text is taken verbatim, a blank literal is still a value
        let condition = r
            .store()
            .attribute(node, &attrs.condition)
            .await?
            .ok_or_else(|| ConfigError::MissingAttribute {
                node,
                attribute: attrs.condition.clone(),
            })?;

        Ok(VariableConfig {
            node,
            name,
            position,
            value_type,
            condition: Condition::from_text(&condition),
        })
    }

    /// Timeout in whole seconds; zero disables it.
    async fn seconds(&self, node: NodeId, attr: &str) -> Result<Option<Duration>, ConfigError> {
        match self.resolver.opt_integer(node, attr).await? {
            None | Some(0) => Ok(None),
            Some(secs) => u64::try_from(secs)
                .map(|s| Some(Duration::from_secs(s)))
                .map_err(|_| ConfigError::invalid(node, attr, &secs.to_string(), "timeout is negative")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;

    fn loader(store: MemoryStore) -> ConfigLoader {
        ConfigLoader::new(Arc::new(store), Schema::default())
    }

    #[tokio::test]
    async fn source_defaults_and_timeouts() {
        let store = MemoryStore::new("plant", "SQL Server");
        let root = store.root();
        for (k, v) in [
            ("Host", "db.local"),
            ("Port", "3306"),
            ("Schema", "metering"),
            ("Connection Timeout", "5"),
            ("Read Timeout", "0"),
            ("Timezone", "Europe/Vienna"),
        ] {
            store.set_attribute(root, k, v).await.unwrap();
        }

        let source = loader(store).load_source(root).await.unwrap();
        assert_eq!(source.name, "plant");
        assert_eq!(source.port, 3306);
        assert_eq!(source.connection_timeout, Some(Duration::from_secs(5)));
        assert_eq!(source.read_timeout, None);
        assert_eq!(source.timezone, chrono_tz::Europe::Vienna);
        assert!(source.enabled);
        assert!(source.user.is_empty());
    }

    #[tokio::test]
    async fn source_rejects_bad_port() {
        let store = MemoryStore::new("plant", "SQL Server");
        let root = store.root();
        for (k, v) in [("Host", "h"), ("Port", "70000"), ("Schema", "s")] {
            store.set_attribute(root, k, v).await.unwrap();
        }
        let err = loader(store).load_source(root).await.unwrap_err();
        assert!(matches!(err, ConfigError::InvalidAttribute { attribute, .. } if attribute == "Port"));
    }

    #[tokio::test]
    async fn table_channel_with_watermark() {
        let store = MemoryStore::new("plant", "SQL Server");
        let ch = store
            .add_node(
                store.root(),
                "readings",
                "SQL Channel",
                [
                    ("Table", "readings"),
                    ("Column Timestamp", "ts"),
                    ("Column Value", "val"),
                    ("Last Readout", "2023-01-01 00:00:00"),
                ],
            )
            .unwrap();

        let channel = loader(store).load_channel(ch, Tz::UTC).await.unwrap();
        let table = channel.table().unwrap();
        assert_eq!(table.table, "readings");
        assert_eq!(table.id_column, None);
        assert_eq!(table.timestamp_format.as_str(), "yyyy-MM-dd HH:mm:ss");
        assert_eq!(channel.watermark.to_sample(Tz::UTC), "2023-01-01 00:00:00");
    }

    #[tokio::test]
    async fn query_attribute_selects_template() {
        let store = MemoryStore::new("plant", "SQL Server");
        let ch = store
            .add_node(
                store.root(),
                "custom",
                "SQL Channel",
                [("Query", "select ts, v from t where ts > ?")],
            )
            .unwrap();

        let channel = loader(store).load_channel(ch, Tz::UTC).await.unwrap();
        assert!(channel.is_templated());
        assert!(channel.watermark.is_epoch());
    }

    #[tokio::test]
    async fn table_channel_requires_columns() {
        let store = MemoryStore::new("plant", "SQL Server");
        let ch = store
            .add_node(store.root(), "broken", "SQL Channel", [("Table", "t")])
            .unwrap();
        let err = loader(store).load_channel(ch, Tz::UTC).await.unwrap_err();
        assert!(matches!(err, ConfigError::MissingAttribute { .. }));
    }

    #[tokio::test]
    async fn data_point_and_variable() {
        let store = MemoryStore::new("plant", "SQL Server");
        let dp = store
            .add_node(
                store.root(),
                "meter 1",
                "SQL Data Point",
                [("Target", "42"), ("ID", "m1"), ("Value Type", "LONG")],
            )
            .unwrap();
        let var = store
            .add_node(
                store.root(),
                "since",
                "SQL Variable",
                [("Position", "1"), ("Variable Type", "timestamp"), ("Condition", "LastReadout")],
            )
            .unwrap();
        let bad = store
            .add_node(
                store.root(),
                "zero",
                "SQL Variable",
                [("Position", "0"), ("Condition", "x")],
            )
            .unwrap();

        let loader = loader(store);
        let point = loader.load_data_point(dp).await.unwrap();
        assert_eq!(point.target_id, 42);
        assert_eq!(point.source_id.as_deref(), Some("m1"));
        assert_eq!(point.target_attribute, "Value");
        assert_eq!(point.value_type, ValueType::Long);
        assert_eq!(point.timestamp_type, None);

        let variable = loader.load_variable(var).await.unwrap();
        assert_eq!(variable.position, 1);
        assert_eq!(variable.value_type, ValueType::Timestamp);
        assert_eq!(variable.condition, Condition::LastReadout);

        assert!(loader.load_variable(bad).await.is_err());
    }
}
