use crate::{error::ConfigError, store::ConfigStore};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use model::{config::NodeId, core::pattern::TimestampPattern};
use std::sync::Arc;

/// Typed attribute reads over a [`ConfigStore`].
///
/// Empty strings count as absent values. Required reads fail with
/// [`ConfigError::MissingAttribute`], unparsable values with
/// [`ConfigError::InvalidAttribute`].
#[derive(Clone)]
pub struct ConfigResolver {
    store: Arc<dyn ConfigStore>,
}

impl ConfigResolver {
    pub fn new(store: Arc<dyn ConfigStore>) -> Self {
        ConfigResolver { store }
    }

    pub fn store(&self) -> &Arc<dyn ConfigStore> {
        &self.store
    }

    pub async fn opt_string(&self, node: NodeId, attr: &str) -> Result<Option<String>, ConfigError> {
        let value = self.store.attribute(node, attr).await?;
        Ok(value.filter(|v| !v.trim().is_empty()))
    }

    pub async fn string(&self, node: NodeId, attr: &str) -> Result<String, ConfigError> {
        self.opt_string(node, attr)
            .await?
            .ok_or_else(|| missing(node, attr))
    }

    pub async fn opt_integer(&self, node: NodeId, attr: &str) -> Result<Option<i64>, ConfigError> {
        match self.opt_string(node, attr).await? {
            Some(text) => parse_integer(node, attr, &text).map(Some),
            None => Ok(None),
        }
    }

    pub async fn integer(&self, node: NodeId, attr: &str) -> Result<i64, ConfigError> {
        self.opt_integer(node, attr)
            .await?
            .ok_or_else(|| missing(node, attr))
    }

    pub async fn opt_boolean(&self, node: NodeId, attr: &str) -> Result<Option<bool>, ConfigError> {
        match self.opt_string(node, attr).await? {
            Some(text) => parse_boolean(node, attr, &text).map(Some),
            None => Ok(None),
        }
    }

    pub async fn boolean(&self, node: NodeId, attr: &str) -> Result<bool, ConfigError> {
        self.opt_boolean(node, attr)
            .await?
            .ok_or_else(|| missing(node, attr))
    }

    pub async fn opt_timestamp(
        &self,
        node: NodeId,
        attr: &str,
        pattern: &TimestampPattern,
        tz: Tz,
    ) -> Result<Option<DateTime<Utc>>, ConfigError> {
        match self.opt_string(node, attr).await? {
            Some(text) => pattern
                .parse(&text, tz)
                .map(Some)
                .map_err(|e| ConfigError::invalid(node, attr, &text, e)),
            None => Ok(None),
        }
    }

    pub async fn timestamp(
        &self,
        node: NodeId,
        attr: &str,
        pattern: &TimestampPattern,
        tz: Tz,
    ) -> Result<DateTime<Utc>, ConfigError> {
        self.opt_timestamp(node, attr, pattern, tz)
            .await?
            .ok_or_else(|| missing(node, attr))
    }
}

fn missing(node: NodeId, attr: &str) -> ConfigError {
    ConfigError::MissingAttribute {
        node,
        attribute: attr.to_string(),
    }
}

fn parse_integer(node: NodeId, attr: &str, text: &str) -> Result<i64, ConfigError> {
    text.trim()
        .parse::<i64>()
        .map_err(|e| ConfigError::invalid(node, attr, text, e))
}

fn parse_boolean(node: NodeId, attr: &str, text: &str) -> Result<bool, ConfigError> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::invalid(node, attr, text, "expected a boolean")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;

    async fn resolver() -> (ConfigResolver, NodeId) {
        let store = MemoryStore::new("root", "SQL Server");
        let root = store.root();
        for (k, v) in [
            ("Port", " 5432 "),
            ("Bad Port", "54x"),
            ("Enable", "Yes"),
            ("Blank", "  "),
            ("Since", "2023-01-01 00:00:00"),
        ] {
            store.set_attribute(root, k, v).await.unwrap();
        }
        (ConfigResolver::new(Arc::new(store)), root)
    }

    #[tokio::test]
    async fn integers_and_booleans() {
        let (r, root) = resolver().await;
        assert_eq!(r.integer(root, "Port").await.unwrap(), 5432);
        assert!(matches!(
            r.integer(root, "Bad Port").await,
            Err(ConfigError::InvalidAttribute { .. })
        ));
        assert!(r.boolean(root, "Enable").await.unwrap());
        assert_eq!(r.opt_boolean(root, "Missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn blank_strings_are_absent() {
        let (r, root) = resolver().await;
        assert_eq!(r.opt_string(root, "Blank").await.unwrap(), None);
        assert!(matches!(
            r.string(root, "Blank").await,
            Err(ConfigError::MissingAttribute { .. })
        ));
    }

    #[tokio::test]
    async fn timestamps_use_pattern_and_zone() {
        let (r, root) = resolver().await;
        let pattern = TimestampPattern::sql_timestamp();
        let ts = r
            .timestamp(root, "Since", &pattern, chrono_tz::Europe::Berlin)
            .await
            .unwrap();
        assert_eq!(ts.to_rfc3339(), "2022-12-31T23:00:00+00:00");
    }
}
