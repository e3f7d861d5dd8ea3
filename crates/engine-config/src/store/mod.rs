use async_trait::async_trait;
use model::config::NodeId;
use thiserror::Error;

pub mod memory;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum StoreError {
    #[error("Unknown node: {0}")]
    UnknownNode(NodeId),

    /// The store has no definition for the requested class.
    #[error("Unknown class: {0}")]
    UnknownClass(String),

    #[error("Store backend error: {0}")]
    Backend(String),
}

/// Hierarchical configuration store the connector reads from and writes
/// watermarks back to.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    async fn node_name(&self, node: NodeId) -> Result<String, StoreError>;

    /// Direct children of `node` whose class is `class`.
    async fn children(&self, node: NodeId, class: &str) -> Result<Vec<NodeId>, StoreError>;

    /// Latest value of an attribute, `None` when it has no value.
    async fn attribute(&self, node: NodeId, name: &str) -> Result<Option<String>, StoreError>;

    async fn set_attribute(&self, node: NodeId, name: &str, value: &str)
    -> Result<(), StoreError>;
}
