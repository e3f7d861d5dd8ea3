use crate::store::StoreError;
use model::config::NodeId;
use thiserror::Error;

/// Errors raised while reading connector configuration from the tree.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required attribute has no value.
    #[error("Node {node} has no value for required attribute '{attribute}'")]
    MissingAttribute { node: NodeId, attribute: String },

    /// An attribute has a value that cannot be converted to its type.
    #[error("Node {node} has an invalid value '{value}' for attribute '{attribute}': {reason}")]
    InvalidAttribute {
        node: NodeId,
        attribute: String,
        value: String,
        reason: String,
    },

    /// Failure reported by the backing store, including unknown classes.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The tree document could not be read or written.
    #[error("Invalid configuration document: {0}")]
    Document(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    pub fn invalid(
        node: NodeId,
        attribute: &str,
        value: &str,
        reason: impl std::fmt::Display,
    ) -> Self {
        ConfigError::InvalidAttribute {
            node,
            attribute: attribute.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}
