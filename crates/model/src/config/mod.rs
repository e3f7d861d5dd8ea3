use serde::{Deserialize, Serialize};
use std::fmt;

pub mod channel;
pub mod data_point;
pub mod source;
pub mod variable;

/// Identifier of a node in the configuration tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
