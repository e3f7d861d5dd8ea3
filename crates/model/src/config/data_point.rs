use crate::{
    config::{
        NodeId,
        channel::{ChannelConfig, ChannelQuery},
    },
    core::data_type::{TimestampType, ValueType},
};
use thiserror::Error;

pub const DEFAULT_TARGET_ATTRIBUTE: &str = "Value";

/// Mapping of result columns onto an attribute of a target object.
///
/// Column and type fields are optional; missing ones are inherited from the
/// channel when it is column-mapped (see [`DataPointConfig::resolve`]).
#[derive(Debug, Clone, PartialEq)]
pub struct DataPointConfig {
    pub node: NodeId,
    pub name: String,
    /// Value matched against the channel's id column.
    pub source_id: Option<String>,
    pub target_id: i64,
    pub target_attribute: String,
    pub timestamp_column: Option<String>,
    pub value_column: Option<String>,
    pub timestamp_type: Option<TimestampType>,
    pub value_type: ValueType,
}

/// A data point with every column and type resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    pub node: NodeId,
    pub name: String,
    pub source_id: Option<String>,
    pub target_id: i64,
    pub target_attribute: String,
    pub timestamp_column: String,
    pub value_column: String,
    pub timestamp_type: TimestampType,
    pub value_type: ValueType,
}

#[derive(Debug, Error, Clone, PartialEq)]
#[error("Data point '{data_point}' has no {field} and its channel provides none")]
pub struct UnresolvedTarget {
    pub data_point: String,
    pub field: &'static str,
}

impl DataPointConfig {
    pub fn new(node: NodeId, name: &str, target_id: i64) -> Self {
        DataPointConfig {
            node,
            name: name.to_string(),
            source_id: None,
            target_id,
            target_attribute: DEFAULT_TARGET_ATTRIBUTE.to_string(),
            timestamp_column: None,
            value_column: None,
            timestamp_type: None,
            value_type: ValueType::default(),
        }
    }

    /// Fills in missing columns and the timestamp type from a column-mapped
    /// channel. Templated channels provide no defaults.
    pub fn resolve(&self, channel: &ChannelConfig) -> Result<Target, UnresolvedTarget> {
        let table = match &channel.query {
            ChannelQuery::Table(table) => Some(table),
            ChannelQuery::Template(_) => None,
        };

        let missing = |field| UnresolvedTarget {
            data_point: self.name.clone(),
            field,
        };

        let timestamp_column = self
            .timestamp_column
            .clone()
            .or_else(|| table.map(|t| t.timestamp_column.clone()))
            .ok_or_else(|| missing("timestamp column"))?;

        let value_column = self
            .value_column
            .clone()
            .or_else(|| table.map(|t| t.value_column.clone()))
            .ok_or_else(|| missing("value column"))?;

        let timestamp_type = self
            .timestamp_type
            .clone()
            .or_else(|| table.map(|t| TimestampType::Pattern(t.timestamp_format.clone())))
            .ok_or_else(|| missing("timestamp type"))?;

        Ok(Target {
            node: self.node,
            name: self.name.clone(),
            source_id: self.source_id.clone(),
            target_id: self.target_id,
            target_attribute: self.target_attribute.clone(),
            timestamp_column,
            value_column,
            timestamp_type,
            value_type: self.value_type.clone(),
        })
    }
}
