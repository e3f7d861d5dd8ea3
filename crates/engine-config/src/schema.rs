//! Class and attribute names of the configuration tree.
//!
//! Defaults match the SQL data source classes; every name can be overridden
//! from the tree document's `schema` section.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Schema {
    pub classes: ClassNames,
    pub source: SourceAttributes,
    pub channel: ChannelAttributes,
    pub data_point: DataPointAttributes,
    pub variable: VariableAttributes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassNames {
    pub source: String,
    pub channel_directory: String,
    pub channel: String,
    pub data_point_directory: String,
    pub data_point: String,
    pub variable_directory: String,
    pub variable: String,
}

impl Default for ClassNames {
    fn default() -> Self {
        ClassNames {
            source: "SQL Server".into(),
            channel_directory: "SQL Channel Directory".into(),
            channel: "SQL Channel".into(),
            data_point_directory: "SQL Data Point Directory".into(),
            data_point: "SQL Data Point".into(),
            variable_directory: "SQL Variable Directory".into(),
            variable: "SQL Variable".into(),
        }
    }
}

impl ClassNames {
    pub fn all(&self) -> Vec<String> {
        vec![
            self.source.clone(),
            self.channel_directory.clone(),
            self.channel.clone(),
            self.data_point_directory.clone(),
            self.data_point.clone(),
            self.variable_directory.clone(),
            self.variable.clone(),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceAttributes {
    pub host: String,
    pub port: String,
    pub schema: String,
    pub user: String,
    pub password: String,
    pub connection_timeout: String,
    pub read_timeout: String,
    pub timezone: String,
    pub enabled: String,
}

impl Default for SourceAttributes {
    fn default() -> Self {
        SourceAttributes {
            host: "Host".into(),
            port: "Port".into(),
            schema: "Schema".into(),
            user: "User".into(),
            password: "Password".into(),
            connection_timeout: "Connection Timeout".into(),
            read_timeout: "Read Timeout".into(),
            timezone: "Timezone".into(),
            enabled: "Enable".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelAttributes {
    pub table: String,
    pub id_column: String,
    pub timestamp_column: String,
    pub timestamp_format: String,
    pub value_column: String,
    pub query: String,
    pub last_readout: String,
}

impl Default for ChannelAttributes {
    fn default() -> Self {
        ChannelAttributes {
            table: "Table".into(),
            id_column: "Column ID".into(),
            timestamp_column: "Column Timestamp".into(),
            timestamp_format: "Timestamp Format".into(),
            value_column: "Column Value".into(),
            query: "Query".into(),
            last_readout: "Last Readout".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataPointAttributes {
    pub id: String,
    pub target: String,
    pub target_attribute: String,
    pub timestamp_column: String,
    pub value_column: String,
    pub timestamp_type: String,
    pub value_type: String,
}

impl Default for DataPointAttributes {
    fn default() -> Self {
        DataPointAttributes {
            id: "ID".into(),
            target: "Target".into(),
            target_attribute: "Target Attribute".into(),
            timestamp_column: "Timestamp Column".into(),
            value_column: "Value Column".into(),
            timestamp_type: "Timestamp Type".into(),
            value_type: "Value Type".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VariableAttributes {
    pub variable_type: String,
    pub position: String,
    pub condition: String,
}

impl Default for VariableAttributes {
    fn default() -> Self {
        VariableAttributes {
            variable_type: "Variable Type".into(),
            position: "Position".into(),
            condition: "Condition".into(),
        }
    }
}

/// Leaf node kinds the walker can discover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Channel,
    DataPoint,
    Variable,
}

impl NodeKind {
    pub fn directory_class<'a>(&self, classes: &'a ClassNames) -> &'a str {
        match self {
            NodeKind::Channel => &classes.channel_directory,
            NodeKind::DataPoint => &classes.data_point_directory,
            NodeKind::Variable => &classes.variable_directory,
        }
    }

    pub fn leaf_class<'a>(&self, classes: &'a ClassNames) -> &'a str {
        match self {
            NodeKind::Channel => &classes.channel,
            NodeKind::DataPoint => &classes.data_point,
            NodeKind::Variable => &classes.variable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_override_keeps_defaults() {
        let schema: Schema =
            serde_json::from_str(r#"{ "classes": { "channel": "MySQL Channel" } }"#).unwrap();
        assert_eq!(schema.classes.channel, "MySQL Channel");
        assert_eq!(schema.classes.channel_directory, "SQL Channel Directory");
        assert_eq!(schema.channel.last_readout, "Last Readout");
    }
}
