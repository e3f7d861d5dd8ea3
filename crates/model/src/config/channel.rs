use crate::{
    config::NodeId,
    core::{pattern::TimestampPattern, watermark::Watermark},
};

/// Fixed table polled through its column names.
#[derive(Debug, Clone, PartialEq)]
pub struct TableQuery {
    pub table: String,
    /// When set, every data point selects its own rows with `id_column = ?`.
    pub id_column: Option<String>,
    pub timestamp_column: String,
    pub value_column: String,
    /// Format of `timestamp_column`; also used to render the watermark
    /// literal in the generated `where` clause.
    pub timestamp_format: TimestampPattern,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChannelQuery {
    Table(TableQuery),
    /// Free-form SQL with `?` placeholders bound from the channel variables.
    Template(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChannelConfig {
    pub node: NodeId,
    pub name: String,
    pub query: ChannelQuery,
    pub watermark: Watermark,
}

impl ChannelConfig {
    pub fn table(&self) -> Option<&TableQuery> {
        match &self.query {
            ChannelQuery::Table(table) => Some(table),
            ChannelQuery::Template(_) => None,
        }
    }

    pub fn is_templated(&self) -> bool {
        matches!(self.query, ChannelQuery::Template(_))
    }
}
