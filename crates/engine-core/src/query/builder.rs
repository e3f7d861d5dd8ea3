use chrono_tz::Tz;
use connectors::sql::base::statement::PreparedQuery;
use model::config::channel::{ChannelConfig, ChannelQuery, TableQuery};
use tracing::info;

/// Statement of one channel, ready for binding.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltQuery {
    pub statement: PreparedQuery,
    /// The single slot takes the data point's id; execute once per point.
    pub id_filtered: bool,
}

/// Builds the statement a channel polls with. Never executes anything.
#[derive(Debug, Clone, Copy)]
pub struct QueryBuilder {
    tz: Tz,
}

impl QueryBuilder {
    pub fn new(tz: Tz) -> Self {
        QueryBuilder { tz }
    }

    pub fn build(&self, channel: &ChannelConfig) -> BuiltQuery {
        let built = match &channel.query {
            ChannelQuery::Template(sql) => BuiltQuery {
                statement: PreparedQuery::new(terminate(sql)),
                id_filtered: false,
            },
            ChannelQuery::Table(table) => self.table_query(table, channel),
        };

        info!(
            channel = %channel.name,
            sql = %built.statement.sql(),
            slots = built.statement.slot_count(),
            "Prepared channel query"
        );
        built
    }

    fn table_query(&self, table: &TableQuery, channel: &ChannelConfig) -> BuiltQuery {
        let since = channel
            .watermark
            .format_with(&table.timestamp_format, self.tz)
            .replace('\'', "''");

        let mut sql = String::from("select ");
        if let Some(id) = &table.id_column {
            sql.push_str(id);
            sql.push_str(", ");
        }
        sql.push_str(&format!(
            "{}, {} from {} where {} > '{}'",
            table.timestamp_column, table.value_column, table.table, table.timestamp_column, since
        ));
        if let Some(id) = &table.id_column {
            sql.push_str(&format!(" and {id} = ?"));
        }
        sql.push(';');

        BuiltQuery {
            statement: PreparedQuery::new(sql),
            id_filtered: table.id_column.is_some(),
        }
    }
}

fn terminate(sql: &str) -> String {
    let sql = sql.trim();
    if sql.ends_with(';') {
        sql.to_string()
    } else {
        format!("{sql};")
    }
}
