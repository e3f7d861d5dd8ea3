use crate::error::ParseError;
use chrono::{DateTime, NaiveTime, Utc};
use chrono_tz::Tz;
use model::{
    config::data_point::Target,
    core::{
        data_type::{TimestampType, ValueType},
        pattern::{localize, parse_sql_date, parse_sql_timestamp},
        value::Value,
    },
    records::{record::Record, row::RowData},
};
use tracing::{debug, warn};

/// Records parsed from one result set.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ParsedRows {
    pub records: Vec<Record>,
    /// (row, target) pairs that produced no record.
    pub skipped: usize,
}

/// Turns result rows into records, one per row and target.
#[derive(Debug, Clone, Copy)]
pub struct ResultParser {
    tz: Tz,
}

impl ResultParser {
    pub fn new(tz: Tz) -> Self {
        ResultParser { tz }
    }

    pub fn parse(&self, rows: &[RowData], targets: &[Target]) -> ParsedRows {
        let mut parsed = ParsedRows::default();

        for row in rows {
            for target in targets {
                match self.parse_record(row, target) {
                    Ok(record) => {
                        debug!(%record, "Parsed record");
                        parsed.records.push(record);
                    }
                    Err(error) => {
                        warn!(error = ?error, "Skipping record");
                        parsed.skipped += 1;
                    }
                }
            }
        }

        parsed
    }

    fn parse_record(&self, row: &RowData, target: &Target) -> Result<Record, ParseError> {
        let timestamp = self.read_timestamp(row, target)?;
        let value = self.read_value(row, target)?;
        Ok(Record::new(
            target.target_id,
            target.target_attribute.clone(),
            value,
            timestamp,
        ))
    }

    fn read_timestamp(&self, row: &RowData, target: &Target) -> Result<DateTime<Utc>, ParseError> {
        let column = &target.timestamp_column;
        let cell = row.get_value(column);
        let fail = |reason: String| row_error(target, column, reason);

        if cell.is_null() {
            return Err(fail("value is NULL or missing".into()));
        }

        if let Some(instant) = cell.as_instant() {
            // offset-aware cells are not localized again
            return match &target.timestamp_type {
                TimestampType::Date => {
                    let date = instant.with_timezone(&self.tz).date_naive();
                    localize(&date.and_time(NaiveTime::MIN), self.tz)
                        .map_err(|e| fail(e.to_string()))
                }
                TimestampType::Timestamp | TimestampType::Pattern(_) => Ok(instant),
            };
        }

        let naive = match &target.timestamp_type {
            TimestampType::Date => match cell.as_date() {
                Some(date) => date.and_hms_opt(0, 0, 0),
                None => cell
                    .as_text()
                    .and_then(|t| parse_sql_date(&t).ok())
                    .and_then(|d| d.and_hms_opt(0, 0, 0)),
            },
            TimestampType::Timestamp => cell
                .as_timestamp()
                .or_else(|| cell.as_text().and_then(|t| parse_sql_timestamp(&t).ok())),
            TimestampType::Pattern(pattern) => match cell.as_timestamp() {
                // typed temporal cells need no text round trip
                Some(ts) => Some(ts),
                None => {
                    let text = cell.as_text().unwrap_or_default();
                    return pattern.parse(&text, self.tz).map_err(|e| fail(e.to_string()));
                }
            },
        };

        let naive = naive.ok_or_else(|| {
            fail(format!(
                "'{}' is not a {}",
                cell.as_text().unwrap_or_default(),
                target.timestamp_type
            ))
        })?;

        localize(&naive, self.tz).map_err(|e| fail(e.to_string()))
    }

    fn read_value(&self, row: &RowData, target: &Target) -> Result<Value, ParseError> {
        let column = &target.value_column;
        let text = row
            .get_value(column)
            .as_text()
            .ok_or_else(|| row_error(target, column, "value is NULL or missing".into()))?;

        match &target.value_type {
            ValueType::Unknown(tag) => {
                let degraded = ParseError::UnknownValueType {
                    data_point: target.name.clone(),
                    tag: tag.clone(),
                };
                warn!(error = ?degraded, "Importing value as string");
                Ok(Value::String(text))
            }
            value_type => value_type
                .parse(&text)
                .map_err(|e| row_error(target, column, e.to_string())),
        }
    }
}

fn row_error(target: &Target, column: &str, reason: String) -> ParseError {
    ParseError::RowParse {
        data_point: target.name.clone(),
        column: column.to_string(),
        reason,
    }
}
