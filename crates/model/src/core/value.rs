use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single typed value. Used for result-set cells, bound statement
/// parameters and the payload of an imported [`Record`](crate::records::record::Record).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Value {
    Double(f64),
    Float(f32),
    Long(i64),
    Int(i32),
    String(String),
    Boolean(bool),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
    /// An offset-aware timestamp, e.g. a PostgreSQL `timestamptz` cell.
    TimestampTz(DateTime<Utc>),
    Null,
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Text form of the cell, as read from a text result column.
    /// `None` for SQL `NULL`.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Value::Double(v) => Some(v.to_string()),
            Value::Float(v) => Some(v.to_string()),
            Value::Long(v) => Some(v.to_string()),
            Value::Int(v) => Some(v.to_string()),
            Value::String(v) => Some(v.clone()),
            Value::Boolean(v) => Some(v.to_string()),
            Value::Bytes(v) => Some(String::from_utf8_lossy(v).into_owned()),
            Value::Date(v) => Some(v.format("%Y-%m-%d").to_string()),
            Value::Timestamp(v) => Some(v.format("%Y-%m-%d %H:%M:%S%.f").to_string()),
            Value::TimestampTz(v) => Some(v.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Value::Null => None,
        }
    }

    /// Reads the value as a SQL `DATE`. Timestamps are truncated to their date.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            Value::Timestamp(ts) => Some(ts.date()),
            _ => None,
        }
    }

    /// The instant of an offset-aware timestamp. Naive cells have none
    /// until a time zone is applied.
    pub fn as_instant(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::TimestampTz(ts) => Some(*ts),
            _ => None,
        }
    }

    /// Reads the value as a SQL `TIMESTAMP`. Dates are promoted to midnight.
    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            Value::Timestamp(ts) => Some(*ts),
            Value::Date(d) => d.and_hms_opt(0, 0, 0),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(v) => write!(f, "'{}'", v.replace('\'', "''")),
            Value::Date(v) => write!(f, "'{}'", v.format("%Y-%m-%d")),
            Value::Timestamp(v) => write!(f, "'{}'", v.format("%Y-%m-%d %H:%M:%S")),
            Value::TimestampTz(v) => write!(f, "'{}'", v.format("%Y-%m-%d %H:%M:%S%:z")),
            Value::Bytes(v) => {
                let hex = v
                    .iter()
                    .fold(String::new(), |acc, byte: &u8| acc + &format!("{byte:02x}"));
                write!(f, "x'{hex}'")
            }
            Value::Null => write!(f, "NULL"),
            other => match other.as_text() {
                Some(text) => write!(f, "{text}"),
                None => write!(f, "NULL"),
            },
        }
    }
}
