use crate::core::{
    error::ValueError,
    pattern::{TimestampPattern, parse_sql_date, parse_sql_timestamp},
    value::Value,
};
use lazy_static::lazy_static;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{collections::HashMap, fmt, str::FromStr};

/// Declared type of a data point value or a statement variable.
///
/// Configuration carries these as free-form tags (`"double"`, `"int"`, ...).
/// Tags outside the supported set are kept as [`ValueType::Unknown`] so the
/// caller decides how to degrade instead of failing at load time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum ValueType {
    #[default]
    Double,
    Float,
    Long,
    Int,
    String,
    Date,
    Timestamp,
    Unknown(String),
}

type ParseFn = fn(&str) -> Result<Value, ValueError>;

lazy_static! {
    /// Single dispatch table: tag -> (type, text parser).
    static ref TYPE_TABLE: HashMap<&'static str, (ValueType, ParseFn)> = build_type_table();
}

fn build_type_table() -> HashMap<&'static str, (ValueType, ParseFn)> {
    let entries: [(&'static str, ValueType, ParseFn); 8] = [
        ("double", ValueType::Double, parse_double),
        ("float", ValueType::Float, parse_float),
        ("long", ValueType::Long, parse_long),
        ("int", ValueType::Int, parse_int),
        ("integer", ValueType::Int, parse_int),
        ("string", ValueType::String, parse_string),
        ("date", ValueType::Date, parse_date),
        ("timestamp", ValueType::Timestamp, parse_timestamp),
    ];

    entries
        .into_iter()
        .map(|(tag, value_type, parse)| (tag, (value_type, parse)))
        .collect()
}

fn parse_double(text: &str) -> Result<Value, ValueError> {
    text.trim()
        .parse::<f64>()
        .map(Value::Double)
        .map_err(|_| ValueError::parse(text, "double"))
}

fn parse_float(text: &str) -> Result<Value, ValueError> {
    text.trim()
        .parse::<f32>()
        .map(Value::Float)
        .map_err(|_| ValueError::parse(text, "float"))
}

fn parse_long(text: &str) -> Result<Value, ValueError> {
    text.trim()
        .parse::<i64>()
        .map(Value::Long)
        .map_err(|_| ValueError::parse(text, "long"))
}

fn parse_int(text: &str) -> Result<Value, ValueError> {
    text.trim()
        .parse::<i32>()
        .map(Value::Int)
        .map_err(|_| ValueError::parse(text, "int"))
}

fn parse_string(text: &str) -> Result<Value, ValueError> {
    Ok(Value::String(text.to_string()))
}

fn parse_date(text: &str) -> Result<Value, ValueError> {
    parse_sql_date(text).map(Value::Date)
}

fn parse_timestamp(text: &str) -> Result<Value, ValueError> {
    parse_sql_timestamp(text).map(Value::Timestamp)
}

impl ValueType {
    /// Resolves a configuration tag. Matching is case-insensitive and
    /// ignores surrounding whitespace.
    pub fn from_tag(tag: &str) -> Self {
        let normalized = tag.trim().to_ascii_lowercase();
        TYPE_TABLE
            .get(normalized.as_str())
            .map(|(value_type, _)| value_type.clone())
            .unwrap_or_else(|| ValueType::Unknown(tag.trim().to_string()))
    }

    pub fn tag(&self) -> &str {
        match self {
            ValueType::Double => "double",
            ValueType::Float => "float",
            ValueType::Long => "long",
            ValueType::Int => "int",
            ValueType::String => "string",
            ValueType::Date => "date",
            ValueType::Timestamp => "timestamp",
            ValueType::Unknown(tag) => tag,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, ValueType::Unknown(_))
    }

    /// Converts text into a typed value.
    ///
    /// Returns [`ValueError::UnknownType`] for unknown tags; callers choose
    /// whether to fall back to a string value or skip.
    pub fn parse(&self, text: &str) -> Result<Value, ValueError> {
        match TYPE_TABLE.get(self.tag()) {
            Some((_, parse)) if !self.is_unknown() => parse(text),
            _ => Err(ValueError::UnknownType(self.tag().to_string())),
        }
    }
}

impl FromStr for ValueType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(ValueType::from_tag(s))
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl Serialize for ValueType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.tag())
    }
}

impl<'de> Deserialize<'de> for ValueType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(ValueType::from_tag(&tag))
    }
}

/// How the timestamp column of a data point is read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimestampType {
    /// SQL `DATE` value, taken at midnight.
    Date,
    /// SQL `TIMESTAMP` / `DATETIME` value.
    Timestamp,
    /// The column's text representation parsed with a date pattern.
    Pattern(TimestampPattern),
}

impl TimestampType {
    /// `date` and `timestamp` select the SQL typed readers, anything else is
    /// taken as a parse pattern.
    pub fn from_tag(tag: &str) -> Result<Self, ValueError> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "date" => Ok(TimestampType::Date),
            "timestamp" => Ok(TimestampType::Timestamp),
            _ => TimestampPattern::new(tag.trim()).map(TimestampType::Pattern),
        }
    }

    pub fn tag(&self) -> &str {
        match self {
            TimestampType::Date => "date",
            TimestampType::Timestamp => "timestamp",
            TimestampType::Pattern(pattern) => pattern.as_str(),
        }
    }
}

impl fmt::Display for TimestampType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}
