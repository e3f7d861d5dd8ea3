use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use core::fmt;
use model::{
    core::value::Value,
    records::row::{FieldValue, RowData},
};
use mysql_async::{Column as MySqlColumn, Row as MySqlRow, Value as MySqlValue, consts::ColumnType};
use rust_decimal::Decimal;
use std::fmt::Formatter;
use tokio_postgres::{Row as PgRow, types::Type as PgType};
use tracing::warn;

/// Charset id MySQL reports for binary columns.
const MYSQL_BINARY_CHARSET: u16 = 63;

pub enum DbRow<'a> {
    MySqlRow(&'a MySqlRow),
    PostgresRow(&'a PgRow),
}

impl DbRow<'_> {
    pub fn to_row_data(&self) -> RowData {
        let field_values = match self {
            DbRow::MySqlRow(row) => row
                .columns_ref()
                .iter()
                .enumerate()
                .map(|(i, column)| FieldValue {
                    name: column.name_str().into_owned(),
                    value: row
                        .as_ref(i)
                        .map(|value| mysql_value(value, column))
                        .unwrap_or(Value::Null),
                })
                .collect(),
            DbRow::PostgresRow(row) => row
                .columns()
                .iter()
                .enumerate()
                .map(|(i, column)| FieldValue {
                    name: column.name().to_string(),
                    value: pg_value(row, i, column.type_()),
                })
                .collect(),
        };

        RowData::new(field_values)
    }
}

impl fmt::Debug for DbRow<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            DbRow::MySqlRow(row) => write!(f, "{row:?}"),
            DbRow::PostgresRow(row) => write!(f, "{row:?}"),
        }
    }
}

fn mysql_value(value: &MySqlValue, column: &MySqlColumn) -> Value {
    mysql_cell(value, column.column_type(), column.character_set())
}

/// Converts a binary-protocol MySQL cell. Text comes back as bytes, so the
/// column charset decides between text and raw bytes.
pub(crate) fn mysql_cell(value: &MySqlValue, column_type: ColumnType, charset: u16) -> Value {
    match value {
        MySqlValue::NULL => Value::Null,
        MySqlValue::Int(i) => Value::Long(*i),
        MySqlValue::UInt(u) => i64::try_from(*u)
            .map(Value::Long)
            .unwrap_or_else(|_| Value::String(u.to_string())),
        MySqlValue::Float(f) => Value::Float(*f),
        MySqlValue::Double(d) => Value::Double(*d),
        MySqlValue::Bytes(bytes) => {
            if charset == MYSQL_BINARY_CHARSET && is_mysql_blob(column_type) {
                Value::Bytes(bytes.clone())
            } else {
                Value::String(String::from_utf8_lossy(bytes).into_owned())
            }
        }
        MySqlValue::Date(year, month, day, hour, minute, second, micros) => {
            let date = NaiveDate::from_ymd_opt(i32::from(*year), u32::from(*month), u32::from(*day));
            match (column_type, date) {
                (ColumnType::MYSQL_TYPE_DATE | ColumnType::MYSQL_TYPE_NEWDATE, Some(date)) => {
                    Value::Date(date)
                }
                (_, Some(date)) => date
                    .and_hms_micro_opt(
                        u32::from(*hour),
                        u32::from(*minute),
                        u32::from(*second),
                        *micros,
                    )
                    .map(Value::Timestamp)
                    .unwrap_or(Value::Null),
                // zero dates such as 0000-00-00
                (_, None) => {
                    warn!(?value, "Invalid MySQL date, reading as NULL");
                    Value::Null
                }
            }
        }
        MySqlValue::Time(negative, days, hours, minutes, seconds, micros) => {
            let sign = if *negative { "-" } else { "" };
            let hours = u32::from(*hours) + days * 24;
            Value::String(format!("{sign}{hours:02}:{minutes:02}:{seconds:02}.{micros:06}"))
        }
    }
}

fn is_mysql_blob(column_type: ColumnType) -> bool {
    matches!(
        column_type,
        ColumnType::MYSQL_TYPE_BLOB
            | ColumnType::MYSQL_TYPE_TINY_BLOB
            | ColumnType::MYSQL_TYPE_MEDIUM_BLOB
            | ColumnType::MYSQL_TYPE_LONG_BLOB
            | ColumnType::MYSQL_TYPE_VAR_STRING
            | ColumnType::MYSQL_TYPE_STRING
            | ColumnType::MYSQL_TYPE_VARCHAR
            | ColumnType::MYSQL_TYPE_GEOMETRY
    )
}

fn pg_value(row: &PgRow, idx: usize, ty: &PgType) -> Value {
    fn get<'a, T: tokio_postgres::types::FromSql<'a>>(row: &'a PgRow, idx: usize) -> Option<T> {
        row.try_get::<_, Option<T>>(idx).ok().flatten()
    }

    let value = match *ty {
        PgType::BOOL => get::<bool>(row, idx).map(Value::Boolean),
        PgType::INT2 => get::<i16>(row, idx).map(|v| Value::Int(i32::from(v))),
        PgType::INT4 => get::<i32>(row, idx).map(Value::Int),
        PgType::INT8 => get::<i64>(row, idx).map(Value::Long),
        PgType::FLOAT4 => get::<f32>(row, idx).map(Value::Float),
        PgType::FLOAT8 => get::<f64>(row, idx).map(Value::Double),
        // kept as text so no precision is lost before the value type applies
        PgType::NUMERIC => get::<Decimal>(row, idx).map(|d| Value::String(d.to_string())),
        PgType::DATE => get::<NaiveDate>(row, idx).map(Value::Date),
        PgType::TIMESTAMP => get::<NaiveDateTime>(row, idx).map(Value::Timestamp),
        PgType::TIMESTAMPTZ => get::<DateTime<Utc>>(row, idx).map(Value::TimestampTz),
        PgType::BYTEA => get::<Vec<u8>>(row, idx).map(Value::Bytes),
        _ => match row.try_get::<_, Option<String>>(idx) {
            Ok(text) => text.map(Value::String),
            Err(error) => {
                warn!(column = idx, pg_type = %ty, %error, "Unsupported column type, reading as NULL");
                None
            }
        },
    };

    value.unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mysql_dates_follow_column_type() {
        let cell = MySqlValue::Date(2023, 1, 2, 0, 0, 0, 0);
        assert_eq!(
            mysql_cell(&cell, ColumnType::MYSQL_TYPE_DATE, 33),
            Value::Date(NaiveDate::from_ymd_opt(2023, 1, 2).unwrap())
        );

        let cell = MySqlValue::Date(2023, 1, 2, 10, 30, 5, 0);
        assert_eq!(
            mysql_cell(&cell, ColumnType::MYSQL_TYPE_DATETIME, 33),
            Value::Timestamp(
                NaiveDate::from_ymd_opt(2023, 1, 2)
                    .unwrap()
                    .and_hms_opt(10, 30, 5)
                    .unwrap()
            )
        );

        let zero = MySqlValue::Date(0, 0, 0, 0, 0, 0, 0);
        assert_eq!(
            mysql_cell(&zero, ColumnType::MYSQL_TYPE_DATETIME, 33),
            Value::Null
        );
    }

    #[test]
    fn mysql_bytes_are_text_unless_binary() {
        let cell = MySqlValue::Bytes(b"12.50".to_vec());
        assert_eq!(
            mysql_cell(&cell, ColumnType::MYSQL_TYPE_NEWDECIMAL, MYSQL_BINARY_CHARSET),
            Value::String("12.50".into())
        );
        assert_eq!(
            mysql_cell(&cell, ColumnType::MYSQL_TYPE_BLOB, MYSQL_BINARY_CHARSET),
            Value::Bytes(b"12.50".to_vec())
        );
        assert_eq!(
            mysql_cell(&cell, ColumnType::MYSQL_TYPE_VAR_STRING, 45),
            Value::String("12.50".into())
        );
    }

    #[test]
    fn mysql_unsigned_overflow_keeps_digits() {
        assert_eq!(
            mysql_cell(&MySqlValue::UInt(u64::MAX), ColumnType::MYSQL_TYPE_LONGLONG, 63),
            Value::String(u64::MAX.to_string())
        );
    }
}
