use crate::sql::postgres::params::PgParam;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use chrono_tz::Tz;
use model::core::{
    pattern::{localize, parse_sql_date, parse_sql_timestamp},
    value::Value,
};
use rust_decimal::Decimal;
use std::str::FromStr;
use tokio_postgres::types::{ToSql, Type};

/// Converts a bound value to the Rust type the server inferred for its
/// placeholder. Naive timestamps are wall-clock time in `tz`.
///
/// Returns `None` when the value has no representation in `ty`. Types
/// without a rule get the value's own Rust type.
pub(crate) fn coerce_param(value: &Value, ty: &Type, tz: Tz) -> Option<PgParam> {
    match *ty {
        Type::BOOL => typed(value, as_bool),
        Type::INT2 => typed(value, |v| as_i64(v).and_then(|n| i16::try_from(n).ok())),
        Type::INT4 => typed(value, |v| as_i64(v).and_then(|n| i32::try_from(n).ok())),
        Type::INT8 => typed(value, as_i64),
        Type::FLOAT4 => typed(value, |v| as_f64(v).map(|f| f as f32)),
        Type::FLOAT8 => typed(value, as_f64),
        Type::NUMERIC => typed(value, as_decimal),
        Type::DATE => typed(value, |v| as_date(v, tz)),
        Type::TIMESTAMP => typed(value, |v| as_naive(v, tz)),
        Type::TIMESTAMPTZ => typed(value, |v| as_instant(v, tz)),
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::UNKNOWN => {
            typed(value, Value::as_text)
        }
        Type::BYTEA => typed(value, as_bytes),
        _ => Some(PgParam::from_value(value.clone())),
    }
}

/// `NULL` is bound as an absent value of the target type so the driver
/// accepts it for any column.
fn typed<T>(value: &Value, convert: impl FnOnce(&Value) -> Option<T>) -> Option<PgParam>
where
    T: ToSql + Sync + Send + 'static,
{
    if value.is_null() {
        return Some(PgParam::new(Option::<T>::None));
    }
    convert(value).map(PgParam::new)
}

fn as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Boolean(b) => Some(*b),
        Value::Int(n) => Some(*n != 0),
        Value::Long(n) => Some(*n != 0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "t" | "1" => Some(true),
            "false" | "f" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Long(n) => Some(*n),
        Value::Int(n) => Some(i64::from(*n)),
        Value::Double(f) if f.fract() == 0.0 => Some(*f as i64),
        Value::Float(f) if f.fract() == 0.0 => Some(*f as i64),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Double(f) => Some(*f),
        Value::Float(f) => Some(f64::from(*f)),
        Value::Long(n) => Some(*n as f64),
        Value::Int(n) => Some(f64::from(*n)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Long(n) => Some(Decimal::from(*n)),
        Value::Int(n) => Some(Decimal::from(*n)),
        Value::Double(f) => Decimal::try_from(*f).ok(),
        Value::Float(f) => Decimal::try_from(*f).ok(),
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    }
}

fn as_date(value: &Value, tz: Tz) -> Option<NaiveDate> {
    match value {
        Value::TimestampTz(ts) => Some(ts.with_timezone(&tz).date_naive()),
        Value::String(s) => parse_sql_date(s).ok(),
        other => other.as_date(),
    }
}

fn as_naive(value: &Value, tz: Tz) -> Option<NaiveDateTime> {
    match value {
        Value::TimestampTz(ts) => Some(ts.with_timezone(&tz).naive_local()),
        Value::String(s) => parse_sql_timestamp(s).ok(),
        other => other.as_timestamp(),
    }
}

fn as_instant(value: &Value, tz: Tz) -> Option<DateTime<Utc>> {
    let naive = match value {
        Value::TimestampTz(ts) => return Some(*ts),
        Value::String(s) => {
            if let Ok(dt) = DateTime::parse_from_rfc3339(s.trim()) {
                return Some(dt.with_timezone(&Utc));
            }
            parse_sql_timestamp(s).ok()?
        }
        Value::Date(d) => d.and_time(NaiveTime::MIN),
        Value::Timestamp(ts) => *ts,
        _ => return None,
    };
    localize(&naive, tz).ok()
}

fn as_bytes(value: &Value) -> Option<Vec<u8>> {
    match value {
        Value::Bytes(b) => Some(b.clone()),
        Value::String(s) => Some(s.clone().into_bytes()),
        _ => None,
    }
}
