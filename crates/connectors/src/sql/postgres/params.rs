use crate::sql::{base::error::DbError, postgres::coercion::coerce_param};
use chrono_tz::Tz;
use model::core::value::Value;
use tokio_postgres::types::{ToSql, Type};

pub struct PgParam(Box<dyn ToSql + Sync + Send>);

impl PgParam {
    pub(crate) fn new<T: ToSql + Sync + Send + 'static>(value: T) -> Self {
        PgParam(Box::new(value))
    }

    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Double(v) => PgParam(Box::new(v)),
            Value::Float(v) => PgParam(Box::new(v)),
            Value::Long(v) => PgParam(Box::new(v)),
            Value::Int(v) => PgParam(Box::new(v)),
            Value::String(v) => PgParam(Box::new(v)),
            Value::Boolean(v) => PgParam(Box::new(v)),
            Value::Bytes(v) => PgParam(Box::new(v)),
            Value::Date(v) => PgParam(Box::new(v)),
            Value::Timestamp(v) => PgParam(Box::new(v)),
            Value::TimestampTz(v) => PgParam(Box::new(v)),
            Value::Null => PgParam(Box::new(Option::<String>::None)),
        }
    }
}

impl AsRef<dyn ToSql + Sync> for PgParam {
    fn as_ref(&self) -> &(dyn ToSql + Sync + 'static) {
        &*self.0
    }
}

pub struct PgParamStore {
    pub params: Vec<PgParam>,
}

impl PgParamStore {
    /// Converts each value to the type of its placeholder, as reported by
    /// the prepared statement. Naive timestamps are wall-clock time in `tz`.
    pub fn coerce(values: Vec<Value>, types: &[Type], tz: Tz) -> Result<Self, DbError> {
        let params = values
            .into_iter()
            .enumerate()
            .map(|(i, value)| match types.get(i) {
                Some(ty) => coerce_param(&value, ty, tz).ok_or_else(|| DbError::ParameterType {
                    position: i + 1,
                    value: value.to_string(),
                    pg_type: ty.to_string(),
                }),
                None => Ok(PgParam::from_value(value)),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { params })
    }

    pub fn as_refs(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params
            .iter()
            .map(|param| param.as_ref())
            .collect::<Vec<_>>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_param_per_value() {
        let store = PgParamStore::coerce(
            vec![Value::String("17".into()), Value::String("m1".into()), Value::Null],
            &[Type::INT4, Type::TEXT, Type::TIMESTAMP],
            Tz::UTC,
        )
        .unwrap();
        assert_eq!(store.as_refs().len(), 3);
    }

    #[test]
    fn unconvertible_value_names_its_position() {
        let err = PgParamStore::coerce(
            vec![Value::String("m1".into()), Value::String("M-1".into())],
            &[Type::TEXT, Type::INT8],
            Tz::UTC,
        )
        .err()
        .expect("text id does not fit an int8 column");

        assert!(matches!(
            err,
            DbError::ParameterType { position: 2, ref pg_type, .. } if pg_type == "int8"
        ));
    }
}
