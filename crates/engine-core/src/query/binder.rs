use crate::error::BindError;
use chrono_tz::Tz;
use connectors::sql::base::statement::PreparedQuery;
use model::{
    config::variable::{Condition, VariableConfig},
    core::{data_type::ValueType, watermark::Watermark},
};
use tracing::{debug, warn};

/// Binds channel variables into the positional slots of a statement.
#[derive(Debug, Clone, Copy)]
pub struct VariableBinder {
    tz: Tz,
}

impl VariableBinder {
    pub fn new(tz: Tz) -> Self {
        VariableBinder { tz }
    }

    /// Text a condition stands for. `lastreadout` is the watermark as
    /// `yyyy-MM-dd HH:mm:ss` in the source timezone.
    pub fn resolve(&self, condition: &Condition, watermark: &Watermark) -> String {
        match condition {
            Condition::Literal(text) => text.clone(),
            Condition::LastReadout => watermark.to_sample(self.tz),
        }
    }

    /// Binds in ascending position order and returns how many slots were
    /// filled. Variables of unknown type are logged and skipped, leaving
    /// their slot unbound; every other problem fails the binding.
    pub fn bind(
        &self,
        statement: &mut PreparedQuery,
        variables: &[VariableConfig],
        watermark: &Watermark,
    ) -> Result<usize, BindError> {
        let mut ordered: Vec<&VariableConfig> = Vec::with_capacity(variables.len());
        for variable in variables {
            match &variable.value_type {
                ValueType::Unknown(tag) => {
                    let skipped = BindError::UnknownVariableType {
                        variable: variable.name.clone(),
                        tag: tag.clone(),
                    };
                    warn!(error = ?skipped, "Skipping variable");
                }
                _ => ordered.push(variable),
            }
        }
        ordered.sort_by_key(|v| v.position);

        if let Some(pair) = ordered.windows(2).find(|w| w[0].position == w[1].position) {
            return Err(BindError::DuplicatePosition {
                position: pair[0].position,
                first: pair[0].name.clone(),
                second: pair[1].name.clone(),
            });
        }

        let slots = statement.slot_count();
        let mut bound = 0;

        for variable in ordered {
            if variable.position == 0 || variable.position > slots {
                return Err(BindError::PositionOutOfRange {
                    variable: variable.name.clone(),
                    position: variable.position,
                    slots,
                });
            }

            let text = self.resolve(&variable.condition, watermark);
            let value = variable
                .value_type
                .parse(&text)
                .map_err(|source| BindError::Value {
                    variable: variable.name.clone(),
                    source,
                })?;

            debug!(variable = %variable.name, position = variable.position, %value, "Binding variable");
            statement.bind(variable.position, value)?;
            bound += 1;
        }

        Ok(bound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use connectors::sql::base::error::DbError;
    use model::{config::NodeId, core::value::Value};
    use tracing_test::traced_test;

    fn variable(name: &str, position: usize, tag: &str, condition: &str) -> VariableConfig {
        VariableConfig {
            node: NodeId(position as u64 + 10),
            name: name.into(),
            position,
            value_type: ValueType::from_tag(tag),
            condition: Condition::from_text(condition),
        }
    }

    #[test]
    fn unset_watermark_resolves_to_epoch() {
        let binder = VariableBinder::new(Tz::UTC);
        assert_eq!(
            binder.resolve(&Condition::LastReadout, &Watermark::epoch()),
            "1970-01-01 00:00:00"
        );
    }

    #[test]
    fn binds_in_position_order() {
        let mut statement = PreparedQuery::new("select * from t where ts > ? and kind = ?;");
        let variables = vec![
            variable("kind", 2, "int", "7"),
            variable("since", 1, "timestamp", "lastreadout"),
        ];

        let bound = VariableBinder::new(Tz::UTC)
            .bind(&mut statement, &variables, &Watermark::epoch())
            .unwrap();

        assert_eq!(bound, 2);
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(
            statement.params().unwrap(),
            vec![Value::Timestamp(epoch), Value::Int(7)]
        );
    }

    #[traced_test]
    #[test]
    fn unknown_type_leaves_slot_unbound() {
        let mut statement = PreparedQuery::new("select * from t where a = ? and b = ?;");
        let variables = vec![
            variable("a", 1, "string", "x"),
            variable("b", 2, "decimal", "1.5"),
        ];

        let bound = VariableBinder::new(Tz::UTC)
            .bind(&mut statement, &variables, &Watermark::epoch())
            .unwrap();

        assert_eq!(bound, 1);
        assert!(logs_contain("UnknownVariableType"));
        assert!(matches!(
            statement.params(),
            Err(DbError::UnboundParameter(2))
        ));
    }

    #[traced_test]
    #[test]
    fn skipped_variable_does_not_claim_its_position() {
        let mut statement = PreparedQuery::new("select * from t where a = ?;");
        let variables = vec![
            variable("legacy", 1, "decimal", "1.5"),
            variable("a", 1, "string", "x"),
        ];

        let bound = VariableBinder::new(Tz::UTC)
            .bind(&mut statement, &variables, &Watermark::epoch())
            .unwrap();

        assert_eq!(bound, 1);
        assert!(logs_contain("UnknownVariableType"));
        assert_eq!(statement.params().unwrap(), vec![Value::String("x".into())]);
    }

    #[test]
    fn bad_literal_fails_binding() {
        let mut statement = PreparedQuery::new("select * from t where a = ?;");
        let err = VariableBinder::new(Tz::UTC)
            .bind(
                &mut statement,
                &[variable("a", 1, "long", "abc")],
                &Watermark::epoch(),
            )
            .unwrap_err();
        assert!(matches!(err, BindError::Value { .. }));
    }

    #[test]
    fn position_checks() {
        let binder = VariableBinder::new(Tz::UTC);
        let mut statement = PreparedQuery::new("select * from t where a = ?;");

        let err = binder
            .bind(&mut statement, &[variable("a", 2, "string", "x")], &Watermark::epoch())
            .unwrap_err();
        assert!(matches!(err, BindError::PositionOutOfRange { position: 2, slots: 1, .. }));

        let err = binder
            .bind(
                &mut statement,
                &[variable("a", 1, "string", "x"), variable("b", 1, "string", "y")],
                &Watermark::epoch(),
            )
            .unwrap_err();
        assert!(matches!(err, BindError::DuplicatePosition { position: 1, .. }));
    }
}
