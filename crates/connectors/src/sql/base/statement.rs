use crate::sql::base::{dialect::Dialect, error::DbError};
use model::core::value::Value;

/// SQL text with `?` placeholders and one parameter slot per placeholder.
///
/// Slots are addressed 1-based, in the order the placeholders appear.
/// Question marks inside quoted literals or identifiers are not
/// placeholders.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedQuery {
    sql: String,
    placeholders: Vec<usize>,
    slots: Vec<Option<Value>>,
}

impl PreparedQuery {
    pub fn new(sql: impl Into<String>) -> Self {
        let sql = sql.into();
        let placeholders = placeholder_offsets(&sql);
        let slots = vec![None; placeholders.len()];
        PreparedQuery {
            sql,
            placeholders,
            slots,
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Binds `value` to the 1-based `position`, replacing any earlier value.
    pub fn bind(&mut self, position: usize, value: Value) -> Result<(), DbError> {
        let slots = self.slots.len();
        match position.checked_sub(1).and_then(|i| self.slots.get_mut(i)) {
            Some(slot) => {
                *slot = Some(value);
                Ok(())
            }
            None => Err(DbError::ParameterOutOfRange { position, slots }),
        }
    }

    pub fn is_bound(&self, position: usize) -> bool {
        position
            .checked_sub(1)
            .and_then(|i| self.slots.get(i))
            .is_some_and(Option::is_some)
    }

    /// Bound values in slot order. Fails on the first unbound slot.
    pub fn params(&self) -> Result<Vec<Value>, DbError> {
        self.slots
            .iter()
            .enumerate()
            .map(|(i, slot)| slot.clone().ok_or(DbError::UnboundParameter(i + 1)))
            .collect()
    }

    /// The SQL text with each placeholder written in the dialect's syntax.
    pub fn render(&self, dialect: &dyn Dialect) -> String {
        let mut out = String::with_capacity(self.sql.len() + self.placeholders.len() * 2);
        let mut last = 0;
        for (index, offset) in self.placeholders.iter().enumerate() {
            out.push_str(&self.sql[last..*offset]);
            out.push_str(&dialect.get_placeholder(index));
            last = offset + 1;
        }
        out.push_str(&self.sql[last..]);
        out
    }
}

/// Byte offsets of the `?` placeholders, skipping quoted sections.
fn placeholder_offsets(sql: &str) -> Vec<usize> {
    let mut offsets = Vec::new();
    let mut quote: Option<char> = None;

    for (offset, ch) in sql.char_indices() {
        match (quote, ch) {
            // a doubled quote leaves and re-enters the literal
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"' | '`') => quote = Some(ch),
            (None, '?') => offsets.push(offset),
            (None, _) => {}
        }
    }

    offsets
}
