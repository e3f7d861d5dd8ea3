use crate::core::value::Value;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A parsed sample ready for the importer: one value for one attribute of
/// one target object at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    target_id: i64,
    target_attribute: String,
    value: Value,
    timestamp: DateTime<Utc>,
}

impl Record {
    pub fn new(
        target_id: i64,
        target_attribute: impl Into<String>,
        value: Value,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Record {
            target_id,
            target_attribute: target_attribute.into(),
            value,
            timestamp,
        }
    }

    pub fn target_id(&self) -> i64 {
        self.target_id
    }

    pub fn target_attribute(&self) -> &str {
        &self.target_attribute
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} @ {} = {}",
            self.target_id,
            self.target_attribute,
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.value
        )
    }
}
