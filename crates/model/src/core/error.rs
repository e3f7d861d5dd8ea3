use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValueError {
    /// The text could not be converted into the declared type.
    #[error("Cannot parse '{value}' as {target}")]
    Parse { value: String, target: String },

    /// The declared type tag is not one of the supported tags.
    #[error("Unknown value type: {0}")]
    UnknownType(String),

    /// A date pattern contains letters that have no chrono equivalent.
    #[error("Invalid timestamp pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// The text does not match the timestamp pattern.
    #[error("Cannot parse timestamp '{value}' with pattern '{pattern}'")]
    Timestamp { value: String, pattern: String },

    /// The local time does not exist in the configured timezone (DST gap).
    #[error("Local time '{0}' does not exist in timezone {1}")]
    NonexistentLocalTime(String, String),

    #[error("Unknown timezone: {0}")]
    UnknownTimezone(String),
}

impl ValueError {
    pub fn parse(value: &str, target: &str) -> Self {
        ValueError::Parse {
            value: value.to_string(),
            target: target.to_string(),
        }
    }
}
