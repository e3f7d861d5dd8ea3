use crate::core::{error::ValueError, pattern::TimestampPattern};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;

/// High-water mark of a channel: every row at or before this instant has
/// already been imported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Watermark(DateTime<Utc>);

impl Watermark {
    pub fn new(instant: DateTime<Utc>) -> Self {
        Watermark(instant)
    }

    /// Watermark of a channel that never imported anything.
    pub fn epoch() -> Self {
        Watermark(DateTime::<Utc>::UNIX_EPOCH)
    }

    pub fn instant(&self) -> DateTime<Utc> {
        self.0
    }

    pub fn is_epoch(&self) -> bool {
        self.0 == DateTime::<Utc>::UNIX_EPOCH
    }

    /// Persisted sample format, `yyyy-MM-dd HH:mm:ss` in `tz`. Fractional
    /// seconds are dropped.
    pub fn to_sample(&self, tz: Tz) -> String {
        TimestampPattern::sql_timestamp().format(&self.0, tz)
    }

    /// Reads a persisted sample. Empty text is the epoch. A sample inside a
    /// DST fold reads back as the earlier of its two instants.
    pub fn from_sample(text: &str, tz: Tz) -> Result<Self, ValueError> {
        if text.trim().is_empty() {
            return Ok(Watermark::epoch());
        }
        TimestampPattern::sql_timestamp()
            .parse(text, tz)
            .map(Watermark)
    }

    pub fn format_with(&self, pattern: &TimestampPattern, tz: Tz) -> String {
        pattern.format(&self.0, tz)
    }

    /// Newest instant of the batch, kept only when it moves the mark forward.
    pub fn advance<I>(&self, timestamps: I) -> Option<Watermark>
    where
        I: IntoIterator<Item = DateTime<Utc>>,
    {
        timestamps
            .into_iter()
            .max()
            .filter(|newest| *newest > self.0)
            .map(Watermark)
    }
}

impl Default for Watermark {
    fn default() -> Self {
        Watermark::epoch()
    }
}

impl fmt::Display for Watermark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d %H:%M:%S"))
    }
}
