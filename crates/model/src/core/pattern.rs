//! Date patterns as written in channel configuration (`yyyy-MM-dd HH:mm:ss`),
//! translated once into chrono format strings.

use crate::core::error::ValueError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::fmt;

/// Pattern used for watermark samples and `lastreadout` conditions.
pub const SQL_TIMESTAMP_PATTERN: &str = "yyyy-MM-dd HH:mm:ss";

const SQL_TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];
const SQL_DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampPattern {
    source: String,
    format: String,
    has_time: bool,
    has_offset: bool,
}

impl TimestampPattern {
    pub fn new(pattern: &str) -> Result<Self, ValueError> {
        if pattern.trim().is_empty() {
            return Err(invalid(pattern, "pattern is empty"));
        }
        translate(pattern)
    }

    pub fn sql_timestamp() -> Self {
        // The constant only uses supported letters.
        translate(SQL_TIMESTAMP_PATTERN).unwrap_or_else(|_| TimestampPattern {
            source: SQL_TIMESTAMP_PATTERN.to_string(),
            format: "%Y-%m-%d %H:%M:%S".to_string(),
            has_time: true,
            has_offset: false,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// The equivalent chrono format string.
    pub fn chrono_format(&self) -> &str {
        &self.format
    }

    /// Renders an instant as wall-clock time in `tz`.
    pub fn format(&self, instant: &DateTime<Utc>, tz: Tz) -> String {
        instant.with_timezone(&tz).format(&self.format).to_string()
    }

    /// Parses text into an instant. Text without an offset is read as
    /// wall-clock time in `tz`; text without a time of day is midnight.
    pub fn parse(&self, text: &str, tz: Tz) -> Result<DateTime<Utc>, ValueError> {
        let text = text.trim();
        let mismatch = || ValueError::Timestamp {
            value: text.to_string(),
            pattern: self.source.clone(),
        };

        if self.has_offset {
            return DateTime::parse_from_str(text, &self.format)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|_| mismatch());
        }

        let naive = if self.has_time {
            NaiveDateTime::parse_from_str(text, &self.format).map_err(|_| mismatch())?
        } else {
            NaiveDate::parse_from_str(text, &self.format)
                .map_err(|_| mismatch())?
                .and_hms_opt(0, 0, 0)
                .ok_or_else(mismatch)?
        };

        localize(&naive, tz)
    }
}

impl fmt::Display for TimestampPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Interprets a naive wall-clock time in `tz`. Ambiguous times (DST fold)
/// resolve to the earlier instant.
pub fn localize(naive: &NaiveDateTime, tz: Tz) -> Result<DateTime<Utc>, ValueError> {
    tz.from_local_datetime(naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| ValueError::NonexistentLocalTime(naive.to_string(), tz.name().to_string()))
}

pub fn parse_timezone(name: &str) -> Result<Tz, ValueError> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| ValueError::UnknownTimezone(name.to_string()))
}

/// Parses `yyyy-MM-dd[ HH:mm:ss[.SSS]]` (or with a `T` separator).
pub fn parse_sql_timestamp(text: &str) -> Result<NaiveDateTime, ValueError> {
    let text = text.trim();
    SQL_TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, SQL_DATE_FORMAT)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| ValueError::parse(text, "timestamp"))
}

/// Parses `yyyy-MM-dd`, also accepting a full timestamp and dropping its time.
pub fn parse_sql_date(text: &str) -> Result<NaiveDate, ValueError> {
    let text = text.trim();
    NaiveDate::parse_from_str(text, SQL_DATE_FORMAT)
        .or_else(|_| parse_sql_timestamp(text).map(|ts| ts.date()))
        .map_err(|_| ValueError::parse(text, "date"))
}

fn invalid(pattern: &str, reason: &str) -> ValueError {
    ValueError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: reason.to_string(),
    }
}

fn translate(pattern: &str) -> Result<TimestampPattern, ValueError> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut format = String::with_capacity(pattern.len() * 2);
    let mut has_time = false;
    let mut has_offset = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '\'' {
            // quoted literal, '' is an escaped quote
            let mut j = i + 1;
            if j < chars.len() && chars[j] == '\'' {
                format.push('\'');
                i = j + 1;
                continue;
            }
            loop {
                match chars.get(j) {
                    None => return Err(invalid(pattern, "unterminated quote")),
                    Some('\'') if chars.get(j + 1) == Some(&'\'') => {
                        format.push('\'');
                        j += 2;
                    }
                    Some('\'') => break,
                    Some('%') => {
                        format.push_str("%%");
                        j += 1;
                    }
                    Some(other) => {
                        format.push(*other);
                        j += 1;
                    }
                }
            }
            i = j + 1;
            continue;
        }

        if !c.is_ascii_alphabetic() {
            if c == '%' {
                format.push_str("%%");
            } else {
                format.push(c);
            }
            i += 1;
            continue;
        }

        let mut run = 1;
        while i + run < chars.len() && chars[i + run] == c {
            run += 1;
        }

        let directive = match (c, run) {
            ('y' | 'u', 2) => "%y",
            ('y' | 'u', _) => "%Y",
            ('M', 1) => "%-m",
            ('M', 2) => "%m",
            ('M', 3) => "%b",
            ('M', _) => "%B",
            ('d', 1) => "%-d",
            ('d', _) => "%d",
            ('D', _) => "%j",
            ('E', 1..=3) => "%a",
            ('E', _) => "%A",
            ('a', _) => "%p",
            ('H', 1) => "%-H",
            ('H', _) => "%H",
            ('h', 1) => "%-I",
            ('h', _) => "%I",
            ('m', 1) => "%-M",
            ('m', _) => "%M",
            ('s', 1) => "%-S",
            ('s', _) => "%S",
            ('S', 1..=3) => "%3f",
            ('S', 4..=6) => "%6f",
            ('S', _) => "%9f",
            ('Z', 1) => "%z",
            ('Z' | 'X' | 'x', _) => "%:z",
            _ => {
                return Err(invalid(
                    pattern,
                    &format!("unsupported pattern letter '{c}'"),
                ));
            }
        };

        if matches!(c, 'H' | 'h' | 'm' | 's' | 'S' | 'a') {
            has_time = true;
        }
        if matches!(c, 'Z' | 'X' | 'x') {
            has_offset = true;
        }

        format.push_str(directive);
        i += run;
    }

    Ok(TimestampPattern {
        source: pattern.to_string(),
        format,
        has_time,
        has_offset,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn translates_common_patterns() {
        let p = TimestampPattern::new("yyyy-MM-dd HH:mm:ss").unwrap();
        assert_eq!(p.chrono_format(), "%Y-%m-%d %H:%M:%S");

        let p = TimestampPattern::new("dd.MM.yy'T'HH:mm:ss.SSS").unwrap();
        assert_eq!(p.chrono_format(), "%d.%m.%yT%H:%M:%S.%3f");
    }

    #[test]
    fn rejects_unknown_letters() {
        assert!(matches!(
            TimestampPattern::new("yyyy-QQ"),
            Err(ValueError::InvalidPattern { .. })
        ));
        assert!(TimestampPattern::new("'open").is_err());
    }

    #[test]
    fn parses_in_source_timezone() {
        let p = TimestampPattern::new("yyyy-MM-dd HH:mm:ss").unwrap();
        let tz: Tz = "Europe/Berlin".parse().unwrap();
        let instant = p.parse("2023-01-02 01:00:00", tz).unwrap();
        assert_eq!(instant.hour(), 0);
        assert_eq!(p.format(&instant, tz), "2023-01-02 01:00:00");
    }

    #[test]
    fn date_only_pattern_is_midnight() {
        let p = TimestampPattern::new("dd/MM/yyyy").unwrap();
        let instant = p.parse("03/01/2023", Tz::UTC).unwrap();
        assert_eq!((instant.year(), instant.month(), instant.day()), (2023, 1, 3));
        assert_eq!(instant.hour(), 0);
    }

    #[test]
    fn pattern_with_offset_ignores_timezone() {
        let p = TimestampPattern::new("yyyy-MM-dd HH:mm:ssZ").unwrap();
        let instant = p.parse("2023-01-02 10:00:00+0200", Tz::UTC).unwrap();
        assert_eq!(instant.hour(), 8);
    }

    #[test]
    fn mismatched_text_fails() {
        let p = TimestampPattern::sql_timestamp();
        assert!(matches!(
            p.parse("yesterday", Tz::UTC),
            Err(ValueError::Timestamp { .. })
        ));
    }

    #[test]
    fn sql_timestamp_accepts_fraction_and_date() {
        assert!(parse_sql_timestamp("2023-01-02 03:04:05.123").is_ok());
        assert!(parse_sql_timestamp("2023-01-02T03:04:05").is_ok());
        assert_eq!(
            parse_sql_timestamp("2023-01-02").unwrap().to_string(),
            "2023-01-02 00:00:00"
        );
        assert!(parse_sql_date("2023-01-02 10:00:00").is_ok());
    }
}
