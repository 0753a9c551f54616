use std::sync::OnceLock;

use anyhow::{anyhow, Result};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

/// One textual shape a guide timestamp may arrive in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstantFormat {
    /// RFC 3339 / ISO-8601 with a `Z` or `+hh:mm` offset, fractional seconds allowed.
    Rfc3339,
    /// A chrono pattern that includes an offset (`%z`).
    WithOffset(String),
    /// A chrono pattern without an offset; the value is read as UTC.
    NaiveUtc(String),
}

impl InstantFormat {
    pub fn with_offset(pattern: impl Into<String>) -> Self {
        InstantFormat::WithOffset(pattern.into())
    }

    pub fn naive_utc(pattern: impl Into<String>) -> Self {
        InstantFormat::NaiveUtc(pattern.into())
    }

    fn try_parse(&self, raw: &str) -> Option<DateTime<Utc>> {
        match self {
            InstantFormat::Rfc3339 => DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
            InstantFormat::WithOffset(pattern) => DateTime::parse_from_str(raw, pattern)
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
            InstantFormat::NaiveUtc(pattern) => NaiveDateTime::parse_from_str(raw, pattern)
                .ok()
                .map(|naive| Utc.from_utc_datetime(&naive)),
        }
    }
}

/// Ordered list of formats; the first one that accepts the input wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstantParser {
    formats: Vec<InstantFormat>,
}

impl Default for InstantParser {
    fn default() -> Self {
        Self {
            formats: vec![
                InstantFormat::Rfc3339,
                InstantFormat::with_offset("%Y-%m-%dT%H:%M:%S%z"),
                InstantFormat::with_offset("%Y-%m-%d %H:%M:%S %z"),
                // XMLTV: 20240501100000 +0200
                InstantFormat::with_offset("%Y%m%d%H%M%S %z"),
                InstantFormat::naive_utc("%Y-%m-%dT%H:%M:%S"),
            ],
        }
    }
}

impl InstantParser {
    pub fn empty() -> Self {
        Self {
            formats: Vec::new(),
        }
    }

    /// Appends a format tried after every format already registered.
    pub fn with_format(mut self, format: InstantFormat) -> Self {
        self.formats.push(format);
        self
    }

    pub fn formats(&self) -> &[InstantFormat] {
        &self.formats
    }

    pub fn parse(&self, raw: &str) -> Result<DateTime<Utc>> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(anyhow!("empty instant"));
        }

        self.formats
            .iter()
            .find_map(|format| format.try_parse(trimmed))
            .ok_or_else(|| anyhow!("unrecognized instant '{raw}'"))
    }
}

/// Process-wide parser with the default format list.
pub fn default_parser() -> &'static InstantParser {
    static PARSER: OnceLock<InstantParser> = OnceLock::new();
    PARSER.get_or_init(InstantParser::default)
}

pub fn parse_instant(raw: &str) -> Result<DateTime<Utc>> {
    default_parser().parse(raw)
}

/// Serde adapter for window bounds: any accepted format in, RFC 3339 out.
pub mod wire {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_instant(&raw).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s)
            .single()
            .expect("valid timestamp")
    }

    #[test]
    fn parses_rfc3339_with_offset_and_zulu() {
        let expected = utc(2024, 5, 1, 8, 0, 0);
        assert_eq!(parse_instant("2024-05-01T10:00:00+02:00").unwrap(), expected);
        assert_eq!(parse_instant("2024-05-01T08:00:00Z").unwrap(), expected);
    }

    #[test]
    fn parses_fractional_seconds() {
        let parsed = parse_instant("2024-05-01T08:00:00.500Z").unwrap();
        assert_eq!(parsed.timestamp_millis(), utc(2024, 5, 1, 8, 0, 0).timestamp_millis() + 500);
    }

    #[test]
    fn parses_compact_offset_and_xmltv() {
        let expected = utc(2024, 5, 1, 8, 0, 0);
        assert_eq!(parse_instant("2024-05-01T10:00:00+0200").unwrap(), expected);
        assert_eq!(parse_instant("2024-05-01 10:00:00 +0200").unwrap(), expected);
        assert_eq!(parse_instant("20240501100000 +0200").unwrap(), expected);
    }

    #[test]
    fn naive_values_are_read_as_utc() {
        assert_eq!(
            parse_instant("2024-05-01T10:00:00").unwrap(),
            utc(2024, 5, 1, 10, 0, 0)
        );
    }

    #[test]
    fn rejects_garbage_and_blank_input() {
        assert!(parse_instant("not a time").is_err());
        assert!(parse_instant("   ").is_err());
        assert!(parse_instant("").is_err());
    }

    #[test]
    fn trims_surrounding_whitespace() {
        assert_eq!(
            parse_instant("  2024-05-01T08:00:00Z\n").unwrap(),
            utc(2024, 5, 1, 8, 0, 0)
        );
    }

    #[test]
    fn custom_formats_are_tried_in_order() {
        let parser = InstantParser::empty();
        assert!(parser.parse("01/05/2024 10:00").is_err());

        let parser = parser.with_format(InstantFormat::naive_utc("%d/%m/%Y %H:%M"));
        assert_eq!(
            parser.parse("01/05/2024 10:00").unwrap(),
            utc(2024, 5, 1, 10, 0, 0)
        );
        assert_eq!(parser.formats().len(), 1);
    }
}
