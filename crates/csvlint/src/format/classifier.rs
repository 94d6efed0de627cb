//! Classification of single cell values into format categories.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

/// Format category of a non-empty cell value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Format {
    Numeric,
    Uri,
    /// `2020-01-31`
    DateDb,
    /// `31 Jan`
    DateShort,
    /// `31 Jan 2020`
    DateRfc822,
    /// `January 31, 2020`
    DateLong,
    /// `13:45`
    TimeHm,
    /// `13:45:30`
    TimeHms,
    /// `2020-01-31 13:45:30`
    DatetimeDb,
    /// `2020-01-31T13:45:30Z`
    DatetimeIso8601,
    /// `31 Jan 13:45`
    DatetimeShort,
    /// `January 31, 2020 13:45`
    DatetimeLong,
    String,
}

impl Format {
    /// The snake_case name used in reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Numeric => "numeric",
            Format::Uri => "uri",
            Format::DateDb => "date_db",
            Format::DateShort => "date_short",
            Format::DateRfc822 => "date_rfc822",
            Format::DateLong => "date_long",
            Format::TimeHm => "time_hm",
            Format::TimeHms => "time_hms",
            Format::DatetimeDb => "datetime_db",
            Format::DatetimeIso8601 => "datetime_iso8601",
            Format::DatetimeShort => "datetime_short",
            Format::DatetimeLong => "datetime_long",
            Format::String => "string",
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// PATTERNS
// =============================================================================

static NUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[-+]?\d*\.?\d+(?:[eE][-+]?\d+)?$").unwrap());

static URI_SCHEME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^https?:").unwrap());

/// What a date/time value is parsed into before being re-rendered.
#[derive(Debug, Clone, Copy)]
enum Temporal {
    Date,
    Time,
    DateTime,
    /// A date without a year; a leap year is supplied for parsing.
    YearlessDate,
    /// A date and time without a year.
    YearlessDateTime,
}

/// A date/time category: a cheap shape check plus a strict strftime format.
struct TemporalRule {
    format: Format,
    shape: Regex,
    strftime: &'static str,
    temporal: Temporal,
}

impl TemporalRule {
    fn new(format: Format, shape: &str, strftime: &'static str, temporal: Temporal) -> Self {
        Self {
            format,
            shape: Regex::new(shape).unwrap(),
            strftime,
            temporal,
        }
    }

    fn matches(&self, value: &str) -> bool {
        self.shape.is_match(value) && round_trips(value, self.strftime, self.temporal)
    }
}

/// Year supplied to yearless values so 29 Feb parses.
const PLACEHOLDER_YEAR: &str = "2000";

/// Checked in order; the first match wins.
static TEMPORAL_RULES: Lazy<Vec<TemporalRule>> = Lazy::new(|| {
    vec![
        TemporalRule::new(Format::DateDb, r"^\d{4}-\d{2}-\d{2}$", "%Y-%m-%d", Temporal::Date),
        TemporalRule::new(Format::DateShort, r"^\d{1,2} [A-Za-z]{3}$", "%-d %b", Temporal::YearlessDate),
        TemporalRule::new(Format::DateRfc822, r"^\d{1,2} [A-Za-z]{3} \d{4}$", "%-d %b %Y", Temporal::Date),
        TemporalRule::new(Format::DateLong, r"^[A-Za-z]+ \d{1,2}, \d{4}$", "%B %-d, %Y", Temporal::Date),
        TemporalRule::new(Format::TimeHm, r"^\d{2}:\d{2}$", "%H:%M", Temporal::Time),
        TemporalRule::new(Format::TimeHms, r"^\d{2}:\d{2}:\d{2}$", "%H:%M:%S", Temporal::Time),
        TemporalRule::new(
            Format::DatetimeDb,
            r"^\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}$",
            "%Y-%m-%d %H:%M:%S",
            Temporal::DateTime,
        ),
        TemporalRule::new(
            Format::DatetimeIso8601,
            r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}Z$",
            "%Y-%m-%dT%H:%M:%SZ",
            Temporal::DateTime,
        ),
        TemporalRule::new(
            Format::DatetimeShort,
            r"^\d{2} [A-Za-z]{3} \d{2}:\d{2}$",
            "%d %b %H:%M",
            Temporal::YearlessDateTime,
        ),
        TemporalRule::new(
            Format::DatetimeLong,
            r"^[A-Za-z]+ \d{2}, \d{4} \d{2}:\d{2}$",
            "%B %d, %Y %H:%M",
            Temporal::DateTime,
        ),
    ]
});

/// Parse `value` with `strftime`, render it back and require exact equality.
fn round_trips(value: &str, strftime: &str, temporal: Temporal) -> bool {
    let rendered = match temporal {
        Temporal::Date => NaiveDate::parse_from_str(value, strftime)
            .map(|d| d.format(strftime).to_string()),
        Temporal::Time => NaiveTime::parse_from_str(value, strftime)
            .map(|t| t.format(strftime).to_string()),
        Temporal::DateTime => NaiveDateTime::parse_from_str(value, strftime)
            .map(|dt| dt.format(strftime).to_string()),
        Temporal::YearlessDate => NaiveDate::parse_from_str(
            &format!("{} {}", value, PLACEHOLDER_YEAR),
            &format!("{} %Y", strftime),
        )
        .map(|d| d.format(strftime).to_string()),
        Temporal::YearlessDateTime => NaiveDateTime::parse_from_str(
            &format!("{} {}", value, PLACEHOLDER_YEAR),
            &format!("{} %Y", strftime),
        )
        .map(|dt| dt.format(strftime).to_string()),
    };

    matches!(rendered, Ok(ref s) if s == value)
}

/// Assigns exactly one [`Format`] to a non-empty cell value.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatClassifier;

impl FormatClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Classify a value. Rules are tried in a fixed order; `String` is the fallback.
    pub fn classify(&self, value: &str) -> Format {
        if NUMERIC.is_match(value.trim()) {
            return Format::Numeric;
        }
        if is_http_uri(value) {
            return Format::Uri;
        }
        TEMPORAL_RULES
            .iter()
            .find(|rule| rule.matches(value))
            .map(|rule| rule.format)
            .unwrap_or(Format::String)
    }
}

/// An `http:`/`https:` prefix alone is not enough; the value must parse.
fn is_http_uri(value: &str) -> bool {
    if !URI_SCHEME.is_match(value) {
        return false;
    }
    match Url::parse(value) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host().is_some(),
        Err(_) => false,
    }
}
