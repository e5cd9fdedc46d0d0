//! Date, datetime and time formatting
//!
//! Formatters are strftime-style patterns. The reserved [`ISO_FORMAT`] name
//! selects ISO-8601 text instead of pattern-based formatting and a lenient
//! ISO parser on input.

use std::fmt::Write;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::{ModelError, Result};

/// Reserved formatter name selecting ISO-8601
pub const ISO_FORMAT: &str = "ISO_FORMAT";

/// Default formatter of date fields
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";

/// Default formatter of datetime fields
pub const DEFAULT_DATETIME_FORMAT: &str = ISO_FORMAT;

/// Default formatter of time fields
pub const DEFAULT_TIME_FORMAT: &str = "%H:%M:%S";

const ISO_DATETIME_PATTERNS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const ISO_TIME_PATTERNS: &[&str] = &["%H:%M:%S%.f", "%H:%M"];

fn render(formatter: &str, display: impl std::fmt::Display) -> Result<String> {
    let mut out = String::new();
    write!(out, "{display}").map_err(|_| ModelError::InvalidFormatter {
        formatter: formatter.to_string(),
        reason: "unsupported pattern".to_string(),
    })?;
    Ok(out)
}

/// Format a date
///
/// # Errors
/// Returns [`ModelError::InvalidFormatter`] for an unusable pattern
pub fn format_date(value: NaiveDate, formatter: &str) -> Result<String> {
    if formatter == ISO_FORMAT {
        return Ok(value.format("%Y-%m-%d").to_string());
    }
    render(formatter, value.format(formatter))
}

/// Format a datetime
///
/// # Errors
/// Returns [`ModelError::InvalidFormatter`] for an unusable pattern
pub fn format_datetime(value: NaiveDateTime, formatter: &str) -> Result<String> {
    if formatter == ISO_FORMAT {
        return Ok(iso_datetime(value));
    }
    render(formatter, value.format(formatter))
}

/// ISO 8601 text of a datetime, omitting a zero fraction
pub(crate) fn iso_datetime(value: NaiveDateTime) -> String {
    value.format("%Y-%m-%dT%H:%M:%S%.f").to_string()
}

/// Format a time of day
///
/// # Errors
/// Returns [`ModelError::InvalidFormatter`] for an unusable pattern
pub fn format_time(value: NaiveTime, formatter: &str) -> Result<String> {
    if formatter == ISO_FORMAT {
        return Ok(value.format("%H:%M:%S%.f").to_string());
    }
    render(formatter, value.format(formatter))
}

fn parse_failure(text: &str, target: &str, reason: impl ToString) -> ModelError {
    ModelError::conversion(text, target, reason.to_string())
}

/// Lenient ISO-8601 datetime parsing
///
/// Offsets are accepted and dropped, keeping the wall-clock time. A bare date
/// parses as midnight.
///
/// # Errors
/// Returns [`ModelError::Conversion`] if no ISO shape matches
pub fn parse_iso_datetime(text: &str) -> Result<NaiveDateTime> {
    let text = text.trim();
    if let Ok(aware) = DateTime::parse_from_rfc3339(text) {
        return Ok(aware.naive_local());
    }
    for pattern in ISO_DATETIME_PATTERNS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(text, pattern) {
            return Ok(parsed);
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .map(|date| date.and_time(NaiveTime::MIN))
        .map_err(|e| parse_failure(text, "datetime", e))
}

/// Parse a date with a formatter
///
/// # Errors
/// Returns [`ModelError::Conversion`] if the text does not match
pub fn parse_date(text: &str, formatter: &str) -> Result<NaiveDate> {
    if formatter == ISO_FORMAT {
        return NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
            .or_else(|_| parse_iso_datetime(text).map(|dt| dt.date()));
    }
    NaiveDate::parse_from_str(text, formatter)
        .or_else(|_| NaiveDateTime::parse_from_str(text, formatter).map(|dt| dt.date()))
        .map_err(|e| parse_failure(text, "date", e))
}

/// Parse a datetime with a formatter, falling back to ISO-8601
///
/// # Errors
/// Returns [`ModelError::Conversion`] if neither the pattern nor ISO matches
pub fn parse_datetime(text: &str, formatter: &str) -> Result<NaiveDateTime> {
    if formatter != ISO_FORMAT {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(text, formatter) {
            return Ok(parsed);
        }
    }
    parse_iso_datetime(text)
}

/// Parse a time of day with a formatter
///
/// # Errors
/// Returns [`ModelError::Conversion`] if the text does not match
pub fn parse_time(text: &str, formatter: &str) -> Result<NaiveTime> {
    if formatter == ISO_FORMAT {
        let text = text.trim();
        return ISO_TIME_PATTERNS
            .iter()
            .find_map(|pattern| NaiveTime::parse_from_str(text, pattern).ok())
            .ok_or_else(|| parse_failure(text, "time", "not an ISO-8601 time"));
    }
    NaiveTime::parse_from_str(text, formatter)
        .or_else(|_| NaiveDateTime::parse_from_str(text, formatter).map(|dt| dt.time()))
        .map_err(|e| parse_failure(text, "time", e))
}
