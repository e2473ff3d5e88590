//! Typed parsing of raw incident fields.
//!
//! Each parser takes an already-trimmed, non-missing value and returns a
//! [`ParseError`] naming the column and the offending value on failure. The
//! cleaner turns these errors into row removals.

use chrono::{NaiveDate, NaiveTime};
use nypd_shootings_incident_models::Column;

/// A single field that could not be converted to its expected type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot parse {column} value '{value}': {reason}")]
pub struct ParseError {
    /// Column the value came from.
    pub column: Column,
    /// The raw value.
    pub value: String,
    /// Why it was rejected.
    pub reason: String,
}

impl ParseError {
    fn new(column: Column, value: &str, reason: impl Into<String>) -> Self {
        Self {
            column,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// Fallback time formats tried after the configured one.
const TIME_FALLBACKS: &[&str] = &["%H:%M:%S", "%H:%M"];

/// Whether `value` counts as missing: empty, or equal to one of
/// `null_tokens` ignoring ASCII case.
#[must_use]
pub fn is_missing(value: &str, null_tokens: &[String]) -> bool {
    let value = value.trim();
    value.is_empty() || null_tokens.iter().any(|t| t.eq_ignore_ascii_case(value))
}

/// Parses an occurrence date with the configured `format` (e.g. `%m/%d/%Y`).
///
/// # Errors
///
/// Returns [`ParseError`] if the value does not match `format`.
pub fn parse_date(value: &str, format: &str) -> Result<NaiveDate, ParseError> {
    NaiveDate::parse_from_str(value, format)
        .map_err(|e| ParseError::new(Column::OccurDate, value, format!("{e} (expected {format})")))
}

/// Parses an occurrence time with the configured `format`, falling back to
/// `HH:MM:SS` and `HH:MM`.
///
/// # Errors
///
/// Returns [`ParseError`] if no format matches.
pub fn parse_time(value: &str, format: &str) -> Result<NaiveTime, ParseError> {
    std::iter::once(format)
        .chain(TIME_FALLBACKS.iter().copied())
        .find_map(|fmt| NaiveTime::parse_from_str(value, fmt).ok())
        .ok_or_else(|| ParseError::new(Column::OccurTime, value, format!("expected {format}")))
}

/// Parses a latitude or longitude. Rejects non-finite values, values out of
/// range for the axis, and exact zero (a placeholder in many city feeds).
///
/// # Errors
///
/// Returns [`ParseError`] if the value is not a usable coordinate.
pub fn parse_coordinate(value: &str, column: Column) -> Result<f64, ParseError> {
    let limit = match column {
        Column::Latitude => 90.0,
        Column::Longitude => 180.0,
        other => {
            return Err(ParseError::new(other, value, "not a coordinate column"));
        }
    };

    let parsed = value
        .parse::<f64>()
        .map_err(|e| ParseError::new(column, value, e.to_string()))?;

    if !parsed.is_finite() || parsed.abs() > limit {
        return Err(ParseError::new(column, value, format!("outside ±{limit}")));
    }
    if parsed == 0.0 {
        return Err(ParseError::new(column, value, "zero coordinate"));
    }

    Ok(parsed)
}

/// Parses the statistical murder flag. Accepts `true`/`false`, `t`/`f`,
/// `y`/`n`, `yes`/`no` and `1`/`0`, ignoring ASCII case.
///
/// # Errors
///
/// Returns [`ParseError`] for any other value.
pub fn parse_murder_flag(value: &str) -> Result<bool, ParseError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "t" | "y" | "yes" | "1" => Ok(true),
        "false" | "f" | "n" | "no" | "0" => Ok(false),
        _ => Err(ParseError::new(
            Column::StatisticalMurderFlag,
            value,
            "expected a boolean",
        )),
    }
}
