//! Value typing for literal (non-formula) cell input.
//!
//! Every cell carries a declared [`DataType`]. When a literal is committed,
//! [`classify`] checks it against the declared type and returns the effective
//! [`ValueKind`] that was actually stored, or the reason it was rejected.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write};
use thiserror::Error;

/// Declared type intent for a cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Text,
    Number,
    Date,
    #[default]
    Auto,
}

/// Effective type of a stored value after classification.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    #[default]
    Text,
    Number,
    Date,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Text => "text",
            DataType::Number => "number",
            DataType::Date => "date",
            DataType::Auto => "auto",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for DataType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(DataType::Text),
            "number" => Ok(DataType::Number),
            "date" => Ok(DataType::Date),
            "auto" => Ok(DataType::Auto),
            other => Err(format!("Unknown data type: {}", other)),
        }
    }
}

/// Why a literal was refused for its declared type.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Value must be a number")]
    NotANumber,

    #[error("Value must be a valid date")]
    NotADate,
}

/// Strict numeric parse: surrounding whitespace is ignored, but empty or
/// whitespace-only input, `inf` and `NaN` are not numbers.
pub fn parse_number(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%d %B %Y",
    "%B %d, %Y",
    "%B %d %Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Parse a calendar date, dropping any time-of-day component.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, fmt) {
            return Some(date);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(dt.date());
        }
    }
    DateTime::parse_from_rfc3339(trimmed)
        .ok()
        .map(|dt| dt.date_naive())
}

/// Check `value` against the declared type and return the effective kind.
pub fn classify(value: &str, declared: DataType) -> Result<ValueKind, ValidationError> {
    match declared {
        DataType::Auto => {
            if parse_number(value).is_some() {
                Ok(ValueKind::Number)
            } else if parse_date(value).is_some() {
                Ok(ValueKind::Date)
            } else {
                Ok(ValueKind::Text)
            }
        }
        DataType::Number => parse_number(value)
            .map(|_| ValueKind::Number)
            .ok_or(ValidationError::NotANumber),
        DataType::Date => parse_date(value)
            .map(|_| ValueKind::Date)
            .ok_or(ValidationError::NotADate),
        DataType::Text => Ok(ValueKind::Text),
    }
}

/// Display form of a stored literal. Dates are rendered with `date_format`
/// (a chrono format string); everything else is shown as typed. An invalid
/// format string leaves the date as typed.
pub fn display_value(raw: &str, kind: ValueKind, date_format: &str) -> String {
    match kind {
        ValueKind::Date => match parse_date(raw) {
            Some(date) => {
                let mut out = String::new();
                match write!(out, "{}", date.format(date_format)) {
                    Ok(()) => out,
                    Err(_) => raw.to_string(),
                }
            }
            None => raw.to_string(),
        },
        ValueKind::Number | ValueKind::Text => raw.to_string(),
    }
}
