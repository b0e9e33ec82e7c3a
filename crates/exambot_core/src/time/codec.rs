//! Exam date codec.
//!
//! # Responsibility
//! - Parse the user-facing `dd.mm.yyyy` form, day first, independent of locale.
//! - Format instants back into `dd.mm.yyyy`.
//! - Convert to and from the RFC 3339 form used only for persistence.
//!
//! # Invariants
//! - Only exactly two day digits, two month digits and four year digits
//!   separated by `.` are accepted.
//! - `parse_canonical(&to_canonical(x)) == x` for every stored instant.

use chrono::{DateTime, FixedOffset, NaiveDate, SecondsFormat};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// User-facing date layout, chrono syntax.
pub const DISPLAY_FORMAT: &str = "%d.%m.%Y";

static DISPLAY_DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([0-9]{2})\.([0-9]{2})\.([0-9]{4})$").expect("valid display date regex")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateCodecError {
    /// Input is not a real calendar date in `dd.mm.yyyy` form.
    InvalidFormat(String),
    /// Persisted value is not a valid RFC 3339 timestamp.
    InvalidCanonical(String),
}

impl Display for DateCodecError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidFormat(value) => {
                write!(f, "invalid date `{value}`; expected dd.mm.yyyy")
            }
            Self::InvalidCanonical(value) => {
                write!(f, "invalid persisted timestamp `{value}`")
            }
        }
    }
}

impl Error for DateCodecError {}

/// Parses `dd.mm.yyyy` into a calendar date.
///
/// Surrounding whitespace is not trimmed; `" 01.02.2027"` is rejected.
///
/// # Errors
/// - `InvalidFormat` when the shape does not match or the date does not
///   exist (e.g. `31.02.2027`).
pub fn parse_date(text: &str) -> Result<NaiveDate, DateCodecError> {
    let invalid = || DateCodecError::InvalidFormat(text.to_string());
    let captures = DISPLAY_DATE_RE.captures(text).ok_or_else(invalid)?;

    let day: u32 = captures[1].parse().map_err(|_| invalid())?;
    let month: u32 = captures[2].parse().map_err(|_| invalid())?;
    let year: i32 = captures[3].parse().map_err(|_| invalid())?;

    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)
}

/// Formats the local calendar date of `instant` as `dd.mm.yyyy`.
pub fn format_date(instant: &DateTime<FixedOffset>) -> String {
    instant.format(DISPLAY_FORMAT).to_string()
}

/// Serializes an instant into the canonical persisted form.
pub fn to_canonical(instant: &DateTime<FixedOffset>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, false)
}

/// Parses the canonical persisted form.
pub fn parse_canonical(text: &str) -> Result<DateTime<FixedOffset>, DateCodecError> {
    DateTime::parse_from_rfc3339(text)
        .map_err(|_| DateCodecError::InvalidCanonical(text.to_string()))
}
