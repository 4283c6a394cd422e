//! Time and timestamp utilities
//!
//! Event timestamps travel as text in a fixed pattern such as
//! `2024-01-01:09h00m00s000Z`. The hour field is read as 24-hour time and
//! the trailing `Z` is a literal: instants are naive, no time zone applies.

use chrono::{Local, NaiveDateTime};

/// chrono format string for `YYYY-MM-DD:hhHmmMssSsssZ`
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d:%Hh%Mm%Ss%3fZ";

/// Parse a wire timestamp into a comparable instant
pub fn parse_timestamp(text: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT)
}

/// Render an instant in the wire timestamp format
pub fn format_timestamp(instant: &NaiveDateTime) -> String {
    instant.format(TIMESTAMP_FORMAT).to_string()
}

/// Current local wall-clock time in the wire timestamp format
pub fn current_timestamp() -> String {
    format_timestamp(&Local::now().naive_local())
}
