//! Event record
//!
//! An `Event` is an immutable, validated record. Identity is the raw
//! (group, description, timestamp) triple, so two events with the same
//! instant but differently written timestamps are distinct.

use std::fmt;

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::utils::time::parse_timestamp;

/// Command tag that prefixes a canonical event line
pub const EVENT_DEFINITION: &str = "EVENT_DEFINITION";

/// Number of fields in an `EVENT_DEFINITION` record, including the tag
pub const EVENT_FIELD_COUNT: usize = 4;

/// Why a raw field tuple could not become an [`Event`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventParseError {
    #[error("expected at least 4 fields, found {0}")]
    TooFewFields(usize),

    #[error("invalid timestamp {0:?}")]
    InvalidTimestamp(String),
}

/// A stored event
#[derive(Debug, Clone)]
pub struct Event {
    group: String,
    description: String,
    timestamp: String,
    instant: NaiveDateTime,
}

impl Event {
    /// Build an event from a raw `EVENT_DEFINITION` field tuple.
    ///
    /// Field 0 is the command tag and is not checked here; fields 1..=3 are
    /// timestamp, description and group. Extra fields are ignored.
    pub fn from_fields<S: AsRef<str>>(fields: &[S]) -> Result<Self, EventParseError> {
        if fields.len() < EVENT_FIELD_COUNT {
            return Err(EventParseError::TooFewFields(fields.len()));
        }

        let timestamp = fields[1].as_ref();
        let instant = parse_timestamp(timestamp)
            .map_err(|_| EventParseError::InvalidTimestamp(timestamp.to_string()))?;

        Ok(Self {
            group: fields[3].as_ref().to_string(),
            description: fields[2].as_ref().to_string(),
            timestamp: timestamp.to_string(),
            instant,
        })
    }

    /// Build an event from its parts
    pub fn new(
        timestamp: impl Into<String>,
        description: impl Into<String>,
        group: impl Into<String>,
    ) -> Result<Self, EventParseError> {
        let timestamp = timestamp.into();
        let instant = parse_timestamp(&timestamp)
            .map_err(|_| EventParseError::InvalidTimestamp(timestamp.clone()))?;

        Ok(Self {
            group: group.into(),
            description: description.into(),
            timestamp,
            instant,
        })
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// The timestamp exactly as it was received
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn instant(&self) -> NaiveDateTime {
        self.instant
    }

    /// Strictly later than `instant`
    pub fn is_after(&self, instant: &NaiveDateTime) -> bool {
        self.instant > *instant
    }

    /// Canonical line: `EVENT_DEFINITION;<timestamp>;<description>;<group>`
    pub fn to_line(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{};{};{};{}",
            EVENT_DEFINITION, self.timestamp, self.description, self.group
        )
    }
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.group == other.group
            && self.description == other.description
            && self.timestamp == other.timestamp
    }
}

impl Eq for Event {}
