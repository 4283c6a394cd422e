//! Data types for the event log

mod event;

pub use event::{Event, EventParseError, EVENT_DEFINITION, EVENT_FIELD_COUNT};
