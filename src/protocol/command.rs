//! Command decoding and response encoding

use crate::types::{Event, EVENT_DEFINITION};

use super::split_fields;

/// Command tag for queries
pub const GET_NEXT_EVENTS: &str = "GET_NEXT_EVENTS";

/// Tag that prefixes a query response
pub const EVENTS: &str = "EVENTS";

/// A decoded request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `EVENT_DEFINITION;<timestamp>;<description>;<group>`
    ///
    /// Fields are not validated here; that happens when the store drains its
    /// pending queue.
    DefineEvent { fields: Vec<String>, line: String },

    /// `GET_NEXT_EVENTS;<unused>;<timestamp>`
    GetNextEvents { since: String },

    /// Anything else, echoed back
    Unrecognized { line: String },
}

impl Command {
    /// Decode one framed message
    pub fn parse(line: &str) -> Self {
        let fields = split_fields(line);

        match fields.first().map(String::as_str) {
            Some(EVENT_DEFINITION) => Command::DefineEvent {
                fields,
                line: line.to_string(),
            },
            Some(GET_NEXT_EVENTS) if fields.len() >= 3 => Command::GetNextEvents {
                since: fields[2].clone(),
            },
            _ => Command::Unrecognized {
                line: line.to_string(),
            },
        }
    }
}

/// A response ready to be written to the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// `ok;<original message>`
    Ack(String),

    /// `EVENTS;<count>;<event>;<event>...`
    Events(Vec<String>),
}

impl Response {
    pub fn ack(line: impl Into<String>) -> Self {
        Response::Ack(line.into())
    }

    pub fn events<'a>(events: impl IntoIterator<Item = &'a Event>) -> Self {
        Response::Events(events.into_iter().map(Event::to_line).collect())
    }

    /// Wire form, newline terminated
    pub fn encode(&self) -> String {
        match self {
            Response::Ack(line) => format!("ok;{}\n", line),
            Response::Events(lines) => {
                let mut out = format!("{};{}", EVENTS, lines.len());
                for line in lines {
                    out.push(';');
                    out.push_str(line);
                }
                out.push('\n');
                out
            }
        }
    }
}
