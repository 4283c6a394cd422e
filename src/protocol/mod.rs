//! Wire protocol
//!
//! Requests are `;`-separated ASCII text, one message per read, terminated by
//! `%` or a newline. The same line format is used for the backing file.

mod command;
mod framing;

pub use command::{Command, Response, EVENTS, GET_NEXT_EVENTS};
pub use framing::{frame_message, has_terminator, MAX_MESSAGE_LEN, MESSAGE_TERMINATOR};

/// Split a line on `;`.
///
/// Trailing empty fields are dropped, but at least one field is always
/// returned, so `""` yields `[""]`.
pub fn split_fields(line: &str) -> Vec<String> {
    let mut fields: Vec<&str> = line.split(';').collect();
    while fields.len() > 1 && fields.last().is_some_and(|f| f.is_empty()) {
        fields.pop();
    }
    fields.into_iter().map(str::to_string).collect()
}
