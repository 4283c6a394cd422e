//! Request dispatch shared by the stream and datagram transports

use std::sync::Arc;

use crate::event_store::EventStore;
use crate::protocol::{frame_message, Command, Response};

/// Turns one received buffer into one response.
///
/// Both transports go through [`CommandHandler::handle`], so identical request
/// bytes produce identical responses regardless of how they arrived.
#[derive(Debug, Clone)]
pub struct CommandHandler {
    store: Arc<EventStore>,
    max_message_len: usize,
}

impl CommandHandler {
    pub fn new(store: Arc<EventStore>, max_message_len: usize) -> Self {
        Self {
            store,
            max_message_len,
        }
    }

    pub fn max_message_len(&self) -> usize {
        self.max_message_len
    }

    /// Frame, decode and execute one request.
    ///
    /// Returns the framed message (for logging) and the encoded response.
    pub fn handle(&self, raw: &[u8]) -> (String, String) {
        let line = frame_message(raw, self.max_message_len);
        let response = self.dispatch(Command::parse(&line));
        (line, response.encode())
    }

    /// Execute a decoded command.
    ///
    /// Event definitions are acknowledged as soon as they are queued; the
    /// store validates them later and silently drops malformed ones.
    pub fn dispatch(&self, command: Command) -> Response {
        match command {
            Command::DefineEvent { fields, line } => {
                self.store.enqueue(fields);
                Response::ack(line)
            }
            Command::GetNextEvents { since } => {
                Response::events(&self.store.query_after(&since))
            }
            Command::Unrecognized { line } => Response::ack(line),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::MAX_MESSAGE_LEN;

    fn handler() -> (CommandHandler, Arc<EventStore>) {
        let store = Arc::new(EventStore::new());
        (CommandHandler::new(Arc::clone(&store), MAX_MESSAGE_LEN), store)
    }

    #[test]
    fn test_event_definition_is_acked_and_queued() {
        let (handler, store) = handler();
        let (line, response) =
            handler.handle(b"EVENT_DEFINITION;2024-01-01:09h00m00s000Z;deploy;infra\n");

        assert_eq!(line, "EVENT_DEFINITION;2024-01-01:09h00m00s000Z;deploy;infra");
        assert_eq!(
            response,
            "ok;EVENT_DEFINITION;2024-01-01:09h00m00s000Z;deploy;infra\n"
        );
        assert_eq!(store.pending_len(), 1);
    }

    #[test]
    fn test_malformed_definition_still_acked() {
        let (handler, store) = handler();
        let (_, response) = handler.handle(b"EVENT_DEFINITION;tomorrow;deploy;infra%");

        assert_eq!(response, "ok;EVENT_DEFINITION;tomorrow;deploy;infra\n");
        let report = store.apply_pending();
        assert_eq!(report.rejected, 1);
        assert!(store.is_empty());
    }

    #[test]
    fn test_query_response() {
        let (handler, store) = handler();
        handler.handle(b"EVENT_DEFINITION;2024-01-01:09h00m00s000Z;deploy;infra\n");
        handler.handle(b"EVENT_DEFINITION;2024-02-01:09h00m00s000Z;login;web\n");

        // Not applied yet
        let (_, response) = handler.handle(b"GET_NEXT_EVENTS;;2023-12-31:00h00m00s000Z\n");
        assert_eq!(response, "EVENTS;0\n");

        store.apply_pending();
        let (_, response) = handler.handle(b"GET_NEXT_EVENTS;;2024-01-15:00h00m00s000Z\n");
        assert_eq!(
            response,
            "EVENTS;1;EVENT_DEFINITION;2024-02-01:09h00m00s000Z;login;web\n"
        );
    }

    #[test]
    fn test_malformed_query_returns_empty_set() {
        let (handler, store) = handler();
        handler.handle(b"EVENT_DEFINITION;2024-01-01:09h00m00s000Z;deploy;infra\n");
        store.apply_pending();

        let (_, response) = handler.handle(b"GET_NEXT_EVENTS;x;last tuesday\n");
        assert_eq!(response, "EVENTS;0\n");
    }

    #[test]
    fn test_unrecognized_is_echoed() {
        let (handler, store) = handler();
        let (_, response) = handler.handle(b"Hello World\n\n");
        assert_eq!(response, "ok;Hello World\n");
        assert_eq!(store.pending_len(), 0);
    }

    #[test]
    fn test_window_limits_message() {
        let store = Arc::new(EventStore::new());
        let handler = CommandHandler::new(store, 5);
        let (line, response) = handler.handle(b"abcdefghij");
        assert_eq!(line, "abcde");
        assert_eq!(response, "ok;abcde\n");
    }
}
