//! Event Store - in-memory event sequence with a pending-write queue
//!
//! Network-facing code only ever calls [`EventStore::enqueue`] and
//! [`EventStore::query_after`]. Validation, deduplication and appending happen
//! in [`EventStore::apply_pending`], which only the persistence worker calls.

use std::collections::VecDeque;

use chrono::NaiveDateTime;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::types::Event;
use crate::utils::time::parse_timestamp;

/// Outcome of one drain of the pending queue
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// New events appended to the sequence
    pub added: usize,
    /// Well-formed events that were already stored
    pub duplicates: usize,
    /// Tuples that did not parse into an event
    pub rejected: usize,
}

impl DrainReport {
    /// Whether the sequence changed
    pub fn changed(&self) -> bool {
        self.added > 0
    }
}

#[derive(Debug, Default)]
struct StoreState {
    events: Vec<Event>,
    pending: VecDeque<Vec<String>>,
}

/// Thread-safe event store.
///
/// One lock guards both the sequence and the queue. A drain holds it for the
/// whole batch, so a concurrent query sees the sequence either before or after
/// the batch, never halfway through it.
#[derive(Debug, Default)]
pub struct EventStore {
    state: Mutex<StoreState>,
}

impl EventStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store hydrated with already-validated events, in order
    pub fn with_events(events: Vec<Event>) -> Self {
        Self {
            state: Mutex::new(StoreState {
                events,
                pending: VecDeque::new(),
            }),
        }
    }

    /// Queue a raw `EVENT_DEFINITION` field tuple. No validation happens here.
    pub fn enqueue(&self, fields: Vec<String>) {
        self.state.lock().pending.push_back(fields);
    }

    /// Every stored event strictly later than `timestamp`, in insertion order.
    ///
    /// A malformed `timestamp` yields an empty result.
    pub fn query_after(&self, timestamp: &str) -> Vec<Event> {
        match parse_timestamp(timestamp) {
            Ok(instant) => self.query_after_instant(&instant),
            Err(e) => {
                debug!(timestamp, error = %e, "Rejecting query with malformed timestamp");
                Vec::new()
            }
        }
    }

    /// Every stored event strictly later than `instant`, in insertion order
    pub fn query_after_instant(&self, instant: &NaiveDateTime) -> Vec<Event> {
        self.state
            .lock()
            .events
            .iter()
            .filter(|event| event.is_after(instant))
            .cloned()
            .collect()
    }

    /// Drain the pending queue into the sequence.
    ///
    /// Tuples that fail to parse are dropped. Each parsed event is compared
    /// against the whole sequence before it is appended; this linear scan is
    /// O(n) per event and is the store's scalability ceiling.
    pub fn apply_pending(&self) -> DrainReport {
        let mut state = self.state.lock();
        let StoreState { events, pending } = &mut *state;
        let mut report = DrainReport::default();

        while let Some(fields) = pending.pop_front() {
            match Event::from_fields(&fields) {
                Ok(event) => {
                    if events.iter().any(|existing| existing == &event) {
                        report.duplicates += 1;
                    } else {
                        events.push(event);
                        report.added += 1;
                    }
                }
                Err(e) => {
                    warn!(record = %fields.join(";"), error = %e, "Dropping malformed event");
                    report.rejected += 1;
                }
            }
        }

        report
    }

    /// Copy of the current sequence, in insertion order
    pub fn snapshot(&self) -> Vec<Event> {
        self.state.lock().events.clone()
    }

    /// Number of stored events
    pub fn len(&self) -> usize {
        self.state.lock().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of queued, not yet applied tuples
    pub fn pending_len(&self) -> usize {
        self.state.lock().pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(line: &str) -> Vec<String> {
        line.split(';').map(str::to_string).collect()
    }

    fn store_with(lines: &[&str]) -> EventStore {
        let store = EventStore::new();
        for line in lines {
            store.enqueue(fields(line));
        }
        store.apply_pending();
        store
    }

    #[test]
    fn test_enqueue_is_invisible_until_applied() {
        let store = EventStore::new();
        store.enqueue(fields("EVENT_DEFINITION;2024-01-01:09h00m00s000Z;deploy;infra"));

        assert_eq!(store.pending_len(), 1);
        assert!(store.is_empty());
        assert!(store.query_after("2023-01-01:00h00m00s000Z").is_empty());

        let report = store.apply_pending();
        assert_eq!(report.added, 1);
        assert!(report.changed());
        assert_eq!(store.pending_len(), 0);
        assert_eq!(store.query_after("2023-01-01:00h00m00s000Z").len(), 1);
    }

    #[test]
    fn test_duplicate_events_stored_once() {
        let store = EventStore::new();
        store.enqueue(fields("EVENT_DEFINITION;2024-01-01:09h00m00s000Z;deploy;infra"));
        store.enqueue(fields("EVENT_DEFINITION;2024-01-01:09h00m00s000Z;deploy;infra"));

        let report = store.apply_pending();
        assert_eq!(report.added, 1);
        assert_eq!(report.duplicates, 1);
        assert_eq!(store.len(), 1);

        // Again in a later batch
        store.enqueue(fields("EVENT_DEFINITION;2024-01-01:09h00m00s000Z;deploy;infra"));
        let report = store.apply_pending();
        assert!(!report.changed());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_same_instant_different_fields_are_distinct() {
        let store = store_with(&[
            "EVENT_DEFINITION;2024-01-01:09h00m00s000Z;deploy;infra",
            "EVENT_DEFINITION;2024-01-01:09h00m00s000Z;deploy;web",
            "EVENT_DEFINITION;2024-01-01:09h00m00s000Z;rollback;infra",
        ]);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_malformed_events_dropped() {
        let store = EventStore::new();
        store.enqueue(fields("EVENT_DEFINITION;not-a-time;deploy;infra"));
        store.enqueue(fields("EVENT_DEFINITION;2024-01-01:09h00m00s000Z;deploy"));
        store.enqueue(fields("EVENT_DEFINITION;2024-01-01:09h00m00s000Z;deploy;infra"));

        let report = store.apply_pending();
        assert_eq!(report.rejected, 2);
        assert_eq!(report.added, 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_query_is_strictly_after() {
        let store = store_with(&["EVENT_DEFINITION;2024-01-01:09h00m00s000Z;deploy;infra"]);

        assert_eq!(store.query_after("2023-12-31:00h00m00s000Z").len(), 1);
        assert!(store.query_after("2024-01-01:09h00m00s000Z").is_empty());
        assert!(store.query_after("2024-06-01:00h00m00s000Z").is_empty());
    }

    #[test]
    fn test_query_preserves_insertion_order() {
        let store = store_with(&[
            "EVENT_DEFINITION;2024-03-01:00h00m00s000Z;third;a",
            "EVENT_DEFINITION;2024-01-01:00h00m00s000Z;first;a",
            "EVENT_DEFINITION;2024-02-01:00h00m00s000Z;second;a",
        ]);

        let descriptions: Vec<String> = store
            .query_after("2023-01-01:00h00m00s000Z")
            .iter()
            .map(|e| e.description().to_string())
            .collect();
        assert_eq!(descriptions, vec!["third", "first", "second"]);
    }

    #[test]
    fn test_query_monotonicity() {
        let store = store_with(&[
            "EVENT_DEFINITION;2024-01-01:00h00m00s000Z;a;g",
            "EVENT_DEFINITION;2024-02-01:00h00m00s000Z;b;g",
            "EVENT_DEFINITION;2024-03-01:00h00m00s000Z;c;g",
            "EVENT_DEFINITION;2024-04-01:00h00m00s000Z;d;g",
        ]);

        let bounds = [
            "2023-12-01:00h00m00s000Z",
            "2024-01-15:00h00m00s000Z",
            "2024-02-01:00h00m00s000Z",
            "2024-03-31:23h59m59s999Z",
            "2024-05-01:00h00m00s000Z",
        ];
        for pair in bounds.windows(2) {
            let earlier = store.query_after(pair[0]);
            let later = store.query_after(pair[1]);
            assert!(later.iter().all(|event| earlier.contains(event)));
            assert!(later.len() <= earlier.len());
        }
    }

    #[test]
    fn test_malformed_query_is_empty() {
        let store = store_with(&["EVENT_DEFINITION;2024-01-01:09h00m00s000Z;deploy;infra"]);
        assert!(store.query_after("garbage").is_empty());
        assert!(store.query_after("").is_empty());
    }

    #[test]
    fn test_with_events_hydrates() {
        let events = vec![
            Event::new("2024-01-01:09h00m00s000Z", "deploy", "infra").unwrap(),
            Event::new("2024-01-02:09h00m00s000Z", "deploy", "infra").unwrap(),
        ];
        let store = EventStore::with_events(events.clone());
        assert_eq!(store.snapshot(), events);

        // Hydrated events take part in dedupe
        store.enqueue(fields("EVENT_DEFINITION;2024-01-01:09h00m00s000Z;deploy;infra"));
        assert!(!store.apply_pending().changed());
    }
}
