//! Event Store Module
//!
//! This module provides the storage side of the event log:
//! - `EventStore`: in-memory event sequence plus the pending-write queue
//! - `EventFile`: the line-oriented backing file
//! - `PersistenceWorker`: background thread that merges and flushes
//!
//! # Architecture
//!
//! ```text
//! Write Path:
//! ┌──────────┐    ┌───────────┐    ┌──────────────────┐    ┌──────────────┐
//! │ TCP/UDP  │───►│ enqueue() │───►│ apply_pending()  │───►│ rewrite file │
//! │ request  │    │ (pending) │    │ validate, dedupe │    │ if changed   │
//! └──────────┘    └───────────┘    └──────────────────┘    └──────────────┘
//!                                   persistence worker, every 100ms
//!
//! Read Path:
//! ┌──────────┐    ┌────────────────┐
//! │ TCP/UDP  │───►│ query_after()  │───► events in insertion order
//! │ request  │    │ (applied only) │
//! └──────────┘    └────────────────┘
//! ```

mod file;
mod store;
mod worker;

pub use file::EventFile;
pub use store::{DrainReport, EventStore};
pub use worker::{PersistenceWorker, WorkerHandle, DEFAULT_FLUSH_INTERVAL};
