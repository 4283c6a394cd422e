//! Persistence worker
//!
//! A dedicated thread that periodically drains the store's pending queue and
//! rewrites the backing file when something changed.

use std::io;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, error, info};

use crate::error::EventLogResult;

use super::{EventFile, EventStore};

/// Default pause between drain cycles
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_millis(100);

/// Drains the pending queue and keeps the backing file in sync
pub struct PersistenceWorker {
    store: Arc<EventStore>,
    file: EventFile,
    interval: Duration,
    /// Set when a rewrite failed and must be retried
    dirty: bool,
}

impl PersistenceWorker {
    pub fn new(store: Arc<EventStore>, file: EventFile) -> Self {
        Self::with_interval(store, file, DEFAULT_FLUSH_INTERVAL)
    }

    pub fn with_interval(store: Arc<EventStore>, file: EventFile, interval: Duration) -> Self {
        Self {
            store,
            file,
            interval,
            dirty: false,
        }
    }

    /// Run one drain cycle.
    ///
    /// Returns `Ok(true)` when the backing file was rewritten. On a failed
    /// rewrite the worker stays dirty and the next cycle tries again.
    pub fn run_cycle(&mut self) -> EventLogResult<bool> {
        let report = self.store.apply_pending();
        if report.added + report.duplicates + report.rejected > 0 {
            debug!(
                added = report.added,
                duplicates = report.duplicates,
                rejected = report.rejected,
                "Applied pending events"
            );
        }

        if !(report.changed() || self.dirty) {
            return Ok(false);
        }

        self.dirty = true;
        let events = self.store.snapshot();
        self.file.save(&events)?;
        self.dirty = false;

        debug!(events = events.len(), path = %self.file.path().display(), "Flushed event file");
        Ok(true)
    }

    /// Start the worker on its own thread.
    ///
    /// The idle wait between cycles doubles as the stop check: a stop request
    /// ends the wait early, then one final cycle runs before the thread exits.
    pub fn spawn(mut self) -> io::Result<WorkerHandle> {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        let thread = thread::Builder::new()
            .name("eventlog-persistence".to_string())
            .spawn(move || {
                info!(interval_ms = self.interval.as_millis() as u64, "Persistence worker started");
                loop {
                    self.cycle_logged();
                    match stop_rx.recv_timeout(self.interval) {
                        Err(RecvTimeoutError::Timeout) => continue,
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                self.cycle_logged();
                info!("Persistence worker stopped");
            })?;

        Ok(WorkerHandle {
            stop_tx: Some(stop_tx),
            thread: Some(thread),
        })
    }

    fn cycle_logged(&mut self) {
        if let Err(e) = self.run_cycle() {
            error!(error = %e, "Failed to flush event file");
        }
    }
}

/// Handle to a running [`PersistenceWorker`]
pub struct WorkerHandle {
    stop_tx: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl WorkerHandle {
    /// Signal the worker to stop and wait for its final flush
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        // Dropping the sender also wakes the worker
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("Persistence worker panicked");
            }
        }
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
