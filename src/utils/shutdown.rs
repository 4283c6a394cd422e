//! Cooperative shutdown flag shared between the server loop and signal handlers

use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;

/// Cloneable shutdown flag.
///
/// The server loop checks [`ShutdownSignal::is_triggered`] at the top of every
/// iteration and also waits on [`ShutdownSignal::triggered`] so that a trigger
/// wakes a blocked readiness wait.
#[derive(Clone, Debug)]
pub struct ShutdownSignal {
    tx: Arc<watch::Sender<bool>>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Request shutdown. Idempotent.
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once [`trigger`](Self::trigger) has been called
    pub async fn triggered(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives as long as `self`, so this only returns once the flag is set
        let _ = rx.wait_for(|triggered| *triggered).await;
    }

    /// Trigger this signal on Ctrl+C / SIGTERM
    pub fn install_ctrlc_handler(&self) -> Result<(), ctrlc::Error> {
        let signal = self.clone();
        ctrlc::set_handler(move || {
            info!("Shutdown requested");
            signal.trigger();
        })
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}
