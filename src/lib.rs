//! Event Log Server
//!
//! A small network event log. Clients submit timestamped events over TCP or
//! UDP on one shared port and query every event recorded after a given
//! timestamp.
//!
//! # Modules
//!
//! - `protocol`: message framing, command decoding, response encoding
//! - `types`: the `Event` record
//! - `event_store`: in-memory store, backing file, persistence worker
//! - `server`: the single-loop TCP + UDP multiplexer
//! - `config`: server configuration
//! - `client`: blocking demonstration client
//! - `utils`: timestamps and the shutdown signal
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use eventlog::{EventFile, EventLogServer, EventStore, PersistenceWorker, ServerConfig};
//! use eventlog::utils::ShutdownSignal;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::default();
//!     let file = EventFile::new("events.db");
//!     let store = Arc::new(EventStore::with_events(file.load()?));
//!     let worker = PersistenceWorker::new(Arc::clone(&store), file).spawn()?;
//!
//!     let server = EventLogServer::bind(&config, store, ShutdownSignal::new()).await?;
//!     server.run().await?;
//!     worker.stop();
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod event_store;
pub mod protocol;
pub mod server;
pub mod types;
pub mod utils;

// Re-export commonly used items at crate root
pub use config::ServerConfig;
pub use error::{EventLogError, EventLogResult};
pub use event_store::{EventFile, EventStore, PersistenceWorker, WorkerHandle};
pub use protocol::{Command, Response};
pub use server::EventLogServer;
pub use types::{Event, EventParseError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
