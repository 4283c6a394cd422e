//! Error types for the event log

use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while starting or running the event log
#[derive(Debug, Error)]
pub enum EventLogError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// No backing file was configured
    #[error("no database file specified")]
    MissingDatabaseFile,

    /// A setting is out of range
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to bind {transport} socket on {addr}: {source}")]
    Bind {
        transport: &'static str,
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("failed to load event file {path}: {source}")]
    LoadEvents {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write event file {path}: {source}")]
    SaveEvents {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Result type for event log operations
pub type EventLogResult<T> = Result<T, EventLogError>;
