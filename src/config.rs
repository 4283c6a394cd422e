//! Server configuration
//!
//! Values come from built-in defaults, optionally overlaid by a TOML file;
//! the binary then applies environment and command-line overrides.

use std::fs;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{EventLogError, EventLogResult};
use crate::protocol::MAX_MESSAGE_LEN;

/// Default port for both transports
pub const DEFAULT_PORT: u16 = 40408;

/// Configuration for the event log server
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Address both sockets bind to
    pub bind_address: IpAddr,
    /// Port shared by the TCP listener and the UDP socket
    pub port: u16,
    /// Backing file for the event store (required to start)
    pub database_file: Option<PathBuf>,
    /// Pause between persistence cycles
    pub flush_interval_ms: u64,
    /// Upper bound on a single readiness wait
    pub poll_timeout_ms: u64,
    /// Framing scan window, in bytes
    pub max_message_len: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            database_file: None,
            flush_interval_ms: 100,
            poll_timeout_ms: 15_000,
            max_message_len: MAX_MESSAGE_LEN,
        }
    }
}

impl ServerConfig {
    /// Parse a TOML document; missing keys keep their defaults
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load a TOML config file
    pub fn load<P: AsRef<Path>>(path: P) -> EventLogResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| EventLogError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content).map_err(|source| EventLogError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the server cannot run with
    pub fn validate(&self) -> EventLogResult<()> {
        if self.max_message_len == 0 {
            return Err(EventLogError::InvalidConfig(
                "max_message_len must be greater than 0".to_string(),
            ));
        }
        if self.flush_interval_ms == 0 {
            return Err(EventLogError::InvalidConfig(
                "flush_interval_ms must be greater than 0".to_string(),
            ));
        }
        if self.poll_timeout_ms == 0 {
            return Err(EventLogError::InvalidConfig(
                "poll_timeout_ms must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Address both sockets bind to
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }

    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms)
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }

    /// The backing file, or [`EventLogError::MissingDatabaseFile`]
    pub fn require_database_file(&self) -> EventLogResult<&Path> {
        self.database_file
            .as_deref()
            .ok_or(EventLogError::MissingDatabaseFile)
    }
}
