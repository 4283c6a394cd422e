//! Event Log Server - Binary Entry Point
//!
//! Loads configuration, hydrates the store from the backing file, starts the
//! persistence worker and runs the TCP + UDP server until Ctrl+C.

use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use eventlog::utils::ShutdownSignal;
use eventlog::{EventFile, EventLogServer, EventStore, PersistenceWorker, ServerConfig};

/// Event log server accepting TCP and UDP on one port
#[derive(Parser, Debug)]
#[command(name = "eventlog-server", author, version, about, long_about = None)]
struct Args {
    /// Port shared by TCP and UDP
    #[arg(short, long, env = "EVENTLOG_PORT")]
    port: Option<u16>,

    /// Backing file for stored events
    #[arg(short = 'f', long = "file", env = "EVENTLOG_FILE")]
    database_file: Option<PathBuf>,

    /// Address to bind
    #[arg(long, env = "EVENTLOG_BIND")]
    bind: Option<IpAddr>,

    /// Optional TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Milliseconds between persistence cycles
    #[arg(long)]
    flush_interval_ms: Option<u64>,

    /// Upper bound on one readiness wait, in milliseconds
    #[arg(long)]
    poll_timeout_ms: Option<u64>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    /// Layer command-line and environment values over the config file
    fn into_config(self) -> Result<ServerConfig> {
        let mut config = match &self.config {
            Some(path) => ServerConfig::load(path)?,
            None => ServerConfig::default(),
        };

        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(file) = self.database_file {
            config.database_file = Some(file);
        }
        if let Some(bind) = self.bind {
            config.bind_address = bind;
        }
        if let Some(ms) = self.flush_interval_ms {
            config.flush_interval_ms = ms;
        }
        if let Some(ms) = self.poll_timeout_ms {
            config.poll_timeout_ms = ms;
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                EnvFilter::new(format!(
                    "eventlog={level},eventlog_server={level}",
                    level = args.log_level
                ))
            }),
        )
        .with_target(true)
        .init();

    let config = args.into_config()?;
    // Checked before any socket is opened
    let path = config.require_database_file()?.to_path_buf();

    info!(version = eventlog::VERSION, "Starting event log server");

    let file = EventFile::new(&path);
    let events = file.load()?;
    info!(events = events.len(), path = %path.display(), "Loaded event file");

    let store = Arc::new(EventStore::with_events(events));
    let worker = PersistenceWorker::with_interval(Arc::clone(&store), file, config.flush_interval())
        .spawn()
        .context("failed to start persistence worker")?;

    let shutdown = ShutdownSignal::new();
    shutdown
        .install_ctrlc_handler()
        .context("failed to install Ctrl+C handler")?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build runtime")?;

    let result = runtime.block_on(async {
        let server = EventLogServer::bind(&config, store, shutdown).await?;
        server.run().await
    });

    if let Err(e) = &result {
        error!(error = %e, "Failed to start servers");
    }

    worker.stop();
    info!("Done.");

    result.map_err(Into::into)
}
