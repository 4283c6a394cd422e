//! Event log server
//!
//! A single readiness-driven loop services the TCP listener, the UDP socket
//! bound to the same port, and every accepted TCP connection. Each iteration
//! performs exactly one bounded readiness wait; no thread or task is spawned
//! per connection.

mod connection;
mod handlers;

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::io::Ready;
use tokio::net::{TcpListener, UdpSocket};
use tracing::{debug, info, trace, warn};

use crate::config::ServerConfig;
use crate::error::{EventLogError, EventLogResult};
use crate::event_store::EventStore;
use crate::protocol::has_terminator;
use crate::utils::ShutdownSignal;

pub use connection::{Connection, ConnectionState, ReadyFuture};
pub use handlers::CommandHandler;

/// TCP + UDP event log server sharing one port
pub struct EventLogServer {
    listener: TcpListener,
    datagram: UdpSocket,
    handler: CommandHandler,
    poll_timeout: Duration,
    shutdown: ShutdownSignal,
}

impl EventLogServer {
    /// Bind both sockets.
    ///
    /// The config is validated first; nothing is bound if it is rejected.
    ///
    /// With port 0 the TCP listener picks a free port and the UDP socket is
    /// bound to the same one.
    pub async fn bind(
        config: &ServerConfig,
        store: Arc<EventStore>,
        shutdown: ShutdownSignal,
    ) -> EventLogResult<Self> {
        config.validate()?;
        let requested = config.socket_addr();
        let listener = TcpListener::bind(requested)
            .await
            .map_err(|source| EventLogError::Bind {
                transport: "TCP",
                addr: requested,
                source,
            })?;

        let addr = listener.local_addr()?;
        let datagram = UdpSocket::bind(addr)
            .await
            .map_err(|source| EventLogError::Bind {
                transport: "UDP",
                addr,
                source,
            })?;

        info!(%addr, "Listening for TCP and UDP");

        Ok(Self {
            listener,
            datagram,
            handler: CommandHandler::new(store, config.max_message_len),
            poll_timeout: config.poll_timeout(),
            shutdown,
        })
    }

    /// Address both sockets are bound to
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Run until the shutdown signal is triggered
    pub async fn run(self) -> EventLogResult<()> {
        let EventLogServer {
            listener,
            datagram,
            handler,
            poll_timeout,
            shutdown,
        } = self;

        let mut connections: FuturesUnordered<ReadyFuture> = FuturesUnordered::new();
        let mut read_buf = vec![0u8; handler.max_message_len()];
        let mut datagram_buf = vec![0u8; handler.max_message_len()];
        let mut next_id: u64 = 0;

        loop {
            if shutdown.is_triggered() {
                break;
            }

            tokio::select! {
                _ = shutdown.triggered() => {}

                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        next_id += 1;
                        debug!(connection = next_id, %peer, "Accepted TCP connection");
                        connections.push(Connection::new(next_id, stream, peer).wait_ready());
                    }
                    Err(e) => warn!(error = %e, "Failed to accept TCP connection"),
                },

                received = datagram.recv_from(&mut datagram_buf) => match received {
                    Ok((len, peer)) => {
                        answer_datagram(&handler, &datagram, &datagram_buf[..len], peer)
                    }
                    Err(e) => warn!(error = %e, "Failed to receive UDP datagram"),
                },

                Some((connection, ready)) = connections.next(), if !connections.is_empty() => {
                    let kept = service_connection(&handler, connection, ready, &mut read_buf);
                    if let Some(connection) = kept {
                        connections.push(connection.wait_ready());
                    }
                }

                _ = tokio::time::sleep(poll_timeout) => {
                    trace!(open_connections = connections.len(), "Readiness wait timed out");
                }
            }
        }

        info!(open_connections = connections.len(), "Server loop stopped");
        Ok(())
    }
}

/// Handle a readiness event on a TCP connection.
///
/// Returns the connection if it should stay registered, `None` once it is
/// closed.
fn service_connection(
    handler: &CommandHandler,
    mut connection: Connection,
    ready: io::Result<Ready>,
    buf: &mut [u8],
) -> Option<Connection> {
    let id = connection.id();

    let ready = match ready {
        Ok(ready) => ready,
        Err(e) => {
            debug!(connection = id, error = %e, "Closing TCP connection");
            return None;
        }
    };

    if connection.state() == ConnectionState::AwaitingRead {
        if !(ready.is_readable() || ready.is_read_closed()) {
            trace!(connection = id, ?ready, "Ignoring unexpected readiness");
            return Some(connection);
        }

        match connection.try_read(buf) {
            Ok(0) => {
                debug!(connection = id, peer = %connection.peer(), "TCP connection closed by peer");
                return None;
            }
            Ok(n) => match connection.skip_overflow(&buf[..n]) {
                Some(raw) => {
                    let (line, response) = handler.handle(raw);
                    debug!(connection = id, "TCP <<< {}", line);
                    connection.queue_response(response.as_bytes());
                    debug!(connection = id, "TCP >>> {}", response.trim_end());

                    // A full window with no end in it: the rest belongs to this message
                    if raw.len() == buf.len() && !has_terminator(raw) {
                        connection.start_overflow();
                    }
                }
                None => trace!(connection = id, bytes = n, "Skipped rest of over-long message"),
            },
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Some(connection),
            Err(e) => {
                debug!(connection = id, error = %e, "Closing TCP connection");
                return None;
            }
        }
    }

    match connection.flush() {
        Ok(()) => Some(connection),
        Err(e) => {
            debug!(connection = id, error = %e, "Closing TCP connection");
            None
        }
    }
}

/// Answer one datagram to its source address. Nothing is kept afterwards.
fn answer_datagram(handler: &CommandHandler, socket: &UdpSocket, raw: &[u8], peer: SocketAddr) {
    let (line, response) = handler.handle(raw);
    debug!(%peer, "UDP <<< {}", line);

    match socket.try_send_to(response.as_bytes(), peer) {
        Ok(_) => debug!(%peer, "UDP >>> {}", response.trim_end()),
        Err(e) => warn!(%peer, error = %e, "Dropping UDP response"),
    }
}
