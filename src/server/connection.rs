//! Per-connection state for accepted TCP streams

use std::io;
use std::net::SocketAddr;

use futures::future::{BoxFuture, FutureExt};
use tokio::io::{Interest, Ready};
use tokio::net::TcpStream;

use crate::protocol::MESSAGE_TERMINATOR;

/// Readiness wait for one connection, resolving to the connection itself
pub type ReadyFuture = BoxFuture<'static, (Connection, io::Result<Ready>)>;

/// What a connection is waiting for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Idle, waiting for the next request
    AwaitingRead,
    /// A response is partially written, waiting for the socket to drain
    AwaitingWrite,
}

/// An accepted TCP connection owned by the server loop.
///
/// Connections stay registered after answering a request. They are dropped,
/// which closes the socket, on EOF or on any I/O error.
#[derive(Debug)]
pub struct Connection {
    id: u64,
    peer: SocketAddr,
    stream: TcpStream,
    outbound: Vec<u8>,
    overflowing: bool,
}

impl Connection {
    pub fn new(id: u64, stream: TcpStream, peer: SocketAddr) -> Self {
        Self {
            id,
            peer,
            stream,
            outbound: Vec::new(),
            overflowing: false,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn state(&self) -> ConnectionState {
        if self.outbound.is_empty() {
            ConnectionState::AwaitingRead
        } else {
            ConnectionState::AwaitingWrite
        }
    }

    /// Readiness the loop should wait for next.
    ///
    /// A connection with unwritten output is not read from, so a peer that
    /// never reads its responses cannot grow the buffer.
    fn interest(&self) -> Interest {
        match self.state() {
            ConnectionState::AwaitingRead => Interest::READABLE,
            ConnectionState::AwaitingWrite => Interest::WRITABLE,
        }
    }

    /// Wait until the socket is ready for the current state, handing the
    /// connection back with the readiness result
    pub fn wait_ready(self) -> ReadyFuture {
        async move {
            let ready = self.stream.ready(self.interest()).await;
            (self, ready)
        }
        .boxed()
    }

    /// Non-blocking read; `Ok(0)` means the peer closed the connection
    pub fn try_read(&self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream.try_read(buf)
    }

    /// Whether input is being skipped up to the end of an over-long message
    pub fn is_overflowing(&self) -> bool {
        self.overflowing
    }

    /// Skip input until the next terminator. Used after a message filled the
    /// whole scan window without ending.
    pub fn start_overflow(&mut self) {
        self.overflowing = true;
    }

    /// Drop the part of `raw` that still belongs to an over-long message.
    ///
    /// Returns the bytes after its terminator, or `None` when nothing in this
    /// read is left to answer.
    pub fn skip_overflow<'a>(&mut self, raw: &'a [u8]) -> Option<&'a [u8]> {
        if !self.overflowing {
            return Some(raw);
        }

        let end = raw
            .iter()
            .position(|&b| b == MESSAGE_TERMINATOR || b == b'\n')?;
        self.overflowing = false;

        let rest = &raw[end + 1..];
        let blank = rest.iter().all(|&b| b.is_ascii_whitespace() || b == 0);
        (!blank).then_some(rest)
    }

    pub fn queue_response(&mut self, response: &[u8]) {
        self.outbound.extend_from_slice(response);
    }

    /// Write as much queued output as the socket accepts without blocking
    pub fn flush(&mut self) -> io::Result<()> {
        while !self.outbound.is_empty() {
            match self.stream.try_write(&self.outbound) {
                Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
                Ok(n) => {
                    self.outbound.drain(..n);
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(()),
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    async fn connected_pair() -> (Connection, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).await.unwrap();
        let (stream, peer) = listener.accept().await.unwrap();
        (Connection::new(1, stream, peer), client)
    }

    #[tokio::test]
    async fn test_state_follows_outbound_buffer() {
        let (mut conn, mut client) = connected_pair().await;
        assert_eq!(conn.state(), ConnectionState::AwaitingRead);

        conn.queue_response(b"ok;hello\n");
        assert_eq!(conn.state(), ConnectionState::AwaitingWrite);

        let (mut conn, ready) = conn.wait_ready().await;
        assert!(ready.unwrap().is_writable());
        conn.flush().unwrap();
        assert_eq!(conn.state(), ConnectionState::AwaitingRead);

        let mut buf = [0u8; 9];
        client.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"ok;hello\n");
    }

    #[tokio::test]
    async fn test_read_after_readiness() {
        let (conn, mut client) = connected_pair().await;
        client.write_all(b"hello\n").await.unwrap();

        let (conn, ready) = conn.wait_ready().await;
        assert!(ready.unwrap().is_readable());

        let mut buf = [0u8; 64];
        let n = conn.try_read(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"hello\n");
    }

    #[tokio::test]
    async fn test_eof_reads_zero() {
        let (conn, client) = connected_pair().await;
        drop(client);

        let (conn, ready) = conn.wait_ready().await;
        assert!(ready.is_ok());

        let mut buf = [0u8; 64];
        assert_eq!(conn.try_read(&mut buf).unwrap(), 0);
    }

    #[tokio::test]
    async fn test_overflow_skips_until_terminator() {
        let (mut conn, _client) = connected_pair().await;
        assert_eq!(conn.skip_overflow(b"plain"), Some(&b"plain"[..]));

        conn.start_overflow();
        assert_eq!(conn.skip_overflow(b"still the same message"), None);
        assert!(conn.is_overflowing());

        assert_eq!(conn.skip_overflow(b"tail\r\n"), None);
        assert!(!conn.is_overflowing());

        conn.start_overflow();
        assert_eq!(conn.skip_overflow(b"tail\nnext\n"), Some(&b"next\n"[..]));
        assert!(!conn.is_overflowing());
    }
}
