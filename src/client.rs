//! Minimal blocking client for the event log protocol
//!
//! Sends one message and returns the first reply line. Used by the
//! `eventlog-client` binary and by the integration tests.

use std::io::{self, BufRead, BufReader, Write};
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, TcpStream, ToSocketAddrs, UdpSocket};
use std::time::Duration;

/// How long to wait for a reply before giving up
pub const REPLY_TIMEOUT: Duration = Duration::from_secs(5);

/// Largest reply read from a single datagram
const MAX_DATAGRAM_LEN: usize = 65_507;

/// Send `message` over TCP and read one reply line (newline stripped)
pub fn send_tcp<A: ToSocketAddrs>(addr: A, message: &str) -> io::Result<String> {
    let mut stream = TcpStream::connect(addr)?;
    stream.set_read_timeout(Some(REPLY_TIMEOUT))?;
    request_line(&mut stream, message)
}

/// Send `message` on an already open TCP connection and read one reply line.
///
/// The connection stays open, so several requests can share it.
pub fn request_line(stream: &mut TcpStream, message: &str) -> io::Result<String> {
    stream.write_all(format!("{}\n", message).as_bytes())?;
    stream.flush()?;

    let mut reader = BufReader::new(&*stream);
    let mut reply = String::new();
    if reader.read_line(&mut reply)? == 0 {
        return Err(io::ErrorKind::UnexpectedEof.into());
    }
    Ok(reply.trim_end_matches(['\r', '\n']).to_string())
}

/// Send `message` as one UDP datagram and wait for the reply datagram
pub fn send_udp<A: ToSocketAddrs>(addr: A, message: &str) -> io::Result<String> {
    let target = resolve(addr)?;
    let local = if target.is_ipv4() {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0))
    } else {
        SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0))
    };

    let socket = UdpSocket::bind(local)?;
    socket.set_read_timeout(Some(REPLY_TIMEOUT))?;
    socket.send_to(format!("{}\n", message).as_bytes(), target)?;

    let mut buf = vec![0u8; MAX_DATAGRAM_LEN];
    let (len, _) = socket.recv_from(&mut buf)?;
    let reply = String::from_utf8_lossy(&buf[..len]);
    Ok(reply.trim_end_matches(['\r', '\n']).to_string())
}

/// First resolved address, preferring IPv4 since the server binds 0.0.0.0 by default
fn resolve<A: ToSocketAddrs>(addr: A) -> io::Result<SocketAddr> {
    let addrs: Vec<SocketAddr> = addr.to_socket_addrs()?.collect();
    addrs
        .iter()
        .find(|a| a.is_ipv4())
        .or_else(|| addrs.first())
        .copied()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "address resolved to nothing"))
}
