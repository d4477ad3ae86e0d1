//! Nonblocking TCP client connection.
//!
//! Resolution keeps IPv4 candidates only and the connect goes to the
//! first one, with no fallback: a failure at any step aborts the session
//! before it starts. Once connected, the stream switches to nonblocking
//! mode so the bridge loop can interleave keyboard and socket work.

use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::thread;
use std::time::Duration;

use thiserror::Error;
use tracing::info;

/// Connection setup failures, one per setup step.
#[derive(Error, Debug)]
pub enum ConnectError {
    #[error("invalid port: {0}")]
    InvalidPort(String),

    #[error("address lookup error: {0}")]
    Resolve(#[source] io::Error),

    #[error("address lookup error: no IPv4 address for {0}")]
    NoAddress(String),

    #[error("error creating control socket: {0}")]
    SocketCreate(#[source] io::Error),

    #[error("connection error: {0}")]
    Connect(#[source] io::Error),

    #[error("error unblocking control socket: {0}")]
    Nonblocking(#[source] io::Error),
}

/// Outcome of one nonblocking read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Received {
    /// `n` bytes landed in the buffer.
    Bytes(usize),
    /// The peer closed the connection in an orderly way.
    Closed,
    /// Nothing available right now.
    Idle,
}

/// An established nonblocking TCP connection.
pub struct Connection {
    stream: TcpStream,
    peer: SocketAddr,
}

impl Connection {
    /// Resolve `host:port` and connect to the first IPv4 candidate.
    pub fn open(host: &str, port: &str, timeout: Duration) -> Result<Self, ConnectError> {
        let port: u16 = port
            .parse()
            .map_err(|_| ConnectError::InvalidPort(port.to_string()))?;

        let addr = (host, port)
            .to_socket_addrs()
            .map_err(ConnectError::Resolve)?
            .find(|a| a.is_ipv4())
            .ok_or_else(|| ConnectError::NoAddress(format!("{}:{}", host, port)))?;

        // connect_timeout covers socket creation too; creation failures
        // carry their own error kinds
        let stream = TcpStream::connect_timeout(&addr, timeout).map_err(|e| match e.kind() {
            io::ErrorKind::Unsupported | io::ErrorKind::InvalidInput => {
                ConnectError::SocketCreate(e)
            }
            _ => ConnectError::Connect(e),
        })?;

        stream
            .set_nonblocking(true)
            .map_err(ConnectError::Nonblocking)?;

        info!("Connected to {}", addr);
        Ok(Self { stream, peer: addr })
    }

    /// Address of the remote end.
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// One nonblocking read into `buf`.
    pub fn recv(&mut self, buf: &mut [u8]) -> io::Result<Received> {
        match self.stream.read(buf) {
            Ok(0) => Ok(Received::Closed),
            Ok(n) => Ok(Received::Bytes(n)),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(Received::Idle),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => Ok(Received::Idle),
            Err(e) => Err(e),
        }
    }

    /// Write all of `bytes`, waiting out transient backpressure.
    pub fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
        let mut sent = 0;
        while sent < bytes.len() {
            match self.stream.write(&bytes[sent..]) {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::WriteZero,
                        "connection closed while sending",
                    ));
                }
                Ok(n) => sent += n,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    thread::sleep(Duration::from_millis(1));
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn local_server() -> (TcpListener, String) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port().to_string();
        (listener, port)
    }

    /// Drain `conn` until `want` bytes arrived or the retries run out.
    fn recv_exact(conn: &mut Connection, want: usize) -> Vec<u8> {
        let mut out = Vec::new();
        let mut buf = [0u8; 64];
        for _ in 0..500 {
            match conn.recv(&mut buf).unwrap() {
                Received::Bytes(n) => out.extend_from_slice(&buf[..n]),
                Received::Idle => thread::sleep(Duration::from_millis(1)),
                Received::Closed => break,
            }
            if out.len() >= want {
                break;
            }
        }
        out
    }

    #[test]
    fn test_open_and_exchange() {
        let (listener, port) = local_server();
        let mut conn = Connection::open("127.0.0.1", &port, TIMEOUT).unwrap();
        let (mut server, _) = listener.accept().unwrap();

        conn.send(b"hello").unwrap();
        let mut buf = [0u8; 5];
        server.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"hello");

        server.write_all(b"ok").unwrap();
        assert_eq!(recv_exact(&mut conn, 2), b"ok");
    }

    #[test]
    fn test_sent_bytes_arrive_unmodified() {
        let (listener, port) = local_server();
        let mut conn = Connection::open("127.0.0.1", &port, TIMEOUT).unwrap();
        let (mut server, _) = listener.accept().unwrap();

        // The keyboard path is never filtered, control and high bytes included
        let sent = [0x00u8, 0x07, 0x1B, 0x1D, b'\n', 0x7F, 0xFF];
        conn.send(&sent).unwrap();
        let mut buf = [0u8; 7];
        server.read_exact(&mut buf).unwrap();
        assert_eq!(buf, sent);
    }

    #[test]
    fn test_recv_idle_when_no_data() {
        let (listener, port) = local_server();
        let mut conn = Connection::open("127.0.0.1", &port, TIMEOUT).unwrap();
        let _server = listener.accept().unwrap();

        let mut buf = [0u8; 16];
        assert_eq!(conn.recv(&mut buf).unwrap(), Received::Idle);
    }

    #[test]
    fn test_recv_closed_when_peer_drops() {
        let (listener, port) = local_server();
        let mut conn = Connection::open("127.0.0.1", &port, TIMEOUT).unwrap();
        let (server, _) = listener.accept().unwrap();
        drop(server);

        let mut buf = [0u8; 16];
        for _ in 0..500 {
            match conn.recv(&mut buf).unwrap() {
                Received::Closed => return,
                Received::Idle => thread::sleep(Duration::from_millis(1)),
                Received::Bytes(_) => {}
            }
        }
        panic!("peer close never surfaced");
    }

    #[test]
    fn test_invalid_port_rejected() {
        let result = Connection::open("127.0.0.1", "no-such-port", TIMEOUT);
        assert!(matches!(result, Err(ConnectError::InvalidPort(_))));

        let result = Connection::open("127.0.0.1", "65536", TIMEOUT);
        assert!(matches!(result, Err(ConnectError::InvalidPort(_))));
    }

    #[test]
    fn test_connect_to_dead_port_fails() {
        // Bind and immediately drop to find a port with no listener
        let (listener, port) = local_server();
        drop(listener);

        let result = Connection::open("127.0.0.1", &port, Duration::from_secs(1));
        assert!(matches!(result, Err(ConnectError::Connect(_))));
    }
}
