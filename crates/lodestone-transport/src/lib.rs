//! Byte transport for Lodestone: sockets in, whole frames out.
//!
//! Provides the [`Transport`] and [`Connection`] traits. A connection hands
//! out whole frames: it reads an ordered byte stream, reassembles
//! length-prefixed frames, and enforces the idle and read timeouts that
//! bound how long a stalled peer can hold a task.
//!
//! - [`FramedConnection`] works over any `AsyncRead + AsyncWrite` stream,
//!   including in-memory `tokio::io::duplex` pipes.
//! - [`TcpTransport`] accepts TCP sockets and wraps them.

mod error;
mod framed;
mod tcp;

pub use error::TransportError;
pub use framed::{ConnectionConfig, FramedConnection};
pub use tcp::TcpTransport;

use std::fmt;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;

static CONNECTION_SEQ: AtomicU64 = AtomicU64::new(1);

/// Process-wide sequence number of an accepted connection, used to
/// correlate log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Takes the next number from the sequence. Never repeats within a process.
    pub fn next() -> Self {
        Self(CONNECTION_SEQ.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for ConnectionId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Source of new connections, such as a bound TCP listener.
pub trait Transport: Send + Sync + 'static {
    type Connection: Connection;

    /// Resolves once a peer has connected.
    fn accept(&mut self) -> impl Future<Output = Result<Self::Connection, TransportError>> + Send;

    fn local_addr(&self) -> Result<SocketAddr, TransportError>;
}

/// One peer, seen as a sequence of frame payloads.
///
/// Methods take `&mut self`: one task owns the connection and reads frames
/// strictly in arrival order.
pub trait Connection: Send + 'static {
    /// Next payload with its length prefix stripped, or `Ok(None)` if the
    /// peer hung up cleanly on a frame boundary.
    fn recv_frame(&mut self) -> impl Future<Output = Result<Option<Bytes>, TransportError>> + Send;

    /// Writes `payload` behind a VarInt length prefix and flushes.
    fn send_frame(&mut self, payload: &[u8]) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Shuts down the write half.
    fn close(&mut self) -> impl Future<Output = Result<(), TransportError>> + Send;

    fn id(&self) -> ConnectionId;

    fn peer_addr(&self) -> SocketAddr;
}
