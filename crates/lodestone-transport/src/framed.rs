//! Frame reassembly over an ordered byte stream.

use std::net::SocketAddr;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use lodestone_protocol::{FrameCodec, DEFAULT_MAX_FRAME_SIZE};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::Instant;

use crate::{Connection, ConnectionId, TransportError};

/// Bytes requested from the stream per read.
const READ_CHUNK: usize = 4096;

/// Per-connection limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Largest frame payload accepted from the peer.
    pub max_frame_size: usize,
    /// How long to wait for the first byte of the next frame.
    pub idle_timeout: Duration,
    /// How long a frame may take to arrive once its first byte is in.
    pub read_timeout: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            idle_timeout: Duration::from_secs(30),
            read_timeout: Duration::from_secs(10),
        }
    }
}

/// A [`Connection`] over any async byte stream.
///
/// Incoming bytes accumulate in a buffer until [`FrameCodec`] can cut a
/// whole frame from it, so frames come out identical no matter how the
/// stream was chunked.
pub struct FramedConnection<S> {
    id: ConnectionId,
    peer: SocketAddr,
    stream: S,
    buf: BytesMut,
    codec: FrameCodec,
    config: ConnectionConfig,
    /// When the oldest unconsumed byte arrived.
    partial_since: Option<Instant>,
}

impl<S> FramedConnection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    pub fn new(stream: S, peer: SocketAddr, config: ConnectionConfig) -> Self {
        Self {
            id: ConnectionId::next(),
            peer,
            stream,
            buf: BytesMut::with_capacity(READ_CHUNK),
            codec: FrameCodec::new(config.max_frame_size),
            config,
            partial_since: None,
        }
    }

    /// Bytes received but not yet returned as a frame.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    async fn read_frame(&mut self) -> Result<Option<Bytes>, TransportError> {
        let idle_deadline = Instant::now() + self.config.idle_timeout;

        loop {
            if let Some(frame) = self.codec.decode(&mut self.buf)? {
                self.partial_since = None;
                return Ok(Some(frame));
            }

            let mid_frame = !self.buf.is_empty();
            let deadline = if mid_frame {
                let since = *self.partial_since.get_or_insert_with(Instant::now);
                since + self.config.read_timeout
            } else {
                idle_deadline
            };

            self.buf.reserve(READ_CHUNK);
            let read = tokio::time::timeout_at(deadline, self.stream.read_buf(&mut self.buf)).await;

            match read {
                Err(_elapsed) if mid_frame => return Err(TransportError::ReadTimeout),
                Err(_elapsed) => return Err(TransportError::IdleTimeout),
                Ok(Ok(0)) if mid_frame => return Err(TransportError::Truncated),
                Ok(Ok(0)) => return Ok(None),
                Ok(Ok(_)) => continue,
                Ok(Err(e)) => return Err(TransportError::Read(e)),
            }
        }
    }

    async fn write_frame(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        let mut out = BytesMut::new();
        self.codec.encode(payload, &mut out);
        self.stream
            .write_all(&out)
            .await
            .map_err(TransportError::Write)?;
        self.stream.flush().await.map_err(TransportError::Write)
    }
}

impl<S> Connection for FramedConnection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    async fn recv_frame(&mut self) -> Result<Option<Bytes>, TransportError> {
        self.read_frame().await
    }

    async fn send_frame(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        self.write_frame(payload).await
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.stream
            .shutdown()
            .await
            .map_err(TransportError::Write)
    }

    fn id(&self) -> ConnectionId {
        self.id
    }

    fn peer_addr(&self) -> SocketAddr {
        self.peer
    }
}
