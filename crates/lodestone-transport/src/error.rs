use std::io;

use lodestone_protocol::CodecError;

/// Why a connection (or the listener) stopped working.
///
/// Only the two timeouts are worth telling the player about; everything
/// else means the socket is already unusable.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("could not bind listener: {0}")]
    Bind(#[source] io::Error),

    #[error("could not accept connection: {0}")]
    Accept(#[source] io::Error),

    #[error("socket read error: {0}")]
    Read(#[source] io::Error),

    #[error("socket write error: {0}")]
    Write(#[source] io::Error),

    /// Nothing arrived for `idle_timeout`.
    #[error("no frame received within the idle timeout")]
    IdleTimeout,

    /// A frame was started but not finished within `read_timeout`.
    #[error("frame not completed within the read timeout")]
    ReadTimeout,

    /// EOF in the middle of a frame.
    #[error("connection closed mid-frame")]
    Truncated,

    /// The length prefix itself was bad.
    #[error(transparent)]
    Frame(#[from] CodecError),
}
