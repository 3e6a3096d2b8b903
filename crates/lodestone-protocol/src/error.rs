//! Error types for the protocol layer.
//!
//! Two enums live here. [`CodecError`] is about bytes: a primitive or a
//! frame that cannot be decoded. [`ProtocolError`] is about meaning: a
//! well-formed packet that is not legal where it arrived. Both are fatal
//! to the connection that produced them.

use crate::Phase;

/// A malformed primitive value or frame.
///
/// Every decode path in [`crate::wire`] and [`crate::frame`] reports one of
/// these. None of them is ever recovered from by substituting a default.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// A VarInt ran past five bytes without a terminating byte.
    #[error("VarInt is longer than 5 bytes")]
    VarIntTooLong,

    /// A VarLong ran past ten bytes without a terminating byte.
    #[error("VarLong is longer than 10 bytes")]
    VarLongTooLong,

    /// A string's declared byte length exceeds the caller's limit.
    #[error("string of {len} bytes exceeds limit of {max}")]
    StringTooLong { len: usize, max: usize },

    /// A length-prefixed byte array is longer than the caller allows.
    #[error("byte array of {len} bytes exceeds limit of {max}")]
    ByteArrayTooLong { len: usize, max: usize },

    /// String bytes are not valid UTF-8.
    #[error("string is not valid UTF-8")]
    InvalidUtf8,

    /// Tried to read past the end of the available bytes.
    #[error("unexpected end of data: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEof { needed: usize, remaining: usize },

    /// A length field decoded to a negative number.
    #[error("negative length {0}")]
    NegativeLength(i32),

    /// A frame announced more bytes than the configured maximum.
    #[error("frame of {len} bytes exceeds maximum of {max}")]
    FrameTooLarge { len: usize, max: usize },

    /// A packet decoder finished with bytes left in the frame.
    #[error("{0} trailing bytes after packet body")]
    TrailingBytes(usize),

    /// A boolean byte was neither 0 nor 1.
    #[error("invalid boolean byte {0:#04x}")]
    InvalidBoolean(u8),
}

/// A packet that decoded fine but is illegal in the connection's state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// No decoder is registered for this id in the current phase.
    #[error("unexpected packet {id:#04x} in {phase} phase")]
    UnexpectedPacket { phase: Phase, id: i32 },

    /// The handshake asked for a next state other than status (1) or login (2).
    #[error("invalid next state {0} in handshake")]
    InvalidNextState(i32),

    /// A state change was requested that the state machine does not allow.
    #[error("invalid transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    /// The client speaks a different protocol version than the server.
    #[error("client protocol {client} does not match server protocol {server}")]
    UnsupportedProtocolVersion { client: i32, server: i32 },

    /// The packet body itself was malformed.
    #[error(transparent)]
    Codec(#[from] CodecError),
}
