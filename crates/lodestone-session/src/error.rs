//! Error types for the session layer.

use lodestone_protocol::CodecError;
use uuid::Uuid;

use crate::ForwardingMode;

/// Why a login could not produce a trusted identity.
///
/// Every variant is fatal to the connection. None of them carries secret
/// material: a rejected token or signature is never echoed back in the
/// message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// No configured Velocity secret produced the payload's signature.
    #[error("forwarding signature did not match any configured secret")]
    InvalidSignature,

    /// The signature checked out but the proxy speaks a forwarding version
    /// this server does not understand.
    #[error("unsupported forwarding version {0}")]
    UnsupportedForwardingVersion(i32),

    /// The BungeeGuard token is missing or matches none of the configured
    /// tokens.
    #[error("missing or invalid BungeeGuard token")]
    InvalidToken,

    /// The server expects forwarded data but the connection carried none.
    /// Usually a client connecting directly, or a proxy with forwarding
    /// switched off.
    #[error("{0} forwarding is required but none was supplied")]
    ForwardingRequired(ForwardingMode),

    /// The signed Velocity payload does not decode.
    #[error("malformed forwarding data: {0}")]
    MalformedForwardingData(#[from] CodecError),

    /// The handshake address has the right shape but a segment is invalid.
    /// The message names the segment, never its contents.
    #[error("malformed forwarding address: {0}")]
    MalformedHandshakeAddress(String),

    /// A plugin response arrived for a message id we never sent.
    #[error("plugin response for message {got}, expected {expected}")]
    UnexpectedPluginResponse { expected: i32, got: i32 },

    /// A [`LoginAuthenticator`](crate::LoginAuthenticator) refused the
    /// player. The string is shown to the client.
    #[error("login rejected: {0}")]
    Rejected(String),
}

/// Why a fully authenticated player could not be admitted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("server is full ({max} players)")]
    ServerFull { max: usize },

    /// A player with this UUID is already online.
    #[error("player {0} is already online")]
    AlreadyOnline(Uuid),
}
