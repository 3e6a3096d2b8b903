//! Unified error type for the Lodestone server.

use lodestone_protocol::{CodecError, ProtocolError};
use lodestone_session::{AuthError, RegistryError};
use lodestone_transport::TransportError;

use crate::ConfigError;

/// Anything that can end a connection or stop the server from starting.
///
/// Each layer keeps its own error type; this one only wraps them so the
/// handler can log a single `kind` and pick a disconnect reason.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The socket failed or timed out. Bad frame lengths are reported as
    /// [`Codec`](Self::Codec) instead.
    #[error(transparent)]
    Transport(TransportError),

    /// A packet illegal in the connection's phase, or malformed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A malformed frame length, or a malformed primitive outside packet
    /// decoding.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Forwarding or login authentication failed.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The authenticated player could not be admitted.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The configuration is unusable.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl From<TransportError> for ServerError {
    fn from(error: TransportError) -> Self {
        match error {
            TransportError::Frame(codec) => Self::Codec(codec),
            other => Self::Transport(other),
        }
    }
}

impl ServerError {
    /// Short category name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::Protocol(ProtocolError::Codec(_)) | Self::Codec(_) => "codec",
            Self::Protocol(_) => "protocol",
            Self::Auth(_) => "auth",
            Self::Registry(_) => "registry",
            Self::Config(_) => "config",
        }
    }
}
