//! Disconnect packets and the reasons shown to players.
//!
//! Reasons go out as JSON chat components built by `serde_json`, so
//! whatever text ends up in them is escaped, never spliced into JSON by
//! hand. Only `Login` and `Play` have a disconnect packet; in `Handshake`
//! and `Status` the socket is simply closed.

use lodestone_protocol::{ClientboundPacket, ClientboundPlay, LoginClientbound, Phase, ProtocolError};
use lodestone_session::{AuthError, ForwardingMode, RegistryError};
use lodestone_transport::TransportError;

use crate::{ServerConfig, ServerError};

/// `{"text": <text>}`
pub fn chat_component(text: &str) -> String {
    serde_json::json!({ "text": text }).to_string()
}

/// The disconnect packet for `phase`, if that phase has one.
pub fn disconnect_packet(phase: Phase, reason: &str) -> Option<ClientboundPacket> {
    let reason = chat_component(reason);
    match phase {
        Phase::Login => Some(ClientboundPacket::Login(LoginClientbound::Disconnect { reason })),
        Phase::Play => Some(ClientboundPacket::Play(ClientboundPlay::Disconnect { reason })),
        Phase::Handshake | Phase::Status => None,
    }
}

/// What to tell the player before closing, or `None` to close silently.
///
/// Configuration-driven rejections and version mismatches get specific
/// messages. Malformed input gets a generic one.
pub fn reason_for(error: &ServerError, config: &ServerConfig) -> Option<String> {
    let reason = match error {
        ServerError::Protocol(ProtocolError::UnsupportedProtocolVersion { client, server }) => {
            if client < server {
                format!("Outdated client! Please use {}", config.version_name)
            } else {
                format!("Outdated server! I'm still on {}", config.version_name)
            }
        }
        ServerError::Protocol(_) | ServerError::Codec(_) => "Malformed packet".to_string(),

        ServerError::Auth(auth) => match auth {
            AuthError::ForwardingRequired(ForwardingMode::VelocityModern) => {
                "This server requires you to connect with Velocity.".to_string()
            }
            AuthError::ForwardingRequired(_) => {
                "If you wish to use IP forwarding, please enable it in your BungeeCord config as well!"
                    .to_string()
            }
            AuthError::InvalidSignature => "Unable to verify player details".to_string(),
            AuthError::UnsupportedForwardingVersion(_) => {
                "Unsupported forwarding version, please update your proxy".to_string()
            }
            AuthError::InvalidToken => {
                "Unable to authenticate - no data was forwarded by the proxy.".to_string()
            }
            AuthError::MalformedForwardingData(_)
            | AuthError::MalformedHandshakeAddress(_)
            | AuthError::UnexpectedPluginResponse { .. } => {
                "Unable to read forwarded player details".to_string()
            }
            AuthError::Rejected(message) => message.clone(),
        },

        ServerError::Registry(RegistryError::ServerFull { .. }) => "The server is full!".to_string(),
        ServerError::Registry(RegistryError::AlreadyOnline(_)) => {
            "You are logged in from another location".to_string()
        }

        ServerError::Transport(TransportError::IdleTimeout | TransportError::ReadTimeout) => {
            "Timed out".to_string()
        }
        ServerError::Transport(_) | ServerError::Config(_) => return None,
    };
    Some(reason)
}
