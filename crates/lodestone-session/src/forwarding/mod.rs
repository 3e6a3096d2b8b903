//! Proxy forwarding: turning proxy-supplied bytes into a trusted identity.
//!
//! When the server sits behind a proxy, the proxy has already authenticated
//! the player and passes the result along. Which scheme it uses is decided
//! once, at startup, by [`ForwardingMode`]:
//!
//! | Mode | Carried in | Proof |
//! |---|---|---|
//! | `VelocityModern` | login plugin response | HMAC-SHA256 with a shared secret |
//! | `BungeeGuard` | handshake address field | shared token |
//! | `BungeeCordLegacy` | handshake address field | none (network position) |
//! | `None` | n/a | the server's own login flow |
//!
//! [`ForwardingAuthenticator`] holds the configured mode and secrets and is
//! stateless per call, so one instance is shared by every connection.

use std::fmt;
use std::str::FromStr;

use lodestone_protocol::LoginPluginResponse;
use serde::{Deserialize, Serialize};

use crate::{AuthError, ForwardedIdentity};

pub mod bungee;
pub mod velocity;

pub use bungee::BungeeForwarding;

// ---------------------------------------------------------------------------
// ForwardingMode
// ---------------------------------------------------------------------------

/// The trust scheme used to accept forwarded identities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ForwardingMode {
    /// No proxy. Identity comes from the server's own login flow.
    #[default]
    #[serde(rename = "none")]
    None,
    /// Plain BungeeCord IP forwarding. Anyone who can reach the server
    /// port can claim any identity, so the port must only be reachable
    /// from the proxy.
    #[serde(rename = "bungeecord", alias = "bungee_cord_legacy")]
    BungeeCordLegacy,
    /// BungeeCord forwarding plus a shared token.
    #[serde(rename = "bungeeguard", alias = "bungee_guard")]
    BungeeGuard,
    /// Velocity modern forwarding, HMAC-signed.
    #[serde(rename = "velocity", alias = "velocity_modern")]
    VelocityModern,
}

impl ForwardingMode {
    /// Whether identity arrives inside the handshake address field.
    pub fn uses_handshake_address(self) -> bool {
        matches!(self, Self::BungeeCordLegacy | Self::BungeeGuard)
    }

    /// Whether login needs a plugin request/response round trip.
    pub fn uses_login_plugin(self) -> bool {
        matches!(self, Self::VelocityModern)
    }
}

impl fmt::Display for ForwardingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::BungeeCordLegacy => write!(f, "bungeecord"),
            Self::BungeeGuard => write!(f, "bungeeguard"),
            Self::VelocityModern => write!(f, "velocity"),
        }
    }
}

/// Error for an unrecognised forwarding mode name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown forwarding mode '{0}' (expected none, bungeecord, bungeeguard or velocity)")]
pub struct ParseForwardingModeError(String);

impl FromStr for ForwardingMode {
    type Err = ParseForwardingModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "bungeecord" => Ok(Self::BungeeCordLegacy),
            "bungeeguard" => Ok(Self::BungeeGuard),
            "velocity" => Ok(Self::VelocityModern),
            _ => Err(ParseForwardingModeError(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// ForwardingFlags
// ---------------------------------------------------------------------------

/// The three independent switches a properties-style config exposes.
///
/// More than one may be on; [`resolve`](Self::resolve) picks the strongest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ForwardingFlags {
    pub velocity_modern: bool,
    pub bungee_guard: bool,
    pub bungeecord: bool,
}

impl ForwardingFlags {
    /// VelocityModern > BungeeGuard > BungeeCordLegacy > None.
    pub fn resolve(self) -> ForwardingMode {
        if self.velocity_modern {
            ForwardingMode::VelocityModern
        } else if self.bungee_guard {
            ForwardingMode::BungeeGuard
        } else if self.bungeecord {
            ForwardingMode::BungeeCordLegacy
        } else {
            ForwardingMode::None
        }
    }
}

// ---------------------------------------------------------------------------
// ForwardingConfig
// ---------------------------------------------------------------------------

/// Forwarding settings, loaded once and never mutated.
///
/// `Debug` prints only how many secrets and tokens are configured.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForwardingConfig {
    pub mode: ForwardingMode,
    /// Velocity secrets, tried in order.
    pub secrets: Vec<String>,
    /// Accepted BungeeGuard tokens.
    pub bungee_guard_tokens: Vec<String>,
}

impl fmt::Debug for ForwardingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForwardingConfig")
            .field("mode", &self.mode)
            .field("secrets", &Redacted(self.secrets.len()))
            .field("bungee_guard_tokens", &Redacted(self.bungee_guard_tokens.len()))
            .finish()
    }
}

struct Redacted(usize);

impl fmt::Debug for Redacted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} redacted>", self.0)
    }
}

// ---------------------------------------------------------------------------
// ForwardingAuthenticator
// ---------------------------------------------------------------------------

/// Validates forwarded identities for the configured mode.
#[derive(Debug, Clone)]
pub struct ForwardingAuthenticator {
    config: ForwardingConfig,
}

impl ForwardingAuthenticator {
    pub fn new(config: ForwardingConfig) -> Self {
        Self { config }
    }

    pub fn mode(&self) -> ForwardingMode {
        self.config.mode
    }

    /// Checks the handshake address field.
    ///
    /// Returns `Ok(None)` when the mode does not forward through the
    /// handshake, so the address is just a hostname. In the BungeeCord
    /// modes the address must carry forwarding data, and in BungeeGuard
    /// mode a valid token.
    pub fn authenticate_handshake(
        &self,
        address: &str,
    ) -> Result<Option<BungeeForwarding>, AuthError> {
        match self.config.mode {
            ForwardingMode::BungeeCordLegacy => {
                bungee::parse(address, ForwardingMode::BungeeCordLegacy).map(Some)
            }
            ForwardingMode::BungeeGuard => {
                bungee::parse_guarded(address, &self.config.bungee_guard_tokens).map(Some)
            }
            ForwardingMode::VelocityModern | ForwardingMode::None => Ok(None),
        }
    }

    /// Checks the proxy's answer to our `velocity:player_info` request.
    pub fn authenticate_plugin_response(
        &self,
        expected_message_id: i32,
        response: &LoginPluginResponse,
    ) -> Result<ForwardedIdentity, AuthError> {
        if response.message_id != expected_message_id {
            return Err(AuthError::UnexpectedPluginResponse {
                expected: expected_message_id,
                got: response.message_id,
            });
        }
        let data = response
            .data
            .as_ref()
            .ok_or(AuthError::ForwardingRequired(ForwardingMode::VelocityModern))?;
        self.authenticate_velocity(data)
    }

    /// Verifies a raw Velocity payload (signature followed by signed data).
    pub fn authenticate_velocity(&self, payload: &[u8]) -> Result<ForwardedIdentity, AuthError> {
        velocity::verify(payload, &self.config.secrets)
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;

    fn config(mode: ForwardingMode) -> ForwardingConfig {
        ForwardingConfig {
            mode,
            secrets: vec!["s3cr3t".into()],
            bungee_guard_tokens: vec!["guard-token".into()],
        }
    }

    #[test]
    fn test_resolve_prefers_velocity() {
        let flags = ForwardingFlags {
            velocity_modern: true,
            bungee_guard: true,
            bungeecord: true,
        };
        assert_eq!(flags.resolve(), ForwardingMode::VelocityModern);
    }

    #[test]
    fn test_resolve_bungeeguard_over_bungeecord() {
        let flags = ForwardingFlags {
            bungee_guard: true,
            bungeecord: true,
            ..Default::default()
        };
        assert_eq!(flags.resolve(), ForwardingMode::BungeeGuard);
    }

    #[test]
    fn test_resolve_nothing_enabled_is_none() {
        assert_eq!(ForwardingFlags::default().resolve(), ForwardingMode::None);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let rendered = format!("{:?}", config(ForwardingMode::VelocityModern));
        assert!(!rendered.contains("s3cr3t"));
        assert!(!rendered.contains("guard-token"));
        assert!(rendered.contains("<1 redacted>"));
    }

    #[test]
    fn test_mode_from_str_accepts_known_names() {
        assert_eq!("Velocity".parse(), Ok(ForwardingMode::VelocityModern));
        assert_eq!("bungeeguard".parse(), Ok(ForwardingMode::BungeeGuard));
        assert!("socks".parse::<ForwardingMode>().is_err());
    }

    #[test]
    fn test_mode_deserializes_from_config_names() {
        let mode: ForwardingMode = serde_json::from_str("\"bungeecord\"").unwrap();
        assert_eq!(mode, ForwardingMode::BungeeCordLegacy);
    }

    #[test]
    fn test_authenticate_handshake_velocity_mode_ignores_address() {
        let auth = ForwardingAuthenticator::new(config(ForwardingMode::VelocityModern));
        assert_eq!(auth.authenticate_handshake("play.example.com"), Ok(None));
    }

    #[test]
    fn test_authenticate_handshake_bungeeguard_wrong_token_rejected() {
        let auth = ForwardingAuthenticator::new(config(ForwardingMode::BungeeGuard));
        let address = "host\0203.0.113.9\000000000-0000-0000-0000-000000000001\0nope";

        assert_eq!(
            auth.authenticate_handshake(address),
            Err(AuthError::InvalidToken)
        );
    }

    #[test]
    fn test_authenticate_handshake_bungeeguard_valid_token_accepted() {
        let auth = ForwardingAuthenticator::new(config(ForwardingMode::BungeeGuard));
        let address = "host\0203.0.113.9\000000000-0000-0000-0000-000000000001\0guard-token";

        let forwarding = auth.authenticate_handshake(address).unwrap().unwrap();

        assert_eq!(forwarding.hostname(), "host");
    }

    #[test]
    fn test_authenticate_plugin_response_wrong_id_rejected() {
        let auth = ForwardingAuthenticator::new(config(ForwardingMode::VelocityModern));
        let response = LoginPluginResponse {
            message_id: 8,
            data: Some(Bytes::new()),
        };

        assert_eq!(
            auth.authenticate_plugin_response(7, &response),
            Err(AuthError::UnexpectedPluginResponse {
                expected: 7,
                got: 8
            })
        );
    }

    #[test]
    fn test_authenticate_plugin_response_not_understood_requires_forwarding() {
        let auth = ForwardingAuthenticator::new(config(ForwardingMode::VelocityModern));
        let response = LoginPluginResponse {
            message_id: 7,
            data: None,
        };

        assert_eq!(
            auth.authenticate_plugin_response(7, &response),
            Err(AuthError::ForwardingRequired(ForwardingMode::VelocityModern))
        );
    }
}
