//! Server configuration.
//!
//! [`ServerConfig`] arrives fully loaded. Where it came from (a properties
//! file, JSON, environment variables) is the caller's business; this module
//! only supplies defaults and checks the values make sense before the
//! server starts. After that the config is shared read-only.

use std::time::Duration;

use lodestone_protocol::{DecodeLimits, DEFAULT_MAX_FRAME_SIZE, PROTOCOL_VERSION};
use lodestone_session::{ForwardingConfig, ForwardingMode};
use lodestone_transport::ConnectionConfig;
use serde::{Deserialize, Serialize};

/// Everything the server needs to know at startup.
///
/// Missing fields take the values from [`Default`], so a config source only
/// has to mention what it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to listen on.
    pub bind_address: String,
    /// Protocol version clients must speak to log in.
    pub protocol_version: i32,
    /// Human-readable version shown in the server list and in
    /// version-mismatch messages.
    pub version_name: String,
    /// Message of the day, sent as the server-list description.
    pub motd: String,
    /// Logged-in players allowed at once. Status still answers when full.
    pub max_players: usize,
    /// Largest frame accepted from a client, in bytes.
    pub max_frame_size: usize,
    /// Largest string or byte array accepted inside a packet.
    pub max_string_length: usize,
    /// Close connections that send nothing for this long.
    pub idle_timeout_ms: u64,
    /// Close connections that start a frame and do not finish it in time.
    pub read_timeout_ms: u64,
    /// How player identities reach the server: from a proxy, or from the
    /// local [`LoginAuthenticator`](lodestone_session::LoginAuthenticator).
    pub forwarding: ForwardingConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:25565".to_string(),
            protocol_version: PROTOCOL_VERSION,
            version_name: "1.19.4".to_string(),
            motd: "A Lodestone server".to_string(),
            max_players: 20,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            max_string_length: DecodeLimits::default().max_string_length,
            idle_timeout_ms: 30_000,
            read_timeout_ms: 10_000,
            forwarding: ForwardingConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Rejects configurations the server cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.forwarding.mode {
            ForwardingMode::VelocityModern if self.forwarding.secrets.is_empty() => {
                return Err(ConfigError::MissingForwardingSecret);
            }
            ForwardingMode::BungeeGuard if self.forwarding.bungee_guard_tokens.is_empty() => {
                return Err(ConfigError::MissingBungeeGuardToken);
            }
            _ => {}
        }

        let limits = [
            ("max_frame_size", self.max_frame_size as u64),
            ("max_string_length", self.max_string_length as u64),
            ("idle_timeout_ms", self.idle_timeout_ms),
            ("read_timeout_ms", self.read_timeout_ms),
        ];
        for (name, value) in limits {
            if value == 0 {
                return Err(ConfigError::ZeroLimit(name));
            }
        }
        Ok(())
    }

    /// Limits for the packet table built from this config.
    pub fn decode_limits(&self) -> DecodeLimits {
        DecodeLimits {
            max_string_length: self.max_string_length,
        }
    }

    /// Frame size and timeouts for each accepted connection.
    pub fn connection_config(&self) -> ConnectionConfig {
        ConnectionConfig {
            max_frame_size: self.max_frame_size,
            idle_timeout: Duration::from_millis(self.idle_timeout_ms),
            read_timeout: Duration::from_millis(self.read_timeout_ms),
        }
    }
}

/// A configuration the server refuses to start with.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Velocity mode with an empty `secrets` list.
    #[error("velocity forwarding is enabled but no forwarding secret is configured")]
    MissingForwardingSecret,

    /// BungeeGuard mode with an empty `bungee_guard_tokens` list.
    #[error("bungeeguard forwarding is enabled but no token is configured")]
    MissingBungeeGuardToken,

    /// A size or timeout that must be positive is zero.
    #[error("{0} must be greater than zero")]
    ZeroLimit(&'static str),
}
