//! # Lodestone
//!
//! A Minecraft Java Edition (1.19.4, protocol 762) server core that can sit
//! behind a Velocity or BungeeCord proxy.
//!
//! Lodestone handles the parts every server needs before gameplay starts:
//! framing, the handshake/status/login state machine, proxy forwarding
//! verification, and player admission. Game developers implement
//! [`GameEvents`] and receive authenticated players in the `Play` phase.
//!
//! ## Layers
//!
//! ```text
//! lodestone-transport   TCP, length-prefixed frames, timeouts
//! lodestone-protocol    wire codec, packets, phase state machine
//! lodestone-session     forwarding verification, login, player registry
//! lodestone             per-connection handler, server loop, config
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lodestone::prelude::*;
//!
//! struct Lobby;
//!
//! impl GameEvents for Lobby {
//!     fn on_login_success(&self, player: &PlayerIdentity) -> Vec<ClientboundPlay> {
//!         tracing::info!(name = player.username(), "joined");
//!         Vec::new()
//!     }
//! }
//!
//! # async fn start() -> Result<(), ServerError> {
//! let server = LodestoneServer::<OfflineAuthenticator, Lobby>::builder()
//!     .bind("0.0.0.0:25565")
//!     .build(OfflineAuthenticator, Lobby)
//!     .await?;
//! server.run().await
//! # }
//! ```

#![allow(async_fn_in_trait)]

mod config;
pub mod disconnect;
mod error;
mod events;
mod handler;
mod server;
mod status;

pub use config::{ConfigError, ServerConfig};
pub use error::ServerError;
pub use events::GameEvents;
pub use handler::handle_connection;
pub use server::{LodestoneServer, LodestoneServerBuilder, ServerState};
pub use status::status_json;

/// Everything a server binary usually needs.
pub mod prelude {
    pub use crate::{
        ConfigError, GameEvents, LodestoneServer, LodestoneServerBuilder, ServerConfig,
        ServerError, ServerState,
    };
    pub use lodestone_protocol::{
        ClientboundPlay, Handshake, Phase, PlayPacket, Property, PROTOCOL_VERSION,
    };
    pub use lodestone_session::{
        offline_uuid, AuthError, ForwardingConfig, ForwardingMode, LocalIdentity, LoginAttempt,
        LoginAuthenticator, OfflineAuthenticator, PlayerIdentity,
    };
}
