//! Player identity for Lodestone.
//!
//! This crate decides who a connection belongs to:
//!
//! 1. **Forwarding**: verifying identities a proxy hands us
//!    ([`ForwardingAuthenticator`], Velocity and BungeeCord schemes)
//! 2. **Local login**: resolving players without a proxy
//!    ([`LoginAuthenticator`] trait, [`OfflineAuthenticator`])
//! 3. **Registry**: knowing who is online ([`PlayerRegistry`])
//!
//! # How it fits in the stack
//!
//! ```text
//! Server (above)  ← drives login, hands identities to game logic
//!     ↕
//! Session Layer (this crate)  ← turns login packets into a trusted identity
//!     ↕
//! Protocol Layer (below)  ← wire primitives, login packets
//! ```

#![allow(async_fn_in_trait)]

mod auth;
mod error;
pub mod forwarding;
mod identity;
mod registry;

pub use auth::{LoginAttempt, LoginAuthenticator, OfflineAuthenticator};
pub use error::{AuthError, RegistryError};
pub use forwarding::{
    BungeeForwarding, ForwardingAuthenticator, ForwardingConfig, ForwardingFlags, ForwardingMode,
    ParseForwardingModeError,
};
pub use identity::{
    offline_uuid, ForwardedIdentity, LocalIdentity, PlayerIdentity, SkinProperty,
    TEXTURES_PROPERTY,
};
pub use registry::{PlayerRegistry, SharedRegistry};
