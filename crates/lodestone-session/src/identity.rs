//! Player identities: who a connection belongs to once login succeeds.
//!
//! There are two ways to become a player:
//!
//! - **Forwarded**: a proxy vouched for the player. A [`ForwardedIdentity`]
//!   can only be built inside this crate, after the forwarding checks for
//!   the configured mode have passed. Game logic can read one but never
//!   forge one.
//! - **Local**: the server resolved the player itself through a
//!   [`LoginAuthenticator`](crate::LoginAuthenticator). [`LocalIdentity`]
//!   is a plain struct because authenticators live outside this crate.
//!
//! [`PlayerIdentity`] is what the rest of the server passes around.

use lodestone_protocol::Property;
use md5::{Digest, Md5};
use uuid::{Builder, Uuid};

use crate::ForwardingMode;

/// Name of the profile property that carries skin textures.
pub const TEXTURES_PROPERTY: &str = "textures";

// ---------------------------------------------------------------------------
// SkinProperty
// ---------------------------------------------------------------------------

/// Signed texture metadata for a player's skin and cape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkinProperty {
    /// Base64 texture blob.
    pub value: String,
    /// Base64 signature over `value`. Empty when the source sent none.
    pub signature: String,
}

impl SkinProperty {
    /// The `textures` property as sent in `LoginSuccess`.
    pub fn to_property(&self) -> Property {
        Property {
            name: TEXTURES_PROPERTY.to_string(),
            value: self.value.clone(),
            signature: (!self.signature.is_empty()).then(|| self.signature.clone()),
        }
    }
}

// ---------------------------------------------------------------------------
// ForwardedIdentity
// ---------------------------------------------------------------------------

/// An identity a proxy forwarded and this server verified.
///
/// Fields are private so the only way to obtain one is through
/// [`ForwardingAuthenticator`](crate::ForwardingAuthenticator).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardedIdentity {
    version: i32,
    remote_address: String,
    uuid: Uuid,
    username: String,
    skin: Option<SkinProperty>,
    mode: ForwardingMode,
}

impl ForwardedIdentity {
    pub(crate) fn new(
        version: i32,
        remote_address: String,
        uuid: Uuid,
        username: String,
        skin: Option<SkinProperty>,
        mode: ForwardingMode,
    ) -> Self {
        Self {
            version,
            remote_address,
            uuid,
            username,
            skin,
            mode,
        }
    }

    /// Forwarding format version. Velocity sends one; BungeeCord forms
    /// have none and report `0`.
    pub fn version(&self) -> i32 {
        self.version
    }

    /// The player's real address as seen by the proxy.
    pub fn remote_address(&self) -> &str {
        &self.remote_address
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn skin(&self) -> Option<&SkinProperty> {
        self.skin.as_ref()
    }

    /// Which scheme vouched for this identity. Identities from
    /// [`ForwardingMode::BungeeCordLegacy`] are trusted on network position
    /// alone.
    pub fn mode(&self) -> ForwardingMode {
        self.mode
    }
}

// ---------------------------------------------------------------------------
// LocalIdentity
// ---------------------------------------------------------------------------

/// An identity resolved by the server itself, without a proxy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalIdentity {
    pub uuid: Uuid,
    pub username: String,
    pub remote_address: String,
    pub skin: Option<SkinProperty>,
}

/// The UUID an offline-mode server assigns to `username`.
///
/// MD5 of `OfflinePlayer:<name>` with no namespace, stamped as version 3.
/// Vanilla and BungeeCord derive offline UUIDs the same way, so a player
/// keeps one UUID across every server on the network.
pub fn offline_uuid(username: &str) -> Uuid {
    let digest = Md5::digest(format!("OfflinePlayer:{username}").as_bytes());
    Builder::from_md5_bytes(digest.into()).into_uuid()
}

// ---------------------------------------------------------------------------
// PlayerIdentity
// ---------------------------------------------------------------------------

/// Whoever a logged-in connection belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerIdentity {
    Forwarded(ForwardedIdentity),
    Local(LocalIdentity),
}

impl PlayerIdentity {
    pub fn uuid(&self) -> Uuid {
        match self {
            Self::Forwarded(identity) => identity.uuid(),
            Self::Local(identity) => identity.uuid,
        }
    }

    pub fn username(&self) -> &str {
        match self {
            Self::Forwarded(identity) => identity.username(),
            Self::Local(identity) => &identity.username,
        }
    }

    pub fn remote_address(&self) -> &str {
        match self {
            Self::Forwarded(identity) => identity.remote_address(),
            Self::Local(identity) => &identity.remote_address,
        }
    }

    pub fn skin(&self) -> Option<&SkinProperty> {
        match self {
            Self::Forwarded(identity) => identity.skin(),
            Self::Local(identity) => identity.skin.as_ref(),
        }
    }

    pub fn is_forwarded(&self) -> bool {
        matches!(self, Self::Forwarded(_))
    }

    /// Profile properties to send in `LoginSuccess`.
    pub fn properties(&self) -> Vec<Property> {
        self.skin().map(SkinProperty::to_property).into_iter().collect()
    }
}

impl From<ForwardedIdentity> for PlayerIdentity {
    fn from(identity: ForwardedIdentity) -> Self {
        Self::Forwarded(identity)
    }
}

impl From<LocalIdentity> for PlayerIdentity {
    fn from(identity: LocalIdentity) -> Self {
        Self::Local(identity)
    }
}
