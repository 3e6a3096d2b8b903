//! Velocity modern forwarding.
//!
//! During login the server sends a `LoginPluginRequest` on
//! [`PLAYER_INFO_CHANNEL`]. The proxy answers with:
//!
//! ```text
//! [signature: 32 bytes][signed data]
//!
//! signed data:
//!   VarInt  version            (must be 1)
//!   String  remote address
//!   UUID    player uuid
//!   String  username
//!   VarInt  property count
//!   { String name, String value, bool signed, [String signature] } * count
//! ```
//!
//! `signature` is HMAC-SHA256 over the signed data, keyed with a secret
//! shared between proxy and server. The signature is checked against every
//! configured secret before a single field of the signed data is decoded.

use bytes::{BufMut, Bytes, BytesMut};
use hmac::{Hmac, Mac};
use lodestone_protocol::packets::MAX_USERNAME_LEN;
use lodestone_protocol::wire::{WireReader, WireWrite};
use lodestone_protocol::{DecodeLimits, LoginClientbound, Property};
use rand::Rng;
use sha2::Sha256;
use uuid::Uuid;

use crate::identity::TEXTURES_PROPERTY;
use crate::{AuthError, ForwardedIdentity, ForwardingMode, SkinProperty};

type HmacSha256 = Hmac<Sha256>;

/// Login plugin channel Velocity answers on.
pub const PLAYER_INFO_CHANNEL: &str = "velocity:player_info";

/// The only forwarding version this server accepts.
pub const MODERN_FORWARDING_VERSION: i32 = 1;

/// Length of the HMAC-SHA256 signature that prefixes the payload.
pub const SIGNATURE_LEN: usize = 32;

/// Picks a message id for the player-info request.
pub fn new_message_id() -> i32 {
    rand::rng().random_range(0..i32::MAX)
}

/// The request that asks the proxy for forwarded player info.
pub fn player_info_request(message_id: i32) -> LoginClientbound {
    LoginClientbound::PluginRequest {
        message_id,
        channel: PLAYER_INFO_CHANNEL.to_string(),
        data: Bytes::new(),
    }
}

/// Verifies and decodes a forwarding payload.
///
/// Secrets are tried in order and compared in constant time. Only after a
/// match is the version read, so a bad version is reported as such even
/// though the data was authentic.
pub fn verify(payload: &[u8], secrets: &[String]) -> Result<ForwardedIdentity, AuthError> {
    if payload.len() < SIGNATURE_LEN {
        return Err(AuthError::InvalidSignature);
    }
    let (signature, signed_data) = payload.split_at(SIGNATURE_LEN);

    let trusted = secrets.iter().any(|secret| {
        let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
            return false;
        };
        mac.update(signed_data);
        mac.verify_slice(signature).is_ok()
    });
    if !trusted {
        return Err(AuthError::InvalidSignature);
    }

    decode_signed_data(signed_data)
}

fn decode_signed_data(signed_data: &[u8]) -> Result<ForwardedIdentity, AuthError> {
    let limits = DecodeLimits::default();
    let mut reader = WireReader::new(signed_data);

    let version = reader.read_var_int()?;
    if version != MODERN_FORWARDING_VERSION {
        return Err(AuthError::UnsupportedForwardingVersion(version));
    }

    let remote_address = reader.read_string(limits.max_string_length)?;
    let uuid = reader.read_uuid()?;
    let username = reader.read_string(MAX_USERNAME_LEN)?;

    let count = reader.read_length()?;
    let mut skin = None;
    for _ in 0..count {
        let property = Property::decode(&mut reader, limits.max_string_length)?;
        if property.name == TEXTURES_PROPERTY {
            skin = Some(SkinProperty {
                value: property.value,
                signature: property.signature.unwrap_or_default(),
            });
            break;
        }
    }
    // Anything after the textures property (or after the last property)
    // is left unread.

    Ok(ForwardedIdentity::new(
        version,
        remote_address,
        uuid,
        username,
        skin,
        ForwardingMode::VelocityModern,
    ))
}

// ---------------------------------------------------------------------------
// Proxy side
// ---------------------------------------------------------------------------

/// Player info as a proxy would forward it.
///
/// Used by proxies and test harnesses to produce payloads this server
/// accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VelocityPlayerInfo {
    pub remote_address: String,
    pub uuid: Uuid,
    pub username: String,
    pub properties: Vec<Property>,
}

impl VelocityPlayerInfo {
    /// The unsigned body, stamped with `version`.
    pub fn signed_data(&self, version: i32) -> BytesMut {
        let mut buf = BytesMut::new();
        buf.put_var_int(version);
        buf.put_string(&self.remote_address);
        buf.put_uuid(&self.uuid);
        buf.put_string(&self.username);
        buf.put_var_int(self.properties.len() as i32);
        for property in &self.properties {
            property.encode(&mut buf);
        }
        buf
    }

    /// A complete version-1 payload signed with `secret`.
    pub fn to_payload(&self, secret: &str) -> Result<Bytes, hmac::digest::InvalidLength> {
        sign(secret, &self.signed_data(MODERN_FORWARDING_VERSION))
    }
}

/// Prefixes `signed_data` with its HMAC-SHA256 under `secret`.
pub fn sign(secret: &str, signed_data: &[u8]) -> Result<Bytes, hmac::digest::InvalidLength> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())?;
    mac.update(signed_data);
    let signature = mac.finalize().into_bytes();

    let mut payload = BytesMut::with_capacity(SIGNATURE_LEN + signed_data.len());
    payload.put_slice(&signature);
    payload.put_slice(signed_data);
    Ok(payload.freeze())
}
