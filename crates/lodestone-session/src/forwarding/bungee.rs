//! BungeeCord and BungeeGuard forwarding through the handshake.
//!
//! A BungeeCord proxy rewrites the handshake's server-address field:
//!
//! ```text
//! hostname \0 player-ip \0 uuid [\0 properties-json]
//! ```
//!
//! `uuid` is either dashed or 32 bare hex digits. `properties-json` is a JSON
//! array of `{name, value, signature?}` profile properties. BungeeGuard adds
//! a shared token, either as a `bungeeguard-token` property inside that
//! array or as a bare final segment.
//!
//! Plain BungeeCord forwarding has no proof of origin. Whoever can reach
//! the server port can claim any UUID and address, so it is only safe when
//! the port is reachable from the proxy alone.

use std::net::IpAddr;

use serde::Deserialize;
use subtle::{Choice, ConstantTimeEq};
use uuid::Uuid;

use crate::identity::TEXTURES_PROPERTY;
use crate::{AuthError, ForwardedIdentity, ForwardingMode, SkinProperty};

/// Property name BungeeGuard uses for its token.
pub const TOKEN_PROPERTY: &str = "bungeeguard-token";

/// Forwarding data taken from a handshake, waiting for the username that
/// arrives with `LoginStart`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BungeeForwarding {
    hostname: String,
    remote_address: String,
    uuid: Uuid,
    skin: Option<SkinProperty>,
    mode: ForwardingMode,
}

impl BungeeForwarding {
    /// The hostname the player typed, with the forwarding segments removed.
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn remote_address(&self) -> &str {
        &self.remote_address
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    /// Completes the identity with the username from `LoginStart`.
    pub fn into_identity(self, username: String) -> ForwardedIdentity {
        ForwardedIdentity::new(
            0,
            self.remote_address,
            self.uuid,
            username,
            self.skin,
            self.mode,
        )
    }
}

#[derive(Debug, Deserialize)]
struct JsonProperty {
    name: String,
    value: String,
    #[serde(default)]
    signature: Option<String>,
}

/// Parses a BungeeCord-forwarded address with no token check.
pub(crate) fn parse(address: &str, mode: ForwardingMode) -> Result<BungeeForwarding, AuthError> {
    let segments = split(address, mode, 1)?;
    let properties = match segments.extra.first() {
        Some(raw) => parse_properties(raw)?,
        None => Vec::new(),
    };
    segments.into_forwarding(&properties, mode)
}

/// Parses a BungeeGuard-forwarded address and checks its token against
/// `accepted`.
///
/// The token is only compared, never stored in the forwarding data.
pub(crate) fn parse_guarded(
    address: &str,
    accepted: &[String],
) -> Result<BungeeForwarding, AuthError> {
    let mode = ForwardingMode::BungeeGuard;
    let segments = split(address, mode, 2)?;

    // After the uuid: `[properties]`, `[properties, token]` or `[token]`.
    let (properties, raw_token) = match (segments.extra.first(), segments.extra.get(1)) {
        (None, _) => (Vec::new(), None),
        (Some(only), None) if only.starts_with('[') => (parse_properties(only)?, None),
        (Some(only), None) => (Vec::new(), Some(*only)),
        (Some(properties), Some(token)) => (parse_properties(properties)?, Some(*token)),
    };

    let token = properties
        .iter()
        .find(|p| p.name == TOKEN_PROPERTY)
        .map(|p| p.value.as_str())
        .or(raw_token);
    match token {
        Some(token) if token_matches(token, accepted) => {}
        _ => return Err(AuthError::InvalidToken),
    }

    segments.into_forwarding(&properties, mode)
}

/// Case-sensitive, constant-time membership test.
pub(crate) fn token_matches(token: &str, accepted: &[String]) -> bool {
    let matched = accepted.iter().fold(Choice::from(0), |found, candidate| {
        found | candidate.as_bytes().ct_eq(token.as_bytes())
    });
    bool::from(matched)
}

struct Segments<'a> {
    hostname: &'a str,
    ip: &'a str,
    uuid: &'a str,
    extra: Vec<&'a str>,
}

/// Splits off hostname, ip and uuid, allowing at most `max_extra` further
/// segments.
fn split(
    address: &str,
    mode: ForwardingMode,
    max_extra: usize,
) -> Result<Segments<'_>, AuthError> {
    let mut parts = address.split('\0');
    let (Some(hostname), Some(ip), Some(uuid)) = (parts.next(), parts.next(), parts.next()) else {
        return Err(AuthError::ForwardingRequired(mode));
    };
    let extra: Vec<&str> = parts.collect();
    if extra.len() > max_extra {
        return Err(AuthError::MalformedHandshakeAddress(format!(
            "{} segments after the uuid, expected at most {max_extra}",
            extra.len()
        )));
    }
    Ok(Segments {
        hostname,
        ip,
        uuid,
        extra,
    })
}

fn parse_properties(raw: &str) -> Result<Vec<JsonProperty>, AuthError> {
    serde_json::from_str(raw).map_err(|_| {
        AuthError::MalformedHandshakeAddress("properties segment is not a JSON array".into())
    })
}

impl Segments<'_> {
    fn into_forwarding(
        self,
        properties: &[JsonProperty],
        mode: ForwardingMode,
    ) -> Result<BungeeForwarding, AuthError> {
        let ip: IpAddr = self
            .ip
            .parse()
            .map_err(|_| AuthError::MalformedHandshakeAddress("invalid player ip".into()))?;
        let uuid = Uuid::try_parse(self.uuid)
            .map_err(|_| AuthError::MalformedHandshakeAddress("invalid player uuid".into()))?;

        let skin = properties
            .iter()
            .find(|p| p.name == TEXTURES_PROPERTY)
            .map(|p| SkinProperty {
                value: p.value.clone(),
                signature: p.signature.clone().unwrap_or_default(),
            });

        Ok(BungeeForwarding {
            hostname: self.hostname.to_string(),
            remote_address: ip.to_string(),
            uuid,
            skin,
            mode,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UUID_HEX: &str = "00000000000000000000000000000001";
    const UUID_DASHED: &str = "00000000-0000-0000-0000-000000000001";
    const TEXTURES_JSON: &str =
        r#"[{"name":"textures","value":"dGV4dHVyZXM=","signature":"c2ln"}]"#;

    fn tokens() -> Vec<String> {
        vec!["guard-token".into()]
    }

    fn address(segments: &[&str]) -> String {
        segments.join("\0")
    }

    // =====================================================================
    // parse()
    // =====================================================================

    #[test]
    fn test_parse_full_address_extracts_fields() {
        let raw = address(&["play.example.com", "203.0.113.9", UUID_HEX, TEXTURES_JSON]);

        let forwarding = parse(&raw, ForwardingMode::BungeeCordLegacy).unwrap();

        assert_eq!(forwarding.hostname(), "play.example.com");
        assert_eq!(forwarding.remote_address(), "203.0.113.9");
        assert_eq!(forwarding.uuid(), Uuid::from_u128(1));
        let identity = forwarding.into_identity("Steve".into());
        assert_eq!(identity.username(), "Steve");
        assert_eq!(identity.version(), 0);
        assert_eq!(identity.mode(), ForwardingMode::BungeeCordLegacy);
        assert_eq!(identity.skin().map(|s| s.signature.as_str()), Some("c2ln"));
    }

    #[test]
    fn test_parse_dashed_uuid_accepted() {
        let raw = address(&["host", "::1", UUID_DASHED]);

        let forwarding = parse(&raw, ForwardingMode::BungeeCordLegacy).unwrap();

        assert_eq!(forwarding.uuid(), Uuid::from_u128(1));
        assert_eq!(forwarding.remote_address(), "::1");
    }

    #[test]
    fn test_parse_plain_hostname_requires_forwarding() {
        assert_eq!(
            parse("play.example.com", ForwardingMode::BungeeCordLegacy),
            Err(AuthError::ForwardingRequired(ForwardingMode::BungeeCordLegacy))
        );
    }

    #[test]
    fn test_parse_two_segments_requires_forwarding() {
        let raw = address(&["host", "203.0.113.9"]);
        assert!(matches!(
            parse(&raw, ForwardingMode::BungeeCordLegacy),
            Err(AuthError::ForwardingRequired(_))
        ));
    }

    #[test]
    fn test_parse_bad_uuid_is_malformed() {
        let raw = address(&["host", "203.0.113.9", "not-a-uuid"]);
        assert!(matches!(
            parse(&raw, ForwardingMode::BungeeCordLegacy),
            Err(AuthError::MalformedHandshakeAddress(_))
        ));
    }

    #[test]
    fn test_parse_bad_ip_is_malformed() {
        let raw = address(&["host", "somewhere", UUID_HEX]);
        assert!(matches!(
            parse(&raw, ForwardingMode::BungeeCordLegacy),
            Err(AuthError::MalformedHandshakeAddress(_))
        ));
    }

    #[test]
    fn test_parse_bad_properties_is_malformed() {
        let raw = address(&["host", "203.0.113.9", UUID_HEX, "{not json"]);
        assert!(matches!(
            parse(&raw, ForwardingMode::BungeeCordLegacy),
            Err(AuthError::MalformedHandshakeAddress(_))
        ));
    }

    #[test]
    fn test_parse_extra_segment_after_properties_is_malformed() {
        let raw = address(&["host", "203.0.113.9", UUID_HEX, TEXTURES_JSON, "more"]);
        assert!(matches!(
            parse(&raw, ForwardingMode::BungeeCordLegacy),
            Err(AuthError::MalformedHandshakeAddress(_))
        ));
    }

    // =====================================================================
    // parse_guarded()
    // =====================================================================

    #[test]
    fn test_parse_guarded_raw_token_segment_accepted() {
        let raw = address(&["host", "203.0.113.9", UUID_HEX, "guard-token"]);

        let forwarding = parse_guarded(&raw, &tokens()).unwrap();

        assert_eq!(forwarding.hostname(), "host");
        assert_eq!(forwarding.into_identity("Steve".into()).skin(), None);
    }

    #[test]
    fn test_parse_guarded_token_property_accepted_and_not_kept() {
        let json = r#"[{"name":"textures","value":"dA==","signature":"cw=="},{"name":"bungeeguard-token","value":"guard-token"}]"#;
        let raw = address(&["host", "203.0.113.9", UUID_HEX, json]);

        let identity = parse_guarded(&raw, &tokens())
            .unwrap()
            .into_identity("Steve".into());

        assert_eq!(identity.skin().map(|s| s.value.as_str()), Some("dA=="));
        assert!(!format!("{identity:?}").contains("guard-token"));
    }

    #[test]
    fn test_parse_guarded_properties_then_raw_token_accepted() {
        let raw = address(&["host", "203.0.113.9", UUID_HEX, TEXTURES_JSON, "guard-token"]);

        let identity = parse_guarded(&raw, &tokens())
            .unwrap()
            .into_identity("Steve".into());

        assert_eq!(identity.skin().map(|s| s.signature.as_str()), Some("c2ln"));
    }

    #[test]
    fn test_parse_guarded_bad_properties_is_malformed() {
        let raw = address(&["host", "203.0.113.9", UUID_HEX, "{not json", "guard-token"]);
        assert_eq!(
            parse_guarded(&raw, &tokens()),
            Err(AuthError::MalformedHandshakeAddress(
                "properties segment is not a JSON array".into()
            ))
        );

        let raw = address(&["host", "203.0.113.9", UUID_HEX, "[{broken"]);
        assert!(matches!(
            parse_guarded(&raw, &tokens()),
            Err(AuthError::MalformedHandshakeAddress(_))
        ));
    }

    #[test]
    fn test_parse_guarded_extra_segments_rejected() {
        let raw = address(&[
            "host",
            "203.0.113.9",
            UUID_HEX,
            TEXTURES_JSON,
            "guess",
            "guard-token",
        ]);
        assert!(matches!(
            parse_guarded(&raw, &tokens()),
            Err(AuthError::MalformedHandshakeAddress(_))
        ));
    }

    #[test]
    fn test_parse_guarded_wrong_token_rejected() {
        let raw = address(&["host", "203.0.113.9", UUID_HEX, "guess"]);
        assert_eq!(parse_guarded(&raw, &tokens()), Err(AuthError::InvalidToken));
    }

    #[test]
    fn test_parse_guarded_token_is_case_sensitive() {
        let raw = address(&["host", "203.0.113.9", UUID_HEX, "GUARD-TOKEN"]);
        assert_eq!(parse_guarded(&raw, &tokens()), Err(AuthError::InvalidToken));
    }

    #[test]
    fn test_parse_guarded_missing_token_rejected() {
        let raw = address(&["host", "203.0.113.9", UUID_HEX, TEXTURES_JSON]);
        assert_eq!(parse_guarded(&raw, &tokens()), Err(AuthError::InvalidToken));

        let raw = address(&["host", "203.0.113.9", UUID_HEX]);
        assert_eq!(parse_guarded(&raw, &tokens()), Err(AuthError::InvalidToken));
    }

    #[test]
    fn test_parse_guarded_no_configured_tokens_rejects_everything() {
        let raw = address(&["host", "203.0.113.9", UUID_HEX, ""]);
        assert_eq!(parse_guarded(&raw, &[]), Err(AuthError::InvalidToken));
    }

    #[test]
    fn test_token_matches_any_configured_entry() {
        let accepted = vec!["first".to_string(), "second".to_string()];
        assert!(token_matches("second", &accepted));
        assert!(!token_matches("secon", &accepted));
        assert!(!token_matches("", &accepted));
    }
}
