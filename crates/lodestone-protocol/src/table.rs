//! The `(Phase, id) → decoder` dispatch table.
//!
//! Built once at startup and shared read-only between connections. A packet
//! id is only meaningful relative to a phase, so lookups always take both.
//! An id with no entry is [`ProtocolError::UnexpectedPacket`]; there is no
//! fallback decoder and nothing is skipped.

use std::collections::HashMap;

use crate::packets::{self, ids::serverbound as sb, DecodeLimits, ServerboundPacket};
use crate::wire::WireReader;
use crate::{Phase, ProtocolError};

/// Decodes a packet body. The id has already been read and is passed in.
pub type PacketDecoder =
    fn(i32, &mut WireReader<'_>, &DecodeLimits) -> Result<ServerboundPacket, ProtocolError>;

/// Static registry of legal serverbound packets per phase.
#[derive(Debug, Clone)]
pub struct PacketTable {
    decoders: HashMap<(Phase, i32), PacketDecoder>,
    limits: DecodeLimits,
}

impl PacketTable {
    /// Builds the table for protocol 762.
    pub fn new(limits: DecodeLimits) -> Self {
        let mut decoders: HashMap<(Phase, i32), PacketDecoder> = HashMap::new();

        decoders.insert((Phase::Handshake, sb::HANDSHAKE), packets::decode_handshake);

        decoders.insert((Phase::Status, sb::STATUS_REQUEST), packets::decode_status_request);
        decoders.insert((Phase::Status, sb::PING_REQUEST), packets::decode_ping_request);

        decoders.insert((Phase::Login, sb::LOGIN_START), packets::decode_login_start);
        decoders.insert(
            (Phase::Login, sb::LOGIN_PLUGIN_RESPONSE),
            packets::decode_login_plugin_response,
        );

        for id in 0..=sb::PLAY_MAX {
            decoders.insert((Phase::Play, id), packets::decode_play_opaque);
        }
        decoders.insert((Phase::Play, sb::PLAY_KEEP_ALIVE), packets::decode_play_keep_alive);
        decoders.insert(
            (Phase::Play, sb::PLAY_PLUGIN_MESSAGE),
            packets::decode_play_plugin_message,
        );

        Self { decoders, limits }
    }

    pub fn limits(&self) -> &DecodeLimits {
        &self.limits
    }

    pub fn is_legal(&self, phase: Phase, id: i32) -> bool {
        self.decoders.contains_key(&(phase, id))
    }

    /// Legal ids for `phase`, ascending.
    pub fn legal_ids(&self, phase: Phase) -> Vec<i32> {
        let mut ids: Vec<i32> = self
            .decoders
            .keys()
            .filter(|(p, _)| *p == phase)
            .map(|(_, id)| *id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Decodes one frame payload (id + body) received in `phase`.
    ///
    /// The decoder must consume the whole payload; leftovers are
    /// [`CodecError::TrailingBytes`](crate::CodecError::TrailingBytes).
    pub fn decode(&self, phase: Phase, payload: &[u8]) -> Result<ServerboundPacket, ProtocolError> {
        let mut reader = WireReader::new(payload);
        let id = reader.read_var_int()?;

        let decoder = self
            .decoders
            .get(&(phase, id))
            .ok_or(ProtocolError::UnexpectedPacket { phase, id })?;

        let packet = decoder(id, &mut reader, &self.limits)?;
        reader.finish()?;

        tracing::trace!(%phase, id, len = payload.len(), "decoded packet");
        Ok(packet)
    }
}

impl Default for PacketTable {
    fn default() -> Self {
        Self::new(DecodeLimits::default())
    }
}
