//! Typed packets, one closed set per phase and direction.
//!
//! Ids and layouts follow protocol 762 (Minecraft 1.19.4). Serverbound
//! packets are decoded through [`crate::PacketTable`]; clientbound packets
//! are encoded here with [`ClientboundPacket::to_payload`]. Serverbound
//! packets can be encoded too, which is what clients, proxies and tests need.

use bytes::{BufMut, Bytes, BytesMut};
use uuid::Uuid;

use crate::wire::{WireReader, WireWrite};
use crate::{CodecError, NextState, Phase, ProtocolError};

/// Packet ids for protocol 762.
pub mod ids {
    pub mod serverbound {
        pub const HANDSHAKE: i32 = 0x00;

        pub const STATUS_REQUEST: i32 = 0x00;
        pub const PING_REQUEST: i32 = 0x01;

        pub const LOGIN_START: i32 = 0x00;
        pub const LOGIN_PLUGIN_RESPONSE: i32 = 0x02;

        pub const PLAY_PLUGIN_MESSAGE: i32 = 0x0D;
        pub const PLAY_KEEP_ALIVE: i32 = 0x12;
        /// Highest serverbound play id (Use Item).
        pub const PLAY_MAX: i32 = 0x32;
    }

    pub mod clientbound {
        pub const STATUS_RESPONSE: i32 = 0x00;
        pub const PONG_RESPONSE: i32 = 0x01;

        pub const LOGIN_DISCONNECT: i32 = 0x00;
        pub const LOGIN_SUCCESS: i32 = 0x02;
        pub const LOGIN_PLUGIN_REQUEST: i32 = 0x04;

        pub const PLAY_PLUGIN_MESSAGE: i32 = 0x17;
        pub const PLAY_DISCONNECT: i32 = 0x1A;
        pub const PLAY_KEEP_ALIVE: i32 = 0x23;
    }
}

/// Usernames are at most 16 characters, all ASCII.
pub const MAX_USERNAME_LEN: usize = 16;

/// Size limits applied while decoding untrusted packets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeLimits {
    /// Upper bound on any string or byte-array length prefix.
    pub max_string_length: usize,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            max_string_length: 32_767,
        }
    }
}

// ---------------------------------------------------------------------------
// Shared field types
// ---------------------------------------------------------------------------

/// A signed or unsigned profile property, e.g. `textures`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub name: String,
    pub value: String,
    pub signature: Option<String>,
}

impl Property {
    pub fn decode(reader: &mut WireReader<'_>, max_len: usize) -> Result<Self, CodecError> {
        let name = reader.read_string(max_len)?;
        let value = reader.read_string(max_len)?;
        let signature = if reader.read_bool()? {
            Some(reader.read_string(max_len)?)
        } else {
            None
        };
        Ok(Self {
            name,
            value,
            signature,
        })
    }

    pub fn encode(&self, buf: &mut impl BufMut) {
        buf.put_string(&self.name);
        buf.put_string(&self.value);
        buf.put_bool(self.signature.is_some());
        if let Some(signature) = &self.signature {
            buf.put_string(signature);
        }
    }
}

// ---------------------------------------------------------------------------
// Serverbound
// ---------------------------------------------------------------------------

/// Handshake phase, id `0x00`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handshake {
    pub protocol_version: i32,
    /// Raw address field. Proxies using BungeeCord forwarding pack extra
    /// NUL-separated segments in here.
    pub server_address: String,
    pub server_port: u16,
    pub next_state: NextState,
}

impl Handshake {
    pub(crate) fn decode(
        reader: &mut WireReader<'_>,
        limits: &DecodeLimits,
    ) -> Result<Self, ProtocolError> {
        let protocol_version = reader.read_var_int()?;
        let server_address = reader.read_string(limits.max_string_length)?;
        let server_port = reader.read_u16()?;
        let next_state = NextState::from_wire(reader.read_var_int()?)?;
        Ok(Self {
            protocol_version,
            server_address,
            server_port,
            next_state,
        })
    }

    fn encode(&self, buf: &mut BytesMut) {
        buf.put_var_int(self.protocol_version);
        buf.put_string(&self.server_address);
        buf.put_u16(self.server_port);
        buf.put_var_int(self.next_state.to_wire());
    }
}

/// Status phase, client to server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusRequest {
    /// `0x00`, empty body.
    Request,
    /// `0x01`, echoed back in the pong.
    Ping { payload: i64 },
}

/// Login `0x00`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginStart {
    pub username: String,
    pub uuid: Option<Uuid>,
}

impl LoginStart {
    fn decode(reader: &mut WireReader<'_>) -> Result<Self, CodecError> {
        let username = reader.read_string(MAX_USERNAME_LEN)?;
        let uuid = if reader.read_bool()? {
            Some(reader.read_uuid()?)
        } else {
            None
        };
        Ok(Self { username, uuid })
    }

    fn encode(&self, buf: &mut BytesMut) {
        buf.put_string(&self.username);
        buf.put_bool(self.uuid.is_some());
        if let Some(uuid) = &self.uuid {
            buf.put_uuid(uuid);
        }
    }
}

/// Login `0x02`, the answer to a [`LoginClientbound::PluginRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginPluginResponse {
    pub message_id: i32,
    /// `None` when the client did not understand the channel. The payload
    /// length is implied by the frame.
    pub data: Option<Bytes>,
}

impl LoginPluginResponse {
    fn decode(reader: &mut WireReader<'_>) -> Result<Self, CodecError> {
        let message_id = reader.read_var_int()?;
        let data = if reader.read_bool()? {
            Some(Bytes::copy_from_slice(reader.read_remaining()))
        } else {
            None
        };
        Ok(Self { message_id, data })
    }

    fn encode(&self, buf: &mut BytesMut) {
        buf.put_var_int(self.message_id);
        buf.put_bool(self.data.is_some());
        if let Some(data) = &self.data {
            buf.put_slice(data);
        }
    }
}

/// Login phase, client to server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginRequest {
    Start(LoginStart),
    PluginResponse(LoginPluginResponse),
}

/// Play phase, client to server.
///
/// Only the packets this server acts on are typed. Every other legal
/// play id arrives as [`PlayPacket::Opaque`] for game logic to interpret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayPacket {
    KeepAlive { id: i64 },
    PluginMessage { channel: String, data: Bytes },
    Opaque { id: i32, data: Bytes },
}

/// Any packet a client may send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerboundPacket {
    Handshake(Handshake),
    Status(StatusRequest),
    Login(LoginRequest),
    Play(PlayPacket),
}

impl ServerboundPacket {
    pub fn phase(&self) -> Phase {
        match self {
            Self::Handshake(_) => Phase::Handshake,
            Self::Status(_) => Phase::Status,
            Self::Login(_) => Phase::Login,
            Self::Play(_) => Phase::Play,
        }
    }

    pub fn id(&self) -> i32 {
        use ids::serverbound::*;
        match self {
            Self::Handshake(_) => HANDSHAKE,
            Self::Status(StatusRequest::Request) => STATUS_REQUEST,
            Self::Status(StatusRequest::Ping { .. }) => PING_REQUEST,
            Self::Login(LoginRequest::Start(_)) => LOGIN_START,
            Self::Login(LoginRequest::PluginResponse(_)) => LOGIN_PLUGIN_RESPONSE,
            Self::Play(PlayPacket::KeepAlive { .. }) => PLAY_KEEP_ALIVE,
            Self::Play(PlayPacket::PluginMessage { .. }) => PLAY_PLUGIN_MESSAGE,
            Self::Play(PlayPacket::Opaque { id, .. }) => *id,
        }
    }

    /// Packet id followed by body, ready to be framed.
    pub fn to_payload(&self) -> BytesMut {
        let mut buf = BytesMut::new();
        buf.put_var_int(self.id());
        match self {
            Self::Handshake(handshake) => handshake.encode(&mut buf),
            Self::Status(StatusRequest::Request) => {}
            Self::Status(StatusRequest::Ping { payload }) => buf.put_i64(*payload),
            Self::Login(LoginRequest::Start(start)) => start.encode(&mut buf),
            Self::Login(LoginRequest::PluginResponse(resp)) => resp.encode(&mut buf),
            Self::Play(PlayPacket::KeepAlive { id }) => buf.put_i64(*id),
            Self::Play(PlayPacket::PluginMessage { channel, data }) => {
                buf.put_string(channel);
                buf.put_slice(data);
            }
            Self::Play(PlayPacket::Opaque { data, .. }) => buf.put_slice(data),
        }
        buf
    }
}

// Decoders registered in the packet table. Each one reads a body whose
// packet id has already been consumed.

pub(crate) fn decode_handshake(
    _id: i32,
    reader: &mut WireReader<'_>,
    limits: &DecodeLimits,
) -> Result<ServerboundPacket, ProtocolError> {
    Handshake::decode(reader, limits).map(ServerboundPacket::Handshake)
}

pub(crate) fn decode_status_request(
    _id: i32,
    _reader: &mut WireReader<'_>,
    _limits: &DecodeLimits,
) -> Result<ServerboundPacket, ProtocolError> {
    Ok(ServerboundPacket::Status(StatusRequest::Request))
}

pub(crate) fn decode_ping_request(
    _id: i32,
    reader: &mut WireReader<'_>,
    _limits: &DecodeLimits,
) -> Result<ServerboundPacket, ProtocolError> {
    let payload = reader.read_i64()?;
    Ok(ServerboundPacket::Status(StatusRequest::Ping { payload }))
}

pub(crate) fn decode_login_start(
    _id: i32,
    reader: &mut WireReader<'_>,
    _limits: &DecodeLimits,
) -> Result<ServerboundPacket, ProtocolError> {
    let start = LoginStart::decode(reader)?;
    Ok(ServerboundPacket::Login(LoginRequest::Start(start)))
}

pub(crate) fn decode_login_plugin_response(
    _id: i32,
    reader: &mut WireReader<'_>,
    _limits: &DecodeLimits,
) -> Result<ServerboundPacket, ProtocolError> {
    let response = LoginPluginResponse::decode(reader)?;
    Ok(ServerboundPacket::Login(LoginRequest::PluginResponse(response)))
}

pub(crate) fn decode_play_keep_alive(
    _id: i32,
    reader: &mut WireReader<'_>,
    _limits: &DecodeLimits,
) -> Result<ServerboundPacket, ProtocolError> {
    let id = reader.read_i64()?;
    Ok(ServerboundPacket::Play(PlayPacket::KeepAlive { id }))
}

pub(crate) fn decode_play_plugin_message(
    _id: i32,
    reader: &mut WireReader<'_>,
    limits: &DecodeLimits,
) -> Result<ServerboundPacket, ProtocolError> {
    let channel = reader.read_string(limits.max_string_length)?;
    let data = Bytes::copy_from_slice(reader.read_remaining());
    Ok(ServerboundPacket::Play(PlayPacket::PluginMessage { channel, data }))
}

pub(crate) fn decode_play_opaque(
    id: i32,
    reader: &mut WireReader<'_>,
    _limits: &DecodeLimits,
) -> Result<ServerboundPacket, ProtocolError> {
    let data = Bytes::copy_from_slice(reader.read_remaining());
    Ok(ServerboundPacket::Play(PlayPacket::Opaque { id, data }))
}

// ---------------------------------------------------------------------------
// Clientbound
// ---------------------------------------------------------------------------

/// Status phase, server to client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusResponse {
    /// `0x00`, server-list JSON.
    Response { json: String },
    /// `0x01`, echo of the ping payload.
    Pong { payload: i64 },
}

/// Login phase, server to client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginClientbound {
    /// `0x00`, JSON chat component.
    Disconnect { reason: String },
    /// `0x02`
    Success {
        uuid: Uuid,
        username: String,
        properties: Vec<Property>,
    },
    /// `0x04`
    PluginRequest {
        message_id: i32,
        channel: String,
        data: Bytes,
    },
}

/// Play phase, server to client.
///
/// Game logic produces these; anything without a typed variant goes out
/// as [`ClientboundPlay::Raw`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientboundPlay {
    /// `0x1A`, JSON chat component.
    Disconnect { reason: String },
    /// `0x23`
    KeepAlive { id: i64 },
    /// `0x17`
    PluginMessage { channel: String, data: Bytes },
    Raw { id: i32, data: Bytes },
}

/// Any packet the server may send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientboundPacket {
    Status(StatusResponse),
    Login(LoginClientbound),
    Play(ClientboundPlay),
}

impl ClientboundPacket {
    pub fn phase(&self) -> Phase {
        match self {
            Self::Status(_) => Phase::Status,
            Self::Login(_) => Phase::Login,
            Self::Play(_) => Phase::Play,
        }
    }

    pub fn id(&self) -> i32 {
        use ids::clientbound::*;
        match self {
            Self::Status(StatusResponse::Response { .. }) => STATUS_RESPONSE,
            Self::Status(StatusResponse::Pong { .. }) => PONG_RESPONSE,
            Self::Login(LoginClientbound::Disconnect { .. }) => LOGIN_DISCONNECT,
            Self::Login(LoginClientbound::Success { .. }) => LOGIN_SUCCESS,
            Self::Login(LoginClientbound::PluginRequest { .. }) => LOGIN_PLUGIN_REQUEST,
            Self::Play(ClientboundPlay::Disconnect { .. }) => PLAY_DISCONNECT,
            Self::Play(ClientboundPlay::KeepAlive { .. }) => PLAY_KEEP_ALIVE,
            Self::Play(ClientboundPlay::PluginMessage { .. }) => PLAY_PLUGIN_MESSAGE,
            Self::Play(ClientboundPlay::Raw { id, .. }) => *id,
        }
    }

    /// Packet id followed by body, ready to be framed.
    pub fn to_payload(&self) -> BytesMut {
        let mut buf = BytesMut::new();
        buf.put_var_int(self.id());
        match self {
            Self::Status(StatusResponse::Response { json }) => buf.put_string(json),
            Self::Status(StatusResponse::Pong { payload }) => buf.put_i64(*payload),
            Self::Login(LoginClientbound::Disconnect { reason }) => buf.put_string(reason),
            Self::Login(LoginClientbound::Success {
                uuid,
                username,
                properties,
            }) => {
                buf.put_uuid(uuid);
                buf.put_string(username);
                buf.put_var_int(properties.len() as i32);
                for property in properties {
                    property.encode(&mut buf);
                }
            }
            Self::Login(LoginClientbound::PluginRequest {
                message_id,
                channel,
                data,
            }) => {
                buf.put_var_int(*message_id);
                buf.put_string(channel);
                buf.put_slice(data);
            }
            Self::Play(ClientboundPlay::Disconnect { reason }) => buf.put_string(reason),
            Self::Play(ClientboundPlay::KeepAlive { id }) => buf.put_i64(*id),
            Self::Play(ClientboundPlay::PluginMessage { channel, data }) => {
                buf.put_string(channel);
                buf.put_slice(data);
            }
            Self::Play(ClientboundPlay::Raw { data, .. }) => buf.put_slice(data),
        }
        buf
    }
}
