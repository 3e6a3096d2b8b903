//! Wire protocol for Lodestone.
//!
//! This crate knows how bytes on a Minecraft connection map to packets and
//! nothing about sockets or players:
//!
//! - **Wire** ([`wire::WireReader`], [`wire::WireWrite`]): bounds-checked
//!   primitive encoding (VarInt, String, UUID, ...).
//! - **Frames** ([`FrameCodec`]): length-prefixed framing on top of a byte
//!   stream.
//! - **Packets** ([`packets`], [`PacketTable`]): typed packets per phase and
//!   the `(phase, id)` table that decodes them.
//! - **State** ([`ConnectionState`]): which phase a connection is in and
//!   which moves are legal from there.
//!
//! # Architecture
//!
//! ```text
//! Transport (bytes) → FrameCodec (frames) → PacketTable (packets) → Session
//! ```
//!
//! Everything here is synchronous and allocation-light so it can be driven
//! from any I/O layer, including plain byte slices in tests.

// ---------------------------------------------------------------------------
// Module declarations
// ---------------------------------------------------------------------------

mod error;
pub mod frame;
pub mod packets;
mod state;
mod table;
pub mod wire;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use error::{CodecError, ProtocolError};
pub use frame::{FrameCodec, DEFAULT_MAX_FRAME_SIZE};
pub use packets::{
    ClientboundPacket, ClientboundPlay, DecodeLimits, Handshake, LoginClientbound,
    LoginPluginResponse, LoginRequest, LoginStart, PlayPacket, Property, ServerboundPacket,
    StatusRequest, StatusResponse,
};
pub use state::{ConnectionState, LoginStage, NextState, Phase};
pub use table::{PacketDecoder, PacketTable};

/// Protocol version this crate's packet tables describe (1.19.4).
pub const PROTOCOL_VERSION: i32 = 762;
