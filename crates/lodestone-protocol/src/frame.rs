//! Length-prefixed frames.
//!
//! ```text
//! [VarInt length][payload: length bytes]
//! ```
//!
//! [`FrameCodec::decode`] works on an accumulating [`BytesMut`]: it returns
//! `Ok(None)` until a whole frame is buffered and never consumes a partial
//! one, so the result is the same however the bytes were split across reads.
//! A length above the configured maximum is rejected as soon as the prefix
//! is complete, before any payload is buffered.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::wire::{var_int_len, WireWrite, MAX_VAR_INT_LEN};
use crate::CodecError;

/// Largest frame vanilla clients will send (a three-byte VarInt).
pub const DEFAULT_MAX_FRAME_SIZE: usize = 2_097_151;

/// Splits a byte stream into frames and builds outgoing ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameCodec {
    max_frame_size: usize,
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_SIZE)
    }
}

impl FrameCodec {
    pub fn new(max_frame_size: usize) -> Self {
        Self { max_frame_size }
    }

    pub fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }

    /// Takes one complete frame off the front of `buf`, if there is one.
    ///
    /// On `Ok(None)` nothing was consumed. On `Err` the stream is unusable.
    pub fn decode(&self, buf: &mut BytesMut) -> Result<Option<Bytes>, CodecError> {
        let Some((len, prefix_len)) = self.peek_length(buf)? else {
            return Ok(None);
        };

        if buf.len() < prefix_len + len {
            buf.reserve(prefix_len + len - buf.len());
            return Ok(None);
        }

        buf.advance(prefix_len);
        Ok(Some(buf.split_to(len).freeze()))
    }

    /// Prepends the VarInt length of `payload`.
    pub fn encode(&self, payload: &[u8], dst: &mut BytesMut) {
        dst.reserve(var_int_len(payload.len() as i32) + payload.len());
        dst.put_var_int(payload.len() as i32);
        dst.put_slice(payload);
    }

    /// Reads the length prefix without consuming it.
    fn peek_length(&self, buf: &BytesMut) -> Result<Option<(usize, usize)>, CodecError> {
        let mut value: u32 = 0;
        for (i, byte) in buf.iter().take(MAX_VAR_INT_LEN).enumerate() {
            value |= u32::from(byte & 0x7F) << (7 * i);
            if byte & 0x80 == 0 {
                let declared = value as i32;
                let len = usize::try_from(declared)
                    .map_err(|_| CodecError::NegativeLength(declared))?;
                if len > self.max_frame_size {
                    return Err(CodecError::FrameTooLarge {
                        len,
                        max: self.max_frame_size,
                    });
                }
                return Ok(Some((len, i + 1)));
            }
        }

        if buf.len() >= MAX_VAR_INT_LEN {
            return Err(CodecError::VarIntTooLong);
        }
        Ok(None)
    }
}

/// Frames `payload` into a fresh buffer.
pub fn write_frame(payload: &[u8]) -> BytesMut {
    let mut dst = BytesMut::new();
    FrameCodec::default().encode(payload, &mut dst);
    dst
}
