//! Primitive wire types shared by every packet.
//!
//! Decoding goes through [`WireReader`], a cursor over a borrowed slice.
//! The slice is the reader's whole budget: asking for more bytes than it
//! holds is [`CodecError::UnexpectedEof`], never a zero-filled read.
//!
//! Encoding goes through the [`WireWrite`] extension trait, implemented for
//! every [`BufMut`]. Encoders cannot fail; the caller controls the values.
//!
//! Multi-byte integers are big-endian. VarInt/VarLong are LEB128-style:
//! seven data bits per byte, least-significant group first, high bit set on
//! every byte except the last.

use bytes::BufMut;
use uuid::Uuid;

use crate::CodecError;

/// Longest legal VarInt encoding.
pub const MAX_VAR_INT_LEN: usize = 5;

/// Longest legal VarLong encoding.
pub const MAX_VAR_LONG_LEN: usize = 10;

const SEGMENT_BITS: u8 = 0x7F;
const CONTINUE_BIT: u8 = 0x80;

/// Number of bytes `value` occupies when VarInt-encoded.
pub fn var_int_len(value: i32) -> usize {
    let bits = value as u32;
    match bits {
        0..=0x7F => 1,
        0x80..=0x3FFF => 2,
        0x4000..=0x1F_FFFF => 3,
        0x20_0000..=0xFFF_FFFF => 4,
        _ => 5,
    }
}

/// Cursor over a fully received byte slice.
#[derive(Debug, Clone)]
pub struct WireReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> WireReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Fails with [`CodecError::TrailingBytes`] unless everything was read.
    pub fn finish(&self) -> Result<(), CodecError> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(CodecError::TrailingBytes(n)),
        }
    }

    /// Takes exactly `len` bytes.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], CodecError> {
        if len > self.remaining() {
            return Err(CodecError::UnexpectedEof {
                needed: len,
                remaining: self.remaining(),
            });
        }
        let slice = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    /// Takes a fixed-size block, e.g. a 32-byte signature.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    /// Takes everything left. Used for payloads whose length is implied by
    /// the enclosing frame.
    pub fn read_remaining(&mut self) -> &'a [u8] {
        let slice = &self.buf[self.pos..];
        self.pos = self.buf.len();
        slice
    }

    pub fn read_u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_i8(&mut self) -> Result<i8, CodecError> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_bool(&mut self) -> Result<bool, CodecError> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(CodecError::InvalidBoolean(other)),
        }
    }

    pub fn read_u16(&mut self) -> Result<u16, CodecError> {
        Ok(u16::from_be_bytes(self.read_array()?))
    }

    pub fn read_i16(&mut self) -> Result<i16, CodecError> {
        Ok(i16::from_be_bytes(self.read_array()?))
    }

    pub fn read_i32(&mut self) -> Result<i32, CodecError> {
        Ok(i32::from_be_bytes(self.read_array()?))
    }

    pub fn read_i64(&mut self) -> Result<i64, CodecError> {
        Ok(i64::from_be_bytes(self.read_array()?))
    }

    pub fn read_f32(&mut self) -> Result<f32, CodecError> {
        Ok(f32::from_be_bytes(self.read_array()?))
    }

    pub fn read_f64(&mut self) -> Result<f64, CodecError> {
        Ok(f64::from_be_bytes(self.read_array()?))
    }

    pub fn read_var_int(&mut self) -> Result<i32, CodecError> {
        let mut value: u32 = 0;
        for i in 0..MAX_VAR_INT_LEN {
            let byte = self.read_u8()?;
            value |= u32::from(byte & SEGMENT_BITS) << (7 * i);
            if byte & CONTINUE_BIT == 0 {
                return Ok(value as i32);
            }
        }
        Err(CodecError::VarIntTooLong)
    }

    pub fn read_var_long(&mut self) -> Result<i64, CodecError> {
        let mut value: u64 = 0;
        for i in 0..MAX_VAR_LONG_LEN {
            let byte = self.read_u8()?;
            value |= u64::from(byte & SEGMENT_BITS) << (7 * i);
            if byte & CONTINUE_BIT == 0 {
                return Ok(value as i64);
            }
        }
        Err(CodecError::VarLongTooLong)
    }

    /// Reads a VarInt that must not be negative, as a `usize`.
    pub fn read_length(&mut self) -> Result<usize, CodecError> {
        let len = self.read_var_int()?;
        usize::try_from(len).map_err(|_| CodecError::NegativeLength(len))
    }

    /// Reads a VarInt byte-length prefix and that many UTF-8 bytes.
    ///
    /// The limit is checked before any string byte is touched, so a hostile
    /// length leaves the cursor right after the prefix.
    pub fn read_string(&mut self, max_len: usize) -> Result<String, CodecError> {
        let len = self.read_length()?;
        if len > max_len {
            return Err(CodecError::StringTooLong { len, max: max_len });
        }
        let bytes = self.read_bytes(len)?;
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| CodecError::InvalidUtf8)
    }

    /// Reads 16 bytes as two big-endian halves, most significant first.
    pub fn read_uuid(&mut self) -> Result<Uuid, CodecError> {
        let most = self.read_i64()? as u64;
        let least = self.read_i64()? as u64;
        Ok(Uuid::from_u64_pair(most, least))
    }

    /// Reads a VarInt-prefixed byte array.
    pub fn read_byte_array(&mut self, max_len: usize) -> Result<&'a [u8], CodecError> {
        let len = self.read_length()?;
        if len > max_len {
            return Err(CodecError::ByteArrayTooLong { len, max: max_len });
        }
        self.read_bytes(len)
    }
}

/// Encoders for the primitive wire types.
pub trait WireWrite: BufMut {
    fn put_var_int(&mut self, value: i32) {
        let mut bits = value as u32;
        loop {
            if bits & !u32::from(SEGMENT_BITS) == 0 {
                self.put_u8(bits as u8);
                return;
            }
            self.put_u8((bits as u8 & SEGMENT_BITS) | CONTINUE_BIT);
            bits >>= 7;
        }
    }

    fn put_var_long(&mut self, value: i64) {
        let mut bits = value as u64;
        loop {
            if bits & !u64::from(SEGMENT_BITS) == 0 {
                self.put_u8(bits as u8);
                return;
            }
            self.put_u8((bits as u8 & SEGMENT_BITS) | CONTINUE_BIT);
            bits >>= 7;
        }
    }

    fn put_bool(&mut self, value: bool) {
        self.put_u8(u8::from(value));
    }

    /// Writes a VarInt byte length followed by the UTF-8 bytes.
    fn put_string(&mut self, value: &str) {
        self.put_var_int(value.len() as i32);
        self.put_slice(value.as_bytes());
    }

    fn put_uuid(&mut self, value: &Uuid) {
        let (most, least) = value.as_u64_pair();
        self.put_u64(most);
        self.put_u64(least);
    }

    fn put_byte_array(&mut self, value: &[u8]) {
        self.put_var_int(value.len() as i32);
        self.put_slice(value);
    }
}

impl<B: BufMut> WireWrite for B {}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn encode_var_int(value: i32) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.put_var_int(value);
        buf
    }

    // -- VarInt -----------------------------------------------------------

    #[test]
    fn test_put_var_int_known_vectors() {
        assert_eq!(encode_var_int(0), [0x00]);
        assert_eq!(encode_var_int(1), [0x01]);
        assert_eq!(encode_var_int(127), [0x7F]);
        assert_eq!(encode_var_int(128), [0x80, 0x01]);
        assert_eq!(encode_var_int(255), [0xFF, 0x01]);
        assert_eq!(encode_var_int(25565), [0xDD, 0xC7, 0x01]);
        assert_eq!(encode_var_int(2_097_151), [0xFF, 0xFF, 0x7F]);
        assert_eq!(encode_var_int(i32::MAX), [0xFF, 0xFF, 0xFF, 0xFF, 0x07]);
        assert_eq!(encode_var_int(-1), [0xFF, 0xFF, 0xFF, 0xFF, 0x0F]);
        assert_eq!(encode_var_int(i32::MIN), [0x80, 0x80, 0x80, 0x80, 0x08]);
    }

    #[test]
    fn test_read_var_int_six_bytes_returns_too_long() {
        let bytes = [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x01];
        let mut reader = WireReader::new(&bytes);
        assert_eq!(reader.read_var_int(), Err(CodecError::VarIntTooLong));
    }

    #[test]
    fn test_read_var_int_truncated_returns_eof() {
        let bytes = [0x80, 0x80];
        let mut reader = WireReader::new(&bytes);
        assert!(matches!(
            reader.read_var_int(),
            Err(CodecError::UnexpectedEof { needed: 1, remaining: 0 })
        ));
    }

    #[test]
    fn test_read_var_long_eleven_bytes_returns_too_long() {
        let bytes = [0xFF; 11];
        let mut reader = WireReader::new(&bytes);
        assert_eq!(reader.read_var_long(), Err(CodecError::VarLongTooLong));
    }

    #[test]
    fn test_var_long_extremes() {
        for value in [0i64, 1, -1, i64::MAX, i64::MIN] {
            let mut buf = Vec::new();
            buf.put_var_long(value);
            assert!(buf.len() <= MAX_VAR_LONG_LEN);
            assert_eq!(WireReader::new(&buf).read_var_long(), Ok(value));
        }
    }

    #[test]
    fn test_read_length_negative_returns_error() {
        let bytes = encode_var_int(-5);
        let mut reader = WireReader::new(&bytes);
        assert_eq!(reader.read_length(), Err(CodecError::NegativeLength(-5)));
    }

    // -- Strings ----------------------------------------------------------

    #[test]
    fn test_read_string_over_limit_consumes_only_prefix() {
        let mut buf = Vec::new();
        buf.put_string("abcdefgh");
        let mut reader = WireReader::new(&buf);

        let result = reader.read_string(4);

        assert_eq!(result, Err(CodecError::StringTooLong { len: 8, max: 4 }));
        assert_eq!(reader.position(), 1, "only the length prefix is consumed");
    }

    #[test]
    fn test_read_byte_array_over_limit_reports_byte_array() {
        let mut buf = Vec::new();
        buf.put_byte_array(&[0xAB; 6]);
        let mut reader = WireReader::new(&buf);

        assert_eq!(
            reader.read_byte_array(5),
            Err(CodecError::ByteArrayTooLong { len: 6, max: 5 })
        );
        assert_eq!(WireReader::new(&buf).read_byte_array(6), Ok(&[0xAB; 6][..]));
    }

    #[test]
    fn test_read_string_invalid_utf8_returns_error() {
        let bytes = [0x02, 0xC3, 0x28];
        let mut reader = WireReader::new(&bytes);
        assert_eq!(reader.read_string(16), Err(CodecError::InvalidUtf8));
    }

    #[test]
    fn test_read_string_length_counts_bytes_not_chars() {
        let mut buf = Vec::new();
        buf.put_string("é");
        assert_eq!(buf[0], 2);
        assert_eq!(WireReader::new(&buf).read_string(2).as_deref(), Ok("é"));
    }

    #[test]
    fn test_read_string_declared_past_end_returns_eof() {
        let bytes = [0x05, b'a', b'b'];
        let mut reader = WireReader::new(&bytes);
        assert!(matches!(
            reader.read_string(16),
            Err(CodecError::UnexpectedEof { needed: 5, remaining: 2 })
        ));
    }

    // -- Fixed-width ------------------------------------------------------

    #[test]
    fn test_read_bool_rejects_other_bytes() {
        assert_eq!(WireReader::new(&[1]).read_bool(), Ok(true));
        assert_eq!(WireReader::new(&[0]).read_bool(), Ok(false));
        assert_eq!(
            WireReader::new(&[2]).read_bool(),
            Err(CodecError::InvalidBoolean(2))
        );
    }

    #[test]
    fn test_read_uuid_is_big_endian_most_significant_first() {
        let uuid = Uuid::from_u128(1);
        let mut buf = Vec::new();
        buf.put_uuid(&uuid);
        assert_eq!(buf.len(), 16);
        assert_eq!(buf[15], 1);
        assert!(buf[..15].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_read_array_short_input_returns_eof() {
        let bytes = [0u8; 31];
        let mut reader = WireReader::new(&bytes);
        assert!(matches!(
            reader.read_array::<32>(),
            Err(CodecError::UnexpectedEof { needed: 32, remaining: 31 })
        ));
    }

    #[test]
    fn test_finish_reports_trailing_bytes() {
        let bytes = [0x01, 0x02, 0x03];
        let mut reader = WireReader::new(&bytes);
        reader.read_u8().unwrap();
        assert_eq!(reader.finish(), Err(CodecError::TrailingBytes(2)));
    }

    #[test]
    fn test_integers_are_big_endian() {
        let bytes = [0x12, 0x34, 0x00, 0x00, 0x00, 0x2A];
        let mut reader = WireReader::new(&bytes);
        assert_eq!(reader.read_u16(), Ok(0x1234));
        assert_eq!(reader.read_i32(), Ok(42));
    }

    // -- Properties -------------------------------------------------------

    proptest! {
        #[test]
        fn prop_var_int_roundtrip(value in any::<i32>()) {
            let buf = encode_var_int(value);
            prop_assert!((1..=MAX_VAR_INT_LEN).contains(&buf.len()));
            prop_assert_eq!(buf.len(), var_int_len(value));
            let mut reader = WireReader::new(&buf);
            prop_assert_eq!(reader.read_var_int(), Ok(value));
            prop_assert_eq!(reader.remaining(), 0);
        }

        #[test]
        fn prop_var_int_len_monotonic(a in any::<u32>(), b in any::<u32>()) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(var_int_len(lo as i32) <= var_int_len(hi as i32));
        }

        #[test]
        fn prop_string_roundtrip(value in ".{0,64}") {
            let mut buf = Vec::new();
            buf.put_string(&value);
            let mut reader = WireReader::new(&buf);
            prop_assert_eq!(reader.read_string(value.len()), Ok(value));
            prop_assert_eq!(reader.remaining(), 0);
        }

        #[test]
        fn prop_uuid_roundtrip(bits in any::<u128>()) {
            let uuid = Uuid::from_u128(bits);
            let mut buf = Vec::new();
            buf.put_uuid(&uuid);
            let mut reader = WireReader::new(&buf);
            prop_assert_eq!(reader.read_uuid(), Ok(uuid));
            prop_assert_eq!(reader.position(), 16);
        }
    }
}
