//! Symmetric byte codec: [`Writer`] encodes, [`Reader`] decodes.
//!
//! All fixed-width integers are little-endian regardless of host byte order.
//! Non-negative integers that are usually small are written with the packed
//! prefix-byte scheme:
//!
//! ```text
//! a0 0..=240    1 byte   value = a0
//! a0 241..=248  2 bytes  value = 240 + 256 * (a0 - 241) + a1
//! a0 249        3 bytes  value = 2288 + 256 * a1 + a2
//! a0 250        4 bytes  value = a1 | a2 << 8 | a3 << 16
//! a0 251..=255  5..9     value = (a0 - 247) little-endian payload bytes
//! ```

use crate::error::CodecError;
use crate::ids::{AssetId, EntityId, SceneId};
use crate::message::Message;
use crate::pod::PodRecord;
use crate::{FRAME_HEADER_SIZE, MAX_BLOB_SIZE, MAX_FRAME_SIZE, MAX_STRING_SIZE};
use bytes::{BufMut, Bytes, BytesMut};

/// Largest value encoded in a single byte.
pub const PACKED_1_MAX: u64 = 240;
/// Largest value encoded in two bytes.
pub const PACKED_2_MAX: u64 = 2287;
/// Largest value encoded in three bytes.
pub const PACKED_3_MAX: u64 = 67823;
/// Largest value encoded in four bytes.
pub const PACKED_4_MAX: u64 = 16_777_215;

/// Returns the number of bytes the packed encoding of `value` occupies.
pub fn packed_len(value: u64) -> usize {
    match value {
        0..=PACKED_1_MAX => 1,
        0..=PACKED_2_MAX => 2,
        0..=PACKED_3_MAX => 3,
        0..=PACKED_4_MAX => 4,
        _ => 1 + payload_width(value),
    }
}

/// Little-endian byte count needed for a value above the 4-byte tier.
fn payload_width(value: u64) -> usize {
    let bits = 64 - value.leading_zeros() as usize;
    bits.div_ceil(8).max(4)
}

/// Growable little-endian byte writer.
///
/// A writer is reused across sends: [`Writer::start_message`] resets it and
/// reserves the frame header, [`Writer::finish_message`] patches the size.
#[derive(Debug, Default)]
pub struct Writer {
    buf: BytesMut,
    in_message: bool,
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
            in_message: false,
        }
    }

    /// Creates a writer whose contents start with `bytes`; appends continue after them.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            buf: BytesMut::from(bytes),
            in_message: false,
        }
    }

    /// Current append position, equal to the number of bytes written.
    pub fn position(&self) -> usize {
        self.buf.len()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.buf.to_vec()
    }

    /// Copies the written bytes into an immutable buffer, leaving the writer intact.
    pub fn to_bytes(&self) -> Bytes {
        Bytes::copy_from_slice(&self.buf)
    }

    pub fn freeze(self) -> Bytes {
        self.buf.freeze()
    }

    pub fn clear(&mut self) {
        self.buf.clear();
        self.in_message = false;
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buf.put_u8(value);
    }

    pub fn write_i8(&mut self, value: i8) {
        self.buf.put_i8(value);
    }

    pub fn write_bool(&mut self, value: bool) {
        self.buf.put_u8(u8::from(value));
    }

    pub fn write_u16(&mut self, value: u16) {
        self.buf.put_u16_le(value);
    }

    pub fn write_i16(&mut self, value: i16) {
        self.buf.put_i16_le(value);
    }

    pub fn write_u32(&mut self, value: u32) {
        self.buf.put_u32_le(value);
    }

    pub fn write_i32(&mut self, value: i32) {
        self.buf.put_i32_le(value);
    }

    pub fn write_u64(&mut self, value: u64) {
        self.buf.put_u64_le(value);
    }

    pub fn write_i64(&mut self, value: i64) {
        self.buf.put_i64_le(value);
    }

    pub fn write_f32(&mut self, value: f32) {
        self.buf.put_f32_le(value);
    }

    pub fn write_f64(&mut self, value: f64) {
        self.buf.put_f64_le(value);
    }

    pub fn write_packed_u32(&mut self, value: u32) {
        self.write_packed_u64(u64::from(value));
    }

    pub fn write_packed_u64(&mut self, value: u64) {
        match value {
            0..=PACKED_1_MAX => self.buf.put_u8(value as u8),
            0..=PACKED_2_MAX => {
                let rest = value - 240;
                self.buf.put_u8((rest / 256 + 241) as u8);
                self.buf.put_u8((rest % 256) as u8);
            }
            0..=PACKED_3_MAX => {
                let rest = value - 2288;
                self.buf.put_u8(249);
                self.buf.put_u8((rest / 256) as u8);
                self.buf.put_u8((rest % 256) as u8);
            }
            0..=PACKED_4_MAX => {
                self.buf.put_u8(250);
                self.buf.put_slice(&value.to_le_bytes()[..3]);
            }
            _ => {
                let width = payload_width(value);
                self.buf.put_u8((247 + width) as u8);
                self.buf.put_slice(&value.to_le_bytes()[..width]);
            }
        }
    }

    /// Writes a u16 byte-length prefix followed by the UTF-8 bytes.
    pub fn write_string(&mut self, value: &str) -> Result<(), CodecError> {
        let len = value.len();
        if len > MAX_STRING_SIZE {
            return Err(CodecError::StringTooLong {
                len,
                max: MAX_STRING_SIZE,
            });
        }
        self.buf.put_u16_le(len as u16);
        self.buf.put_slice(value.as_bytes());
        Ok(())
    }

    /// Writes raw bytes without a length prefix.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), CodecError> {
        check_blob(bytes.len())?;
        self.buf.put_slice(bytes);
        Ok(())
    }

    /// Writes a u16 length prefix and the bytes; `None` or empty writes a zero prefix.
    pub fn write_bytes_and_size(&mut self, bytes: Option<&[u8]>) -> Result<(), CodecError> {
        match bytes {
            None => self.buf.put_u16_le(0),
            Some(bytes) if bytes.is_empty() => self.buf.put_u16_le(0),
            Some(bytes) => {
                check_blob(bytes.len())?;
                self.buf.put_u16_le(bytes.len() as u16);
                self.buf.put_slice(bytes);
            }
        }
        Ok(())
    }

    /// Writes a u16 length prefix and the whole buffer.
    ///
    /// Nothing is trimmed: trailing zero bytes in `bytes` go on the wire.
    pub fn write_bytes_full(&mut self, bytes: &[u8]) -> Result<(), CodecError> {
        check_blob(bytes.len())?;
        self.buf.put_u16_le(bytes.len() as u16);
        self.buf.put_slice(bytes);
        Ok(())
    }

    pub fn write_entity_id(&mut self, id: EntityId) {
        self.write_packed_u32(id.value());
    }

    pub fn write_scene_id(&mut self, id: SceneId) {
        self.write_packed_u32(id.value());
    }

    pub fn write_asset_id(&mut self, id: &AssetId) {
        self.buf.put_slice(id.as_bytes());
    }

    pub fn write_pod<P: PodRecord>(&mut self, value: &P) {
        value.write_fields(self);
    }

    pub fn write_message<M: Message>(&mut self, message: &M) -> Result<(), CodecError> {
        message.serialize(self)
    }

    /// Resets the writer and reserves the frame header for `msg_type`.
    pub fn start_message(&mut self, msg_type: i16) {
        self.buf.clear();
        // size placeholder, patched by finish_message
        self.buf.put_u16_le(0);
        self.buf.put_i16_le(msg_type);
        self.in_message = true;
    }

    /// Patches the header size with the payload length written since `start_message`.
    pub fn finish_message(&mut self) -> Result<(), CodecError> {
        if !self.in_message {
            return Err(CodecError::NotInMessage);
        }
        let total = self.buf.len();
        if total > MAX_FRAME_SIZE {
            return Err(CodecError::MessageTooLarge {
                size: total,
                max: MAX_FRAME_SIZE,
            });
        }
        let size = (total - FRAME_HEADER_SIZE) as u16;
        self.buf[0..2].copy_from_slice(&size.to_le_bytes());
        self.in_message = false;
        Ok(())
    }
}

fn check_blob(len: usize) -> Result<(), CodecError> {
    if len > MAX_BLOB_SIZE {
        return Err(CodecError::BlobTooLarge {
            len,
            max: MAX_BLOB_SIZE,
        });
    }
    Ok(())
}

/// Little-endian byte reader over an immutable buffer.
///
/// Reading past the end is always an error; payload slices share the
/// underlying allocation.
#[derive(Debug, Clone, Default)]
pub struct Reader {
    buf: Bytes,
    pos: usize,
}

impl Reader {
    pub fn new(buf: Bytes) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn from_slice(bytes: &[u8]) -> Self {
        Self::new(Bytes::copy_from_slice(bytes))
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn seek_zero(&mut self) {
        self.pos = 0;
    }

    /// Swaps in a new buffer and rewinds.
    pub fn replace(&mut self, buf: Bytes) {
        self.buf = buf;
        self.pos = 0;
    }

    /// The full underlying buffer, independent of the read position.
    pub fn buffer(&self) -> &Bytes {
        &self.buf
    }

    fn ensure(&self, needed: usize) -> Result<(), CodecError> {
        if self.remaining() < needed {
            return Err(CodecError::EndOfBuffer {
                position: self.pos,
                needed,
                available: self.remaining(),
            });
        }
        Ok(())
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        self.ensure(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(&self.buf[self.pos..self.pos + N]);
        self.pos += N;
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.take::<1>()?[0])
    }

    pub fn read_i8(&mut self) -> Result<i8, CodecError> {
        Ok(self.read_u8()? as i8)
    }

    /// Only the byte value 1 decodes as `true`.
    pub fn read_bool(&mut self) -> Result<bool, CodecError> {
        Ok(self.read_u8()? == 1)
    }

    pub fn read_u16(&mut self) -> Result<u16, CodecError> {
        Ok(u16::from_le_bytes(self.take()?))
    }

    pub fn read_i16(&mut self) -> Result<i16, CodecError> {
        Ok(i16::from_le_bytes(self.take()?))
    }

    pub fn read_u32(&mut self) -> Result<u32, CodecError> {
        Ok(u32::from_le_bytes(self.take()?))
    }

    pub fn read_i32(&mut self) -> Result<i32, CodecError> {
        Ok(i32::from_le_bytes(self.take()?))
    }

    pub fn read_u64(&mut self) -> Result<u64, CodecError> {
        Ok(u64::from_le_bytes(self.take()?))
    }

    pub fn read_i64(&mut self) -> Result<i64, CodecError> {
        Ok(i64::from_le_bytes(self.take()?))
    }

    pub fn read_f32(&mut self) -> Result<f32, CodecError> {
        Ok(f32::from_le_bytes(self.take()?))
    }

    pub fn read_f64(&mut self) -> Result<f64, CodecError> {
        Ok(f64::from_le_bytes(self.take()?))
    }

    /// Decodes the 32-bit packed form. Every prefix from 251 up carries four payload bytes.
    pub fn read_packed_u32(&mut self) -> Result<u32, CodecError> {
        let a0 = self.read_u8()?;
        match a0 {
            0..=240 => Ok(u32::from(a0)),
            241..=248 => {
                let a1 = self.read_u8()?;
                Ok(240 + 256 * (u32::from(a0) - 241) + u32::from(a1))
            }
            249 => {
                let [a1, a2] = self.take::<2>()?;
                Ok(2288 + 256 * u32::from(a1) + u32::from(a2))
            }
            250 => {
                let [a1, a2, a3] = self.take::<3>()?;
                Ok(u32::from_le_bytes([a1, a2, a3, 0]))
            }
            _ => Ok(u32::from_le_bytes(self.take::<4>()?)),
        }
    }

    pub fn read_packed_u64(&mut self) -> Result<u64, CodecError> {
        let a0 = self.read_u8()?;
        match a0 {
            0..=240 => Ok(u64::from(a0)),
            241..=248 => {
                let a1 = self.read_u8()?;
                Ok(240 + 256 * (u64::from(a0) - 241) + u64::from(a1))
            }
            249 => {
                let [a1, a2] = self.take::<2>()?;
                Ok(2288 + 256 * u64::from(a1) + u64::from(a2))
            }
            _ => {
                let width = usize::from(a0) - 247;
                self.ensure(width)?;
                let mut le = [0u8; 8];
                le[..width].copy_from_slice(&self.buf[self.pos..self.pos + width]);
                self.pos += width;
                Ok(u64::from_le_bytes(le))
            }
        }
    }

    /// Reads `count` raw bytes as a slice of the underlying buffer.
    pub fn read_bytes(&mut self, count: usize) -> Result<Bytes, CodecError> {
        self.ensure(count)?;
        let out = self.buf.slice(self.pos..self.pos + count);
        self.pos += count;
        Ok(out)
    }

    /// Reads a u16 length prefix and that many bytes; a zero prefix yields an empty buffer.
    pub fn read_bytes_and_size(&mut self) -> Result<Bytes, CodecError> {
        let len = self.read_u16()?;
        if len == 0 {
            return Ok(Bytes::new());
        }
        self.read_bytes(usize::from(len))
    }

    pub fn read_string(&mut self) -> Result<String, CodecError> {
        let len = usize::from(self.read_u16()?);
        if len == 0 {
            return Ok(String::new());
        }
        if len > MAX_STRING_SIZE {
            return Err(CodecError::StringTooLong {
                len,
                max: MAX_STRING_SIZE,
            });
        }
        let raw = self.read_bytes(len)?;
        String::from_utf8(raw.to_vec()).map_err(|_| CodecError::InvalidUtf8)
    }

    pub fn read_entity_id(&mut self) -> Result<EntityId, CodecError> {
        Ok(EntityId::new(self.read_packed_u32()?))
    }

    pub fn read_scene_id(&mut self) -> Result<SceneId, CodecError> {
        Ok(SceneId::new(self.read_packed_u32()?))
    }

    pub fn read_asset_id(&mut self) -> Result<AssetId, CodecError> {
        Ok(AssetId::from_bytes(self.take::<16>()?))
    }

    pub fn read_pod<P: PodRecord>(&mut self) -> Result<P, CodecError> {
        P::read_fields(self)
    }

    pub fn read_message<M: Message>(&mut self) -> Result<M, CodecError> {
        M::deserialize(self)
    }
}

impl From<Bytes> for Reader {
    fn from(buf: Bytes) -> Self {
        Self::new(buf)
    }
}

impl From<Vec<u8>> for Reader {
    fn from(buf: Vec<u8>) -> Self {
        Self::new(Bytes::from(buf))
    }
}

impl From<&Writer> for Reader {
    fn from(writer: &Writer) -> Self {
        Self::new(writer.to_bytes())
    }
}
