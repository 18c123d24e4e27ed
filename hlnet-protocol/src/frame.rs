//! Frame header and packet splitting.
//!
//! A physical packet carries frames back to back:
//!
//! ```text
//! +-----------+--------------+---------------------+
//! | size: u16 | msgType: i16 | payload: size bytes |
//! +-----------+--------------+---------------------+
//! ```
//!
//! `size` counts the payload only. Both header fields are little-endian.

use crate::codec::{Reader, Writer};
use crate::error::CodecError;
use crate::message::Message;
use crate::msg_kind::MsgKind;
use crate::{FRAME_HEADER_SIZE, MAX_FRAME_SIZE};
use bytes::Bytes;

/// Largest payload a single frame can carry.
pub const MAX_FRAME_PAYLOAD: usize = MAX_FRAME_SIZE - FRAME_HEADER_SIZE;

/// The fixed 4-byte frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub size: u16,
    pub msg_type: i16,
}

impl FrameHeader {
    pub fn read(reader: &mut Reader) -> Result<Self, CodecError> {
        Ok(Self {
            size: reader.read_u16()?,
            msg_type: reader.read_i16()?,
        })
    }

    pub fn write(&self, writer: &mut Writer) {
        writer.write_u16(self.size);
        writer.write_i16(self.msg_type);
    }
}

/// One decoded frame: the raw type tag and its payload slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub msg_type: i16,
    pub payload: Bytes,
}

impl Frame {
    pub fn new(msg_type: i16, payload: Bytes) -> Self {
        Self { msg_type, payload }
    }

    /// Typed view of the tag, if it is a valid kind.
    pub fn kind(&self) -> Option<MsgKind> {
        MsgKind::try_from(self.msg_type).ok()
    }

    /// Total encoded length, header included.
    pub fn encoded_len(&self) -> usize {
        FRAME_HEADER_SIZE + self.payload.len()
    }

    /// Encodes header and payload into `writer`, replacing its contents.
    pub fn encode_into(&self, writer: &mut Writer) -> Result<(), CodecError> {
        writer.start_message(self.msg_type);
        writer.write_bytes(&self.payload)?;
        writer.finish_message()
    }

    pub fn encode(&self) -> Result<Bytes, CodecError> {
        let mut writer = Writer::with_capacity(self.encoded_len());
        self.encode_into(&mut writer)?;
        Ok(writer.freeze())
    }

    pub fn payload_reader(&self) -> Reader {
        Reader::new(self.payload.clone())
    }
}

/// Builds a complete frame for `message` in `writer`.
pub fn encode_message<M: Message>(
    writer: &mut Writer,
    kind: MsgKind,
    message: &M,
) -> Result<(), CodecError> {
    writer.start_message(kind.as_wire());
    message.serialize(writer)?;
    writer.finish_message()
}

/// Splits a packet into frames.
///
/// Iteration stops for good after the first malformed frame: a header or
/// payload that runs past the end of the packet yields one error and then
/// `None`, so frames after the damage are never seen.
#[derive(Debug, Clone)]
pub struct FrameParser {
    reader: Reader,
    halted: bool,
}

impl FrameParser {
    pub fn new(packet: Bytes) -> Self {
        Self {
            reader: Reader::new(packet),
            halted: false,
        }
    }

    /// Parses only the first `received` bytes of `packet`.
    pub fn with_len(packet: Bytes, received: usize) -> Self {
        let end = received.min(packet.len());
        Self::new(packet.slice(..end))
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.reader.remaining()
    }

    fn next_frame(&mut self) -> Result<Frame, CodecError> {
        let header = FrameHeader::read(&mut self.reader)?;
        let payload = self.reader.read_bytes(usize::from(header.size))?;
        Ok(Frame::new(header.msg_type, payload))
    }
}

impl Iterator for FrameParser {
    type Item = Result<Frame, CodecError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.halted || self.reader.remaining() == 0 {
            return None;
        }
        match self.next_frame() {
            Ok(frame) => Some(Ok(frame)),
            Err(e) => {
                self.halted = true;
                Some(Err(e))
            }
        }
    }
}
