//! # hlnet-protocol
//!
//! Wire format for hlnet.
//!
//! This crate provides:
//! - A little-endian byte codec with packed variable-length integers
//! - Fixed-layout value records and identifier types
//! - Message kinds, the `Message` trait and the system message catalogue
//! - Frame headers and a packet splitter that halts on malformed input
//! - The protocol fingerprint used for the connect-time consistency check

pub mod codec;
pub mod error;
pub mod fingerprint;
pub mod frame;
pub mod ids;
pub mod message;
pub mod msg_kind;
pub mod pod;

pub use codec::{Reader, Writer};
pub use error::{CodecError, FingerprintError, NetworkError, ProtocolError};
pub use fingerprint::ProtocolFingerprint;
pub use frame::{encode_message, Frame, FrameHeader, FrameParser, MAX_FRAME_PAYLOAD};
pub use ids::{AssetId, EntityId, SceneId};
pub use message::*;
pub use msg_kind::MsgKind;
pub use pod::{
    Color, Color32, Matrix4x4, Plane, PodRecord, Quaternion, Ray, Rect, Vector2, Vector3, Vector4,
};

/// Size of the frame header: u16 size + i16 message type.
pub const FRAME_HEADER_SIZE: usize = 4;

/// Maximum encoded frame length, header included.
pub const MAX_FRAME_SIZE: usize = u16::MAX as usize;

/// Maximum string length in UTF-8 bytes.
pub const MAX_STRING_SIZE: usize = 32767;

/// Maximum byte blob length.
pub const MAX_BLOB_SIZE: usize = u16::MAX as usize;
