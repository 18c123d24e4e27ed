//! Connection-level errors.

use crate::config::ConfigError;
use hlnet_channel::ChannelError;
use hlnet_protocol::{CodecError, FingerprintError, ProtocolError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("invalid channel {channel_id} (connection has {channel_count} channels)")]
    InvalidChannel { channel_id: u8, channel_count: usize },

    #[error("channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("connection is disposed")]
    Disposed,

    #[error("peer is incompatible: {0}")]
    Incompatible(FingerprintError),
}

impl ConnectionError {
    /// Whether the error concerns the peer's compatibility rather than a single send.
    pub fn is_incompatible(&self) -> bool {
        matches!(
            self,
            ConnectionError::Incompatible(_)
                | ConnectionError::Protocol(ProtocolError::Fingerprint(_))
        )
    }
}
