//! Channel and transport error types.

use hlnet_protocol::{CodecError, NetworkError};
use thiserror::Error;

/// Failures reported by a [`Transport`](crate::Transport).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("transport has no resources to queue the packet")]
    NoResources,

    #[error("unknown connection")]
    WrongConnection,

    #[error("unknown channel")]
    WrongChannel,

    #[error("packet too long for transport")]
    MessageTooLong,

    #[error("connection is disconnected")]
    Disconnected,

    #[error("transport error: {0}")]
    Other(String),
}

impl TransportError {
    /// The one-byte network error code closest to this failure.
    pub fn code(&self) -> NetworkError {
        match self {
            TransportError::NoResources => NetworkError::NoResources,
            TransportError::WrongConnection => NetworkError::WrongConnection,
            TransportError::WrongChannel => NetworkError::WrongChannel,
            TransportError::MessageTooLong => NetworkError::MessageToLong,
            TransportError::Disconnected => NetworkError::WrongConnection,
            TransportError::Other(_) => NetworkError::UsageError,
        }
    }
}

/// Errors raised by a [`ChannelBuffer`](crate::ChannelBuffer).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    #[error("cannot send zero bytes")]
    EmptySend,

    #[error("send of {size} bytes exceeds channel limit of {max} bytes")]
    MessageTooLarge { size: usize, max: usize },

    #[error("pending packet limit of {limit} reached")]
    PendingLimit { limit: usize },

    #[error("pending packet limit {requested} exceeds maximum {max}")]
    InvalidPendingLimit { requested: usize, max: usize },

    #[error("fragment size {requested} must be between 1 and {max}")]
    InvalidFragmentSize { requested: usize, max: usize },

    #[error("fragment {received} out of order (expected {expected:?})")]
    FragmentOutOfOrder {
        expected: Option<u32>,
        received: u32,
    },

    #[error("reassembled message exceeds {max} bytes")]
    FragmentTooLarge { max: usize },

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_codes() {
        assert_eq!(TransportError::NoResources.code(), NetworkError::NoResources);
        assert!(TransportError::NoResources.code().is_retryable());
        assert_eq!(
            TransportError::MessageTooLong.code(),
            NetworkError::MessageToLong
        );
        assert!(!TransportError::Disconnected.code().is_retryable());
    }

    #[test]
    fn test_channel_error_display() {
        let err = ChannelError::MessageTooLarge {
            size: 2000,
            max: 1440,
        };
        assert!(err.to_string().contains("2000"));
        assert!(err.to_string().contains("1440"));

        let err: ChannelError = TransportError::WrongChannel.into();
        assert!(matches!(err, ChannelError::Transport(_)));

        let err = ChannelError::FragmentOutOfOrder {
            expected: Some(2),
            received: 5,
        };
        assert!(err.to_string().contains("fragment 5"));
    }
}
