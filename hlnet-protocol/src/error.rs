//! Codec and protocol error types, plus the stable network error codes.

use std::fmt;
use thiserror::Error;

/// Errors raised by the byte codec.
///
/// Every variant is a hard failure at the call site: the codec never
/// truncates oversized input and never fabricates zero values on short reads.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("read past end of buffer: need {needed} bytes at position {position}, {available} available")]
    EndOfBuffer {
        position: usize,
        needed: usize,
        available: usize,
    },

    #[error("string too long: {len} bytes (max {max})")]
    StringTooLong { len: usize, max: usize },

    #[error("byte blob too large: {len} bytes (max {max})")]
    BlobTooLarge { len: usize, max: usize },

    #[error("message too large: {size} bytes including header (max {max})")]
    MessageTooLarge { size: usize, max: usize },

    #[error("too many entries: {count} (max {max})")]
    TooManyEntries { count: usize, max: usize },

    #[error("invalid UTF-8 in string payload")]
    InvalidUtf8,

    #[error("finish_message called without start_message")]
    NotInMessage,
}

/// Errors raised while interpreting frames and handshake data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("unknown message type: {0}")]
    UnknownMessageType(i16),

    #[error("message type {0} is reserved for system messages")]
    ReservedMessageType(i16),

    #[error("fingerprint validation failed: {0}")]
    Fingerprint(#[from] FingerprintError),
}

/// Reasons two peers' protocol fingerprints disagree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FingerprintError {
    #[error("entry count mismatch: local {local}, remote {remote}")]
    CountMismatch { local: usize, remote: usize },

    #[error("channel mismatch for '{name}': local {local}, remote {remote}")]
    ChannelMismatch { name: String, local: u8, remote: u8 },

    #[error("channel {channel} for '{name}' is out of range ({channel_count} channels)")]
    ChannelOutOfRange {
        name: String,
        channel: u8,
        channel_count: usize,
    },
}

/// Stable one-byte error codes carried by the error system message.
///
/// The numeric values are part of the wire contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum NetworkError {
    Ok = 0,
    WrongHost = 1,
    WrongConnection = 2,
    WrongChannel = 3,
    NoResources = 4,
    BadMessage = 5,
    Timeout = 6,
    MessageToLong = 7,
    WrongOperation = 8,
    VersionMismatch = 9,
    CrcMismatch = 10,
    DnsFailure = 11,
    UsageError = 12,
}

impl NetworkError {
    /// Returns whether a peer may reasonably retry after this error.
    pub fn is_retryable(&self) -> bool {
        matches!(self, NetworkError::NoResources | NetworkError::Timeout)
    }
}

impl TryFrom<u8> for NetworkError {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(NetworkError::Ok),
            1 => Ok(NetworkError::WrongHost),
            2 => Ok(NetworkError::WrongConnection),
            3 => Ok(NetworkError::WrongChannel),
            4 => Ok(NetworkError::NoResources),
            5 => Ok(NetworkError::BadMessage),
            6 => Ok(NetworkError::Timeout),
            7 => Ok(NetworkError::MessageToLong),
            8 => Ok(NetworkError::WrongOperation),
            9 => Ok(NetworkError::VersionMismatch),
            10 => Ok(NetworkError::CrcMismatch),
            11 => Ok(NetworkError::DnsFailure),
            12 => Ok(NetworkError::UsageError),
            other => Err(other),
        }
    }
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkError::Ok => write!(f, "OK"),
            NetworkError::WrongHost => write!(f, "WRONG_HOST"),
            NetworkError::WrongConnection => write!(f, "WRONG_CONNECTION"),
            NetworkError::WrongChannel => write!(f, "WRONG_CHANNEL"),
            NetworkError::NoResources => write!(f, "NO_RESOURCES"),
            NetworkError::BadMessage => write!(f, "BAD_MESSAGE"),
            NetworkError::Timeout => write!(f, "TIMEOUT"),
            NetworkError::MessageToLong => write!(f, "MESSAGE_TO_LONG"),
            NetworkError::WrongOperation => write!(f, "WRONG_OPERATION"),
            NetworkError::VersionMismatch => write!(f, "VERSION_MISMATCH"),
            NetworkError::CrcMismatch => write!(f, "CRC_MISMATCH"),
            NetworkError::DnsFailure => write!(f, "DNS_FAILURE"),
            NetworkError::UsageError => write!(f, "USAGE_ERROR"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_error_retryable() {
        assert!(NetworkError::NoResources.is_retryable());
        assert!(NetworkError::Timeout.is_retryable());

        assert!(!NetworkError::Ok.is_retryable());
        assert!(!NetworkError::BadMessage.is_retryable());
        assert!(!NetworkError::CrcMismatch.is_retryable());
        assert!(!NetworkError::VersionMismatch.is_retryable());
    }

    #[test]
    fn test_network_error_byte_roundtrip() {
        for code in 0u8..=12 {
            let err = NetworkError::try_from(code).unwrap();
            assert_eq!(err as u8, code);
        }
        assert_eq!(NetworkError::try_from(13), Err(13));
        assert_eq!(NetworkError::try_from(255), Err(255));
    }

    #[test]
    fn test_network_error_display() {
        assert_eq!(format!("{}", NetworkError::Ok), "OK");
        assert_eq!(format!("{}", NetworkError::WrongChannel), "WRONG_CHANNEL");
        assert_eq!(format!("{}", NetworkError::CrcMismatch), "CRC_MISMATCH");
        assert_eq!(format!("{}", NetworkError::DnsFailure), "DNS_FAILURE");
    }

    #[test]
    fn test_codec_error_display() {
        let err = CodecError::EndOfBuffer {
            position: 3,
            needed: 4,
            available: 1,
        };
        let msg = err.to_string();
        assert!(msg.contains("position 3"));
        assert!(msg.contains("need 4"));

        let err = CodecError::StringTooLong {
            len: 40000,
            max: 32767,
        };
        assert!(err.to_string().contains("40000"));

        let err = CodecError::MessageTooLarge {
            size: 65536,
            max: 65535,
        };
        assert!(err.to_string().contains("65536"));

        assert!(CodecError::InvalidUtf8.to_string().contains("UTF-8"));
    }

    #[test]
    fn test_protocol_error_from() {
        let err: ProtocolError = CodecError::InvalidUtf8.into();
        assert!(matches!(err, ProtocolError::Codec(CodecError::InvalidUtf8)));

        let err: ProtocolError = FingerprintError::CountMismatch {
            local: 2,
            remote: 3,
        }
        .into();
        assert!(err.to_string().contains("local 2"));
    }
}
