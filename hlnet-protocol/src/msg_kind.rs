//! Message kinds: the typed view of the frame header's `msgType` field.
//!
//! Values 1..=18 and 32..=47 are system kinds. Everything above
//! [`MsgKind::HIGHEST`] is free for application messages. Zero, negative
//! values and the gap 19..=31 never appear on the wire.

use crate::error::ProtocolError;
use std::fmt;

macro_rules! msg_kinds {
    ($($variant:ident = $value:literal,)+) => {
        /// A message kind, either system-reserved or application-defined.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum MsgKind {
            $($variant,)+
            /// Application-defined kind; always greater than [`MsgKind::HIGHEST`].
            User(i16),
        }

        impl MsgKind {
            /// Every system kind in wire order.
            pub const SYSTEM: &'static [MsgKind] = &[$(MsgKind::$variant,)+];

            /// Returns the value carried in the frame header.
            pub const fn as_wire(self) -> i16 {
                match self {
                    $(MsgKind::$variant => $value,)+
                    MsgKind::User(value) => value,
                }
            }

            /// Display name used in logs and packet statistics.
            pub const fn name(self) -> &'static str {
                match self {
                    $(MsgKind::$variant => stringify!($variant),)+
                    MsgKind::User(_) => "User",
                }
            }

            fn from_system(value: i16) -> Option<MsgKind> {
                match value {
                    $($value => Some(MsgKind::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

msg_kinds! {
    ObjectDestroy = 1,
    Rpc = 2,
    ObjectSpawn = 3,
    Owner = 4,
    Command = 5,
    LocalPlayerTransform = 6,
    SyncEvent = 7,
    UpdateVars = 8,
    SyncList = 9,
    ObjectSpawnScene = 10,
    NetworkInfo = 11,
    SpawnFinished = 12,
    ObjectHide = 13,
    Crc = 14,
    LocalClientAuthority = 15,
    LocalChildTransform = 16,
    Fragment = 17,
    PeerClientAuthority = 18,
    Connect = 32,
    Disconnect = 33,
    Error = 34,
    Ready = 35,
    NotReady = 36,
    AddPlayer = 37,
    RemovePlayer = 38,
    Scene = 39,
    Animation = 40,
    AnimationParameters = 41,
    AnimationTrigger = 42,
    LobbyReadyToBegin = 43,
    LobbySceneLoaded = 44,
    LobbyAddPlayerFailed = 45,
    LobbyReturnToLobby = 46,
    ReconnectPlayer = 47,
}

impl MsgKind {
    /// Highest system-reserved value.
    pub const HIGHEST: i16 = 47;

    /// Builds an application kind, rejecting values in the system range.
    pub fn user(value: i16) -> Result<MsgKind, ProtocolError> {
        if value <= Self::HIGHEST {
            return Err(ProtocolError::ReservedMessageType(value));
        }
        Ok(MsgKind::User(value))
    }

    pub fn is_system(self) -> bool {
        !matches!(self, MsgKind::User(_))
    }
}

impl TryFrom<i16> for MsgKind {
    type Error = ProtocolError;

    fn try_from(value: i16) -> Result<Self, ProtocolError> {
        if value > Self::HIGHEST {
            return Ok(MsgKind::User(value));
        }
        if value <= 0 {
            return Err(ProtocolError::UnknownMessageType(value));
        }
        Self::from_system(value).ok_or(ProtocolError::ReservedMessageType(value))
    }
}

impl From<MsgKind> for i16 {
    fn from(kind: MsgKind) -> i16 {
        kind.as_wire()
    }
}

impl fmt::Display for MsgKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MsgKind::User(value) => write!(f, "User({})", value),
            other => write!(f, "{}", other.name()),
        }
    }
}
