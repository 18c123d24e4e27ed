//! The [`Message`] contract and the system message catalogue.
//!
//! A message only knows how to write its fields into a [`Writer`] and read
//! them back from a [`Reader`]; the frame header and the kind are applied by
//! whoever sends it.

use crate::codec::{Reader, Writer};
use crate::error::{CodecError, NetworkError};
use crate::ids::{AssetId, EntityId, SceneId};
use crate::pod::{Quaternion, Vector3};
use bytes::Bytes;

/// A payload that can encode itself into a writer and decode from a reader.
pub trait Message: Sized {
    fn serialize(&self, writer: &mut Writer) -> Result<(), CodecError>;
    fn deserialize(reader: &mut Reader) -> Result<Self, CodecError>;
}

fn optional(bytes: &Bytes) -> Option<&[u8]> {
    if bytes.is_empty() {
        None
    } else {
        Some(bytes)
    }
}

fn entry_count(count: usize) -> Result<u16, CodecError> {
    u16::try_from(count).map_err(|_| CodecError::TooManyEntries {
        count,
        max: u16::MAX as usize,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StringMessage {
    pub value: String,
}

impl StringMessage {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

impl Message for StringMessage {
    fn serialize(&self, writer: &mut Writer) -> Result<(), CodecError> {
        writer.write_string(&self.value)
    }

    fn deserialize(reader: &mut Reader) -> Result<Self, CodecError> {
        Ok(Self {
            value: reader.read_string()?,
        })
    }
}

/// A single packed non-negative integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IntegerMessage {
    pub value: u32,
}

impl IntegerMessage {
    pub fn new(value: u32) -> Self {
        Self { value }
    }
}

impl Message for IntegerMessage {
    fn serialize(&self, writer: &mut Writer) -> Result<(), CodecError> {
        writer.write_packed_u32(self.value);
        Ok(())
    }

    fn deserialize(reader: &mut Reader) -> Result<Self, CodecError> {
        Ok(Self {
            value: reader.read_packed_u32()?,
        })
    }
}

macro_rules! empty_message {
    ($($(#[$meta:meta])* $name:ident),+ $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
            pub struct $name;

            impl Message for $name {
                fn serialize(&self, _writer: &mut Writer) -> Result<(), CodecError> {
                    Ok(())
                }

                fn deserialize(_reader: &mut Reader) -> Result<Self, CodecError> {
                    Ok($name)
                }
            }
        )+
    };
}

empty_message!(
    /// No payload at all.
    EmptyMessage,
    ReadyMessage,
    NotReadyMessage,
);

/// Carries a one-byte [`NetworkError`] code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ErrorMessage {
    pub error_code: u8,
}

impl ErrorMessage {
    pub fn new(error: NetworkError) -> Self {
        Self {
            error_code: error as u8,
        }
    }

    /// Decodes the code, returning the raw byte when it is not a known error.
    pub fn error(&self) -> Result<NetworkError, u8> {
        NetworkError::try_from(self.error_code)
    }
}

impl Message for ErrorMessage {
    fn serialize(&self, writer: &mut Writer) -> Result<(), CodecError> {
        writer.write_u8(self.error_code);
        Ok(())
    }

    fn deserialize(reader: &mut Reader) -> Result<Self, CodecError> {
        Ok(Self {
            error_code: reader.read_u8()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AddPlayerMessage {
    pub player_controller_id: i16,
    pub msg_data: Bytes,
}

impl Message for AddPlayerMessage {
    fn serialize(&self, writer: &mut Writer) -> Result<(), CodecError> {
        writer.write_i16(self.player_controller_id);
        writer.write_bytes_and_size(optional(&self.msg_data))
    }

    fn deserialize(reader: &mut Reader) -> Result<Self, CodecError> {
        Ok(Self {
            player_controller_id: reader.read_i16()?,
            msg_data: reader.read_bytes_and_size()?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RemovePlayerMessage {
    pub player_controller_id: i16,
}

impl Message for RemovePlayerMessage {
    fn serialize(&self, writer: &mut Writer) -> Result<(), CodecError> {
        writer.write_i16(self.player_controller_id);
        Ok(())
    }

    fn deserialize(reader: &mut Reader) -> Result<Self, CodecError> {
        Ok(Self {
            player_controller_id: reader.read_i16()?,
        })
    }
}

/// Tells peers which connection holds authority over an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PeerAuthorityMessage {
    pub connection_id: u32,
    pub entity_id: EntityId,
    pub authority_state: bool,
}

impl Message for PeerAuthorityMessage {
    fn serialize(&self, writer: &mut Writer) -> Result<(), CodecError> {
        writer.write_packed_u32(self.connection_id);
        writer.write_entity_id(self.entity_id);
        writer.write_bool(self.authority_state);
        Ok(())
    }

    fn deserialize(reader: &mut Reader) -> Result<Self, CodecError> {
        Ok(Self {
            connection_id: reader.read_packed_u32()?,
            entity_id: reader.read_entity_id()?,
            authority_state: reader.read_bool()?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PeerInfoPlayer {
    pub entity_id: EntityId,
    /// Packed as the sign-extended 32-bit value, so -1 takes five bytes.
    pub player_controller_id: i16,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PeerInfoMessage {
    pub connection_id: u32,
    pub address: String,
    pub port: u32,
    pub is_host: bool,
    pub is_you: bool,
    pub players: Vec<PeerInfoPlayer>,
}

impl Message for PeerInfoMessage {
    fn serialize(&self, writer: &mut Writer) -> Result<(), CodecError> {
        writer.write_packed_u32(self.connection_id);
        writer.write_string(&self.address)?;
        writer.write_packed_u32(self.port);
        writer.write_bool(self.is_host);
        writer.write_bool(self.is_you);
        writer.write_packed_u32(self.players.len() as u32);
        for player in &self.players {
            writer.write_entity_id(player.entity_id);
            // controller ids travel as their two's-complement bit pattern
            writer.write_packed_u32(player.player_controller_id as i32 as u32);
        }
        Ok(())
    }

    fn deserialize(reader: &mut Reader) -> Result<Self, CodecError> {
        let connection_id = reader.read_packed_u32()?;
        let address = reader.read_string()?;
        let port = reader.read_packed_u32()?;
        let is_host = reader.read_bool()?;
        let is_you = reader.read_bool()?;
        let count = reader.read_packed_u32()? as usize;
        // each player takes at least two bytes; don't trust the count for allocation
        let mut players = Vec::with_capacity(count.min(reader.remaining() / 2));
        for _ in 0..count {
            players.push(PeerInfoPlayer {
                entity_id: reader.read_entity_id()?,
                player_controller_id: reader.read_packed_u32()? as u16 as i16,
            });
        }
        Ok(Self {
            connection_id,
            address,
            port,
            is_host,
            is_you,
            players,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PeerListMessage {
    pub old_server_connection_id: u32,
    pub peers: Vec<PeerInfoMessage>,
}

impl Message for PeerListMessage {
    fn serialize(&self, writer: &mut Writer) -> Result<(), CodecError> {
        writer.write_packed_u32(self.old_server_connection_id);
        writer.write_u16(entry_count(self.peers.len())?);
        for peer in &self.peers {
            peer.serialize(writer)?;
        }
        Ok(())
    }

    fn deserialize(reader: &mut Reader) -> Result<Self, CodecError> {
        let old_server_connection_id = reader.read_packed_u32()?;
        let count = reader.read_u16()?;
        let mut peers = Vec::with_capacity(usize::from(count).min(reader.remaining()));
        for _ in 0..count {
            peers.push(PeerInfoMessage::deserialize(reader)?);
        }
        Ok(Self {
            old_server_connection_id,
            peers,
        })
    }
}

/// Sent by a client rejoining a migrated host.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReconnectMessage {
    pub old_connection_id: u32,
    pub player_controller_id: i16,
    pub entity_id: EntityId,
    pub msg_data: Bytes,
}

impl Message for ReconnectMessage {
    fn serialize(&self, writer: &mut Writer) -> Result<(), CodecError> {
        writer.write_packed_u32(self.old_connection_id);
        writer.write_packed_u32(self.player_controller_id as i32 as u32);
        writer.write_entity_id(self.entity_id);
        writer.write_bytes_and_size(optional(&self.msg_data))
    }

    fn deserialize(reader: &mut Reader) -> Result<Self, CodecError> {
        Ok(Self {
            old_connection_id: reader.read_packed_u32()?,
            player_controller_id: reader.read_packed_u32()? as u16 as i16,
            entity_id: reader.read_entity_id()?,
            msg_data: reader.read_bytes_and_size()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectSpawnMessage {
    pub entity_id: EntityId,
    pub asset_id: AssetId,
    pub position: Vector3,
    pub rotation: Quaternion,
    pub payload: Bytes,
}

impl Message for ObjectSpawnMessage {
    fn serialize(&self, writer: &mut Writer) -> Result<(), CodecError> {
        writer.write_entity_id(self.entity_id);
        writer.write_asset_id(&self.asset_id);
        writer.write_pod(&self.position);
        writer.write_pod(&self.rotation);
        writer.write_bytes_full(&self.payload)
    }

    fn deserialize(reader: &mut Reader) -> Result<Self, CodecError> {
        Ok(Self {
            entity_id: reader.read_entity_id()?,
            asset_id: reader.read_asset_id()?,
            position: reader.read_pod()?,
            rotation: reader.read_pod()?,
            payload: reader.read_bytes_and_size()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectSpawnSceneMessage {
    pub entity_id: EntityId,
    pub scene_id: SceneId,
    pub position: Vector3,
    pub payload: Bytes,
}

impl Message for ObjectSpawnSceneMessage {
    fn serialize(&self, writer: &mut Writer) -> Result<(), CodecError> {
        writer.write_entity_id(self.entity_id);
        writer.write_scene_id(self.scene_id);
        writer.write_pod(&self.position);
        writer.write_bytes_full(&self.payload)
    }

    fn deserialize(reader: &mut Reader) -> Result<Self, CodecError> {
        Ok(Self {
            entity_id: reader.read_entity_id()?,
            scene_id: reader.read_scene_id()?,
            position: reader.read_pod()?,
            payload: reader.read_bytes_and_size()?,
        })
    }
}

/// Brackets a batch of spawn messages: state 0 starts it, 1 ends it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ObjectSpawnFinishedMessage {
    pub state: u8,
}

impl Message for ObjectSpawnFinishedMessage {
    fn serialize(&self, writer: &mut Writer) -> Result<(), CodecError> {
        writer.write_u8(self.state);
        Ok(())
    }

    fn deserialize(reader: &mut Reader) -> Result<Self, CodecError> {
        Ok(Self {
            state: reader.read_u8()?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ObjectDestroyMessage {
    pub entity_id: EntityId,
}

impl Message for ObjectDestroyMessage {
    fn serialize(&self, writer: &mut Writer) -> Result<(), CodecError> {
        writer.write_entity_id(self.entity_id);
        Ok(())
    }

    fn deserialize(reader: &mut Reader) -> Result<Self, CodecError> {
        Ok(Self {
            entity_id: reader.read_entity_id()?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OwnerMessage {
    pub entity_id: EntityId,
    pub player_controller_id: i16,
}

impl Message for OwnerMessage {
    fn serialize(&self, writer: &mut Writer) -> Result<(), CodecError> {
        writer.write_entity_id(self.entity_id);
        writer.write_packed_u32(self.player_controller_id as i32 as u32);
        Ok(())
    }

    fn deserialize(reader: &mut Reader) -> Result<Self, CodecError> {
        Ok(Self {
            entity_id: reader.read_entity_id()?,
            player_controller_id: reader.read_packed_u32()? as u16 as i16,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClientAuthorityMessage {
    pub entity_id: EntityId,
    pub authority: bool,
}

impl Message for ClientAuthorityMessage {
    fn serialize(&self, writer: &mut Writer) -> Result<(), CodecError> {
        writer.write_entity_id(self.entity_id);
        writer.write_bool(self.authority);
        Ok(())
    }

    fn deserialize(reader: &mut Reader) -> Result<Self, CodecError> {
        Ok(Self {
            entity_id: reader.read_entity_id()?,
            authority: reader.read_bool()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OverrideTransformMessage {
    pub entity_id: EntityId,
    pub payload: Bytes,
    pub teleport: bool,
    pub time: u32,
}

impl Message for OverrideTransformMessage {
    fn serialize(&self, writer: &mut Writer) -> Result<(), CodecError> {
        writer.write_entity_id(self.entity_id);
        writer.write_bytes_full(&self.payload)?;
        writer.write_bool(self.teleport);
        writer.write_packed_u32(self.time);
        Ok(())
    }

    fn deserialize(reader: &mut Reader) -> Result<Self, CodecError> {
        Ok(Self {
            entity_id: reader.read_entity_id()?,
            payload: reader.read_bytes_and_size()?,
            teleport: reader.read_bool()?,
            time: reader.read_packed_u32()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnimationMessage {
    pub entity_id: EntityId,
    /// Non-zero plays this state directly, skipping transitions.
    pub state_hash: u32,
    pub normalized_time: f32,
    pub parameters: Bytes,
}

impl Message for AnimationMessage {
    fn serialize(&self, writer: &mut Writer) -> Result<(), CodecError> {
        writer.write_entity_id(self.entity_id);
        writer.write_packed_u32(self.state_hash);
        writer.write_f32(self.normalized_time);
        writer.write_bytes_and_size(optional(&self.parameters))
    }

    fn deserialize(reader: &mut Reader) -> Result<Self, CodecError> {
        Ok(Self {
            entity_id: reader.read_entity_id()?,
            state_hash: reader.read_packed_u32()?,
            normalized_time: reader.read_f32()?,
            parameters: reader.read_bytes_and_size()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AnimationParametersMessage {
    pub entity_id: EntityId,
    pub parameters: Bytes,
}

impl Message for AnimationParametersMessage {
    fn serialize(&self, writer: &mut Writer) -> Result<(), CodecError> {
        writer.write_entity_id(self.entity_id);
        writer.write_bytes_and_size(optional(&self.parameters))
    }

    fn deserialize(reader: &mut Reader) -> Result<Self, CodecError> {
        Ok(Self {
            entity_id: reader.read_entity_id()?,
            parameters: reader.read_bytes_and_size()?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AnimationTriggerMessage {
    pub entity_id: EntityId,
    pub hash: u32,
}

impl Message for AnimationTriggerMessage {
    fn serialize(&self, writer: &mut Writer) -> Result<(), CodecError> {
        writer.write_entity_id(self.entity_id);
        writer.write_packed_u32(self.hash);
        Ok(())
    }

    fn deserialize(reader: &mut Reader) -> Result<Self, CodecError> {
        Ok(Self {
            entity_id: reader.read_entity_id()?,
            hash: reader.read_packed_u32()?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LobbyReadyToBeginMessage {
    pub slot_id: u8,
    pub ready_state: bool,
}

impl Message for LobbyReadyToBeginMessage {
    fn serialize(&self, writer: &mut Writer) -> Result<(), CodecError> {
        writer.write_u8(self.slot_id);
        writer.write_bool(self.ready_state);
        Ok(())
    }

    fn deserialize(reader: &mut Reader) -> Result<Self, CodecError> {
        Ok(Self {
            slot_id: reader.read_u8()?,
            ready_state: reader.read_bool()?,
        })
    }
}

/// One `{name, channel}` pair of a protocol fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CrcEntry {
    pub name: String,
    pub channel: u8,
}

/// The full fingerprint exchanged once per connection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CrcMessage {
    pub entries: Vec<CrcEntry>,
}

impl Message for CrcMessage {
    fn serialize(&self, writer: &mut Writer) -> Result<(), CodecError> {
        writer.write_u16(entry_count(self.entries.len())?);
        for entry in &self.entries {
            writer.write_string(&entry.name)?;
            writer.write_u8(entry.channel);
        }
        Ok(())
    }

    fn deserialize(reader: &mut Reader) -> Result<Self, CodecError> {
        let count = reader.read_u16()?;
        // every entry is at least three bytes
        let mut entries = Vec::with_capacity(usize::from(count).min(reader.remaining() / 3));
        for _ in 0..count {
            entries.push(CrcEntry {
                name: reader.read_string()?,
                channel: reader.read_u8()?,
            });
        }
        Ok(Self { entries })
    }
}

/// One chunk of a message split across packets on a fragmented channel.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FragmentMessage {
    pub last: bool,
    pub index: u32,
    pub chunk: Bytes,
}

impl FragmentMessage {
    /// Bytes a fragment adds around its chunk, frame header included.
    pub fn overhead(index: u32) -> usize {
        crate::FRAME_HEADER_SIZE + 1 + crate::codec::packed_len(u64::from(index)) + 2
    }
}

impl Message for FragmentMessage {
    fn serialize(&self, writer: &mut Writer) -> Result<(), CodecError> {
        writer.write_bool(self.last);
        writer.write_packed_u32(self.index);
        writer.write_bytes_and_size(optional(&self.chunk))
    }

    fn deserialize(reader: &mut Reader) -> Result<Self, CodecError> {
        Ok(Self {
            last: reader.read_bool()?,
            index: reader.read_packed_u32()?,
            chunk: reader.read_bytes_and_size()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip<M: Message>(message: &M) -> M {
        let mut writer = Writer::new();
        writer.write_message(message).unwrap();
        let mut reader = Reader::from(&writer);
        let decoded = reader.read_message::<M>().unwrap();
        assert_eq!(reader.remaining(), 0, "trailing bytes after decode");
        decoded
    }

    #[test]
    fn test_empty_messages_write_nothing() {
        let mut writer = Writer::new();
        writer.write_message(&EmptyMessage).unwrap();
        writer.write_message(&ReadyMessage).unwrap();
        writer.write_message(&NotReadyMessage).unwrap();
        assert!(writer.is_empty());
    }

    #[test]
    fn test_integer_message_is_packed() {
        let mut writer = Writer::new();
        writer.write_message(&IntegerMessage::new(67823)).unwrap();
        assert_eq!(writer.to_vec(), vec![249, 255, 255]);
    }

    #[test]
    fn test_error_message_codes() {
        let msg = roundtrip(&ErrorMessage::new(NetworkError::Timeout));
        assert_eq!(msg.error(), Ok(NetworkError::Timeout));
        assert_eq!(ErrorMessage { error_code: 99 }.error(), Err(99));
    }

    #[test]
    fn test_negative_controller_id_is_sign_extended() {
        let msg = ReconnectMessage {
            player_controller_id: -1,
            ..Default::default()
        };
        let mut writer = Writer::new();
        writer.write_message(&msg).unwrap();
        assert_eq!(writer.to_vec(), vec![0, 251, 255, 255, 255, 255, 0, 0, 0]);
        assert_eq!(roundtrip(&msg).player_controller_id, -1);
    }

    #[test]
    fn test_add_player_empty_data() {
        let msg = AddPlayerMessage {
            player_controller_id: -1,
            msg_data: Bytes::new(),
        };
        let mut writer = Writer::new();
        writer.write_message(&msg).unwrap();
        assert_eq!(writer.to_vec(), vec![0xFF, 0xFF, 0, 0]);
        assert_eq!(roundtrip(&msg), msg);
    }

    #[test]
    fn test_peer_list_roundtrip() {
        let peer = PeerInfoMessage {
            connection_id: 3,
            address: "10.0.0.7".into(),
            port: 7777,
            is_host: true,
            is_you: false,
            players: vec![
                PeerInfoPlayer {
                    entity_id: EntityId::new(12),
                    player_controller_id: 0,
                },
                PeerInfoPlayer {
                    entity_id: EntityId::new(300),
                    player_controller_id: -2,
                },
            ],
        };
        let list = PeerListMessage {
            old_server_connection_id: 1,
            peers: vec![peer.clone(), PeerInfoMessage::default()],
        };
        let decoded = roundtrip(&list);
        assert_eq!(decoded, list);
        assert_eq!(decoded.peers[0].players[1].player_controller_id, -2);
    }

    #[test]
    fn test_peer_info_hostile_count() {
        // claims u32::MAX players but carries none
        let mut writer = Writer::new();
        writer.write_packed_u32(1);
        writer.write_string("").unwrap();
        writer.write_packed_u32(0);
        writer.write_bool(false);
        writer.write_bool(false);
        writer.write_packed_u32(u32::MAX);
        let mut reader = Reader::from(&writer);
        assert!(matches!(
            PeerInfoMessage::deserialize(&mut reader),
            Err(CodecError::EndOfBuffer { .. })
        ));
    }

    #[test]
    fn test_spawn_payload_written_full() {
        let msg = ObjectSpawnMessage {
            entity_id: EntityId::new(5),
            asset_id: AssetId::from_bytes([7; 16]),
            position: Vector3::new(1.0, 2.0, 3.0),
            rotation: Quaternion::IDENTITY,
            payload: Bytes::from_static(&[1, 0, 0, 0]),
        };
        let decoded = roundtrip(&msg);
        assert_eq!(decoded.payload.len(), 4);
        assert_eq!(decoded, msg);

        let mut writer = Writer::new();
        writer.write_message(&msg).unwrap();
        // netId(1) + asset(16) + position(12) + rotation(16) + len(2) + payload(4)
        assert_eq!(writer.len(), 51);
    }

    #[test]
    fn test_spawn_scene_roundtrip() {
        let msg = ObjectSpawnSceneMessage {
            entity_id: EntityId::new(900),
            scene_id: SceneId::new(4),
            position: Vector3::default(),
            payload: Bytes::new(),
        };
        assert_eq!(roundtrip(&msg), msg);
    }

    #[test]
    fn test_entity_messages_roundtrip() {
        let owner = OwnerMessage {
            entity_id: EntityId::new(70000),
            player_controller_id: 3,
        };
        assert_eq!(roundtrip(&owner), owner);

        let authority = PeerAuthorityMessage {
            connection_id: 2,
            entity_id: EntityId::new(1),
            authority_state: true,
        };
        assert_eq!(roundtrip(&authority), authority);

        let transform = OverrideTransformMessage {
            entity_id: EntityId::new(8),
            payload: Bytes::from_static(b"xyz"),
            teleport: true,
            time: 1234,
        };
        assert_eq!(roundtrip(&transform), transform);

        let reconnect = ReconnectMessage {
            old_connection_id: 4,
            player_controller_id: 1,
            entity_id: EntityId::new(44),
            msg_data: Bytes::from_static(&[9]),
        };
        assert_eq!(roundtrip(&reconnect), reconnect);
    }

    #[test]
    fn test_animation_messages_roundtrip() {
        let anim = AnimationMessage {
            entity_id: EntityId::new(2),
            state_hash: 0xDEAD_BEEF,
            normalized_time: 0.5,
            parameters: Bytes::from_static(&[1, 2, 3]),
        };
        assert_eq!(roundtrip(&anim), anim);

        let params = AnimationParametersMessage {
            entity_id: EntityId::new(2),
            parameters: Bytes::new(),
        };
        assert_eq!(roundtrip(&params), params);

        let trigger = AnimationTriggerMessage {
            entity_id: EntityId::new(2),
            hash: 17,
        };
        assert_eq!(roundtrip(&trigger), trigger);
    }

    #[test]
    fn test_crc_message_layout() {
        let msg = CrcMessage {
            entries: vec![CrcEntry {
                name: "Player".into(),
                channel: 1,
            }],
        };
        let mut writer = Writer::new();
        writer.write_message(&msg).unwrap();
        let mut expected = vec![1, 0, 6, 0];
        expected.extend_from_slice(b"Player");
        expected.push(1);
        assert_eq!(writer.to_vec(), expected);
        assert_eq!(roundtrip(&msg), msg);
    }

    #[test]
    fn test_fragment_overhead_matches_encoding() {
        for index in [0u32, 240, 241, 70000] {
            let msg = FragmentMessage {
                last: false,
                index,
                chunk: Bytes::from_static(&[0; 10]),
            };
            let mut writer = Writer::new();
            writer.start_message(17);
            writer.write_message(&msg).unwrap();
            writer.finish_message().unwrap();
            assert_eq!(writer.len(), 10 + FragmentMessage::overhead(index));
        }
    }

    #[test]
    fn test_misc_roundtrips() {
        let lobby = LobbyReadyToBeginMessage {
            slot_id: 3,
            ready_state: true,
        };
        assert_eq!(roundtrip(&lobby), lobby);
        assert_eq!(
            roundtrip(&ObjectSpawnFinishedMessage { state: 1 }).state,
            1
        );
        assert_eq!(
            roundtrip(&ObjectDestroyMessage {
                entity_id: EntityId::new(9)
            })
            .entity_id,
            EntityId::new(9)
        );
        assert!(roundtrip(&ClientAuthorityMessage {
            entity_id: EntityId::new(1),
            authority: true
        })
        .authority);
        assert_eq!(roundtrip(&StringMessage::new("hi")).value, "hi");
        assert_eq!(roundtrip(&RemovePlayerMessage { player_controller_id: 2 }).player_controller_id, 2);
    }
}
