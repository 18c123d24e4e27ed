//! Protocol fingerprint: the declared name-to-channel assignments both peers
//! must agree on before trusting each other's traffic.

use crate::error::FingerprintError;
use crate::message::{CrcEntry, CrcMessage};
use std::collections::BTreeMap;
use tracing::{debug, error, info};

/// Registry of `{name -> channel}` assignments.
///
/// Constructed explicitly by the application and passed to connections;
/// entries are kept sorted by name so the exchanged list is deterministic.
#[derive(Debug, Clone)]
pub struct ProtocolFingerprint {
    entries: BTreeMap<String, u8>,
    check_enabled: bool,
}

impl Default for ProtocolFingerprint {
    fn default() -> Self {
        Self::new()
    }
}

impl ProtocolFingerprint {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            check_enabled: true,
        }
    }

    /// Registers `name` on `channel`, replacing any earlier assignment.
    pub fn register(&mut self, name: impl Into<String>, channel: u8) {
        self.entries.insert(name.into(), channel);
    }

    pub fn reset(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn channel(&self, name: &str) -> Option<u8> {
        self.entries.get(name).copied()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, u8)> {
        self.entries.iter().map(|(name, channel)| (name.as_str(), *channel))
    }

    /// Whether a failed validation should reject the peer.
    pub fn check_enabled(&self) -> bool {
        self.check_enabled
    }

    pub fn set_check_enabled(&mut self, enabled: bool) {
        self.check_enabled = enabled;
    }

    /// Builds the handshake message carrying every entry.
    pub fn to_message(&self) -> CrcMessage {
        CrcMessage {
            entries: self
                .entries
                .iter()
                .map(|(name, channel)| CrcEntry {
                    name: name.clone(),
                    channel: *channel,
                })
                .collect(),
        }
    }

    /// CRC32C over the ordered entries, for compact logging.
    pub fn digest(&self) -> u32 {
        let mut crc = 0u32;
        for (name, channel) in &self.entries {
            crc = crc32c::crc32c_append(crc, name.as_bytes());
            crc = crc32c::crc32c_append(crc, &[*channel]);
        }
        crc
    }

    /// Checks a peer's entries against this registry.
    ///
    /// Fails when the counts differ, when a name known to both sides maps to
    /// different channels, or when a remote channel is not below
    /// `channel_count`. Every failure dumps both registries.
    pub fn validate(&self, remote: &[CrcEntry], channel_count: usize) -> Result<(), FingerprintError> {
        let result = self.check(remote, channel_count);
        if let Err(e) = &result {
            error!(error = %e, "protocol fingerprint mismatch");
            self.dump(remote);
        }
        result
    }

    fn check(&self, remote: &[CrcEntry], channel_count: usize) -> Result<(), FingerprintError> {
        if self.entries.len() != remote.len() {
            return Err(FingerprintError::CountMismatch {
                local: self.entries.len(),
                remote: remote.len(),
            });
        }

        for entry in remote {
            debug!(name = %entry.name, channel = entry.channel, "fingerprint entry");
            if let Some(local) = self.entries.get(&entry.name) {
                if *local != entry.channel {
                    return Err(FingerprintError::ChannelMismatch {
                        name: entry.name.clone(),
                        local: *local,
                        remote: entry.channel,
                    });
                }
            }
            if usize::from(entry.channel) >= channel_count {
                return Err(FingerprintError::ChannelOutOfRange {
                    name: entry.name.clone(),
                    channel: entry.channel,
                    channel_count,
                });
            }
        }
        Ok(())
    }

    fn dump(&self, remote: &[CrcEntry]) {
        for (name, channel) in &self.entries {
            info!(name = %name, channel = *channel, "fingerprint local entry");
        }
        for entry in remote {
            info!(name = %entry.name, channel = entry.channel, "fingerprint remote entry");
        }
    }
}
