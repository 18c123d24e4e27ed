//! Channel reliability and ordering classes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Delivery class of a channel, fixed at connection setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QosType {
    Unreliable,
    UnreliableFragmented,
    UnreliableSequenced,
    Reliable,
    ReliableFragmented,
    ReliableSequenced,
    /// Unreliable, only the newest buffered value is kept.
    StateUpdate,
    /// Reliable, only the newest buffered value is kept.
    ReliableStateUpdate,
}

impl QosType {
    pub fn is_reliable(self) -> bool {
        matches!(
            self,
            QosType::Reliable
                | QosType::ReliableFragmented
                | QosType::ReliableSequenced
                | QosType::ReliableStateUpdate
        )
    }

    pub fn is_sequenced(self) -> bool {
        matches!(self, QosType::ReliableSequenced | QosType::UnreliableSequenced)
    }

    /// Fragmented channels split oversized sends instead of rejecting them.
    pub fn is_fragmented(self) -> bool {
        matches!(
            self,
            QosType::ReliableFragmented | QosType::UnreliableFragmented
        )
    }

    pub fn is_state_update(self) -> bool {
        matches!(self, QosType::StateUpdate | QosType::ReliableStateUpdate)
    }
}

impl fmt::Display for QosType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QosType::Unreliable => "unreliable",
            QosType::UnreliableFragmented => "unreliable_fragmented",
            QosType::UnreliableSequenced => "unreliable_sequenced",
            QosType::Reliable => "reliable",
            QosType::ReliableFragmented => "reliable_fragmented",
            QosType::ReliableSequenced => "reliable_sequenced",
            QosType::StateUpdate => "state_update",
            QosType::ReliableStateUpdate => "reliable_state_update",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(QosType::ReliableSequenced.is_reliable());
        assert!(QosType::ReliableSequenced.is_sequenced());
        assert!(!QosType::ReliableSequenced.is_fragmented());

        assert!(!QosType::UnreliableFragmented.is_reliable());
        assert!(QosType::UnreliableFragmented.is_fragmented());

        assert!(QosType::ReliableStateUpdate.is_reliable());
        assert!(QosType::StateUpdate.is_state_update());
        assert!(!QosType::StateUpdate.is_reliable());
        assert!(!QosType::Unreliable.is_sequenced());
    }

    #[test]
    fn test_display_matches_serde_name() {
        assert_eq!(QosType::ReliableFragmented.to_string(), "reliable_fragmented");
        assert_eq!(QosType::StateUpdate.to_string(), "state_update");
    }
}
