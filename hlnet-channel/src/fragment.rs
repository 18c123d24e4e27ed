//! Fragment splitting and reassembly for fragmented channels.

use crate::error::ChannelError;
use bytes::{Bytes, BytesMut};
use hlnet_protocol::FragmentMessage;
use tracing::warn;

/// Upper bound on a reassembled message.
pub const MAX_REASSEMBLED_SIZE: usize = 1 << 20;

/// Splits `bytes` into chunks of at most `chunk_size` bytes.
///
/// Indices run from zero; only the final chunk has `last` set.
pub fn split(bytes: &Bytes, chunk_size: usize) -> Vec<FragmentMessage> {
    let chunk_size = chunk_size.max(1);
    let count = bytes.len().div_ceil(chunk_size);
    (0..count)
        .map(|i| {
            let start = i * chunk_size;
            let end = (start + chunk_size).min(bytes.len());
            FragmentMessage {
                last: i + 1 == count,
                index: i as u32,
                chunk: bytes.slice(start..end),
            }
        })
        .collect()
}

/// Reassembly state for one channel.
///
/// Only one message is assembled at a time: a chunk with index zero always
/// starts over, discarding whatever was in progress.
#[derive(Debug, Default)]
pub struct FragmentAssembler {
    buffer: BytesMut,
    next_index: Option<u32>,
}

impl FragmentAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a message is partially assembled.
    pub fn in_progress(&self) -> bool {
        self.next_index.is_some()
    }

    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
        self.next_index = None;
    }

    /// Feeds one chunk; returns the whole message once the last chunk arrives.
    pub fn accept(&mut self, fragment: FragmentMessage) -> Result<Option<Bytes>, ChannelError> {
        if fragment.index == 0 {
            if self.in_progress() {
                warn!(
                    discarded = self.buffer.len(),
                    "new fragmented message started, discarding incomplete buffer"
                );
            }
            self.buffer.clear();
        } else if self.next_index != Some(fragment.index) {
            let expected = self.next_index;
            self.clear();
            return Err(ChannelError::FragmentOutOfOrder {
                expected,
                received: fragment.index,
            });
        }

        // a non-final chunk must leave room for a successor index
        let next_index = match (fragment.last, fragment.index.checked_add(1)) {
            (true, _) => None,
            (false, Some(next)) => Some(next),
            (false, None) => {
                self.clear();
                return Err(ChannelError::FragmentOutOfOrder {
                    expected: None,
                    received: fragment.index,
                });
            }
        };

        if self.buffer.len() + fragment.chunk.len() > MAX_REASSEMBLED_SIZE {
            self.clear();
            return Err(ChannelError::FragmentTooLarge {
                max: MAX_REASSEMBLED_SIZE,
            });
        }

        self.buffer.extend_from_slice(&fragment.chunk);
        self.next_index = next_index;
        if fragment.last {
            return Ok(Some(self.buffer.split().freeze()));
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn payload(len: usize) -> Bytes {
        Bytes::from((0..len).map(|i| (i % 251) as u8).collect::<Vec<_>>())
    }

    #[test]
    fn test_split_three_ceilings_plus_seven() {
        let ceiling = 64;
        let data = payload(3 * ceiling + 7);
        let chunks = split(&data, ceiling);
        assert_eq!(chunks.len(), 4);
        assert_eq!(chunks[3].chunk.len(), 7);
        assert!(chunks[3].last);
        assert!(chunks[..3].iter().all(|c| !c.last && c.chunk.len() == ceiling));
        assert_eq!(
            chunks.iter().map(|c| c.index).collect::<Vec<_>>(),
            vec![0, 1, 2, 3]
        );
    }

    #[test]
    fn test_reassemble_in_order() {
        let data = payload(3 * 64 + 7);
        let mut assembler = FragmentAssembler::new();
        let mut result = None;
        for chunk in split(&data, 64) {
            assert!(result.is_none());
            result = assembler.accept(chunk).unwrap();
        }
        assert_eq!(result.unwrap(), data);
        assert!(!assembler.in_progress());
        assert_eq!(assembler.buffered_len(), 0);
    }

    #[test]
    fn test_index_at_u32_max_resets() {
        let mut assembler = FragmentAssembler {
            buffer: BytesMut::from(&b"partial"[..]),
            next_index: Some(u32::MAX),
        };
        let err = assembler
            .accept(FragmentMessage {
                last: false,
                index: u32::MAX,
                chunk: payload(4),
            })
            .unwrap_err();
        assert_eq!(
            err,
            ChannelError::FragmentOutOfOrder {
                expected: None,
                received: u32::MAX
            }
        );
        assert!(!assembler.in_progress());
        assert_eq!(assembler.buffered_len(), 0);

        // a final chunk at the top index still completes
        assembler.next_index = Some(u32::MAX);
        let done = assembler
            .accept(FragmentMessage {
                last: true,
                index: u32::MAX,
                chunk: payload(4),
            })
            .unwrap();
        assert_eq!(done, Some(payload(4)));
    }

    #[test]
    fn test_missing_terminal_never_completes() {
        let data = payload(3 * 64 + 7);
        let mut chunks = split(&data, 64);
        chunks.pop();

        let mut assembler = FragmentAssembler::new();
        for chunk in chunks {
            assert_eq!(assembler.accept(chunk).unwrap(), None);
        }
        assert!(assembler.in_progress());
        assert_eq!(assembler.buffered_len(), 3 * 64);
    }

    #[test]
    fn test_new_message_discards_incomplete() {
        let first = payload(200);
        let second = Bytes::from_static(b"second message");
        let mut assembler = FragmentAssembler::new();

        let mut chunks = split(&first, 64).into_iter();
        assembler.accept(chunks.next().unwrap()).unwrap();
        assembler.accept(chunks.next().unwrap()).unwrap();

        let mut done = None;
        for chunk in split(&second, 4) {
            done = assembler.accept(chunk).unwrap();
        }
        assert_eq!(done.unwrap(), second);
    }

    #[test]
    fn test_gap_drops_buffer_and_chunk() {
        let data = payload(300);
        let chunks = split(&data, 64);
        let mut assembler = FragmentAssembler::new();
        assembler.accept(chunks[0].clone()).unwrap();

        let err = assembler.accept(chunks[2].clone()).unwrap_err();
        assert_eq!(
            err,
            ChannelError::FragmentOutOfOrder {
                expected: Some(1),
                received: 2,
            }
        );
        assert!(!assembler.in_progress());

        // continuation without a start is also rejected
        assert!(assembler.accept(chunks[1].clone()).is_err());
    }

    #[test]
    fn test_single_chunk_message() {
        let mut assembler = FragmentAssembler::new();
        let chunks = split(&Bytes::from_static(b"tiny"), 64);
        assert_eq!(chunks.len(), 1);
        let out = assembler.accept(chunks[0].clone()).unwrap();
        assert_eq!(out.unwrap(), Bytes::from_static(b"tiny"));
    }

    #[test]
    fn test_oversized_reassembly_rejected() {
        let mut assembler = FragmentAssembler::new();
        let big = Bytes::from(vec![0u8; MAX_REASSEMBLED_SIZE]);
        assembler
            .accept(FragmentMessage {
                last: false,
                index: 0,
                chunk: big,
            })
            .unwrap();
        let err = assembler
            .accept(FragmentMessage {
                last: true,
                index: 1,
                chunk: Bytes::from_static(&[1]),
            })
            .unwrap_err();
        assert!(matches!(err, ChannelError::FragmentTooLarge { .. }));
        assert!(!assembler.in_progress());
    }

    proptest! {
        #[test]
        fn prop_split_then_accept_reassembles(len in 1usize..4096, chunk in 1usize..600) {
            let bytes = payload(len);
            let chunks = split(&bytes, chunk);
            prop_assert_eq!(chunks.len(), len.div_ceil(chunk));

            let mut assembler = FragmentAssembler::new();
            let mut complete = None;
            for (i, fragment) in chunks.into_iter().enumerate() {
                let result = assembler.accept(fragment).unwrap();
                if i + 1 < len.div_ceil(chunk) {
                    prop_assert!(result.is_none());
                }
                complete = result;
            }
            prop_assert_eq!(complete, Some(bytes));
        }
    }
}
