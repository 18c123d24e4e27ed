//! # hlnet-channel
//!
//! Per-channel machinery between connections and the packet transport.
//!
//! This crate provides:
//! - QoS classes and their reliability/ordering/fragmentation properties
//! - `ChannelBuffer`: send coalescing, size ceilings, fragmentation and
//!   reassembly, pending resend of reliable packets
//! - The `Transport` trait and an in-memory implementation
//! - Traffic counters

pub mod buffer;
pub mod error;
pub mod fragment;
pub mod qos;
pub mod stats;
pub mod transport;

pub use buffer::{
    ChannelBuffer, DEFAULT_MAX_PENDING_PACKETS, FRAGMENT_SIZE_MULTIPLIER, MAX_FRAGMENT_OVERHEAD,
    MAX_PENDING_PACKETS_LIMIT,
};
pub use error::{ChannelError, TransportError};
pub use fragment::{FragmentAssembler, MAX_REASSEMBLED_SIZE};
pub use qos::QosType;
pub use stats::ChannelStats;
pub use transport::{Link, MemoryTransport, SentPacket, Transport};
