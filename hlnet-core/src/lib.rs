//! # hlnet-core
//!
//! Peer sessions for hlnet.
//!
//! This crate provides:
//! - `Connection`: handler dispatch, pause queue, visibility and ownership
//!   bookkeeping, player controller slots and orderly disposal
//! - The `EntityRegistry` seam to the application's entity store
//! - In-process loopback connection pairs
//! - YAML/environment configuration

pub mod config;
pub mod connection;
pub mod entity;
pub mod error;
pub mod handler;
pub mod local;

pub use config::{Config, ConfigError, FingerprintConfig, LoggingConfig, TopologyConfig};
pub use connection::{
    Connection, DispatchReport, HaltReason, PacketStat, StatsIn, StatsOut,
    DEFAULT_RELIABLE_CHANNEL, DEFAULT_UNRELIABLE_CHANNEL,
};
pub use entity::{EntityHandle, EntityId, EntityRegistry, PlayerController};
pub use error::ConnectionError;
pub use handler::{Handler, HandlerRegistry, NetworkMessage};
pub use local::{LocalConnection, LocalPacket, LOCAL_HOST_ID};
