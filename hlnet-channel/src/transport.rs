//! The packet transport seam.
//!
//! The transport itself (sockets, NAT traversal, congestion control) lives
//! outside this crate. Channels only need to hand it finished packets.

use crate::error::TransportError;
use bytes::Bytes;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

/// A packet-oriented transport addressed by host, connection and channel.
///
/// Inbound packets travel the other way: the owner of the transport calls
/// `Connection::handle_bytes` for each packet it receives.
pub trait Transport {
    fn send(
        &self,
        host_id: i32,
        connection_id: i32,
        channel_id: u8,
        bytes: &[u8],
    ) -> Result<(), TransportError>;

    fn disconnect(&self, host_id: i32, connection_id: i32) -> Result<(), TransportError>;
}

/// A transport bound to one peer session.
#[derive(Clone)]
pub struct Link {
    transport: Rc<dyn Transport>,
    host_id: i32,
    connection_id: i32,
}

impl Link {
    pub fn new(transport: Rc<dyn Transport>, host_id: i32, connection_id: i32) -> Self {
        Self {
            transport,
            host_id,
            connection_id,
        }
    }

    pub fn host_id(&self) -> i32 {
        self.host_id
    }

    pub fn connection_id(&self) -> i32 {
        self.connection_id
    }

    pub fn send(&self, channel_id: u8, bytes: &[u8]) -> Result<(), TransportError> {
        self.transport
            .send(self.host_id, self.connection_id, channel_id, bytes)
    }

    pub fn disconnect(&self) -> Result<(), TransportError> {
        self.transport.disconnect(self.host_id, self.connection_id)
    }
}

impl fmt::Debug for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Link")
            .field("host_id", &self.host_id)
            .field("connection_id", &self.connection_id)
            .finish()
    }
}

/// A packet captured by [`MemoryTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentPacket {
    pub host_id: i32,
    pub connection_id: i32,
    pub channel_id: u8,
    pub bytes: Bytes,
}

/// In-process transport that records every packet it is given.
///
/// Failures can be scripted with [`MemoryTransport::fail_next`]; each queued
/// error is returned by exactly one subsequent `send`.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    sent: RefCell<VecDeque<SentPacket>>,
    failures: RefCell<VecDeque<TransportError>>,
    disconnects: RefCell<Vec<(i32, i32)>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next(&self, error: TransportError) {
        self.failures.borrow_mut().push_back(error);
    }

    /// Removes and returns every packet recorded so far.
    pub fn take_packets(&self) -> Vec<SentPacket> {
        self.sent.borrow_mut().drain(..).collect()
    }

    pub fn packet_count(&self) -> usize {
        self.sent.borrow().len()
    }

    pub fn disconnects(&self) -> Vec<(i32, i32)> {
        self.disconnects.borrow().clone()
    }
}

impl Transport for MemoryTransport {
    fn send(
        &self,
        host_id: i32,
        connection_id: i32,
        channel_id: u8,
        bytes: &[u8],
    ) -> Result<(), TransportError> {
        if let Some(e) = self.failures.borrow_mut().pop_front() {
            return Err(e);
        }
        self.sent.borrow_mut().push_back(SentPacket {
            host_id,
            connection_id,
            channel_id,
            bytes: Bytes::copy_from_slice(bytes),
        });
        Ok(())
    }

    fn disconnect(&self, host_id: i32, connection_id: i32) -> Result<(), TransportError> {
        self.disconnects.borrow_mut().push((host_id, connection_id));
        Ok(())
    }
}
