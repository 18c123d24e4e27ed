//! In-process loopback connections.
//!
//! A [`LocalConnection`] pair skips channel buffers. Every frame one side
//! sends goes through its [`LocalTransport`] into the other side's inbox and
//! is dispatched on the next [`LocalConnection::update`].

use crate::config::Config;
use crate::connection::{Connection, DispatchReport};
use crate::error::ConnectionError;
use bytes::Bytes;
use hlnet_channel::{Transport, TransportError};
use hlnet_protocol::{FrameHeader, MsgKind, Writer, FRAME_HEADER_SIZE};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::ops::{Deref, DerefMut};
use std::rc::Rc;
use tracing::{debug, trace};

/// A packet waiting in a loopback inbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalPacket {
    pub bytes: Bytes,
    pub channel_id: u8,
}

pub(crate) type Inbox = Rc<RefCell<VecDeque<LocalPacket>>>;

/// Host id reported by loopback connections.
pub const LOCAL_HOST_ID: i32 = -1;

const LOCAL_ADDRESS: &str = "localClient";

/// Transport for a loopback endpoint. Sends go to the peer's inbox;
/// disconnecting posts a `Disconnect` frame there.
struct LocalTransport {
    peer: Inbox,
}

impl Transport for LocalTransport {
    fn send(
        &self,
        _host_id: i32,
        _connection_id: i32,
        channel_id: u8,
        bytes: &[u8],
    ) -> Result<(), TransportError> {
        self.peer.borrow_mut().push_back(LocalPacket {
            bytes: Bytes::copy_from_slice(bytes),
            channel_id,
        });
        Ok(())
    }

    fn disconnect(&self, _host_id: i32, connection_id: i32) -> Result<(), TransportError> {
        debug!(connection_id, "local disconnect");
        self.peer
            .borrow_mut()
            .push_back(system_packet(MsgKind::Disconnect));
        Ok(())
    }
}

fn system_packet(kind: MsgKind) -> LocalPacket {
    let mut writer = Writer::with_capacity(FRAME_HEADER_SIZE);
    FrameHeader {
        size: 0,
        msg_type: kind.as_wire(),
    }
    .write(&mut writer);
    LocalPacket {
        bytes: writer.freeze(),
        channel_id: 0,
    }
}

/// One end of an in-process connection pair.
pub struct LocalConnection {
    conn: Connection,
    inbox: Inbox,
}

impl LocalConnection {
    /// Creates two connected endpoints, conventionally (server side, client side).
    pub fn pair(config: &Config) -> Result<(LocalConnection, LocalConnection), ConnectionError> {
        let server_inbox: Inbox = Rc::default();
        let client_inbox: Inbox = Rc::default();
        let server = Self::endpoint(0, server_inbox.clone(), client_inbox.clone(), config)?;
        let client = Self::endpoint(1, client_inbox, server_inbox, config)?;
        Ok((server, client))
    }

    fn endpoint(
        connection_id: i32,
        inbox: Inbox,
        peer: Inbox,
        config: &Config,
    ) -> Result<Self, ConnectionError> {
        let transport = Rc::new(LocalTransport { peer });
        let mut conn = Connection::new(transport, LOCAL_HOST_ID, connection_id, LOCAL_ADDRESS, config)?;
        conn.set_unbuffered();
        Ok(Self { conn, inbox })
    }

    /// Enqueues an empty system message (e.g. `Connect`) for this endpoint.
    pub fn post_internal(&self, kind: MsgKind) {
        self.inbox.borrow_mut().push_back(system_packet(kind));
    }

    /// Packets waiting for the next update.
    pub fn pending(&self) -> usize {
        self.inbox.borrow().len()
    }

    /// Dispatches everything received so far.
    ///
    /// Packets that arrive while this runs, including replies sent to
    /// ourselves by a handler, wait for the next call.
    pub fn update(&mut self) -> DispatchReport {
        let batch = std::mem::take(&mut *self.inbox.borrow_mut());
        let mut total = DispatchReport::default();
        for packet in batch {
            trace!(
                connection_id = self.conn.connection_id(),
                size = packet.bytes.len(),
                "local packet"
            );
            let report = self.conn.handle_packet(packet.bytes, packet.channel_id);
            total.frames += report.frames;
            total.dispatched += report.dispatched;
            total.queued += report.queued;
            total.failed += report.failed;
            if report.halted.is_some() {
                total.halted = report.halted;
            }
        }
        total
    }

    pub fn into_inner(self) -> Connection {
        self.conn
    }
}

impl Deref for LocalConnection {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        &self.conn
    }
}

impl DerefMut for LocalConnection {
    fn deref_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }
}

impl std::fmt::Debug for LocalConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalConnection")
            .field("conn", &self.conn)
            .field("pending", &self.pending())
            .finish()
    }
}
