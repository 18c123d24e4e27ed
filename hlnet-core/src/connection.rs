//! A peer session: channels, handler dispatch, pause queue and the
//! visibility/ownership bookkeeping that must be undone on disposal.

use crate::config::Config;
use crate::entity::{EntityId, EntityRegistry, PlayerController};
use crate::error::ConnectionError;
use crate::handler::{HandlerRegistry, NetworkMessage};
use bytes::Bytes;
use hlnet_channel::{ChannelBuffer, ChannelError, ChannelStats, Link, Transport};
use hlnet_protocol::{
    CodecError, CrcMessage, FragmentMessage, Frame, FrameParser, Message, MsgKind,
    ProtocolFingerprint, Reader, Writer,
};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;
use std::rc::Rc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Channel used by [`Connection::send`].
pub const DEFAULT_RELIABLE_CHANNEL: u8 = 0;
/// Channel used by [`Connection::send_unreliable`].
pub const DEFAULT_UNRELIABLE_CHANNEL: u8 = 1;

/// Payload bytes included in message log lines.
const MAX_LOGGED_PAYLOAD: usize = 150;

/// Why parsing of a packet stopped early.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HaltReason {
    /// A frame header or payload ran past the end of the packet.
    Malformed(CodecError),
    /// No handler for this message type; the rest of the packet is discarded.
    UnknownType(i16),
    InvalidChannel(u8),
    Disposed,
}

/// Outcome of feeding one packet (or replaying the pause queue).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Frames parsed, including fragments.
    pub frames: usize,
    pub dispatched: usize,
    pub queued: usize,
    /// Handlers that returned an error.
    pub failed: usize,
    pub halted: Option<HaltReason>,
}

/// Receive counters for one message kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PacketStat {
    pub count: u64,
    pub bytes: u64,
}

/// Outbound totals across all channels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsOut {
    pub msgs: u64,
    pub buffered_msgs: u64,
    pub bytes: u64,
    pub last_buffered_per_second: u64,
}

/// Inbound totals across all channels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsIn {
    pub msgs: u64,
    pub bytes: u64,
}

#[derive(Debug, Clone)]
struct QueuedMessage {
    kind: MsgKind,
    payload: Bytes,
    channel_id: u8,
}

/// One peer session.
///
/// All state is owned by the thread driving the transport; nothing here is
/// shared across connections, including the reusable writer.
pub struct Connection {
    host_id: i32,
    connection_id: i32,
    address: String,
    link: Link,
    channels: Vec<ChannelBuffer>,
    unbuffered: bool,
    writer: Writer,
    handlers: HandlerRegistry,
    pause_queue: Option<VecDeque<QueuedMessage>>,
    vis_list: BTreeSet<EntityId>,
    owned_objects: BTreeSet<EntityId>,
    player_controllers: BTreeMap<i16, PlayerController>,
    registry: Option<Rc<dyn EntityRegistry>>,
    is_ready: bool,
    is_connected: bool,
    disposed: bool,
    incompatible: bool,
    last_message_time: Option<Instant>,
    log_network_messages: bool,
    script_crc_check: bool,
    packet_stats: BTreeMap<MsgKind, PacketStat>,
}

impl Connection {
    /// Creates a session over `transport` with one channel per configured QoS class.
    pub fn new(
        transport: Rc<dyn Transport>,
        host_id: i32,
        connection_id: i32,
        address: impl Into<String>,
        config: &Config,
    ) -> Result<Self, ConnectionError> {
        config.validate()?;
        let link = Link::new(transport, host_id, connection_id);
        let topology = &config.topology;
        let channels = topology
            .channels
            .iter()
            .enumerate()
            .map(|(i, qos)| {
                let mut channel =
                    ChannelBuffer::new(link.clone(), i as u8, *qos, topology.packet_size);
                channel.set_max_delay(topology.max_delay());
                if qos.is_fragmented() {
                    channel.set_fragment_size(topology.fragment_size)?;
                }
                Ok(channel)
            })
            .collect::<Result<Vec<_>, ChannelError>>()?;

        Ok(Self {
            host_id,
            connection_id,
            address: address.into(),
            link,
            channels,
            unbuffered: false,
            writer: Writer::new(),
            handlers: HandlerRegistry::new(),
            pause_queue: None,
            vis_list: BTreeSet::new(),
            owned_objects: BTreeSet::new(),
            player_controllers: BTreeMap::new(),
            registry: None,
            is_ready: false,
            is_connected: true,
            disposed: false,
            incompatible: false,
            last_message_time: None,
            log_network_messages: config.logging.log_network_messages,
            script_crc_check: config.fingerprint.script_crc_check,
            packet_stats: BTreeMap::new(),
        })
    }

    /// Sends go straight to the transport, skipping channel buffers.
    pub(crate) fn set_unbuffered(&mut self) {
        self.unbuffered = true;
    }

    pub fn host_id(&self) -> i32 {
        self.host_id
    }

    pub fn connection_id(&self) -> i32 {
        self.connection_id
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn channel(&self, channel_id: u8) -> Option<&ChannelBuffer> {
        self.channels.get(usize::from(channel_id))
    }

    pub fn is_ready(&self) -> bool {
        self.is_ready
    }

    pub fn set_ready(&mut self, ready: bool) {
        self.is_ready = ready;
    }

    pub fn is_connected(&self) -> bool {
        self.is_connected && !self.disposed
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Set once a fingerprint check has rejected the peer.
    pub fn is_incompatible(&self) -> bool {
        self.incompatible
    }

    pub fn last_message_time(&self) -> Option<Instant> {
        self.last_message_time
    }

    pub fn set_log_network_messages(&mut self, enabled: bool) {
        self.log_network_messages = enabled;
    }

    pub fn set_script_crc_check(&mut self, enabled: bool) {
        self.script_crc_check = enabled;
    }

    pub fn set_entity_registry(&mut self, registry: Rc<dyn EntityRegistry>) {
        self.registry = Some(registry);
    }

    // --- handlers ---

    pub fn register_handler<F>(&mut self, kind: MsgKind, handler: F)
    where
        F: Fn(&mut NetworkMessage<'_>) -> Result<(), ConnectionError> + 'static,
    {
        self.handlers.register(kind, handler);
    }

    /// Registers a handler that receives the decoded message.
    pub fn register_message<M, F>(&mut self, kind: MsgKind, handler: F)
    where
        M: Message + 'static,
        F: Fn(&mut Connection, M) -> Result<(), ConnectionError> + 'static,
    {
        self.handlers.register_message(kind, handler);
    }

    pub fn unregister_handler(&mut self, kind: MsgKind) -> bool {
        self.handlers.unregister(kind)
    }

    /// Replaces the whole handler table, e.g. with one shared by every connection.
    pub fn set_handlers(&mut self, handlers: HandlerRegistry) {
        self.handlers = handlers;
    }

    pub fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    pub fn check_handler(&self, kind: MsgKind) -> bool {
        self.handlers.contains(kind)
    }

    /// Calls the handler for `kind` directly; `Ok(false)` if none is registered.
    pub fn invoke_handler(
        &mut self,
        kind: MsgKind,
        payload: Bytes,
        channel_id: u8,
    ) -> Result<bool, ConnectionError> {
        self.ensure_open()?;
        self.invoke(kind, payload, channel_id)
    }

    fn invoke(
        &mut self,
        kind: MsgKind,
        payload: Bytes,
        channel_id: u8,
    ) -> Result<bool, ConnectionError> {
        let Some(handler) = self.handlers.get(kind) else {
            return Ok(false);
        };
        let mut message = NetworkMessage {
            kind,
            channel_id,
            reader: Reader::new(payload),
            conn: self,
        };
        handler(&mut message)?;
        Ok(true)
    }

    // --- pause queue ---

    /// Defers dispatch: frames are queued in arrival order until resumed.
    ///
    /// Calling this while already paused starts a fresh queue; anything still
    /// queued is dropped.
    pub fn pause_handling(&mut self) {
        if let Some(queue) = &self.pause_queue {
            if !queue.is_empty() {
                warn!(
                    connection_id = self.connection_id,
                    dropped = queue.len(),
                    "pause_handling while paused, dropping queued messages"
                );
            }
        }
        self.pause_queue = Some(VecDeque::new());
    }

    pub fn is_paused(&self) -> bool {
        self.pause_queue.is_some()
    }

    pub fn queued_messages(&self) -> usize {
        self.pause_queue.as_ref().map_or(0, VecDeque::len)
    }

    /// Replays the pause queue in arrival order; no-op when not paused.
    ///
    /// Handlers are looked up at replay time. If a handler pauses again, the
    /// messages not yet replayed stay queued ahead of later arrivals.
    pub fn resume_handling(&mut self) -> DispatchReport {
        let mut report = DispatchReport::default();
        let Some(mut queue) = self.pause_queue.take() else {
            return report;
        };
        debug!(
            connection_id = self.connection_id,
            queued = queue.len(),
            "resuming message handling"
        );

        while let Some(message) = queue.pop_front() {
            if self.disposed {
                report.halted = Some(HaltReason::Disposed);
                return report;
            }
            match self.invoke(message.kind, message.payload, message.channel_id) {
                Ok(true) => report.dispatched += 1,
                Ok(false) => warn!(
                    connection_id = self.connection_id,
                    kind = %message.kind,
                    "handler unregistered while paused, skipping queued message"
                ),
                Err(e) => {
                    error!(connection_id = self.connection_id, kind = %message.kind, error = %e, "handler failed");
                    report.failed += 1;
                }
            }
            if let Some(newer) = self.pause_queue.take() {
                queue.extend(newer);
                report.queued = queue.len();
                self.pause_queue = Some(queue);
                return report;
            }
        }
        report
    }

    // --- receive ---

    /// Parses `buffer[..received_size]` as frames arriving on `channel_id`.
    pub fn handle_bytes(
        &mut self,
        buffer: &[u8],
        received_size: usize,
        channel_id: u8,
    ) -> DispatchReport {
        let end = received_size.min(buffer.len());
        self.handle_packet(Bytes::copy_from_slice(&buffer[..end]), channel_id)
    }

    /// Parses a whole packet.
    ///
    /// Frames are dispatched (or queued while paused) in order. The first
    /// malformed frame or frame without a handler stops parsing: later
    /// frames in the packet are discarded.
    pub fn handle_packet(&mut self, packet: Bytes, channel_id: u8) -> DispatchReport {
        let mut report = DispatchReport::default();
        if self.disposed {
            report.halted = Some(HaltReason::Disposed);
            return report;
        }
        let index = usize::from(channel_id);
        if index >= self.channels.len() {
            error!(
                connection_id = self.connection_id,
                channel_id,
                channel_count = self.channels.len(),
                "packet on invalid channel"
            );
            report.halted = Some(HaltReason::InvalidChannel(channel_id));
            return report;
        }

        self.last_message_time = Some(Instant::now());
        let len = packet.len();
        self.dispatch_packet(packet, channel_id, &mut report);
        if let Some(channel) = self.channels.get_mut(index) {
            channel.record_received(report.frames as u64, len);
        }
        report
    }

    fn dispatch_packet(&mut self, packet: Bytes, channel_id: u8, report: &mut DispatchReport) {
        for frame in FrameParser::new(packet) {
            if self.disposed {
                report.halted = Some(HaltReason::Disposed);
                return;
            }
            let frame = match frame {
                Ok(frame) => frame,
                Err(e) => {
                    error!(connection_id = self.connection_id, error = %e, "malformed frame, discarding rest of packet");
                    report.halted = Some(HaltReason::Malformed(e));
                    return;
                }
            };
            report.frames += 1;
            self.log_frame("recv", frame.msg_type, channel_id, &frame.payload);

            let kind = match frame.kind() {
                Some(kind) if kind == MsgKind::Fragment || self.handlers.contains(kind) => kind,
                _ => {
                    error!(
                        connection_id = self.connection_id,
                        msg_type = frame.msg_type,
                        "unknown message type, discarding rest of packet"
                    );
                    report.halted = Some(HaltReason::UnknownType(frame.msg_type));
                    return;
                }
            };
            self.record_packet_stat(kind, frame.payload.len());

            if kind == MsgKind::Fragment {
                match self.reassemble(&frame, channel_id) {
                    Ok(Some(message)) => {
                        self.dispatch_packet(message, channel_id, report);
                        if report.halted.is_some() {
                            return;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => {
                        warn!(connection_id = self.connection_id, channel_id, error = %e, "fragment rejected");
                    }
                }
                continue;
            }

            self.deliver(kind, frame.payload, channel_id, report);
        }
    }

    fn deliver(&mut self, kind: MsgKind, payload: Bytes, channel_id: u8, report: &mut DispatchReport) {
        if let Some(queue) = &mut self.pause_queue {
            queue.push_back(QueuedMessage {
                kind,
                payload,
                channel_id,
            });
            report.queued += 1;
            return;
        }
        match self.invoke(kind, payload, channel_id) {
            Ok(_) => report.dispatched += 1,
            Err(e) => {
                error!(connection_id = self.connection_id, kind = %kind, error = %e, "handler failed");
                report.failed += 1;
            }
        }
    }

    fn reassemble(&mut self, frame: &Frame, channel_id: u8) -> Result<Option<Bytes>, ConnectionError> {
        let fragment = FragmentMessage::deserialize(&mut frame.payload_reader())?;
        let channel_count = self.channels.len();
        let channel = self
            .channels
            .get_mut(usize::from(channel_id))
            .ok_or(ConnectionError::InvalidChannel {
                channel_id,
                channel_count,
            })?;
        Ok(channel.handle_fragment(fragment)?)
    }

    fn record_packet_stat(&mut self, kind: MsgKind, bytes: usize) {
        let stat = self.packet_stats.entry(kind).or_default();
        stat.count += 1;
        stat.bytes += bytes as u64;
    }

    pub fn packet_stats(&self) -> &BTreeMap<MsgKind, PacketStat> {
        &self.packet_stats
    }

    pub fn reset_packet_stats(&mut self) {
        self.packet_stats.clear();
    }

    fn log_frame(&self, direction: &str, msg_type: i16, channel_id: u8, payload: &[u8]) {
        if !self.log_network_messages {
            return;
        }
        let shown = &payload[..payload.len().min(MAX_LOGGED_PAYLOAD)];
        debug!(
            connection_id = self.connection_id,
            direction,
            channel_id,
            size = payload.len(),
            msg_type,
            payload = %hex::encode(shown),
            "network message"
        );
    }

    // --- send ---

    /// Sends on the default reliable channel.
    pub fn send<M: Message>(&mut self, kind: MsgKind, message: &M) -> Result<(), ConnectionError> {
        self.send_by_channel(kind, message, DEFAULT_RELIABLE_CHANNEL)
    }

    /// Sends on the default unreliable channel.
    pub fn send_unreliable<M: Message>(
        &mut self,
        kind: MsgKind,
        message: &M,
    ) -> Result<(), ConnectionError> {
        self.send_by_channel(kind, message, DEFAULT_UNRELIABLE_CHANNEL)
    }

    pub fn send_by_channel<M: Message>(
        &mut self,
        kind: MsgKind,
        message: &M,
        channel_id: u8,
    ) -> Result<(), ConnectionError> {
        self.ensure_open()?;
        self.check_channel(channel_id)?;

        self.writer.start_message(kind.as_wire());
        message.serialize(&mut self.writer)?;
        self.writer.finish_message()?;

        let frame = self.writer.as_slice();
        self.log_frame("send", kind.as_wire(), channel_id, &frame[hlnet_protocol::FRAME_HEADER_SIZE..]);
        route(&self.link, self.unbuffered, &mut self.channels, channel_id, frame)
    }

    /// Sends pre-framed bytes.
    pub fn send_bytes(&mut self, bytes: &[u8], channel_id: u8) -> Result<(), ConnectionError> {
        self.ensure_open()?;
        self.check_channel(channel_id)?;
        route(&self.link, self.unbuffered, &mut self.channels, channel_id, bytes)
    }

    /// Sends the contents of a writer built with `start_message`/`finish_message`.
    pub fn send_writer(&mut self, writer: &Writer, channel_id: u8) -> Result<(), ConnectionError> {
        self.send_bytes(writer.as_slice(), channel_id)
    }

    /// Flushes coalesced sends whose delay has elapsed and retries pending packets.
    pub fn flush_channels(&mut self, now: Instant) -> Result<(), ConnectionError> {
        let mut first_error = None;
        for channel in &mut self.channels {
            if let Err(e) = channel.check_internal_buffer(now) {
                warn!(
                    connection_id = self.connection_id,
                    channel_id = channel.channel_id(),
                    error = %e,
                    "channel flush failed"
                );
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }

    pub fn set_max_delay(&mut self, max_delay: Duration) {
        for channel in &mut self.channels {
            channel.set_max_delay(max_delay);
        }
    }

    pub fn set_max_pending_packets(
        &mut self,
        channel_id: u8,
        limit: usize,
    ) -> Result<(), ConnectionError> {
        self.check_channel(channel_id)?;
        self.channels[usize::from(channel_id)].set_max_pending_packets(limit)?;
        Ok(())
    }

    fn check_channel(&self, channel_id: u8) -> Result<(), ConnectionError> {
        if usize::from(channel_id) >= self.channels.len() {
            error!(
                connection_id = self.connection_id,
                channel_id,
                channel_count = self.channels.len(),
                "invalid channel"
            );
            return Err(ConnectionError::InvalidChannel {
                channel_id,
                channel_count: self.channels.len(),
            });
        }
        Ok(())
    }

    fn ensure_open(&self) -> Result<(), ConnectionError> {
        if self.disposed {
            return Err(ConnectionError::Disposed);
        }
        Ok(())
    }

    // --- statistics ---

    fn channel_totals(&self) -> ChannelStats {
        self.channels.iter().map(ChannelBuffer::stats).sum()
    }

    pub fn stats_out(&self) -> StatsOut {
        let total = self.channel_totals();
        StatsOut {
            msgs: total.msgs_out,
            buffered_msgs: total.buffered_msgs_out,
            bytes: total.bytes_out,
            last_buffered_per_second: total.last_buffered_per_second,
        }
    }

    pub fn stats_in(&self) -> StatsIn {
        let total = self.channel_totals();
        StatsIn {
            msgs: total.msgs_in,
            bytes: total.bytes_in,
        }
    }

    // --- fingerprint ---

    /// Sends the local fingerprint on the default reliable channel.
    pub fn send_fingerprint(&mut self, fingerprint: &ProtocolFingerprint) -> Result<(), ConnectionError> {
        info!(
            connection_id = self.connection_id,
            entries = fingerprint.len(),
            digest = %format!("{:08x}", fingerprint.digest()),
            "sending protocol fingerprint"
        );
        self.send(MsgKind::Crc, &fingerprint.to_message())
    }

    /// Validates a peer's fingerprint against the local one.
    ///
    /// A mismatch marks the connection incompatible unless the check is
    /// disabled on either the connection or the fingerprint, in which case it
    /// is only logged.
    pub fn verify_fingerprint(
        &mut self,
        remote: &CrcMessage,
        fingerprint: &ProtocolFingerprint,
    ) -> Result<(), ConnectionError> {
        match fingerprint.validate(&remote.entries, self.channels.len()) {
            Ok(()) => Ok(()),
            Err(e) if self.script_crc_check && fingerprint.check_enabled() => {
                self.incompatible = true;
                Err(ConnectionError::Incompatible(e))
            }
            Err(e) => {
                warn!(connection_id = self.connection_id, error = %e, "fingerprint mismatch ignored");
                Ok(())
            }
        }
    }

    // --- players, visibility, ownership ---

    /// Stores `controller` in its slot, replacing any previous occupant.
    pub fn set_player_controller(&mut self, controller: PlayerController) {
        self.player_controllers
            .insert(controller.player_controller_id, controller);
    }

    pub fn remove_player_controller(&mut self, player_controller_id: i16) -> Option<PlayerController> {
        let removed = self.player_controllers.remove(&player_controller_id);
        if removed.is_none() {
            warn!(
                connection_id = self.connection_id,
                player_controller_id, "no player controller to remove"
            );
        }
        removed
    }

    pub fn player_controller(&self, player_controller_id: i16) -> Option<&PlayerController> {
        self.player_controllers.get(&player_controller_id)
    }

    pub fn player_controllers(&self) -> impl Iterator<Item = &PlayerController> {
        self.player_controllers.values()
    }

    /// Starts observing `id` and asks the registry to show it to this peer.
    pub fn add_to_vis_list(&mut self, id: EntityId) {
        if self.vis_list.insert(id) {
            if let Some(registry) = &self.registry {
                registry.show_for_connection(id, self.connection_id);
            }
        }
    }

    /// Stops observing `id`. A destroyed entity is not hidden, only forgotten.
    pub fn remove_from_vis_list(&mut self, id: EntityId, is_destroyed: bool) {
        if self.vis_list.remove(&id) && !is_destroyed {
            if let Some(registry) = &self.registry {
                registry.hide_for_connection(id, self.connection_id);
            }
        }
    }

    pub fn is_visible(&self, id: EntityId) -> bool {
        self.vis_list.contains(&id)
    }

    pub fn vis_list(&self) -> &BTreeSet<EntityId> {
        &self.vis_list
    }

    /// Removes this peer from every entity it observes.
    pub fn remove_observers(&mut self) {
        let observed = std::mem::take(&mut self.vis_list);
        if let Some(registry) = &self.registry {
            for id in observed {
                registry.remove_observer(id, self.connection_id);
            }
        }
    }

    pub fn add_owned_object(&mut self, id: EntityId) {
        self.owned_objects.insert(id);
    }

    pub fn remove_owned_object(&mut self, id: EntityId) {
        self.owned_objects.remove(&id);
    }

    pub fn owned_objects(&self) -> &BTreeSet<EntityId> {
        &self.owned_objects
    }

    // --- lifecycle ---

    /// Marks the peer not ready, tells the transport and drops all observations.
    pub fn disconnect(&mut self) {
        self.is_ready = false;
        if self.is_connected && !self.disposed {
            if let Err(e) = self.link.disconnect() {
                warn!(connection_id = self.connection_id, error = %e, "transport disconnect failed");
            }
        }
        self.is_connected = false;
        self.remove_observers();
    }

    /// Releases authority over owned entities, leaves every visibility set
    /// and stops all further dispatch. Safe to call more than once.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;

        let owned = std::mem::take(&mut self.owned_objects);
        if let Some(registry) = &self.registry {
            for id in owned {
                if let Some(entity) = registry.resolve(id) {
                    registry.clear_client_owner(&entity);
                }
            }
        }
        self.remove_observers();

        if let Some(queue) = self.pause_queue.take() {
            if !queue.is_empty() {
                debug!(
                    connection_id = self.connection_id,
                    dropped = queue.len(),
                    "disposed with queued messages"
                );
            }
        }
        for channel in &mut self.channels {
            channel.clear();
        }
    }
}

fn route(
    link: &Link,
    unbuffered: bool,
    channels: &mut [ChannelBuffer],
    channel_id: u8,
    bytes: &[u8],
) -> Result<(), ConnectionError> {
    if unbuffered {
        link.send(channel_id, bytes).map_err(ChannelError::from)?;
        return Ok(());
    }
    let channel_count = channels.len();
    let channel = channels
        .get_mut(usize::from(channel_id))
        .ok_or(ConnectionError::InvalidChannel {
            channel_id,
            channel_count,
        })?;
    channel.send_bytes(bytes, Instant::now())?;
    Ok(())
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("host_id", &self.host_id)
            .field("connection_id", &self.connection_id)
            .field("address", &self.address)
            .field("channels", &self.channels.len())
            .field("is_ready", &self.is_ready)
            .field("paused", &self.is_paused())
            .field("disposed", &self.disposed)
            .field("handlers", &self.handlers)
            .finish()
    }
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hostId: {} connectionId: {} isReady: {} channel count: {}",
            self.host_id,
            self.connection_id,
            self.is_ready,
            self.channels.len()
        )
    }
}
