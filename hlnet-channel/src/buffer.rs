//! Outbound buffering and inbound fragment handling for a single channel.

use crate::error::{ChannelError, TransportError};
use crate::fragment::{self, FragmentAssembler, MAX_REASSEMBLED_SIZE};
use crate::qos::QosType;
use crate::stats::ChannelStats;
use crate::transport::Link;
use bytes::{Bytes, BytesMut};
use hlnet_protocol::{encode_message, FragmentMessage, MsgKind, Writer, MAX_FRAME_PAYLOAD};
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Default number of reliable packets held while the transport is out of resources.
pub const DEFAULT_MAX_PENDING_PACKETS: usize = 16;

/// Hard cap for [`ChannelBuffer::set_max_pending_packets`].
pub const MAX_PENDING_PACKETS_LIMIT: usize = 512;

/// Largest fragment frame overhead: header, last flag, 5-byte index, length prefix.
pub const MAX_FRAGMENT_OVERHEAD: usize = 4 + 1 + 5 + 2;

/// Fragmented channels accept sends of up to `fragment_size` times this many bytes.
pub const FRAGMENT_SIZE_MULTIPLIER: usize = 128;

/// One outbound lane of a connection.
///
/// Small sends are coalesced into a single packet until it would exceed the
/// channel's ceiling or `max_delay` elapses. A zero delay sends every call
/// immediately. On fragmented channels a send above the ceiling is split
/// into fragment frames of at most `fragment_size` bytes each, so every
/// packet still fits the ceiling; everywhere else it is rejected.
#[derive(Debug)]
pub struct ChannelBuffer {
    link: Link,
    channel_id: u8,
    qos: QosType,
    max_packet_size: usize,
    fragment_size: usize,
    max_message_size: usize,
    max_delay: Duration,
    current: BytesMut,
    pending: VecDeque<Bytes>,
    max_pending: usize,
    last_flush: Instant,
    last_stats_tick: Instant,
    buffered_this_second: u64,
    assembler: FragmentAssembler,
    fragment_writer: Writer,
    stats: ChannelStats,
}

impl ChannelBuffer {
    pub fn new(link: Link, channel_id: u8, qos: QosType, max_packet_size: usize) -> Self {
        let now = Instant::now();
        let max_packet_size = max_packet_size.clamp(1, MAX_FRAME_PAYLOAD);
        let fragment_size = max_packet_size.saturating_sub(MAX_FRAGMENT_OVERHEAD).max(1);
        Self {
            link,
            channel_id,
            qos,
            max_packet_size,
            fragment_size,
            max_message_size: Self::message_limit(qos, max_packet_size, fragment_size),
            max_delay: Duration::ZERO,
            current: BytesMut::with_capacity(max_packet_size),
            pending: VecDeque::new(),
            max_pending: DEFAULT_MAX_PENDING_PACKETS,
            last_flush: now,
            last_stats_tick: now,
            buffered_this_second: 0,
            assembler: FragmentAssembler::new(),
            fragment_writer: Writer::new(),
            stats: ChannelStats::default(),
        }
    }

    pub fn channel_id(&self) -> u8 {
        self.channel_id
    }

    pub fn qos(&self) -> QosType {
        self.qos
    }

    /// Packet ceiling; also the largest single send accepted without fragmentation.
    pub fn max_packet_size(&self) -> usize {
        self.max_packet_size
    }

    /// Chunk size used when splitting oversized sends.
    pub fn fragment_size(&self) -> usize {
        self.fragment_size
    }

    /// Largest send accepted at all. Above `max_packet_size` only on
    /// fragmented channels.
    pub fn max_message_size(&self) -> usize {
        self.max_message_size
    }

    /// Sets the fragment chunk size. A fragment frame built from a full
    /// chunk must still fit within the packet ceiling.
    pub fn set_fragment_size(&mut self, size: usize) -> Result<(), ChannelError> {
        let max = self.max_packet_size.saturating_sub(MAX_FRAGMENT_OVERHEAD);
        if size == 0 || size > max {
            return Err(ChannelError::InvalidFragmentSize {
                requested: size,
                max,
            });
        }
        self.fragment_size = size;
        self.max_message_size = Self::message_limit(self.qos, self.max_packet_size, size);
        Ok(())
    }

    fn message_limit(qos: QosType, max_packet_size: usize, fragment_size: usize) -> usize {
        if qos.is_fragmented() {
            fragment_size
                .saturating_mul(FRAGMENT_SIZE_MULTIPLIER)
                .min(MAX_REASSEMBLED_SIZE)
                .max(max_packet_size)
        } else {
            max_packet_size
        }
    }

    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    pub fn set_max_delay(&mut self, max_delay: Duration) {
        self.max_delay = max_delay;
    }

    pub fn set_max_pending_packets(&mut self, limit: usize) -> Result<(), ChannelError> {
        if limit > MAX_PENDING_PACKETS_LIMIT {
            return Err(ChannelError::InvalidPendingLimit {
                requested: limit,
                max: MAX_PENDING_PACKETS_LIMIT,
            });
        }
        self.max_pending = limit;
        Ok(())
    }

    pub fn stats(&self) -> ChannelStats {
        self.stats
    }

    /// Bytes waiting for the next flush.
    pub fn buffered_len(&self) -> usize {
        self.current.len()
    }

    /// Reliable packets the transport refused for lack of resources.
    pub fn pending_packets(&self) -> usize {
        self.pending.len()
    }

    /// Queues or sends `bytes`, one or more complete frames.
    pub fn send_bytes(&mut self, bytes: &[u8], now: Instant) -> Result<(), ChannelError> {
        if bytes.is_empty() {
            return Err(ChannelError::EmptySend);
        }

        if bytes.len() > self.max_message_size {
            return Err(ChannelError::MessageTooLarge {
                size: bytes.len(),
                max: self.max_message_size,
            });
        }
        if bytes.len() > self.max_packet_size {
            return self.send_fragmented(Bytes::copy_from_slice(bytes), now);
        }

        self.stats.msgs_out += 1;
        self.stats.bytes_out += bytes.len() as u64;

        if self.max_delay.is_zero() {
            self.flush(now)?;
            return self.send_packet(Bytes::copy_from_slice(bytes));
        }

        if self.qos.is_state_update() {
            if !self.current.is_empty() {
                debug!(channel = self.channel_id, "replacing buffered state update");
            }
            self.current.clear();
        } else if self.current.len() + bytes.len() > self.max_packet_size {
            self.flush(now)?;
        }

        self.current.extend_from_slice(bytes);
        self.stats.buffered_msgs_out += 1;
        self.buffered_this_second += 1;
        Ok(())
    }

    /// Sends the coalesced packet now, if there is one.
    pub fn flush(&mut self, now: Instant) -> Result<(), ChannelError> {
        self.last_flush = now;
        if self.current.is_empty() {
            return Ok(());
        }
        let packet = self.current.split().freeze();
        self.send_packet(packet)
    }

    /// Periodic maintenance: flushes once `max_delay` has elapsed, retries
    /// pending reliable packets and rolls the per-second counter.
    pub fn check_internal_buffer(&mut self, now: Instant) -> Result<(), ChannelError> {
        if now.saturating_duration_since(self.last_stats_tick) >= Duration::from_secs(1) {
            self.stats.last_buffered_per_second = self.buffered_this_second;
            self.buffered_this_second = 0;
            self.last_stats_tick = now;
        }

        self.retry_pending()?;

        if !self.current.is_empty()
            && now.saturating_duration_since(self.last_flush) >= self.max_delay
        {
            self.flush(now)?;
        }
        Ok(())
    }

    /// Feeds an inbound fragment; returns the reassembled bytes when complete.
    pub fn handle_fragment(
        &mut self,
        fragment: FragmentMessage,
    ) -> Result<Option<Bytes>, ChannelError> {
        let result = self.assembler.accept(fragment);
        if let Err(e) = &result {
            warn!(channel = self.channel_id, error = %e, "dropping fragment");
        }
        result
    }

    /// Counts one received packet of `bytes` bytes carrying `frames` frames.
    pub fn record_received(&mut self, frames: u64, bytes: usize) {
        self.stats.msgs_in += frames;
        self.stats.bytes_in += bytes as u64;
    }

    /// Drops all buffered, pending and partially reassembled data.
    pub fn clear(&mut self) {
        self.current.clear();
        self.pending.clear();
        self.assembler.clear();
    }

    fn send_fragmented(&mut self, bytes: Bytes, now: Instant) -> Result<(), ChannelError> {
        // earlier coalesced sends go first
        self.flush(now)?;

        let chunks = fragment::split(&bytes, self.fragment_size);
        debug!(
            channel = self.channel_id,
            size = bytes.len(),
            chunks = chunks.len(),
            "sending fragmented"
        );
        for chunk in &chunks {
            encode_message(&mut self.fragment_writer, MsgKind::Fragment, chunk)?;
            let packet = self.fragment_writer.to_bytes();
            self.stats.bytes_out += packet.len() as u64;
            self.send_packet(packet)?;
        }
        self.stats.msgs_out += 1;
        Ok(())
    }

    fn send_packet(&mut self, packet: Bytes) -> Result<(), ChannelError> {
        if self.qos.is_reliable() && !self.pending.is_empty() {
            // keep reliable order behind packets already waiting
            self.queue_pending(packet)?;
            return self.retry_pending();
        }

        match self.link.send(self.channel_id, &packet) {
            Ok(()) => Ok(()),
            Err(TransportError::NoResources) if self.qos.is_reliable() => {
                self.queue_pending(packet)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn queue_pending(&mut self, packet: Bytes) -> Result<(), ChannelError> {
        if self.pending.len() >= self.max_pending {
            warn!(
                channel = self.channel_id,
                limit = self.max_pending,
                "pending packet limit reached, dropping packet"
            );
            return Err(ChannelError::PendingLimit {
                limit: self.max_pending,
            });
        }
        self.pending.push_back(packet);
        Ok(())
    }

    fn retry_pending(&mut self) -> Result<(), ChannelError> {
        while let Some(packet) = self.pending.front() {
            match self.link.send(self.channel_id, packet) {
                Ok(()) => {
                    self.pending.pop_front();
                }
                Err(TransportError::NoResources) => break,
                Err(e) => {
                    self.pending.pop_front();
                    return Err(e.into());
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MemoryTransport;
    use hlnet_protocol::{FrameParser, Message};
    use std::rc::Rc;

    fn channel(qos: QosType, ceiling: usize) -> (Rc<MemoryTransport>, ChannelBuffer) {
        let transport = Rc::new(MemoryTransport::new());
        let link = Link::new(transport.clone(), 0, 1);
        (transport, ChannelBuffer::new(link, 0, qos, ceiling))
    }

    fn data(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 7 % 256) as u8).collect()
    }

    #[test]
    fn test_immediate_send() {
        let (transport, mut ch) = channel(QosType::Reliable, 100);
        let now = Instant::now();
        ch.send_bytes(b"hello", now).unwrap();
        ch.send_bytes(b"world", now).unwrap();

        let packets = transport.take_packets();
        assert_eq!(packets.len(), 2);
        assert_eq!(&packets[1].bytes[..], b"world");
        assert_eq!(ch.stats().msgs_out, 2);
        assert_eq!(ch.stats().bytes_out, 10);
        assert_eq!(ch.stats().buffered_msgs_out, 0);
    }

    #[test]
    fn test_empty_send_rejected() {
        let (_, mut ch) = channel(QosType::Reliable, 100);
        assert_eq!(ch.send_bytes(&[], Instant::now()), Err(ChannelError::EmptySend));
    }

    #[test]
    fn test_oversize_on_plain_channel_rejected() {
        let (transport, mut ch) = channel(QosType::ReliableSequenced, 64);
        let err = ch.send_bytes(&data(65), Instant::now()).unwrap_err();
        assert_eq!(err, ChannelError::MessageTooLarge { size: 65, max: 64 });
        assert_eq!(transport.packet_count(), 0);
        assert_eq!(ch.stats().msgs_out, 0);

        ch.send_bytes(&data(64), Instant::now()).unwrap();
        assert_eq!(transport.packet_count(), 1);
    }

    #[test]
    fn test_coalesce_until_delay() {
        let (transport, mut ch) = channel(QosType::Unreliable, 100);
        ch.set_max_delay(Duration::from_millis(50));
        let start = Instant::now();

        ch.send_bytes(b"aa", start).unwrap();
        ch.send_bytes(b"bb", start).unwrap();
        assert_eq!(transport.packet_count(), 0);
        assert_eq!(ch.buffered_len(), 4);

        ch.check_internal_buffer(start + Duration::from_millis(10)).unwrap();
        assert_eq!(transport.packet_count(), 0);

        ch.check_internal_buffer(start + Duration::from_millis(60)).unwrap();
        let packets = transport.take_packets();
        assert_eq!(packets.len(), 1);
        assert_eq!(&packets[0].bytes[..], b"aabb");
        assert_eq!(ch.stats().buffered_msgs_out, 2);
    }

    #[test]
    fn test_coalesce_flushes_at_ceiling() {
        let (transport, mut ch) = channel(QosType::Reliable, 10);
        ch.set_max_delay(Duration::from_secs(1));
        let now = Instant::now();

        ch.send_bytes(&[1; 6], now).unwrap();
        ch.send_bytes(&[2; 6], now).unwrap();
        let packets = transport.take_packets();
        assert_eq!(packets.len(), 1);
        assert_eq!(&packets[0].bytes[..], &[1; 6]);
        assert_eq!(ch.buffered_len(), 6);
    }

    #[test]
    fn test_state_update_keeps_latest() {
        let (transport, mut ch) = channel(QosType::StateUpdate, 100);
        ch.set_max_delay(Duration::from_millis(20));
        let now = Instant::now();

        ch.send_bytes(b"pos=1", now).unwrap();
        ch.send_bytes(b"pos=2", now).unwrap();
        ch.send_bytes(b"pos=3", now).unwrap();
        ch.flush(now).unwrap();

        let packets = transport.take_packets();
        assert_eq!(packets.len(), 1);
        assert_eq!(&packets[0].bytes[..], b"pos=3");
    }

    fn fragmented(
        qos: QosType,
        ceiling: usize,
        fragment_size: usize,
    ) -> (Rc<MemoryTransport>, ChannelBuffer) {
        let (transport, mut ch) = channel(qos, ceiling);
        ch.set_fragment_size(fragment_size).unwrap();
        (transport, ch)
    }

    #[test]
    fn test_fragmented_send_yields_four_chunks() {
        let (ceiling, fragment_size) = (128, 64);
        let (transport, mut ch) = fragmented(QosType::ReliableFragmented, ceiling, fragment_size);
        let payload = data(3 * fragment_size + 7);
        ch.send_bytes(&payload, Instant::now()).unwrap();

        let packets = transport.take_packets();
        assert_eq!(packets.len(), 4);
        assert!(packets.iter().all(|p| p.bytes.len() <= ceiling));

        // feed the chunks to a receiving channel in arrival order
        let (_, mut receiver) = fragmented(QosType::ReliableFragmented, ceiling, fragment_size);
        let mut rebuilt = None;
        for packet in packets {
            let frame = FrameParser::new(packet.bytes).next().unwrap().unwrap();
            assert_eq!(frame.kind(), Some(MsgKind::Fragment));
            let fragment = FragmentMessage::deserialize(&mut frame.payload_reader()).unwrap();
            assert!(rebuilt.is_none());
            rebuilt = receiver.handle_fragment(fragment).unwrap();
        }
        assert_eq!(rebuilt.unwrap().to_vec(), payload);
        assert_eq!(ch.stats().msgs_out, 1);
    }

    #[test]
    fn test_fragmented_missing_terminal() {
        let (ceiling, fragment_size) = (64, 32);
        let (transport, mut ch) = fragmented(QosType::UnreliableFragmented, ceiling, fragment_size);
        ch.send_bytes(&data(3 * ceiling + 7), Instant::now()).unwrap();
        let mut packets = transport.take_packets();
        assert_eq!(packets.len(), 7);
        packets.pop();

        let (_, mut receiver) = fragmented(QosType::UnreliableFragmented, ceiling, fragment_size);
        for packet in packets {
            let frame = FrameParser::new(packet.bytes).next().unwrap().unwrap();
            let fragment = FragmentMessage::deserialize(&mut frame.payload_reader()).unwrap();
            assert_eq!(receiver.handle_fragment(fragment).unwrap(), None);
        }
    }

    #[test]
    fn test_default_fragment_size_fits_ceiling() {
        let ceiling = 1440;
        let (transport, mut ch) = channel(QosType::ReliableFragmented, ceiling);
        assert_eq!(ch.fragment_size(), ceiling - MAX_FRAGMENT_OVERHEAD);
        assert_eq!(
            ch.max_message_size(),
            (ceiling - MAX_FRAGMENT_OVERHEAD) * FRAGMENT_SIZE_MULTIPLIER
        );

        ch.send_bytes(&data(20_000), Instant::now()).unwrap();
        let packets = transport.take_packets();
        assert_eq!(packets.len(), 15);
        assert!(packets.iter().all(|p| p.bytes.len() <= ceiling));
    }

    #[test]
    fn test_fragmented_send_above_limit_rejected() {
        let (transport, mut ch) = fragmented(QosType::ReliableFragmented, 128, 1);
        // the limit never drops below the ceiling
        assert_eq!(ch.max_message_size(), 128);
        assert_eq!(
            ch.send_bytes(&data(129), Instant::now()),
            Err(ChannelError::MessageTooLarge { size: 129, max: 128 })
        );
        assert_eq!(transport.packet_count(), 0);

        ch.set_fragment_size(100).unwrap();
        assert_eq!(ch.max_message_size(), 12_800);
        ch.send_bytes(&data(12_800), Instant::now()).unwrap();
        assert_eq!(transport.packet_count(), 128);
        assert!(ch.send_bytes(&data(12_801), Instant::now()).is_err());
    }

    #[test]
    fn test_invalid_fragment_size() {
        let (_, mut ch) = channel(QosType::ReliableFragmented, 128);
        assert_eq!(
            ch.set_fragment_size(0),
            Err(ChannelError::InvalidFragmentSize {
                requested: 0,
                max: 116
            })
        );
        assert!(ch.set_fragment_size(117).is_err());
        assert!(ch.set_fragment_size(116).is_ok());
    }

    #[test]
    fn test_reliable_pending_on_no_resources() {
        let (transport, mut ch) = channel(QosType::Reliable, 100);
        let now = Instant::now();
        transport.fail_next(TransportError::NoResources);

        ch.send_bytes(b"first", now).unwrap();
        assert_eq!(ch.pending_packets(), 1);
        assert_eq!(transport.packet_count(), 0);

        // second send queues behind the first and both drain in order
        ch.send_bytes(b"second", now).unwrap();
        assert_eq!(ch.pending_packets(), 0);
        let packets = transport.take_packets();
        assert_eq!(&packets[0].bytes[..], b"first");
        assert_eq!(&packets[1].bytes[..], b"second");
    }

    #[test]
    fn test_pending_retried_on_check() {
        let (transport, mut ch) = channel(QosType::ReliableSequenced, 100);
        let now = Instant::now();
        transport.fail_next(TransportError::NoResources);
        ch.send_bytes(b"x", now).unwrap();
        assert_eq!(ch.pending_packets(), 1);

        ch.check_internal_buffer(now).unwrap();
        assert_eq!(ch.pending_packets(), 0);
        assert_eq!(transport.packet_count(), 1);
    }

    #[test]
    fn test_pending_limit() {
        let (transport, mut ch) = channel(QosType::Reliable, 100);
        ch.set_max_pending_packets(1).unwrap();
        let now = Instant::now();
        for _ in 0..3 {
            transport.fail_next(TransportError::NoResources);
        }
        ch.send_bytes(b"a", now).unwrap();
        assert_eq!(
            ch.send_bytes(b"b", now),
            Err(ChannelError::PendingLimit { limit: 1 })
        );
        assert!(matches!(
            ch.set_max_pending_packets(513),
            Err(ChannelError::InvalidPendingLimit { .. })
        ));
    }

    #[test]
    fn test_unreliable_no_resources_is_error() {
        let (transport, mut ch) = channel(QosType::Unreliable, 100);
        transport.fail_next(TransportError::NoResources);
        assert_eq!(
            ch.send_bytes(b"x", Instant::now()),
            Err(ChannelError::Transport(TransportError::NoResources))
        );
        assert_eq!(ch.pending_packets(), 0);
    }

    #[test]
    fn test_buffered_per_second_rolls() {
        let (_, mut ch) = channel(QosType::Unreliable, 100);
        ch.set_max_delay(Duration::from_secs(10));
        let start = Instant::now();
        ch.send_bytes(b"a", start).unwrap();
        ch.send_bytes(b"b", start).unwrap();
        ch.check_internal_buffer(start + Duration::from_millis(1500)).unwrap();
        assert_eq!(ch.stats().last_buffered_per_second, 2);
    }

    #[test]
    fn test_clear_drops_everything() {
        let (transport, mut ch) = channel(QosType::Reliable, 100);
        ch.set_max_delay(Duration::from_secs(1));
        ch.send_bytes(b"abc", Instant::now()).unwrap();
        ch.clear();
        ch.flush(Instant::now()).unwrap();
        assert_eq!(transport.packet_count(), 0);
    }

    #[test]
    fn test_record_received() {
        let (_, mut ch) = channel(QosType::Reliable, 100);
        ch.record_received(3, 40);
        ch.record_received(1, 10);
        assert_eq!(ch.stats().msgs_in, 4);
        assert_eq!(ch.stats().bytes_in, 50);
    }
}
