//! Per-channel traffic counters.

use std::ops::{Add, AddAssign};

/// Counters kept by each channel. Summing channels gives connection totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelStats {
    pub msgs_out: u64,
    pub buffered_msgs_out: u64,
    pub bytes_out: u64,
    pub msgs_in: u64,
    pub bytes_in: u64,
    /// Messages that waited for a coalescing flush during the last full second.
    pub last_buffered_per_second: u64,
}

impl Add for ChannelStats {
    type Output = ChannelStats;

    fn add(self, other: ChannelStats) -> ChannelStats {
        ChannelStats {
            msgs_out: self.msgs_out + other.msgs_out,
            buffered_msgs_out: self.buffered_msgs_out + other.buffered_msgs_out,
            bytes_out: self.bytes_out + other.bytes_out,
            msgs_in: self.msgs_in + other.msgs_in,
            bytes_in: self.bytes_in + other.bytes_in,
            last_buffered_per_second: self.last_buffered_per_second
                + other.last_buffered_per_second,
        }
    }
}

impl AddAssign for ChannelStats {
    fn add_assign(&mut self, other: ChannelStats) {
        *self = *self + other;
    }
}

impl std::iter::Sum for ChannelStats {
    fn sum<I: Iterator<Item = ChannelStats>>(iter: I) -> Self {
        iter.fold(ChannelStats::default(), Add::add)
    }
}
