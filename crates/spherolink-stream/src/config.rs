use bytes::{BufMut, Bytes, BytesMut};
use tracing::debug;

use crate::catalog::{Group, Mask1, Mask2, MaskBits};
use crate::error::{Result, StreamError};

/// Highest sample rate the firmware supports; rates are divisors of it.
pub const MAX_SAMPLE_RATE_HZ: u16 = 400;

/// Size of the set-data-stream command payload.
pub const COMMAND_PAYLOAD_SIZE: usize = 13;

/// Which sensor groups to stream and how to present them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamConfig {
    pub mask1: Mask1,
    pub mask2: Mask2,
    /// Frames per async packet.
    pub frame_count: u16,
    /// Scale raw integers into physical units.
    pub convert: bool,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            mask1: Mask1::empty(),
            mask2: Mask2::empty(),
            frame_count: 1,
            convert: true,
        }
    }
}

impl StreamConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable every bit of `group`.
    pub fn with(mut self, group: Group) -> Self {
        self.set(group, true);
        self
    }

    pub fn with_frame_count(mut self, frame_count: u16) -> Self {
        self.frame_count = frame_count;
        self
    }

    pub fn with_convert(mut self, convert: bool) -> Self {
        self.convert = convert;
        self
    }

    /// Enable or disable every bit of `group`.
    pub fn set(&mut self, group: Group, enabled: bool) {
        match group.bits() {
            MaskBits::First(bits) => self.mask1.set(bits, enabled),
            MaskBits::Second(bits) => self.mask2.set(bits, enabled),
        }
    }

    /// Whether all bits of `group` are set.
    pub fn is_active(&self, group: Group) -> bool {
        match group.bits() {
            MaskBits::First(bits) => self.mask1.contains(bits),
            MaskBits::Second(bits) => self.mask2.contains(bits),
        }
    }

    /// Active groups in emission order. Partially set groups are ignored.
    pub fn active_groups(&self) -> Vec<Group> {
        Group::ALL
            .into_iter()
            .filter(|group| self.is_active(*group))
            .collect()
    }

    /// 16-bit values per frame.
    pub fn value_count(&self) -> usize {
        self.active_groups().iter().map(|group| group.arity()).sum()
    }

    /// Bytes per frame.
    pub fn frame_size(&self) -> usize {
        self.value_count() * 2
    }

    /// Masks holding only the bits of active groups.
    ///
    /// Partially set groups and bits outside the catalog are cleared, so the
    /// device never streams values the decoder would not account for.
    pub fn wire_masks(&self) -> (Mask1, Mask2) {
        self.active_groups().into_iter().fold(
            (Mask1::empty(), Mask2::empty()),
            |(mask1, mask2), group| match group.bits() {
                MaskBits::First(bits) => (mask1 | bits, mask2),
                MaskBits::Second(bits) => (mask1, mask2 | bits),
            },
        )
    }

    /// Bytes expected in one async stream packet.
    pub fn packet_size(&self) -> usize {
        self.frame_size() * self.frame_count as usize
    }

    /// Payload of the set-data-stream command.
    ///
    /// ```text
    /// divisor u16 | frames u16 | mask1 u32 | packet_count u8 | mask2 u32
    /// ```
    /// All fields big-endian; `packet_count` 0 streams until disabled. The
    /// masks are the [`wire_masks`](Self::wire_masks).
    pub fn command_payload(&self, sample_rate_hz: u16, packet_count: u8) -> Result<Bytes> {
        if sample_rate_hz == 0 || sample_rate_hz > MAX_SAMPLE_RATE_HZ {
            return Err(StreamError::InvalidSampleRate(sample_rate_hz));
        }
        if self.frame_count == 0 {
            return Err(StreamError::ZeroFrames);
        }

        let (mask1, mask2) = self.wire_masks();
        if mask1 != self.mask1 || mask2 != self.mask2 {
            debug!(
                requested1 = self.mask1.bits(),
                requested2 = self.mask2.bits(),
                sent1 = mask1.bits(),
                sent2 = mask2.bits(),
                "clearing mask bits outside complete groups"
            );
        }

        let mut buf = BytesMut::with_capacity(COMMAND_PAYLOAD_SIZE);
        buf.put_u16(MAX_SAMPLE_RATE_HZ / sample_rate_hz);
        buf.put_u16(self.frame_count);
        buf.put_u32(mask1.bits());
        buf.put_u8(packet_count);
        buf.put_u32(mask2.bits());
        Ok(buf.freeze())
    }
}
