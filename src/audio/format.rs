//! Linear PCM format description shared by capture devices and file sources.

use crate::defaults;
use std::fmt;

/// Sample encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// Two's complement integers.
    Signed,
    /// Offset binary integers (silence is the midpoint).
    Unsigned,
    /// IEEE float samples. Recognized so it can be rejected.
    Float,
}

/// Byte order of multi-byte samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    LittleEndian,
    BigEndian,
}

/// Format of a PCM byte stream.
///
/// Immutable once a capture session has started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    pub sample_rate: u32,
    pub bits_per_sample: u16,
    pub channels: u16,
    pub encoding: Encoding,
    pub byte_order: ByteOrder,
}

impl AudioFormat {
    /// Mono, signed 16-bit little-endian at the given rate.
    pub fn mono_i16(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            bits_per_sample: 16,
            channels: 1,
            encoding: Encoding::Signed,
            byte_order: ByteOrder::LittleEndian,
        }
    }

    /// Bytes occupied by a single channel's sample.
    pub fn bytes_per_sample(&self) -> usize {
        (self.bits_per_sample as usize).div_ceil(8)
    }

    /// Bytes occupied by one frame (all channels of one instant).
    pub fn frame_size(&self) -> usize {
        self.bytes_per_sample() * self.channels.max(1) as usize
    }

    pub fn is_big_endian(&self) -> bool {
        self.byte_order == ByteOrder::BigEndian
    }
}

impl Default for AudioFormat {
    fn default() -> Self {
        Self::mono_i16(defaults::SAMPLE_RATE)
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let encoding = match self.encoding {
            Encoding::Signed => "signed",
            Encoding::Unsigned => "unsigned",
            Encoding::Float => "float",
        };
        let order = match self.byte_order {
            ByteOrder::LittleEndian => "LE",
            ByteOrder::BigEndian => "BE",
        };
        write!(
            f,
            "{}Hz/{}-bit {} {}/{}ch",
            self.sample_rate, self.bits_per_sample, encoding, order, self.channels
        )
    }
}
