//! PCM byte buffer to normalized sample conversion.
//!
//! Both entry points are pure: they borrow the input, allocate the output and
//! touch no shared state, so they can run concurrently on disjoint buffers.

use crate::audio::format::{AudioFormat, ByteOrder, Encoding};
use crate::error::{PcgError, Result};

const I16_SCALE: f64 = 32768.0;
const I8_SCALE: f64 = 128.0;

/// Check that `format` is one [`decode`] can handle.
///
/// # Errors
/// Returns `PcgError::UnsupportedFormat` for float encodings and for bit
/// depths other than 8 or 16.
pub fn ensure_supported(format: &AudioFormat) -> Result<()> {
    if format.encoding == Encoding::Float {
        return Err(PcgError::unsupported(format!(
            "float encoding is not linear PCM ({})",
            format
        )));
    }
    match format.bits_per_sample {
        8 | 16 => Ok(()),
        bits => Err(PcgError::unsupported(format!(
            "{}-bit samples (only 8 and 16 are supported)",
            bits
        ))),
    }
}

/// Decode the first `byte_count` bytes of `bytes` into samples in [-1.0, 1.0].
///
/// One sample is produced per complete frame; only the first channel of each
/// frame is read. A trailing partial frame is ignored. `byte_count` larger
/// than the buffer is clamped to the buffer length.
///
/// # Errors
/// Returns `PcgError::UnsupportedFormat` when [`ensure_supported`] rejects the
/// format. No partial output is produced in that case.
pub fn decode(bytes: &[u8], byte_count: usize, format: &AudioFormat) -> Result<Vec<f64>> {
    ensure_supported(format)?;

    let filled = &bytes[..byte_count.min(bytes.len())];
    let frames = filled.chunks_exact(format.frame_size());

    let samples = if format.bits_per_sample == 16 {
        frames
            .map(|frame| {
                let pair = [frame[0], frame[1]];
                let value = match format.byte_order {
                    ByteOrder::LittleEndian => i16::from_le_bytes(pair),
                    ByteOrder::BigEndian => i16::from_be_bytes(pair),
                };
                value as f64 / I16_SCALE
            })
            .collect()
    } else if format.encoding == Encoding::Signed {
        frames.map(|frame| frame[0] as i8 as f64 / I8_SCALE).collect()
    } else {
        frames
            .map(|frame| (frame[0] as f64 - 128.0) / I8_SCALE)
            .collect()
    };
    Ok(samples)
}

/// Decode a complete recording whose header declares `declared_frames` frames.
///
/// Stricter than [`decode`]: the encoding must be linear signed PCM, and the
/// payload must hold at least `declared_frames` whole frames. Bytes beyond the
/// declared length are ignored.
///
/// # Errors
/// - `PcgError::UnsupportedFormat` if the encoding is not signed PCM or the
///   bit depth is unsupported
/// - `PcgError::TruncatedInput` if the payload is shorter than declared
pub fn decode_full(bytes: &[u8], declared_frames: usize, format: &AudioFormat) -> Result<Vec<f64>> {
    if format.encoding != Encoding::Signed {
        return Err(PcgError::unsupported(format!(
            "file encoding must be signed linear PCM, got {}",
            format
        )));
    }
    ensure_supported(format)?;

    let expected_bytes = declared_frames.saturating_mul(format.frame_size());
    if bytes.len() < expected_bytes {
        return Err(PcgError::TruncatedInput {
            expected_bytes,
            actual_bytes: bytes.len(),
        });
    }

    decode(bytes, expected_bytes, format)
}
