//! WAV file source for the file pipeline.

use crate::audio::format::{AudioFormat, ByteOrder, Encoding};
use crate::error::{PcgError, Result};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// An opened WAV file positioned at the start of its PCM payload.
///
/// The header is parsed eagerly; the payload is read on [`WavFile::read_all`].
pub struct WavFile {
    format: AudioFormat,
    declared_frames: usize,
    reader: Box<dyn Read + Send>,
}

impl WavFile {
    /// Open a WAV file from disk.
    ///
    /// # Errors
    /// - `PcgError::Io` if the file cannot be opened
    /// - `PcgError::Wav` / `PcgError::UnsupportedFormat` if the header is invalid
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Parse the header from any reader (for testing/flexibility).
    pub fn from_reader<R: Read + Send + 'static>(reader: R) -> Result<Self> {
        let wav_reader = hound::WavReader::new(reader).map_err(map_hound_error)?;

        let spec = wav_reader.spec();
        // WAV stores 8-bit samples as unsigned, wider integers as signed.
        let encoding = match spec.sample_format {
            hound::SampleFormat::Float => Encoding::Float,
            hound::SampleFormat::Int if spec.bits_per_sample == 8 => Encoding::Unsigned,
            hound::SampleFormat::Int => Encoding::Signed,
        };
        let format = AudioFormat {
            sample_rate: spec.sample_rate,
            bits_per_sample: spec.bits_per_sample,
            channels: spec.channels,
            encoding,
            byte_order: ByteOrder::LittleEndian,
        };
        let declared_frames = wav_reader.duration() as usize;

        Ok(Self {
            format,
            declared_frames,
            reader: Box::new(wav_reader.into_inner()),
        })
    }

    /// Format declared by the header.
    pub fn format(&self) -> AudioFormat {
        self.format
    }

    /// Frames declared by the header's data chunk length.
    pub fn declared_frames(&self) -> usize {
        self.declared_frames
    }

    /// Bytes the payload should contain according to the header.
    pub fn declared_bytes(&self) -> usize {
        self.declared_frames.saturating_mul(self.format.frame_size())
    }

    /// Read the whole PCM payload.
    ///
    /// # Errors
    /// Returns `PcgError::TruncatedInput` if the file ends before the declared
    /// payload length. No partial payload is returned.
    pub fn read_all(self) -> Result<Vec<u8>> {
        let expected_bytes = self.declared_bytes();
        let mut bytes = Vec::with_capacity(expected_bytes);
        self.reader
            .take(expected_bytes as u64)
            .read_to_end(&mut bytes)?;

        if bytes.len() < expected_bytes {
            return Err(PcgError::TruncatedInput {
                expected_bytes,
                actual_bytes: bytes.len(),
            });
        }
        Ok(bytes)
    }
}

fn map_hound_error(error: hound::Error) -> PcgError {
    match error {
        hound::Error::IoError(e) => PcgError::Io(e),
        hound::Error::Unsupported => PcgError::unsupported("WAV feature not supported"),
        other => PcgError::Wav {
            message: format!("Failed to parse WAV file: {}", other),
        },
    }
}
