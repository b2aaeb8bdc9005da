//! One-shot decoding of recorded files for static plotting.

use crate::audio::decoder::decode_full;
use crate::audio::format::AudioFormat;
use crate::audio::wav::WavFile;
use crate::error::Result;
use crate::spectrum::{SpectralEngine, SpectrumResult};
use std::path::Path;

/// Every sample of a recording, decoded in one pass.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedFile {
    pub format: AudioFormat,
    pub samples: Vec<f64>,
}

impl DecodedFile {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Length of the recording in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.format.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.format.sample_rate as f64
    }

    /// Spectrum of the whole recording, zero-padded to a power of two.
    pub fn spectrum(&self) -> SpectrumResult {
        SpectralEngine::new().analyze(&self.samples, self.format.sample_rate)
    }
}

/// Stateless file decoder. Safe to use while a capture session runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilePipeline;

impl FilePipeline {
    pub fn new() -> Self {
        Self
    }

    /// Open and decode the recording at `path`.
    ///
    /// # Errors
    /// - `PcgError::Io` if the file cannot be read
    /// - `PcgError::UnsupportedFormat` unless it holds signed linear PCM
    /// - `PcgError::TruncatedInput` if the payload is shorter than declared
    pub fn load(&self, path: &Path) -> Result<DecodedFile> {
        let file = WavFile::open(path)?;
        let decoded = self.decode(file)?;
        tracing::info!(
            "[File] Decoded {} ({} samples, {:.2}s at {})",
            path.display(),
            decoded.len(),
            decoded.duration_secs(),
            decoded.format
        );
        Ok(decoded)
    }

    /// Decode an already opened file.
    pub fn decode(&self, file: WavFile) -> Result<DecodedFile> {
        let format = file.format();
        let declared_frames = file.declared_frames();
        let bytes = file.read_all()?;
        let samples = decode_full(&bytes, declared_frames, &format)?;
        Ok(DecodedFile { format, samples })
    }
}
