//! pcgscope - waveform and spectrum core for phonocardiogram visualization
//!
//! Decodes linear PCM from a live capture device or a recorded file, keeps a
//! sliding waveform window, and computes magnitude spectra over fixed-size
//! analysis windows. Rendering is left to a [`Renderer`] supplied by the host.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod audio;
pub mod config;
pub mod defaults;
pub mod error;
pub mod pipeline;
pub mod spectrum;
pub mod streaming;

// Sources
#[cfg(feature = "cpal-audio")]
pub use audio::CpalCaptureDevice;
pub use audio::{AudioFormat, CaptureDevice, DeviceStream, MockCaptureDevice, WavFile};

// Pipelines and rendering
pub use pipeline::{
    CaptureConfig, CapturePipeline, CaptureState, ChannelRenderer, DecodedFile, EndReason,
    FilePipeline, RenderEvent, Renderer,
};

// Analysis
pub use spectrum::{SpectralEngine, SpectrumResult, compute_frequencies, compute_magnitude};

// Error handling
pub use error::{PcgError, Result};

// Config
pub use config::Config;

// Acquisition-thread error reporting
pub use pipeline::error::{ErrorReporter, StationError};

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}
