//! Capture and file pipelines feeding the rendering side.
//!
//! The capture pipeline runs one acquisition thread per session; computed
//! views leave it through a [`Renderer`]. The file pipeline is a stateless
//! one-shot decode.

pub mod capture;
pub mod error;
pub mod file;
pub mod sink;

pub use capture::{CaptureConfig, CapturePipeline, CaptureState, CaptureStats};
pub use error::{ErrorReporter, LogReporter, StationError};
pub use file::{DecodedFile, FilePipeline};
pub use sink::{
    ChannelRenderer, CollectorRenderer, EndReason, RenderEvent, Renderer, SpectrumSnapshot,
    WaveformSnapshot,
};
