//! Sample windows maintained by the acquisition thread.
//!
//! ```text
//!                    ┌──────────────────┐
//!               ┌───▶│ WaveformWindow   │───▶ waveform snapshot
//! decoded chunk │    │ (last N samples) │
//! ──────────────┤    └──────────────────┘
//!               │    ┌──────────────────┐    ┌──────────┐
//!               └───▶│ AnalysisWindow   │───▶│ Spectral │───▶ spectrum
//!                    │ (M-sample frames)│    │ Engine   │
//!                    └──────────────────┘    └──────────┘
//! ```

pub mod analysis;
pub mod waveform;

pub use analysis::AnalysisWindow;
pub use waveform::WaveformWindow;
