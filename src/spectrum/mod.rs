//! Spectral analysis: zero-padded radix-2 FFT and magnitude spectra.

pub mod analyzer;
pub mod fft;

pub use analyzer::{SpectralEngine, SpectrumResult, compute_frequencies, compute_magnitude};
pub use fft::{FftPlan, fft_recursive, next_power_of_two};
