//! Magnitude spectra and their frequency axis.

use crate::defaults;
use crate::spectrum::fft::{FftPlan, fft_recursive, next_power_of_two};
use num_complex::Complex64;

/// Paired frequency axis and magnitudes for one analysis window.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpectrumResult {
    /// Bin centre frequencies in Hz, starting at 0.
    pub frequencies: Vec<f64>,
    /// Magnitude of each bin (unnormalized |X[k]|).
    pub magnitudes: Vec<f64>,
}

impl SpectrumResult {
    /// Build a result from magnitudes, deriving the axis for `sample_rate`.
    pub fn from_magnitudes(magnitudes: Vec<f64>, sample_rate: u32) -> Self {
        let frequencies = compute_frequencies(magnitudes.len(), sample_rate);
        Self {
            frequencies,
            magnitudes,
        }
    }

    pub fn len(&self) -> usize {
        self.magnitudes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.magnitudes.is_empty()
    }

    /// Spacing between adjacent bins in Hz, or 0 with fewer than two bins.
    pub fn bin_width(&self) -> f64 {
        match self.frequencies.as_slice() {
            [first, second, ..] => second - first,
            _ => 0.0,
        }
    }

    /// `(frequency, magnitude)` of the strongest bin. Ties keep the lowest bin.
    pub fn peak(&self) -> Option<(f64, f64)> {
        self.frequencies
            .iter()
            .zip(&self.magnitudes)
            .fold(None, |best: Option<(f64, f64)>, (&f, &m)| match best {
                Some((_, best_m)) if best_m >= m => best,
                _ => Some((f, m)),
            })
    }

    /// Keep only bins at or below `max_hz`.
    pub fn truncate_to(mut self, max_hz: f64) -> Self {
        let keep = self.frequencies.partition_point(|&f| f <= max_hz);
        self.frequencies.truncate(keep);
        self.magnitudes.truncate(keep);
        self
    }

    /// Keep only the band shown by the spectrum view.
    pub fn display_band(self) -> Self {
        self.truncate_to(defaults::SPECTRUM_DISPLAY_MAX_HZ)
    }
}

/// Magnitude spectrum of `samples` using the recursive transform.
///
/// Samples are zero-padded to the next power of two P; the first P/2 bins
/// are returned. Empty input pads to P = 1 and yields no bins.
pub fn compute_magnitude(samples: &[f64]) -> Vec<f64> {
    let padded = next_power_of_two(samples.len());
    let mut input: Vec<Complex64> = samples.iter().map(|&s| Complex64::new(s, 0.0)).collect();
    input.resize(padded, Complex64::new(0.0, 0.0));

    let output = fft_recursive(&input);
    output[..padded / 2].iter().map(|c| c.norm()).collect()
}

/// Frequency of each of `bin_count` bins: `i * sample_rate / (2 * bin_count)`.
pub fn compute_frequencies(bin_count: usize, sample_rate: u32) -> Vec<f64> {
    if bin_count == 0 {
        return Vec::new();
    }
    let step = sample_rate as f64 / (2.0 * bin_count as f64);
    (0..bin_count).map(|i| i as f64 * step).collect()
}

/// Reusable spectral analyzer.
///
/// Keeps the plan and scratch buffer of the last transform size so a capture
/// session with a fixed window does not reallocate per window.
#[derive(Debug, Default)]
pub struct SpectralEngine {
    plan: Option<FftPlan>,
    scratch: Vec<Complex64>,
}

impl SpectralEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepare tables for windows of `len` samples ahead of time.
    pub fn with_window(len: usize) -> Self {
        let mut engine = Self::new();
        engine.ensure_plan(len);
        engine
    }

    fn ensure_plan(&mut self, len: usize) -> &FftPlan {
        let size = next_power_of_two(len);
        if self.plan.as_ref().map(FftPlan::size) != Some(size) {
            self.plan = Some(FftPlan::new(size));
            self.scratch = Vec::with_capacity(size);
        }
        self.plan.get_or_insert_with(|| FftPlan::new(size))
    }

    /// Same contract as [`compute_magnitude`], using the cached plan.
    pub fn magnitudes(&mut self, samples: &[f64]) -> Vec<f64> {
        let size = self.ensure_plan(samples.len()).size();

        self.scratch.clear();
        self.scratch
            .extend(samples.iter().map(|&s| Complex64::new(s, 0.0)));
        self.scratch.resize(size, Complex64::new(0.0, 0.0));

        if let Some(plan) = &self.plan {
            plan.process(&mut self.scratch);
        }
        self.scratch[..size / 2].iter().map(|c| c.norm()).collect()
    }

    /// Magnitudes plus frequency axis for a window sampled at `sample_rate`.
    pub fn analyze(&mut self, samples: &[f64], sample_rate: u32) -> SpectrumResult {
        SpectrumResult::from_magnitudes(self.magnitudes(samples), sample_rate)
    }
}
