//! Radix-2 decimation-in-time FFT.
//!
//! Two implementations of the same transform:
//! - [`fft_recursive`]: the textbook even/odd split, allocating per level
//! - [`FftPlan`]: iterative and in place, with twiddles and the bit-reversal
//!   permutation computed once per size
//!
//! Both use the forward twiddle factor e^{-2πik/n} and produce identical
//! results up to rounding.

use num_complex::Complex64;
use std::f64::consts::PI;

/// Smallest power of two ≥ `n`. Zero maps to one.
pub fn next_power_of_two(n: usize) -> usize {
    let mut p = 1;
    while p < n {
        p <<= 1;
    }
    p
}

fn twiddle(k: usize, n: usize) -> Complex64 {
    Complex64::from_polar(1.0, -2.0 * PI * k as f64 / n as f64)
}

/// Recursive Cooley–Tukey transform.
///
/// Inputs of zero or one point are returned unchanged. Any other length that
/// is not a power of two is zero-padded to [`next_power_of_two`] first, so the
/// output can be longer than `input`.
pub fn fft_recursive(input: &[Complex64]) -> Vec<Complex64> {
    let n = input.len();
    if n <= 1 {
        return input.to_vec();
    }
    if !n.is_power_of_two() {
        let mut padded = input.to_vec();
        padded.resize(next_power_of_two(n), Complex64::new(0.0, 0.0));
        return fft_recursive(&padded);
    }

    let even: Vec<Complex64> = input.iter().step_by(2).copied().collect();
    let odd: Vec<Complex64> = input.iter().skip(1).step_by(2).copied().collect();
    let even = fft_recursive(&even);
    let odd = fft_recursive(&odd);

    let half = n / 2;
    let mut output = vec![Complex64::new(0.0, 0.0); n];
    for k in 0..half {
        let t = twiddle(k, n) * odd[k];
        output[k] = even[k] + t;
        output[k + half] = even[k] - t;
    }
    output
}

/// Precomputed tables for an in-place transform of one fixed size.
#[derive(Debug, Clone)]
pub struct FftPlan {
    size: usize,
    twiddles: Vec<Complex64>,
    bit_reverse: Vec<usize>,
}

impl FftPlan {
    /// Plan a transform of `next_power_of_two(len)` points.
    pub fn new(len: usize) -> Self {
        let size = next_power_of_two(len);
        let twiddles = (0..size / 2).map(|k| twiddle(k, size)).collect();

        let bits = size.trailing_zeros();
        let bit_reverse = (0..size)
            .map(|i| {
                if bits == 0 {
                    0
                } else {
                    i.reverse_bits() >> (usize::BITS - bits)
                }
            })
            .collect();

        Self {
            size,
            twiddles,
            bit_reverse,
        }
    }

    /// Number of points this plan transforms.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Transform `buffer` in place.
    ///
    /// # Panics
    /// If `buffer.len()` differs from [`FftPlan::size`]. Callers size their
    /// scratch buffer from the plan.
    pub fn process(&self, buffer: &mut [Complex64]) {
        let n = self.size;
        assert_eq!(buffer.len(), n, "buffer length does not match plan size");

        for i in 0..n {
            let j = self.bit_reverse[i];
            if i < j {
                buffer.swap(i, j);
            }
        }

        let mut len = 2;
        while len <= n {
            let half = len / 2;
            let stride = n / len;
            for start in (0..n).step_by(len) {
                for k in 0..half {
                    let t = self.twiddles[k * stride] * buffer[start + k + half];
                    let even = buffer[start + k];
                    buffer[start + k] = even + t;
                    buffer[start + k + half] = even - t;
                }
            }
            len <<= 1;
        }
    }
}
