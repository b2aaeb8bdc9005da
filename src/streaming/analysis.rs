//! Fixed-size accumulation window feeding the spectral engine.

/// Accumulates streamed samples into non-overlapping windows of `size`.
///
/// Invariant: `0 <= fill_index <= size`, and `fill_index < size` between calls.
#[derive(Debug, Clone)]
pub struct AnalysisWindow {
    buffer: Vec<f64>,
    fill_index: usize,
    completed: u64,
}

impl AnalysisWindow {
    pub fn new(size: usize) -> Self {
        Self {
            buffer: vec![0.0; size],
            fill_index: 0,
            completed: 0,
        }
    }

    /// Copy `samples` in, calling `on_full` once for every window completed.
    ///
    /// Chunks of any size are accepted; a chunk spanning several windows
    /// completes each of them in order and the remainder starts the next one.
    /// Returns the number of windows completed by this call.
    pub fn push<F>(&mut self, mut samples: &[f64], mut on_full: F) -> usize
    where
        F: FnMut(&[f64]),
    {
        let size = self.buffer.len();
        if size == 0 {
            return 0;
        }

        let mut completed = 0;
        while !samples.is_empty() {
            let take = (size - self.fill_index).min(samples.len());
            self.buffer[self.fill_index..self.fill_index + take].copy_from_slice(&samples[..take]);
            self.fill_index += take;
            samples = &samples[take..];

            if self.fill_index == size {
                on_full(&self.buffer);
                self.fill_index = 0;
                completed += 1;
            }
        }

        self.completed += completed as u64;
        completed
    }

    /// Samples accumulated towards the next window.
    pub fn fill_index(&self) -> usize {
        self.fill_index
    }

    pub fn size(&self) -> usize {
        self.buffer.len()
    }

    /// Windows completed since creation or the last reset.
    pub fn windows_completed(&self) -> u64 {
        self.completed
    }

    /// Discard any partial window.
    pub fn reset(&mut self) {
        self.fill_index = 0;
        self.completed = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counting(total: usize) -> Vec<f64> {
        (0..total).map(|i| i as f64).collect()
    }

    #[test]
    fn one_window_per_size_samples_for_irregular_chunks() {
        const M: usize = 2048;
        for chunk_size in [1, 17, 2048, 5000] {
            let mut window = AnalysisWindow::new(M);
            let input = counting(M * 5 + 123);
            let mut published = Vec::new();

            for chunk in input.chunks(chunk_size) {
                window.push(chunk, |full| published.push(full.to_vec()));
            }

            assert_eq!(published.len(), input.len() / M, "chunk size {}", chunk_size);
            assert_eq!(window.fill_index(), input.len() % M);
            assert_eq!(window.windows_completed(), published.len() as u64);
            for (i, full) in published.iter().enumerate() {
                assert_eq!(full.as_slice(), &input[i * M..(i + 1) * M]);
            }
        }
    }

    #[test]
    fn exact_fill_resets_index() {
        let mut window = AnalysisWindow::new(4);
        let completed = window.push(&[1.0, 2.0, 3.0, 4.0], |_| {});
        assert_eq!(completed, 1);
        assert_eq!(window.fill_index(), 0);
    }

    #[test]
    fn remainder_starts_next_window() {
        let mut window = AnalysisWindow::new(4);
        let mut published = Vec::new();

        window.push(&[1.0, 2.0, 3.0], |full| published.push(full.to_vec()));
        assert!(published.is_empty());
        assert_eq!(window.fill_index(), 3);

        window.push(&[4.0, 5.0, 6.0], |full| published.push(full.to_vec()));
        assert_eq!(published, vec![vec![1.0, 2.0, 3.0, 4.0]]);
        assert_eq!(window.fill_index(), 2);

        window.push(&[7.0, 8.0], |full| published.push(full.to_vec()));
        assert_eq!(published[1], vec![5.0, 6.0, 7.0, 8.0]);
    }

    #[test]
    fn reset_discards_partial_window() {
        let mut window = AnalysisWindow::new(4);
        window.push(&[1.0, 2.0, 3.0, 4.0, 5.0], |_| {});
        window.reset();
        assert_eq!(window.fill_index(), 0);
        assert_eq!(window.windows_completed(), 0);

        let mut published = Vec::new();
        window.push(&[6.0, 7.0, 8.0, 9.0], |full| published.push(full.to_vec()));
        assert_eq!(published, vec![vec![6.0, 7.0, 8.0, 9.0]]);
    }

    #[test]
    fn empty_chunk_is_noop() {
        let mut window = AnalysisWindow::new(4);
        assert_eq!(window.push(&[], |_| panic!("should not publish")), 0);
        assert_eq!(window.fill_index(), 0);
    }

    #[test]
    fn zero_size_never_publishes() {
        let mut window = AnalysisWindow::new(0);
        assert_eq!(window.push(&[1.0, 2.0], |_| panic!("should not publish")), 0);
    }
}
