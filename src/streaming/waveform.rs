//! Sliding window over the most recent live samples.

use std::collections::VecDeque;

/// Bounded FIFO of the most recent samples, oldest first.
#[derive(Debug, Clone)]
pub struct WaveformWindow {
    samples: VecDeque<f64>,
    capacity: usize,
}

impl WaveformWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append `chunk`, evicting the oldest samples beyond capacity.
    pub fn push(&mut self, chunk: &[f64]) {
        if chunk.len() >= self.capacity {
            self.samples.clear();
            self.samples
                .extend(&chunk[chunk.len() - self.capacity..]);
            return;
        }

        self.samples.extend(chunk);
        let excess = self.samples.len().saturating_sub(self.capacity);
        self.samples.drain(..excess);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Owned copy of the window contents in arrival order.
    pub fn snapshot(&self) -> Vec<f64> {
        self.samples.iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_up_to_capacity() {
        let mut window = WaveformWindow::new(4);
        window.push(&[1.0, 2.0]);
        assert_eq!(window.snapshot(), vec![1.0, 2.0]);
        window.push(&[3.0, 4.0]);
        assert_eq!(window.snapshot(), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn evicts_oldest_first() {
        let mut window = WaveformWindow::new(4);
        window.push(&[1.0, 2.0, 3.0]);
        window.push(&[4.0, 5.0]);
        assert_eq!(window.snapshot(), vec![2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn oversized_chunk_keeps_its_tail() {
        let mut window = WaveformWindow::new(3);
        window.push(&[0.5]);
        window.push(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(window.snapshot(), vec![3.0, 4.0, 5.0]);
    }

    #[test]
    fn never_exceeds_capacity_and_keeps_latest_in_order() {
        let capacity = 100;
        let mut window = WaveformWindow::new(capacity);
        let mut next = 0.0;
        let mut all = Vec::new();

        for size in [1, 17, 99, 100, 101, 3, 250, 0, 64] {
            let chunk: Vec<f64> = (0..size)
                .map(|_| {
                    next += 1.0;
                    next
                })
                .collect();
            all.extend_from_slice(&chunk);
            window.push(&chunk);

            assert!(window.len() <= capacity);
            let start = all.len().saturating_sub(capacity);
            assert_eq!(window.snapshot(), all[start..].to_vec());
        }
    }

    #[test]
    fn clear_empties_window() {
        let mut window = WaveformWindow::new(8);
        window.push(&[1.0; 5]);
        window.clear();
        assert!(window.is_empty());
        assert_eq!(window.capacity(), 8);
    }

    #[test]
    fn zero_capacity_stays_empty() {
        let mut window = WaveformWindow::new(0);
        window.push(&[1.0, 2.0]);
        assert!(window.is_empty());
    }
}
