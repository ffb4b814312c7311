//! Rolling Window Statistics
//!
//! Explicit sliding buffer over a partition's chronological sequence.
//! Mirrors a trailing window of size N with a minimum period of 1: the
//! window yields statistics from the first pushed value onward.

use std::collections::VecDeque;

/// Sliding buffer of the most recent N values within one partition
#[derive(Debug, Clone)]
pub struct RollingWindow {
    buf: VecDeque<f64>,
    capacity: usize,
}

impl RollingWindow {
    /// Create a window holding up to `capacity` trailing values
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "window capacity must be positive");
        Self {
            buf: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Push the next chronological value, evicting the oldest when full
    pub fn push(&mut self, value: f64) {
        if self.buf.len() == self.capacity {
            self.buf.pop_front();
        }
        self.buf.push_back(value);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Mean of the current window, 0 when empty
    pub fn mean(&self) -> f64 {
        if self.buf.is_empty() {
            return 0.0;
        }
        self.buf.iter().sum::<f64>() / self.buf.len() as f64
    }

    /// Minimum of the current window, 0 when empty
    pub fn min(&self) -> f64 {
        if self.buf.is_empty() {
            0.0
        } else {
            self.buf.iter().cloned().fold(f64::INFINITY, f64::min)
        }
    }

    /// Maximum of the current window, 0 when empty
    pub fn max(&self) -> f64 {
        if self.buf.is_empty() {
            0.0
        } else {
            self.buf.iter().cloned().fold(f64::NEG_INFINITY, f64::max)
        }
    }

    /// Sample standard deviation (n-1 denominator) of the current window.
    /// A window of fewer than two values has std 0, not NaN.
    pub fn std(&self) -> f64 {
        let n = self.buf.len();
        if n < 2 {
            return 0.0;
        }
        let mean = self.mean();
        let sum_sq: f64 = self.buf.iter().map(|v| (v - mean) * (v - mean)).sum();
        (sum_sq / (n as f64 - 1.0)).sqrt()
    }
}
