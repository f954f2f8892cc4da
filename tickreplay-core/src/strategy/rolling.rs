//! Bounded FIFO window of recent prices with mean / population stddev.

use std::collections::VecDeque;

/// Strict FIFO window holding at most `capacity` values.
///
/// The oldest value is evicted exactly when a push would exceed capacity.
/// Statistics are computed on values shifted by the oldest held value, so a
/// flat window yields exactly its price as the mean and zero deviation.
#[derive(Debug, Clone, PartialEq)]
pub struct RollingWindow {
    capacity: usize,
    values: VecDeque<f64>,
}

impl RollingWindow {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity >= 1, "window capacity must be >= 1");
        Self {
            capacity,
            values: VecDeque::with_capacity(capacity),
        }
    }

    /// Append a value, returning the evicted oldest value if the window was full.
    pub fn push(&mut self, value: f64) -> Option<f64> {
        let evicted = if self.values.len() == self.capacity {
            self.values.pop_front()
        } else {
            None
        };
        self.values.push_back(value);
        evicted
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.values.len() == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().copied()
    }

    fn shifted_mean(&self) -> Option<(f64, f64)> {
        let shift = *self.values.front()?;
        let n = self.values.len() as f64;
        let mean_offset = self.values.iter().map(|v| v - shift).sum::<f64>() / n;
        Some((shift, mean_offset))
    }

    pub fn mean(&self) -> Option<f64> {
        self.shifted_mean().map(|(shift, offset)| shift + offset)
    }

    /// Population standard deviation (divide by N).
    pub fn std_dev(&self) -> Option<f64> {
        let (shift, offset) = self.shifted_mean()?;
        let variance = self
            .values
            .iter()
            .map(|v| {
                let diff = (v - shift) - offset;
                diff * diff
            })
            .sum::<f64>()
            / self.values.len() as f64;
        Some(variance.sqrt())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_oldest_only_when_full() {
        let mut w = RollingWindow::new(3);
        assert_eq!(w.push(1.0), None);
        assert_eq!(w.push(2.0), None);
        assert_eq!(w.push(3.0), None);
        assert!(w.is_full());
        assert_eq!(w.push(4.0), Some(1.0));
        assert_eq!(w.values().collect::<Vec<_>>(), vec![2.0, 3.0, 4.0]);
        assert_eq!(w.len(), 3);
    }

    #[test]
    fn mean_and_population_std() {
        let mut w = RollingWindow::new(4);
        for v in [2.0, 4.0, 4.0, 6.0] {
            w.push(v);
        }
        assert_eq!(w.mean(), Some(4.0));
        // population variance = (4 + 0 + 0 + 4) / 4 = 2
        assert!((w.std_dev().unwrap() - 2.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn flat_window_has_zero_std() {
        let mut w = RollingWindow::new(3);
        for v in [1.3, 0.7, 1.3, 1.3, 1.3] {
            w.push(v);
        }
        assert_eq!(w.std_dev(), Some(0.0));
        assert_eq!(w.mean(), Some(1.3));
    }

    #[test]
    fn empty_window_has_no_stats() {
        let w = RollingWindow::new(5);
        assert!(w.mean().is_none());
        assert!(w.std_dev().is_none());
    }
}
