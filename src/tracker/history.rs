//! Bounded FIFO of recently accepted fits.

use std::collections::VecDeque;

use crate::tracker::polyfit::LaneFit;

/// Default number of fits averaged into the smoothed curve.
pub const DEFAULT_HISTORY_LEN: usize = 5;

/// Fixed-capacity history; pushing past capacity evicts the oldest fit.
#[derive(Debug, Clone, PartialEq)]
pub struct FitHistory {
    fits: VecDeque<LaneFit>,
    capacity: usize,
}

impl Default for FitHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LEN)
    }
}

impl FitHistory {
    /// `capacity` is clamped to at least 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            fits: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, fit: LaneFit) {
        if self.fits.len() == self.capacity {
            self.fits.pop_front();
        }
        self.fits.push_back(fit);
    }

    /// Coefficient-wise mean of the stored fits.
    pub fn mean(&self) -> Option<LaneFit> {
        LaneFit::mean_of(&self.fits)
    }

    /// Replace the newest entry with a copy of the one before it.
    ///
    /// Returns the restored fit, or `None` with fewer than two entries.
    pub fn rollback_latest(&mut self) -> Option<LaneFit> {
        let n = self.fits.len();
        if n < 2 {
            return None;
        }
        let previous = self.fits[n - 2];
        self.fits[n - 1] = previous;
        Some(previous)
    }

    pub fn latest(&self) -> Option<&LaneFit> {
        self.fits.back()
    }

    pub fn clear(&mut self) {
        self.fits.clear();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.fits.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fits.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &LaneFit> {
        self.fits.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fit(c: f64) -> LaneFit {
        LaneFit::new(0.0, 0.0, c)
    }

    #[test]
    fn test_capacity_and_eviction() {
        let mut history = FitHistory::default();
        for i in 1..=6 {
            history.push(fit(i as f64));
            assert!(history.len() <= 5);
        }
        assert_eq!(history.len(), 5);

        let cs: Vec<f64> = history.iter().map(|f| f.c).collect();
        assert_eq!(cs, vec![2.0, 3.0, 4.0, 5.0, 6.0]);

        // The first fit no longer contributes to the mean
        assert_eq!(history.mean().unwrap().c, 4.0);
    }

    #[test]
    fn test_mean_empty() {
        assert!(FitHistory::default().mean().is_none());
    }

    #[test]
    fn test_rollback_latest() {
        let mut history = FitHistory::default();
        history.push(fit(10.0));
        assert!(history.rollback_latest().is_none());

        history.push(fit(30.0));
        assert_eq!(history.rollback_latest(), Some(fit(10.0)));
        assert_eq!(history.len(), 2);
        assert_eq!(history.mean().unwrap().c, 10.0);
    }

    #[test]
    fn test_zero_capacity_clamped() {
        let mut history = FitHistory::new(0);
        history.push(fit(1.0));
        history.push(fit(2.0));
        assert_eq!(history.capacity(), 1);
        assert_eq!(history.latest(), Some(&fit(2.0)));
    }
}
