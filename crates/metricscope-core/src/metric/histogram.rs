use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Mutex;

use super::snapshot::{SlidingWindow, Snapshot, DEFAULT_RESERVOIR_SIZE};

/// Distribution of recorded values.
///
/// `count`, `sum`, `min` and `max` cover every update since creation; the
/// snapshot only covers the reservoir window. `sum` saturates at the `i64`
/// bounds instead of wrapping.
#[derive(Debug)]
pub struct Histogram {
    count: AtomicU64,
    sum: AtomicI64,
    min: AtomicI64,
    max: AtomicI64,
    window: Mutex<SlidingWindow>,
}

impl Default for Histogram {
    fn default() -> Self {
        Self::with_reservoir(DEFAULT_RESERVOIR_SIZE)
    }
}

impl Histogram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Histogram whose reservoir holds the last `size` values.
    pub fn with_reservoir(size: usize) -> Self {
        Self {
            count: AtomicU64::new(0),
            sum: AtomicI64::new(0),
            min: AtomicI64::new(i64::MAX),
            max: AtomicI64::new(i64::MIN),
            window: Mutex::new(SlidingWindow::new(size)),
        }
    }

    pub fn update(&self, value: i64) {
        // Extremes before count so `min()`/`max()` never see a counted but
        // unset extreme; count before the window so a snapshot never holds
        // more values than `count()` reports.
        self.min.fetch_min(value, Ordering::Relaxed);
        self.max.fetch_max(value, Ordering::Relaxed);
        let _ = self
            .sum
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |s| Some(s.saturating_add(value)));
        self.count.fetch_add(1, Ordering::Relaxed);
        match self.window.lock() {
            Ok(mut w) => w.record(value),
            Err(poisoned) => poisoned.into_inner().record(value),
        }
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn sum(&self) -> i64 {
        self.sum.load(Ordering::Relaxed)
    }

    /// Smallest value ever recorded, `None` before the first update.
    pub fn min(&self) -> Option<i64> {
        match self.min.load(Ordering::Relaxed) {
            i64::MAX if self.count() == 0 => None,
            v => Some(v),
        }
    }

    /// Largest value ever recorded, `None` before the first update.
    pub fn max(&self) -> Option<i64> {
        match self.max.load(Ordering::Relaxed) {
            i64::MIN if self.count() == 0 => None,
            v => Some(v),
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        match self.window.lock() {
            Ok(w) => w.snapshot(),
            Err(poisoned) => poisoned.into_inner().snapshot(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn totals_cover_values_evicted_from_window() {
        let h = Histogram::with_reservoir(2);
        for v in [5, -3, 10, 7] {
            h.update(v);
        }
        assert_eq!(h.count(), 4);
        assert_eq!(h.sum(), 19);
        assert_eq!(h.min(), Some(-3));
        assert_eq!(h.max(), Some(10));
        assert_eq!(h.snapshot().values(), &[7, 10]);
    }

    #[test]
    fn empty_histogram_has_no_extremes() {
        let h = Histogram::new();
        assert_eq!(h.min(), None);
        assert_eq!(h.max(), None);
        assert_eq!(h.snapshot().size(), 0);
        assert_eq!(h.snapshot().min(), None);
    }

    #[test]
    fn sum_saturates_instead_of_wrapping() {
        let h = Histogram::new();
        h.update(i64::MAX);
        h.update(1);
        assert_eq!(h.sum(), i64::MAX);

        let low = Histogram::new();
        low.update(i64::MIN);
        low.update(-1);
        assert_eq!(low.sum(), i64::MIN);
        assert_eq!(low.count(), 2);
    }
}
