use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{MetricsError, Result};

/// Monotonic counter. The total never wraps: `inc` saturates at `u64::MAX`
/// and `inc_by` rejects a delta that would overflow.
#[derive(Debug, Default)]
pub struct Counter {
    count: AtomicU64,
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment by 1, saturating at `u64::MAX`.
    pub fn inc(&self) {
        let _ = self
            .count
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |c| c.checked_add(1));
    }

    /// Increment by `n`. Negative deltas and deltas that would overflow are
    /// rejected and leave the total untouched.
    pub fn inc_by(&self, n: i64) -> Result<()> {
        let n = u64::try_from(n)
            .map_err(|_| MetricsError::InvalidArgument(format!("counter delta must be >= 0, got {n}")))?;
        self.count
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |c| c.checked_add(n))
            .map(|_| ())
            .map_err(|current| {
                MetricsError::InvalidArgument(format!("counter delta {n} overflows total {current}"))
            })
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}
