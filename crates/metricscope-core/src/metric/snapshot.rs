//! Sliding window reservoir and point-in-time snapshots.
//!
//! The reservoir keeps the most recent `capacity` values in a ring buffer.
//! Quantiles are estimated from the sorted window: position `q * (n + 1)`,
//! linear interpolation between the two neighbouring values, clamped to the
//! first/last value. The same recorded sequence always yields the same
//! estimate.

use serde::Serialize;

/// Default window size.
pub const DEFAULT_RESERVOIR_SIZE: usize = 1028;

/// Percentiles reported when the caller does not ask for specific ones.
pub const DEFAULT_PERCENTILES: [f64; 6] = [0.5, 0.75, 0.95, 0.98, 0.99, 0.999];

#[derive(Debug)]
pub(crate) struct SlidingWindow {
    values: Vec<i64>,
    next: usize,
    capacity: usize,
}

impl SlidingWindow {
    pub(crate) fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            values: Vec::with_capacity(capacity.min(DEFAULT_RESERVOIR_SIZE)),
            next: 0,
            capacity,
        }
    }

    pub(crate) fn record(&mut self, v: i64) {
        if self.values.len() < self.capacity {
            self.values.push(v);
        } else {
            self.values[self.next] = v;
        }
        self.next = (self.next + 1) % self.capacity;
    }

    pub(crate) fn snapshot(&self) -> Snapshot {
        Snapshot::new(self.values.clone())
    }
}

/// One requested percentile and its estimate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PercentileValue {
    pub percentile: f64,
    pub value: f64,
}

/// Sorted copy of the reservoir at one point in time.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    values: Vec<i64>,
}

impl Snapshot {
    pub fn new(mut values: Vec<i64>) -> Self {
        values.sort_unstable();
        Self { values }
    }

    pub fn size(&self) -> usize {
        self.values.len()
    }

    pub fn values(&self) -> &[i64] {
        &self.values
    }

    /// Smallest value in the window, `None` when empty.
    pub fn min(&self) -> Option<i64> {
        self.values.first().copied()
    }

    /// Largest value in the window, `None` when empty.
    pub fn max(&self) -> Option<i64> {
        self.values.last().copied()
    }

    pub fn mean(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.values.iter().map(|&v| v as f64).sum();
        sum / self.values.len() as f64
    }

    /// Sample standard deviation.
    pub fn std_dev(&self) -> f64 {
        let n = self.values.len();
        if n <= 1 {
            return 0.0;
        }
        let mean = self.mean();
        let var: f64 = self
            .values
            .iter()
            .map(|&v| {
                let d = v as f64 - mean;
                d * d
            })
            .sum::<f64>()
            / (n - 1) as f64;
        var.sqrt()
    }

    /// Estimate the value at quantile `q`; `q` is clamped to `[0, 1]`.
    pub fn value(&self, q: f64) -> f64 {
        let n = self.values.len();
        if n == 0 {
            return 0.0;
        }
        let q = if q.is_nan() { 0.0 } else { q.clamp(0.0, 1.0) };
        let pos = q * (n + 1) as f64;
        let index = pos as usize;
        if index < 1 {
            return self.values[0] as f64;
        }
        if index >= n {
            return self.values[n - 1] as f64;
        }
        let lower = self.values[index - 1] as f64;
        let upper = self.values[index] as f64;
        lower + (pos - pos.floor()) * (upper - lower)
    }

    pub fn median(&self) -> f64 {
        self.value(0.5)
    }

    pub fn percentile_values(&self, percentiles: &[f64]) -> Vec<PercentileValue> {
        percentiles
            .iter()
            .map(|&p| PercentileValue { percentile: p, value: self.value(p) })
            .collect()
    }
}
