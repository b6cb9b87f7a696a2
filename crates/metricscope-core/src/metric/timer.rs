use std::future::Future;
use std::time::{Duration, Instant};

use super::histogram::Histogram;
use super::snapshot::{Snapshot, DEFAULT_RESERVOIR_SIZE};

/// Histogram of elapsed durations, recorded in nanoseconds.
#[derive(Debug)]
pub struct Timer {
    histogram: Histogram,
}

impl Default for Timer {
    fn default() -> Self {
        Self::with_reservoir(DEFAULT_RESERVOIR_SIZE)
    }
}

impl Timer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reservoir(size: usize) -> Self {
        Self {
            histogram: Histogram::with_reservoir(size),
        }
    }

    pub fn update(&self, elapsed: Duration) {
        let nanos = i64::try_from(elapsed.as_nanos()).unwrap_or(i64::MAX);
        self.histogram.update(nanos);
    }

    /// Start measuring. The context records once, on `stop()` or when dropped.
    pub fn start(&self) -> TimerContext<'_> {
        TimerContext {
            timer: self,
            started: Instant::now(),
            recorded: false,
        }
    }

    /// Time a closure. Also records when `f` unwinds.
    pub fn time<R>(&self, f: impl FnOnce() -> R) -> R {
        let _ctx = self.start();
        f()
    }

    /// Time a future until completion (or until it is dropped).
    pub async fn time_future<F: Future>(&self, fut: F) -> F::Output {
        let _ctx = self.start();
        fut.await
    }

    pub fn count(&self) -> u64 {
        self.histogram.count()
    }

    /// Sum of every recorded duration, saturating at `i64::MAX` nanoseconds.
    pub fn elapsed_time(&self) -> Duration {
        Duration::from_nanos(u64::try_from(self.histogram.sum()).unwrap_or(0))
    }

    /// Snapshot of the recent durations, in nanoseconds.
    pub fn snapshot(&self) -> Snapshot {
        self.histogram.snapshot()
    }
}

/// In-flight measurement returned by [`Timer::start`].
#[must_use = "dropping the context immediately records a near-zero duration"]
pub struct TimerContext<'a> {
    timer: &'a Timer,
    started: Instant,
    recorded: bool,
}

impl TimerContext<'_> {
    /// Record and return the elapsed time.
    pub fn stop(mut self) -> Duration {
        self.record()
    }

    fn record(&mut self) -> Duration {
        let elapsed = self.started.elapsed();
        if !self.recorded {
            self.recorded = true;
            self.timer.update(elapsed);
        }
        elapsed
    }
}

impl Drop for TimerContext<'_> {
    fn drop(&mut self) {
        self.record();
    }
}
