//! Metric variants and the polymorphic [`Metric`] handle stored by registries.

mod counter;
mod gauge;
mod histogram;
mod snapshot;
mod timer;

use std::sync::Arc;

pub use counter::Counter;
pub use gauge::{Gauge, Number};
pub use histogram::Histogram;
pub use snapshot::{PercentileValue, Snapshot, DEFAULT_PERCENTILES, DEFAULT_RESERVOIR_SIZE};
pub use timer::{Timer, TimerContext};

use crate::metadata::MetricKind;

/// Shared handle to a registered metric. Cloning is cheap and keeps identity.
#[derive(Debug, Clone)]
pub enum Metric {
    Counter(Arc<Counter>),
    Gauge(Arc<Gauge>),
    Histogram(Arc<Histogram>),
    Timer(Arc<Timer>),
}

impl Metric {
    pub fn kind(&self) -> MetricKind {
        match self {
            Metric::Counter(_) => MetricKind::Counter,
            Metric::Gauge(_) => MetricKind::Gauge,
            Metric::Histogram(_) => MetricKind::Histogram,
            Metric::Timer(_) => MetricKind::Timer,
        }
    }

    /// Fresh instance of a kind that needs no producer. Gauges return `None`.
    pub fn create(kind: MetricKind, reservoir_size: usize) -> Option<Metric> {
        match kind {
            MetricKind::Counter => Some(Metric::Counter(Arc::new(Counter::new()))),
            MetricKind::Histogram => Some(Metric::Histogram(Arc::new(Histogram::with_reservoir(reservoir_size)))),
            MetricKind::Timer => Some(Metric::Timer(Arc::new(Timer::with_reservoir(reservoir_size)))),
            MetricKind::Gauge => None,
        }
    }

    /// Reference identity: both handles point at the same instance.
    pub fn ptr_eq(&self, other: &Metric) -> bool {
        match (self, other) {
            (Metric::Counter(a), Metric::Counter(b)) => Arc::ptr_eq(a, b),
            (Metric::Gauge(a), Metric::Gauge(b)) => Arc::ptr_eq(a, b),
            (Metric::Histogram(a), Metric::Histogram(b)) => Arc::ptr_eq(a, b),
            (Metric::Timer(a), Metric::Timer(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    pub fn as_counter(&self) -> Option<&Arc<Counter>> {
        match self {
            Metric::Counter(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_gauge(&self) -> Option<&Arc<Gauge>> {
        match self {
            Metric::Gauge(g) => Some(g),
            _ => None,
        }
    }

    pub fn as_histogram(&self) -> Option<&Arc<Histogram>> {
        match self {
            Metric::Histogram(h) => Some(h),
            _ => None,
        }
    }

    pub fn as_timer(&self) -> Option<&Arc<Timer>> {
        match self {
            Metric::Timer(t) => Some(t),
            _ => None,
        }
    }
}

impl From<Arc<Counter>> for Metric {
    fn from(c: Arc<Counter>) -> Self {
        Metric::Counter(c)
    }
}

impl From<Arc<Gauge>> for Metric {
    fn from(g: Arc<Gauge>) -> Self {
        Metric::Gauge(g)
    }
}

impl From<Arc<Histogram>> for Metric {
    fn from(h: Arc<Histogram>) -> Self {
        Metric::Histogram(h)
    }
}

impl From<Arc<Timer>> for Metric {
    fn from(t: Arc<Timer>) -> Self {
        Metric::Timer(t)
    }
}
