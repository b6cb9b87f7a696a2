//! metricscope core: metric identities, metadata, metric variants and the
//! error surface shared by the registry and instrumentation layers.
//!
//! This crate carries no runtime or storage dependencies; registries live in
//! `metricscope-registry`.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! Every fallible path surfaces as `MetricsError`/`Result` so an instrumented
//! process never crashes because of its metrics.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod id;
pub mod metadata;
pub mod metric;

/// Shared result type.
pub use error::{BoxError, ErrorCode, MetricsError, Result};
pub use id::{metric_name, MetricId, Tag, Tags};
pub use metadata::{units, Metadata, MetricKind};
pub use metric::{Counter, Gauge, Histogram, Metric, Number, Snapshot, Timer};
