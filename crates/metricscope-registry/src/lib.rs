//! metricscope registry library entry.
//!
//! This crate wires scoped registries, configuration, the composition root
//! and the instrumentation boundary together. It is consumed by the demo
//! binary (`main.rs`), by hosts embedding the registry and by integration
//! tests.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod app_state;
pub mod config;
pub mod instrument;
pub mod registry;
pub mod scope;

pub use app_state::MetricsContext;
pub use registry::{MetricFilter, Registry, RegistryOptions};
pub use scope::{ScopeTable, APPLICATION_SCOPE, BASE_SCOPE, VENDOR_SCOPE};
