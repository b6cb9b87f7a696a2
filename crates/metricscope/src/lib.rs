//! Top-level facade crate for metricscope.
//!
//! Re-exports the core metric types and the registry library so users can depend on a single crate.

pub mod core {
    pub use metricscope_core::*;
}

pub mod registry {
    pub use metricscope_registry::*;
}
