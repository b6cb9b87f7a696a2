//! Instrumentation boundary.
//!
//! Hosts that intercept annotated methods (or call sites written by hand)
//! describe each member with an [`Annotation`], resolve it to an id, metadata
//! and scope, then bind a site that calls the registry around every
//! invocation. Interception itself is the host's business.

pub mod annotation;
pub mod site;

pub use annotation::{resolve, resolve_class, Annotation, Member, Placement, ResolvedMetric};
pub use site::{CountedSite, GaugeSite, TimedSite};
