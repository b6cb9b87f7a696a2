//! Descriptive metadata shared by every tag variant of a metric name.

use std::fmt;

use serde::Serialize;

use crate::error::{MetricsError, Result};

/// Common unit names.
pub mod units {
    pub const NONE: &str = "none";
    pub const NANOSECONDS: &str = "nanoseconds";
    pub const MILLISECONDS: &str = "milliseconds";
    pub const SECONDS: &str = "seconds";
    pub const BYTES: &str = "bytes";
    pub const PERCENT: &str = "percent";
}

/// Metric variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Counter,
    Gauge,
    Histogram,
    Timer,
}

impl MetricKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
            MetricKind::Histogram => "histogram",
            MetricKind::Timer => "timer",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-name metadata. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Metadata {
    name: String,
    description: Option<String>,
    unit: String,
    kind: MetricKind,
}

impl Metadata {
    pub fn builder(name: impl Into<String>) -> MetadataBuilder {
        MetadataBuilder {
            name: name.into(),
            description: None,
            unit: None,
            kind: None,
        }
    }

    /// Default metadata: no description, unit `none`.
    pub fn of(name: impl Into<String>, kind: MetricKind) -> Result<Self> {
        Self::builder(name).kind(kind).build()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn kind(&self) -> MetricKind {
        self.kind
    }

    /// Whether `other` may be re-registered under the same name.
    pub fn is_compatible(&self, other: &Metadata) -> bool {
        self == other
    }
}

#[derive(Debug, Clone)]
pub struct MetadataBuilder {
    name: String,
    description: Option<String>,
    unit: Option<String>,
    kind: Option<MetricKind>,
}

impl MetadataBuilder {
    /// Empty descriptions are treated as absent.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        let d = description.into();
        self.description = if d.is_empty() { None } else { Some(d) };
        self
    }

    pub fn unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn kind(mut self, kind: MetricKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn build(self) -> Result<Metadata> {
        if self.name.is_empty() {
            return Err(MetricsError::invalid("metadata name must not be empty"));
        }
        let kind = self
            .kind
            .ok_or_else(|| MetricsError::invalid(format!("metadata for {} has no kind", self.name)))?;
        let unit = match self.unit {
            Some(u) if !u.is_empty() => u,
            _ => units::NONE.to_string(),
        };
        Ok(Metadata {
            name: self.name,
            description: self.description,
            unit,
            kind,
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn kind_is_required() {
        let err = Metadata::builder("requests").unit("ms").build().unwrap_err();
        assert_eq!(err.code().as_str(), "INVALID_ARGUMENT");
    }

    #[test]
    fn unit_defaults_to_none() {
        let md = Metadata::of("requests", MetricKind::Counter).unwrap();
        assert_eq!(md.unit(), units::NONE);
        assert_eq!(md.description(), None);
    }

    #[test]
    fn equality_covers_every_field() {
        let a = Metadata::builder("r").kind(MetricKind::Timer).unit("ms").build().unwrap();
        let b = Metadata::builder("r").kind(MetricKind::Timer).unit("s").build().unwrap();
        let c = Metadata::builder("r").kind(MetricKind::Timer).unit("ms").build().unwrap();
        assert!(!a.is_compatible(&b));
        assert!(a.is_compatible(&c));
    }
}
