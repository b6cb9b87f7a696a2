//! Annotation descriptors and metric id resolution.
//!
//! Naming follows the annotation contract:
//!
//! | declared on | `name` | `absolute` | metric name |
//! |---|---|---|---|
//! | member | empty | false | `Class.member` |
//! | member | empty | true | `member` |
//! | member | set | false | `Class.name` |
//! | member | set | true | `name` |
//! | class | empty | false | `Class.member` |
//! | class | set | false | `package.name.member` |
//!
//! Constructors use the simple class name as their member name. Class-level
//! annotations reject `absolute = true`.

use metricscope_core::error::{MetricsError, Result};
use metricscope_core::{metric_name, units, Metadata, MetricId, MetricKind, Tags};

use crate::scope::APPLICATION_SCOPE;

/// Attributes shared by `Counted`, `Timed`, `Gauge` style annotations.
#[derive(Debug, Clone)]
pub struct Annotation {
    pub name: String,
    pub tags: Vec<String>,
    pub absolute: bool,
    pub description: String,
    pub unit: String,
    pub scope: String,
}

impl Default for Annotation {
    fn default() -> Self {
        Self {
            name: String::new(),
            tags: Vec::new(),
            absolute: false,
            description: String::new(),
            unit: units::NONE.to_string(),
            scope: APPLICATION_SCOPE.to_string(),
        }
    }
}

impl Annotation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn tags<S: AsRef<str>>(mut self, tags: &[S]) -> Self {
        self.tags = tags.iter().map(|s| s.as_ref().to_string()).collect();
        self
    }

    pub fn absolute(mut self, absolute: bool) -> Self {
        self.absolute = absolute;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }
}

/// Where the annotation was declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Member,
    Class,
}

/// An instrumentable method or constructor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    class: String,
    name: String,
}

impl Member {
    /// `class` is the fully qualified class name.
    pub fn method(class: impl Into<String>, name: impl Into<String>) -> Self {
        Self { class: class.into(), name: name.into() }
    }

    pub fn constructor(class: impl Into<String>) -> Self {
        let class = class.into();
        let name = simple_name(&class).to_string();
        Self { class, name }
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

fn simple_name(class: &str) -> &str {
    class.rsplit_once('.').map(|(_, s)| s).unwrap_or(class)
}

fn package_of(class: &str) -> &str {
    class.rsplit_once('.').map(|(p, _)| p).unwrap_or("")
}

/// Identity, metadata and scope of one instrumented member.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMetric {
    pub id: MetricId,
    pub metadata: Metadata,
    pub scope: String,
}

pub fn resolve(
    ann: &Annotation,
    placement: Placement,
    member: &Member,
    kind: MetricKind,
) -> Result<ResolvedMetric> {
    let name = match placement {
        Placement::Member => match (ann.name.is_empty(), ann.absolute) {
            (true, true) => member.name.clone(),
            (true, false) => metric_name(&member.class, &[member.name.as_str()]),
            (false, true) => ann.name.clone(),
            (false, false) => metric_name(&member.class, &[ann.name.as_str()]),
        },
        Placement::Class => {
            if ann.absolute {
                return Err(MetricsError::InvalidArgument(format!(
                    "class-level annotation on {} must not be absolute",
                    member.class
                )));
            }
            if ann.name.is_empty() {
                metric_name(&member.class, &[member.name.as_str()])
            } else {
                metric_name(package_of(&member.class), &[ann.name.as_str(), member.name.as_str()])
            }
        }
    };

    let id = MetricId::new(name, Tags::parse(&ann.tags))?;
    let metadata = Metadata::builder(id.name())
        .description(ann.description.as_str())
        .unit(ann.unit.as_str())
        .kind(kind)
        .build()?;

    Ok(ResolvedMetric {
        id,
        metadata,
        scope: ann.scope.clone(),
    })
}

/// Resolve a class-level annotation for each of `members`.
pub fn resolve_class(ann: &Annotation, members: &[Member], kind: MetricKind) -> Result<Vec<ResolvedMetric>> {
    members
        .iter()
        .map(|m| resolve(ann, Placement::Class, m, kind))
        .collect()
}
