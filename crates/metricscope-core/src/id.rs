//! Metric identity: name + tag set.
//!
//! Tags are kept sorted by key, so equality and hashing are independent of the
//! order in which tags were supplied and `MetricId` can be used directly as a
//! map key. Raw `"key=value"` strings are parsed leniently: entries without a
//! `=` or with an empty key are dropped, never reported.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::error::{MetricsError, Result};

/// A single validated tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag {
    key: String,
    value: String,
}

impl Tag {
    /// Strict constructor: key must be `[A-Za-z_][A-Za-z0-9_]*`.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Result<Self> {
        let key = key.into();
        if !is_valid_key(&key) {
            return Err(MetricsError::InvalidArgument(format!("invalid tag key: {key:?}")));
        }
        Ok(Self { key, value: value.into() })
    }

    /// Lenient parser for `"key=value"`. Splits at the first `=`.
    pub fn parse(raw: &str) -> Option<Self> {
        let (key, value) = raw.split_once('=')?;
        let key = key.trim();
        if key.is_empty() {
            return None;
        }
        Some(Self { key: key.to_string(), value: value.trim().to_string() })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

fn is_valid_key(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Ordered tag set, unique keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Tags(BTreeMap<String, String>);

impl Tags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse raw `"key=value"` strings, silently dropping malformed entries.
    pub fn parse<S: AsRef<str>>(raw: &[S]) -> Self {
        raw.iter()
            .filter_map(|s| Tag::parse(s.as_ref()))
            .collect()
    }

    /// Insert a tag, replacing any previous value for the same key.
    pub fn insert(&mut self, tag: Tag) {
        self.0.insert(tag.key, tag.value);
    }

    /// Builder-style insert.
    pub fn with(mut self, tag: Tag) -> Self {
        self.insert(tag);
        self
    }

    /// Union of both sets; entries of `self` win on key collision.
    pub fn merge(&self, other: &Tags) -> Tags {
        let mut out = other.0.clone();
        for (k, v) in &self.0 {
            out.insert(k.clone(), v.clone());
        }
        Tags(out)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate `(key, value)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl FromIterator<Tag> for Tags {
    fn from_iter<I: IntoIterator<Item = Tag>>(iter: I) -> Self {
        let mut tags = Tags::new();
        for t in iter {
            tags.insert(t);
        }
        tags
    }
}

impl fmt::Display for Tags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (k, v) in self.iter() {
            if !first {
                f.write_str(",")?;
            }
            first = false;
            write!(f, "{k}=\"{}\"", v.replace('\\', "\\\\").replace('"', "\\\""))?;
        }
        Ok(())
    }
}

/// Unique key of a metric inside a scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct MetricId {
    name: String,
    tags: Tags,
}

impl MetricId {
    /// Fails with `InvalidArgument` when `name` is empty.
    pub fn new(name: impl Into<String>, tags: Tags) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(MetricsError::invalid("metric name must not be empty"));
        }
        Ok(Self { name, tags })
    }

    /// Untagged id.
    pub fn named(name: impl Into<String>) -> Result<Self> {
        Self::new(name, Tags::new())
    }

    /// Build from raw `"key=value"` strings (lenient).
    pub fn from_raw<S: AsRef<str>>(name: impl Into<String>, raw_tags: &[S]) -> Result<Self> {
        Self::new(name, Tags::parse(raw_tags))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tags(&self) -> &Tags {
        &self.tags
    }

    /// Same id with `extra` merged underneath the existing tags.
    pub fn with_defaults(&self, extra: &Tags) -> MetricId {
        if extra.is_empty() {
            return self.clone();
        }
        MetricId {
            name: self.name.clone(),
            tags: self.tags.merge(extra),
        }
    }
}

impl fmt::Display for MetricId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.tags.is_empty() {
            f.write_str(&self.name)
        } else {
            write!(f, "{}{{{}}}", self.name, self.tags)
        }
    }
}

/// Join a base name and further segments with `.`, skipping empty segments.
pub fn metric_name(base: &str, parts: &[&str]) -> String {
    std::iter::once(base)
        .chain(parts.iter().copied())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(".")
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn strict_tag_rejects_bad_keys() {
        assert!(Tag::new("ok_key1", "v").is_ok());
        assert!(Tag::new("", "v").is_err());
        assert!(Tag::new("1abc", "v").is_err());
        assert!(Tag::new("a-b", "v").is_err());
    }

    #[test]
    fn metric_name_skips_empty_segments() {
        assert_eq!(metric_name("Orders", &["create"]), "Orders.create");
        assert_eq!(metric_name("Orders", &["", "create", ""]), "Orders.create");
        assert_eq!(metric_name("", &["create"]), "create");
    }

    #[test]
    fn display_includes_tags() {
        let id = MetricId::from_raw("hits", &["b=2", "a=1"]).unwrap();
        assert_eq!(id.to_string(), "hits{a=\"1\",b=\"2\"}");
        assert_eq!(MetricId::named("hits").unwrap().to_string(), "hits");
    }
}
