//! Per-scope metric registry.
//!
//! Storage is keyed by metric name: each name owns one `Metadata` and the
//! map of its tag variants. Locking is sharded by `DashMap` bucket, so
//! create-if-absent for a name happens under that bucket's lock and at most
//! one instance is ever created per `MetricId`. Read paths (`metrics`,
//! `metric_ids`, ...) copy handles out first and filter afterwards, so no
//! caller code ever runs while a shard is locked.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use metricscope_core::error::{BoxError, MetricsError, Result};
use metricscope_core::metric::DEFAULT_RESERVOIR_SIZE;
use metricscope_core::{Counter, Gauge, Histogram, Metadata, Metric, MetricId, MetricKind, Number, Tags, Timer};

use crate::config::MetricsConfig;

/// Settings shared by every registry built from one config.
#[derive(Debug, Clone)]
pub struct RegistryOptions {
    pub global_tags: Tags,
    pub reservoir_size: usize,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            global_tags: Tags::new(),
            reservoir_size: DEFAULT_RESERVOIR_SIZE,
        }
    }
}

impl RegistryOptions {
    pub fn from_config(cfg: &MetricsConfig) -> Result<Self> {
        Ok(Self {
            global_tags: cfg.registry.compiled_global_tags()?,
            reservoir_size: cfg.histogram.reservoir_size,
        })
    }
}

/// Predicate over registered metrics.
#[derive(Clone)]
pub struct MetricFilter {
    pred: Arc<dyn Fn(&MetricId, &Metric) -> bool + Send + Sync>,
}

impl MetricFilter {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&MetricId, &Metric) -> bool + Send + Sync + 'static,
    {
        Self { pred: Arc::new(f) }
    }

    pub fn all() -> Self {
        Self::new(|_, _| true)
    }

    pub fn by_name(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(move |id, _| id.name() == name)
    }

    pub fn by_kind(kind: MetricKind) -> Self {
        Self::new(move |_, m| m.kind() == kind)
    }

    pub fn matches(&self, id: &MetricId, metric: &Metric) -> bool {
        (self.pred)(id, metric)
    }
}

impl Default for MetricFilter {
    fn default() -> Self {
        Self::all()
    }
}

impl fmt::Debug for MetricFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MetricFilter")
    }
}

struct NameEntry {
    metadata: Metadata,
    variants: HashMap<MetricId, Metric>,
}

/// Registry for one scope.
pub struct Registry {
    scope: String,
    names: DashMap<String, NameEntry>,
    opts: RegistryOptions,
}

impl Registry {
    pub fn new(scope: impl Into<String>) -> Self {
        Self::with_options(scope, RegistryOptions::default())
    }

    pub fn with_options(scope: impl Into<String>, opts: RegistryOptions) -> Self {
        Self {
            scope: scope.into(),
            names: DashMap::new(),
            opts,
        }
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    fn qualify(&self, id: &MetricId) -> MetricId {
        id.with_defaults(&self.opts.global_tags)
    }

    /// Register a counter, histogram or timer under `id`.
    ///
    /// Gauges need a producer, see [`Registry::register_gauge`].
    pub fn register(&self, metadata: Metadata, id: &MetricId) -> Result<Metric> {
        let size = self.opts.reservoir_size;
        let kind = metadata.kind();
        self.register_with(metadata, id, || {
            Metric::create(kind, size).ok_or_else(|| {
                MetricsError::InvalidArgument(format!(
                    "{kind} metrics need a producer; use register_gauge"
                ))
            })
        })
    }

    pub fn register_gauge<F, N>(&self, metadata: Metadata, id: &MetricId, producer: F) -> Result<Arc<Gauge>>
    where
        F: Fn() -> N + Send + Sync + 'static,
        N: Into<Number>,
    {
        require_gauge_kind(&metadata)?;
        let name = id.name().to_string();
        let metric = self.register_with(metadata, id, move || {
            Ok(Metric::Gauge(Arc::new(Gauge::new(name, producer))))
        })?;
        expect_gauge(metric, id)
    }

    /// Like [`Registry::register_gauge`] for producers that can fail.
    pub fn register_gauge_fallible<F>(&self, metadata: Metadata, id: &MetricId, producer: F) -> Result<Arc<Gauge>>
    where
        F: Fn() -> std::result::Result<Number, BoxError> + Send + Sync + 'static,
    {
        require_gauge_kind(&metadata)?;
        let name = id.name().to_string();
        let metric = self.register_with(metadata, id, move || {
            Ok(Metric::Gauge(Arc::new(Gauge::fallible(name, producer))))
        })?;
        expect_gauge(metric, id)
    }

    /// Register a caller-built instance. An identical id/metadata pair already
    /// present wins and is returned instead.
    pub fn register_metric(&self, metadata: Metadata, id: &MetricId, metric: Metric) -> Result<Metric> {
        if metric.kind() != metadata.kind() {
            return Err(MetricsError::InvalidArgument(format!(
                "metadata for {} declares {} but instance is a {}",
                id,
                metadata.kind(),
                metric.kind()
            )));
        }
        self.register_with(metadata, id, move || Ok(metric))
    }

    fn register_with<F>(&self, metadata: Metadata, id: &MetricId, make: F) -> Result<Metric>
    where
        F: FnOnce() -> Result<Metric>,
    {
        if metadata.name() != id.name() {
            return Err(MetricsError::InvalidArgument(format!(
                "metadata name {} does not match metric id {}",
                metadata.name(),
                id
            )));
        }
        let id = self.qualify(id);

        match self.names.entry(id.name().to_string()) {
            Entry::Occupied(mut occupied) => {
                let entry = occupied.get_mut();
                if !entry.metadata.is_compatible(&metadata) {
                    tracing::warn!(scope = %self.scope, metric = %id, "conflicting metadata for existing metric name");
                    return Err(MetricsError::DuplicateMetric {
                        name: id.name().to_string(),
                        reason: format!(
                            "registered as {:?}, attempted {:?}",
                            entry.metadata, metadata
                        ),
                    });
                }
                if let Some(existing) = entry.variants.get(&id) {
                    tracing::trace!(scope = %self.scope, metric = %id, "metric already registered");
                    return Ok(existing.clone());
                }
                let metric = make()?;
                tracing::debug!(scope = %self.scope, metric = %id, kind = %metric.kind(), "registered tag variant");
                entry.variants.insert(id, metric.clone());
                Ok(metric)
            }
            Entry::Vacant(vacant) => {
                let metric = make()?;
                tracing::debug!(scope = %self.scope, metric = %id, kind = %metric.kind(), "registered metric");
                let mut variants = HashMap::new();
                variants.insert(id, metric.clone());
                vacant.insert(NameEntry { metadata, variants });
                Ok(metric)
            }
        }
    }

    /// Get-or-create with default metadata. An existing name is reused when
    /// its kind matches, whatever its description or unit.
    fn get_or_create<F>(&self, name: &str, tags: Tags, kind: MetricKind, make: F) -> Result<Metric>
    where
        F: FnOnce(&MetricId) -> Metric,
    {
        let id = self.qualify(&MetricId::new(name, tags)?);

        if let Some(entry) = self.names.get(id.name()) {
            if entry.metadata.kind() == kind {
                if let Some(m) = entry.variants.get(&id) {
                    return Ok(m.clone());
                }
            }
        }

        match self.names.entry(id.name().to_string()) {
            Entry::Occupied(mut occupied) => {
                let entry = occupied.get_mut();
                if entry.metadata.kind() != kind {
                    tracing::warn!(scope = %self.scope, metric = %id, existing = %entry.metadata.kind(), requested = %kind, "metric kind conflict");
                    return Err(MetricsError::DuplicateMetric {
                        name: id.name().to_string(),
                        reason: format!("registered as {}, requested {}", entry.metadata.kind(), kind),
                    });
                }
                if let Some(m) = entry.variants.get(&id) {
                    return Ok(m.clone());
                }
                let metric = make(&id);
                tracing::debug!(scope = %self.scope, metric = %id, %kind, "created tag variant");
                entry.variants.insert(id, metric.clone());
                Ok(metric)
            }
            Entry::Vacant(vacant) => {
                let metadata = Metadata::of(id.name(), kind)?;
                let metric = make(&id);
                tracing::debug!(scope = %self.scope, metric = %id, %kind, "created metric");
                let mut variants = HashMap::new();
                variants.insert(id, metric.clone());
                vacant.insert(NameEntry { metadata, variants });
                Ok(metric)
            }
        }
    }

    pub fn counter(&self, name: &str, tags: Tags) -> Result<Arc<Counter>> {
        let metric = self.get_or_create(name, tags, MetricKind::Counter, |_| {
            Metric::Counter(Arc::new(Counter::new()))
        })?;
        metric
            .as_counter()
            .cloned()
            .ok_or_else(|| MetricsError::Internal(format!("{name} is not a counter")))
    }

    pub fn histogram(&self, name: &str, tags: Tags) -> Result<Arc<Histogram>> {
        let size = self.opts.reservoir_size;
        let metric = self.get_or_create(name, tags, MetricKind::Histogram, |_| {
            Metric::Histogram(Arc::new(Histogram::with_reservoir(size)))
        })?;
        metric
            .as_histogram()
            .cloned()
            .ok_or_else(|| MetricsError::Internal(format!("{name} is not a histogram")))
    }

    pub fn timer(&self, name: &str, tags: Tags) -> Result<Arc<Timer>> {
        let size = self.opts.reservoir_size;
        let metric = self.get_or_create(name, tags, MetricKind::Timer, |_| {
            Metric::Timer(Arc::new(Timer::with_reservoir(size)))
        })?;
        metric
            .as_timer()
            .cloned()
            .ok_or_else(|| MetricsError::Internal(format!("{name} is not a timer")))
    }

    /// Get-or-create a gauge. When the gauge already exists `producer` is
    /// ignored; use [`Gauge::rebind`] to swap it.
    pub fn gauge<F, N>(&self, name: &str, tags: Tags, producer: F) -> Result<Arc<Gauge>>
    where
        F: Fn() -> N + Send + Sync + 'static,
        N: Into<Number>,
    {
        let metric = self.get_or_create(name, tags, MetricKind::Gauge, move |id| {
            Metric::Gauge(Arc::new(Gauge::new(id.name(), producer)))
        })?;
        metric
            .as_gauge()
            .cloned()
            .ok_or_else(|| MetricsError::Internal(format!("{name} is not a gauge")))
    }

    /// Lookup only; never creates.
    pub fn get(&self, id: &MetricId) -> Option<Metric> {
        let id = self.qualify(id);
        self.names
            .get(id.name())
            .and_then(|entry| entry.variants.get(&id).cloned())
    }

    pub fn counter_at(&self, id: &MetricId) -> Option<Arc<Counter>> {
        self.get(id).and_then(|m| m.as_counter().cloned())
    }

    pub fn gauge_at(&self, id: &MetricId) -> Option<Arc<Gauge>> {
        self.get(id).and_then(|m| m.as_gauge().cloned())
    }

    pub fn histogram_at(&self, id: &MetricId) -> Option<Arc<Histogram>> {
        self.get(id).and_then(|m| m.as_histogram().cloned())
    }

    pub fn timer_at(&self, id: &MetricId) -> Option<Arc<Timer>> {
        self.get(id).and_then(|m| m.as_timer().cloned())
    }

    pub fn metadata(&self, name: &str) -> Option<Metadata> {
        self.names.get(name).map(|e| e.metadata.clone())
    }

    /// Remove one tag variant. Removing the last variant also drops the
    /// name's metadata.
    pub fn remove(&self, id: &MetricId) -> bool {
        let id = self.qualify(id);
        let Entry::Occupied(mut occupied) = self.names.entry(id.name().to_string()) else {
            return false;
        };
        let removed = occupied.get_mut().variants.remove(&id).is_some();
        if occupied.get().variants.is_empty() {
            occupied.remove();
            tracing::debug!(scope = %self.scope, name = %id.name(), "metric name released");
        }
        if removed {
            tracing::debug!(scope = %self.scope, metric = %id, "removed metric");
        }
        removed
    }

    /// Remove every tag variant of `name`. Returns how many were removed.
    pub fn remove_all(&self, name: &str) -> usize {
        let removed = self
            .names
            .remove(name)
            .map(|(_, e)| e.variants.len())
            .unwrap_or(0);
        if removed > 0 {
            tracing::debug!(scope = %self.scope, %name, removed, "removed metric name");
        }
        removed
    }

    pub fn remove_matching(&self, filter: &MetricFilter) -> usize {
        self.metrics(filter)
            .keys()
            .filter(|id| self.remove(id))
            .count()
    }

    fn entries(&self) -> Vec<(MetricId, Metric)> {
        let mut out = Vec::with_capacity(self.names.len());
        for entry in self.names.iter() {
            for (id, metric) in &entry.variants {
                out.push((id.clone(), metric.clone()));
            }
        }
        out
    }

    /// Sorted snapshot of the registered ids.
    pub fn metric_ids(&self) -> BTreeSet<MetricId> {
        self.entries().into_iter().map(|(id, _)| id).collect()
    }

    pub fn names(&self) -> BTreeSet<String> {
        self.names.iter().map(|e| e.key().clone()).collect()
    }

    /// Sorted snapshot of the metrics matching `filter`.
    pub fn metrics(&self, filter: &MetricFilter) -> BTreeMap<MetricId, Metric> {
        self.entries()
            .into_iter()
            .filter(|(id, m)| filter.matches(id, m))
            .collect()
    }

    pub fn counters(&self, filter: &MetricFilter) -> BTreeMap<MetricId, Arc<Counter>> {
        self.typed(filter, |m| m.as_counter().cloned())
    }

    pub fn gauges(&self, filter: &MetricFilter) -> BTreeMap<MetricId, Arc<Gauge>> {
        self.typed(filter, |m| m.as_gauge().cloned())
    }

    pub fn histograms(&self, filter: &MetricFilter) -> BTreeMap<MetricId, Arc<Histogram>> {
        self.typed(filter, |m| m.as_histogram().cloned())
    }

    pub fn timers(&self, filter: &MetricFilter) -> BTreeMap<MetricId, Arc<Timer>> {
        self.typed(filter, |m| m.as_timer().cloned())
    }

    fn typed<T>(&self, filter: &MetricFilter, pick: impl Fn(&Metric) -> Option<T>) -> BTreeMap<MetricId, T> {
        self.metrics(filter)
            .into_iter()
            .filter_map(|(id, m)| pick(&m).map(|t| (id, t)))
            .collect()
    }

    /// Number of registered ids (all tag variants).
    pub fn len(&self) -> usize {
        self.names.iter().map(|e| e.variants.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("scope", &self.scope)
            .field("names", &self.names.len())
            .finish()
    }
}

fn require_gauge_kind(metadata: &Metadata) -> Result<()> {
    if metadata.kind() != MetricKind::Gauge {
        return Err(MetricsError::InvalidArgument(format!(
            "metadata for {} declares {}, not a gauge",
            metadata.name(),
            metadata.kind()
        )));
    }
    Ok(())
}

fn expect_gauge(metric: Metric, id: &MetricId) -> Result<Arc<Gauge>> {
    metric
        .as_gauge()
        .cloned()
        .ok_or_else(|| MetricsError::Internal(format!("{id} is not a gauge")))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use metricscope_core::Tag;

    #[test]
    fn global_tags_apply_to_lookup() {
        let opts = RegistryOptions {
            global_tags: Tags::new().with(Tag::new("app", "shop").unwrap()),
            ..RegistryOptions::default()
        };
        let reg = Registry::with_options("application", opts);
        let c = reg.counter("hits", Tags::new()).unwrap();
        c.inc();

        let plain = MetricId::named("hits").unwrap();
        assert_eq!(reg.counter_at(&plain).unwrap().count(), 1);
        let stored = reg.metric_ids().into_iter().next().unwrap();
        assert_eq!(stored.tags().get("app"), Some("shop"));
    }

    #[test]
    fn gauge_kind_needs_producer() {
        let reg = Registry::new("application");
        let md = Metadata::of("g", MetricKind::Gauge).unwrap();
        let err = reg.register(md, &MetricId::named("g").unwrap()).unwrap_err();
        assert_eq!(err.code().as_str(), "INVALID_ARGUMENT");
        assert!(reg.is_empty());
    }

    #[test]
    fn metadata_name_must_match_id() {
        let reg = Registry::new("application");
        let md = Metadata::of("a", MetricKind::Counter).unwrap();
        let err = reg.register(md, &MetricId::named("b").unwrap()).unwrap_err();
        assert_eq!(err.code().as_str(), "INVALID_ARGUMENT");
    }
}
