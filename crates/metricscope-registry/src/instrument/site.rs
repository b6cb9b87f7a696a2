//! Call sites bound to registered metrics.
//!
//! A site registers its metric when bound (before the first invocation) and
//! looks it up again on every call. If the metric has been removed from the
//! registry in the meantime the call fails with `MetricNotFound` and the
//! wrapped code does not run.

use std::future::Future;
use std::sync::Arc;

use metricscope_core::error::{MetricsError, Result};
use metricscope_core::{Counter, Gauge, MetricId, MetricKind, Number, Timer};

use super::annotation::{resolve_class, Annotation, Member, ResolvedMetric};
use crate::registry::Registry;
use crate::scope::ScopeTable;

fn require_kind(resolved: &ResolvedMetric, kind: MetricKind) -> Result<()> {
    if resolved.metadata.kind() != kind {
        return Err(MetricsError::InvalidArgument(format!(
            "{} resolved as {}, site expects {}",
            resolved.id,
            resolved.metadata.kind(),
            kind
        )));
    }
    Ok(())
}

fn missing(registry: &Registry, id: &MetricId) -> MetricsError {
    tracing::warn!(scope = %registry.scope(), metric = %id, "instrumented call site lost its metric");
    MetricsError::MetricNotFound(format!("{id} (scope {})", registry.scope()))
}

/// `Counted` call site: increments before running the wrapped code.
#[derive(Debug, Clone)]
pub struct CountedSite {
    registry: Arc<Registry>,
    id: MetricId,
}

impl CountedSite {
    pub fn bind(scopes: &ScopeTable, resolved: &ResolvedMetric) -> Result<Self> {
        require_kind(resolved, MetricKind::Counter)?;
        let registry = scopes.get_or_create(&resolved.scope)?;
        registry.register(resolved.metadata.clone(), &resolved.id)?;
        Ok(Self { registry, id: resolved.id.clone() })
    }

    /// Bind every member of a class-level annotation.
    pub fn bind_class(scopes: &ScopeTable, ann: &Annotation, members: &[Member]) -> Result<Vec<Self>> {
        resolve_class(ann, members, MetricKind::Counter)?
            .iter()
            .map(|r| Self::bind(scopes, r))
            .collect()
    }

    pub fn id(&self) -> &MetricId {
        &self.id
    }

    fn counter(&self) -> Result<Arc<Counter>> {
        self.registry
            .counter_at(&self.id)
            .ok_or_else(|| missing(&self.registry, &self.id))
    }

    pub fn invoke<R>(&self, f: impl FnOnce() -> R) -> Result<R> {
        self.counter()?.inc();
        Ok(f())
    }

    pub async fn invoke_async<F: Future>(&self, fut: F) -> Result<F::Output> {
        self.counter()?.inc();
        Ok(fut.await)
    }
}

/// `Timed` call site: records the wrapped code's duration on every exit path.
#[derive(Debug, Clone)]
pub struct TimedSite {
    registry: Arc<Registry>,
    id: MetricId,
}

impl TimedSite {
    pub fn bind(scopes: &ScopeTable, resolved: &ResolvedMetric) -> Result<Self> {
        require_kind(resolved, MetricKind::Timer)?;
        let registry = scopes.get_or_create(&resolved.scope)?;
        registry.register(resolved.metadata.clone(), &resolved.id)?;
        Ok(Self { registry, id: resolved.id.clone() })
    }

    pub fn bind_class(scopes: &ScopeTable, ann: &Annotation, members: &[Member]) -> Result<Vec<Self>> {
        resolve_class(ann, members, MetricKind::Timer)?
            .iter()
            .map(|r| Self::bind(scopes, r))
            .collect()
    }

    pub fn id(&self) -> &MetricId {
        &self.id
    }

    fn timer(&self) -> Result<Arc<Timer>> {
        self.registry
            .timer_at(&self.id)
            .ok_or_else(|| missing(&self.registry, &self.id))
    }

    pub fn invoke<R>(&self, f: impl FnOnce() -> R) -> Result<R> {
        Ok(self.timer()?.time(f))
    }

    pub async fn invoke_async<F: Future>(&self, fut: F) -> Result<F::Output> {
        let timer = self.timer()?;
        Ok(timer.time_future(fut).await)
    }
}

/// `Gauge` site: exposes a member's value through a registered gauge.
#[derive(Debug, Clone)]
pub struct GaugeSite {
    registry: Arc<Registry>,
    id: MetricId,
}

impl GaugeSite {
    pub fn bind<F, N>(scopes: &ScopeTable, resolved: &ResolvedMetric, producer: F) -> Result<Self>
    where
        F: Fn() -> N + Send + Sync + 'static,
        N: Into<Number>,
    {
        require_kind(resolved, MetricKind::Gauge)?;
        let registry = scopes.get_or_create(&resolved.scope)?;
        registry.register_gauge(resolved.metadata.clone(), &resolved.id, producer)?;
        Ok(Self { registry, id: resolved.id.clone() })
    }

    pub fn id(&self) -> &MetricId {
        &self.id
    }

    pub fn gauge(&self) -> Result<Arc<Gauge>> {
        self.registry
            .gauge_at(&self.id)
            .ok_or_else(|| missing(&self.registry, &self.id))
    }

    pub fn value(&self) -> Result<Number> {
        self.gauge()?.value()
    }
}
