//! Composition root owning the scope table.
//!
//! There is no implicit global: hosts build one `MetricsContext` at startup
//! and hand clones to whatever needs a registry. Tests build their own and
//! can `reset()` it.

use std::sync::Arc;

use metricscope_core::error::Result;

use crate::config::MetricsConfig;
use crate::registry::{Registry, RegistryOptions};
use crate::scope::ScopeTable;

#[derive(Clone)]
pub struct MetricsContext {
    inner: Arc<MetricsContextInner>,
}

struct MetricsContextInner {
    cfg: MetricsConfig,
    scopes: ScopeTable,
}

impl MetricsContext {
    /// Build the context and eagerly create the configured scopes.
    pub fn new(cfg: MetricsConfig) -> Result<Self> {
        cfg.validate()?;
        let opts = RegistryOptions::from_config(&cfg)?;
        let ctx = Self {
            inner: Arc::new(MetricsContextInner {
                scopes: ScopeTable::new(opts),
                cfg,
            }),
        };
        ctx.create_builtin_scopes()?;
        Ok(ctx)
    }

    fn create_builtin_scopes(&self) -> Result<()> {
        for scope in &self.inner.cfg.registry.scopes {
            self.inner.scopes.get_or_create(scope)?;
        }
        Ok(())
    }

    pub fn cfg(&self) -> &MetricsConfig {
        &self.inner.cfg
    }

    pub fn scopes(&self) -> &ScopeTable {
        &self.inner.scopes
    }

    /// Registry for `scope` (`RegistryScope` injection point).
    pub fn registry(&self, scope: &str) -> Result<Arc<Registry>> {
        self.inner.scopes.get_or_create(scope)
    }

    /// Drop every scope and re-create the configured built-ins.
    pub fn reset(&self) -> Result<()> {
        self.inner.scopes.clear();
        tracing::debug!("metrics context reset");
        self.create_builtin_scopes()
    }
}
