//! Process-wide table of scoped registries.

use std::sync::Arc;

use dashmap::DashMap;

use metricscope_core::error::{MetricsError, Result};

use crate::registry::{Registry, RegistryOptions};

pub const APPLICATION_SCOPE: &str = "application";
pub const BASE_SCOPE: &str = "base";
pub const VENDOR_SCOPE: &str = "vendor";

/// `scope name -> Registry`, created lazily.
#[derive(Debug, Default)]
pub struct ScopeTable {
    registries: DashMap<String, Arc<Registry>>,
    opts: RegistryOptions,
}

impl ScopeTable {
    pub fn new(opts: RegistryOptions) -> Self {
        Self {
            registries: DashMap::new(),
            opts,
        }
    }

    /// Registry for `scope`, created on first use. Concurrent callers always
    /// observe the same instance.
    pub fn get_or_create(&self, scope: &str) -> Result<Arc<Registry>> {
        if scope.trim().is_empty() {
            return Err(MetricsError::InvalidArgument("scope name must not be empty".into()));
        }
        if let Some(reg) = self.registries.get(scope) {
            return Ok(Arc::clone(reg.value()));
        }
        let reg = self
            .registries
            .entry(scope.to_string())
            .or_insert_with(|| {
                tracing::info!(%scope, "created metric registry scope");
                Arc::new(Registry::with_options(scope, self.opts.clone()))
            });
        Ok(Arc::clone(reg.value()))
    }

    pub fn get(&self, scope: &str) -> Option<Arc<Registry>> {
        self.registries.get(scope).map(|r| Arc::clone(r.value()))
    }

    pub fn application(&self) -> Result<Arc<Registry>> {
        self.get_or_create(APPLICATION_SCOPE)
    }

    /// Sorted scope names.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.registries.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Administrative removal. Handles already given out keep working but are
    /// no longer reachable through the table.
    pub fn remove(&self, scope: &str) -> Option<Arc<Registry>> {
        let removed = self.registries.remove(scope).map(|(_, r)| r);
        if removed.is_some() {
            tracing::info!(%scope, "dropped metric registry scope");
        }
        removed
    }

    pub(crate) fn clear(&self) {
        self.registries.clear();
    }
}
