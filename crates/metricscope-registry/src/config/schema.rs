use std::collections::HashSet;

use serde::Deserialize;

use metricscope_core::error::{MetricsError, Result};
use metricscope_core::metric::{DEFAULT_PERCENTILES, DEFAULT_RESERVOIR_SIZE};
use metricscope_core::{Tag, Tags};

use crate::scope::{APPLICATION_SCOPE, BASE_SCOPE, VENDOR_SCOPE};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsConfig {
    pub version: u32,

    #[serde(default)]
    pub registry: RegistrySection,

    #[serde(default)]
    pub histogram: HistogramSection,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            version: 1,
            registry: RegistrySection::default(),
            histogram: HistogramSection::default(),
        }
    }
}

impl MetricsConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(MetricsError::UnsupportedVersion);
        }
        self.registry.validate()?;
        self.histogram.validate()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistrySection {
    /// Scopes created eagerly at startup.
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,

    /// `key=value` tags added to every metric id.
    #[serde(default)]
    pub global_tags: Vec<String>,
}

impl Default for RegistrySection {
    fn default() -> Self {
        Self {
            scopes: default_scopes(),
            global_tags: Vec::new(),
        }
    }
}

impl RegistrySection {
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for s in &self.scopes {
            if s.trim().is_empty() {
                return Err(MetricsError::Config("registry.scopes must not contain empty names".into()));
            }
            if !seen.insert(s.as_str()) {
                return Err(MetricsError::Config(format!("registry.scopes lists {s} twice")));
            }
        }
        self.compiled_global_tags()?;
        Ok(())
    }

    /// Global tags are validated strictly, unlike annotation tags.
    pub fn compiled_global_tags(&self) -> Result<Tags> {
        let mut tags = Tags::new();
        for raw in &self.global_tags {
            let (k, v) = raw.split_once('=').ok_or_else(|| {
                MetricsError::Config(format!("invalid registry.global_tags entry: {raw} (expected key=value)"))
            })?;
            let tag = Tag::new(k, v)
                .map_err(|e| MetricsError::Config(format!("invalid registry.global_tags entry {raw}: {e}")))?;
            tags.insert(tag);
        }
        Ok(tags)
    }
}

fn default_scopes() -> Vec<String> {
    vec![APPLICATION_SCOPE.into(), BASE_SCOPE.into(), VENDOR_SCOPE.into()]
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HistogramSection {
    #[serde(default = "default_reservoir_size")]
    pub reservoir_size: usize,

    #[serde(default = "default_percentiles")]
    pub percentiles: Vec<f64>,
}

impl Default for HistogramSection {
    fn default() -> Self {
        Self {
            reservoir_size: default_reservoir_size(),
            percentiles: default_percentiles(),
        }
    }
}

impl HistogramSection {
    pub fn validate(&self) -> Result<()> {
        if !(16..=65536).contains(&self.reservoir_size) {
            return Err(MetricsError::Config(
                "histogram.reservoir_size must be between 16 and 65536".into(),
            ));
        }
        if let Some(p) = self.percentiles.iter().find(|p| !(**p > 0.0 && **p <= 1.0)) {
            return Err(MetricsError::Config(format!(
                "histogram.percentiles entries must be in (0, 1], got {p}"
            )));
        }
        Ok(())
    }
}

fn default_reservoir_size() -> usize {
    DEFAULT_RESERVOIR_SIZE
}
fn default_percentiles() -> Vec<f64> {
    DEFAULT_PERCENTILES.to_vec()
}
