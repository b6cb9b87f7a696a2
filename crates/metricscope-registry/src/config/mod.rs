//! Registry config loader (strict parsing).

pub mod schema;

use std::fs;

use metricscope_core::error::{MetricsError, Result};

pub use schema::{HistogramSection, MetricsConfig, RegistrySection};

pub fn load_from_file(path: &str) -> Result<MetricsConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| MetricsError::Config(format!("read config failed ({path}): {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<MetricsConfig> {
    let cfg: MetricsConfig = serde_yaml::from_str(s)
        .map_err(|e| MetricsError::Config(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
