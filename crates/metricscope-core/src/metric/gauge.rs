use std::fmt;
use std::sync::{Arc, RwLock};

use serde::Serialize;

use crate::error::{BoxError, MetricsError, Result};

/// Value read from a gauge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Int(v) => v as f64,
            Number::Float(v) => v,
        }
    }

    /// Integer value, `None` for floats.
    pub fn as_i64(self) -> Option<i64> {
        match self {
            Number::Int(v) => Some(v),
            Number::Float(_) => None,
        }
    }
}

impl From<i64> for Number {
    fn from(v: i64) -> Self {
        Number::Int(v)
    }
}

impl From<i32> for Number {
    fn from(v: i32) -> Self {
        Number::Int(v.into())
    }
}

impl From<u32> for Number {
    fn from(v: u32) -> Self {
        Number::Int(v.into())
    }
}

impl From<f64> for Number {
    fn from(v: f64) -> Self {
        Number::Float(v)
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(v) => write!(f, "{v}"),
            Number::Float(v) => write!(f, "{v}"),
        }
    }
}

type Producer = Arc<dyn Fn() -> std::result::Result<Number, BoxError> + Send + Sync>;

/// Gauge backed by an external producer. Reading never mutates registry state.
pub struct Gauge {
    name: String,
    producer: RwLock<Producer>,
}

impl Gauge {
    /// Gauge over an infallible producer.
    pub fn new<F, N>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn() -> N + Send + Sync + 'static,
        N: Into<Number>,
    {
        Self::fallible(name, move || Ok(f().into()))
    }

    /// Gauge over a producer that may fail; failures surface from [`Gauge::value`].
    pub fn fallible<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn() -> std::result::Result<Number, BoxError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            producer: RwLock::new(Arc::new(f)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invoke the bound producer.
    pub fn value(&self) -> Result<Number> {
        // Clone the producer out so it runs without the lock held.
        let producer = match self.producer.read() {
            Ok(g) => Arc::clone(&g),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        };
        producer().map_err(|source| {
            tracing::debug!(gauge = %self.name, error = %source, "gauge producer failed");
            MetricsError::MetricEvaluation {
                name: self.name.clone(),
                source,
            }
        })
    }

    /// Replace the producer; the next read observes it.
    pub fn rebind<F, N>(&self, f: F)
    where
        F: Fn() -> N + Send + Sync + 'static,
        N: Into<Number>,
    {
        self.rebind_fallible(move || Ok(f().into()));
    }

    pub fn rebind_fallible<F>(&self, f: F)
    where
        F: Fn() -> std::result::Result<Number, BoxError> + Send + Sync + 'static,
    {
        let producer: Producer = Arc::new(f);
        match self.producer.write() {
            Ok(mut g) => *g = producer,
            Err(poisoned) => *poisoned.into_inner() = producer,
        }
    }
}

impl fmt::Debug for Gauge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gauge").field("name", &self.name).finish_non_exhaustive()
    }
}
