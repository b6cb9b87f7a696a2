//! Shared error type across metricscope crates.

use thiserror::Error;

/// Boxed error returned by gauge producers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Stable error codes (for callers that match on failures without caring
/// about the message).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Malformed identity, metadata or a negative counter delta.
    InvalidArgument,
    /// Metadata conflict on an existing metric name.
    DuplicateMetric,
    /// The metric backing a call site has been removed.
    MetricNotFound,
    /// A gauge producer failed.
    MetricEvaluation,
    /// Unsupported config version.
    UnsupportedVersion,
    /// Invalid configuration.
    Config,
    /// Internal error.
    Internal,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidArgument => "INVALID_ARGUMENT",
            ErrorCode::DuplicateMetric => "DUPLICATE_METRIC",
            ErrorCode::MetricNotFound => "METRIC_NOT_FOUND",
            ErrorCode::MetricEvaluation => "METRIC_EVALUATION",
            ErrorCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ErrorCode::Config => "CONFIG",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, MetricsError>;

/// Unified error type used by core and registry.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("duplicate metric {name}: {reason}")]
    DuplicateMetric { name: String, reason: String },
    #[error("metric not found: {0}")]
    MetricNotFound(String),
    #[error("gauge {name} evaluation failed: {source}")]
    MetricEvaluation {
        name: String,
        #[source]
        source: BoxError,
    },
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("config: {0}")]
    Config(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl MetricsError {
    pub fn code(&self) -> ErrorCode {
        match self {
            MetricsError::InvalidArgument(_) => ErrorCode::InvalidArgument,
            MetricsError::DuplicateMetric { .. } => ErrorCode::DuplicateMetric,
            MetricsError::MetricNotFound(_) => ErrorCode::MetricNotFound,
            MetricsError::MetricEvaluation { .. } => ErrorCode::MetricEvaluation,
            MetricsError::UnsupportedVersion => ErrorCode::UnsupportedVersion,
            MetricsError::Config(_) => ErrorCode::Config,
            MetricsError::Internal(_) => ErrorCode::Internal,
        }
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        MetricsError::InvalidArgument(msg.into())
    }
}
