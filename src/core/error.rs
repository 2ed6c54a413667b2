use thiserror::Error;

/// Errors surfaced by the metrics pipeline.
#[derive(Error, Debug)]
pub enum MetricError {
    #[error("invalid instrument name: {0}")]
    InvalidName(String),

    #[error("invalid instrument unit: {0}")]
    InvalidUnit(String),

    #[error("invalid instrument description: {0}")]
    InvalidDescription(String),

    #[error("invalid explicit bucket boundaries: {0}")]
    InvalidExplicitBucketBoundaries(String),

    #[error("meter {0} already exists with different attributes")]
    MeterExistsWithDifferentAttributes(String),

    #[error("instrument {0} already exists with the same name and identifying fields")]
    InstrumentExistsWithSameNameAndIdentifyingFields(String),

    #[error("metric reader is already attached to a meter provider")]
    MetricReaderAlreadyAttached,

    #[error("collect failed: no meter provider attached")]
    CollectFailedOnMissingMeterProvider,

    #[error("export failed: {0}")]
    ExportFailed(String),

    #[error("force flush timed out after {timeout_ms}ms")]
    ForceFlushTimedOut { timeout_ms: u64 },
}

/// Result type alias for metrics operations
pub type Result<T> = std::result::Result<T, MetricError>;

impl MetricError {
    /// Creates a new invalid-name error
    pub fn invalid_name<S: Into<String>>(msg: S) -> Self {
        Self::InvalidName(msg.into())
    }

    /// Creates a new invalid-unit error
    pub fn invalid_unit<S: Into<String>>(msg: S) -> Self {
        Self::InvalidUnit(msg.into())
    }

    /// Creates a new invalid-description error
    pub fn invalid_description<S: Into<String>>(msg: S) -> Self {
        Self::InvalidDescription(msg.into())
    }

    /// Creates a new invalid-boundaries error
    pub fn invalid_boundaries<S: Into<String>>(msg: S) -> Self {
        Self::InvalidExplicitBucketBoundaries(msg.into())
    }

    /// Creates a new export error
    pub fn export<S: Into<String>>(msg: S) -> Self {
        Self::ExportFailed(msg.into())
    }

    /// Returns true if this error is recoverable by retrying later
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::ExportFailed(_) | Self::ForceFlushTimedOut { .. })
    }

    /// Returns the error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidName(_)
            | Self::InvalidUnit(_)
            | Self::InvalidDescription(_)
            | Self::InvalidExplicitBucketBoundaries(_) => "validation",
            Self::MeterExistsWithDifferentAttributes(_)
            | Self::InstrumentExistsWithSameNameAndIdentifyingFields(_) => "identity",
            Self::MetricReaderAlreadyAttached | Self::CollectFailedOnMissingMeterProvider => {
                "reader"
            },
            Self::ExportFailed(_) => "export",
            Self::ForceFlushTimedOut { .. } => "timeout",
        }
    }
}
