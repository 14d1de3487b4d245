//! Error types for the basket-miner library.
//!
//! All fallible operations return [`BasketError`] through the crate-wide
//! [`Result`] alias. Mining errors (`EmptyInput`, `InvalidThreshold`,
//! `MetricUnavailable`, `InsufficientData`) are confined to the single
//! pipeline run that raised them; see [`BasketError::is_partition_local`].

use thiserror::Error;

/// The main error type for the basket-miner library.
#[derive(Error, Debug)]
pub enum BasketError {
    /// No transactions were supplied, so no vocabulary can be derived.
    #[error("Empty input: {0}")]
    EmptyInput(String),

    /// A support, confidence or metric threshold is outside its valid range.
    #[error("Invalid threshold for '{parameter}' ({value}): {reason}")]
    InvalidThreshold {
        /// Name of the offending parameter
        parameter: String,
        /// The rejected value
        value: f64,
        /// Why the value was rejected
        reason: String,
    },

    /// The requested rule metric is not one of the supported metrics.
    #[error("Metric '{metric}' is not available; expected one of support, confidence, lift, leverage, conviction")]
    MetricUnavailable {
        /// The metric name that was requested
        metric: String,
    },

    /// A partition has too few transactions or items to form any frequent itemset.
    #[error("Insufficient data in '{partition}': {message}")]
    InsufficientData {
        /// Name of the partition (a category label, or "global")
        partition: String,
        /// Detailed error message
        message: String,
    },

    /// Error from DataFusion operations.
    #[error("DataFusion error: {0}")]
    DataFusion(#[from] datafusion::error::DataFusionError),

    /// Error from Arrow operations.
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Error from data source operations.
    #[error("Data source error: {message}")]
    DataSource {
        /// Type of data source (e.g., "CSV", "Memory")
        source_type: String,
        /// Detailed error message
        message: String,
        /// Optional underlying error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Error from I/O operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error related to configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Error from serialization/deserialization operations.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Error when a required column is not found in the dataset.
    #[error("Column '{column}' not found in dataset")]
    ColumnNotFound { column: String },

    /// Generic internal error for unexpected conditions.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A type alias for `Result<T, BasketError>`.
pub type Result<T> = std::result::Result<T, BasketError>;

impl BasketError {
    /// Creates a new data source error.
    pub fn data_source(source_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DataSource {
            source_type: source_type.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new data source error with a source error.
    pub fn data_source_with_source(
        source_type: impl Into<String>,
        message: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::DataSource {
            source_type: source_type.into(),
            message: message.into(),
            source: Some(source),
        }
    }

    /// Creates a new invalid threshold error.
    pub fn invalid_threshold(
        parameter: impl Into<String>,
        value: f64,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidThreshold {
            parameter: parameter.into(),
            value,
            reason: reason.into(),
        }
    }

    /// Creates a new insufficient data error for the named partition.
    pub fn insufficient_data(partition: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InsufficientData {
            partition: partition.into(),
            message: message.into(),
        }
    }

    /// Returns true if this error only invalidates the pipeline run that raised it.
    ///
    /// Sibling category runs continue when such an error occurs; every other
    /// error (I/O, data source, schema) aborts the whole analysis.
    pub fn is_partition_local(&self) -> bool {
        matches!(
            self,
            Self::EmptyInput(_)
                | Self::InvalidThreshold { .. }
                | Self::MetricUnavailable { .. }
                | Self::InsufficientData { .. }
        )
    }
}

impl From<serde_json::Error> for BasketError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Extension trait for adding context to errors.
pub trait ErrorContext<T> {
    /// Adds context to an error.
    fn context(self, msg: &str) -> Result<T>;

    /// Adds context with a lazy message.
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<BasketError>,
{
    fn context(self, msg: &str) -> Result<T> {
        self.map_err(|e| match e.into() {
            BasketError::Internal(inner) => BasketError::Internal(format!("{msg}: {inner}")),
            other => BasketError::Internal(format!("{msg}: {other}")),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let msg = f();
            match e.into() {
                BasketError::Internal(inner) => BasketError::Internal(format!("{msg}: {inner}")),
                other => BasketError::Internal(format!("{msg}: {other}")),
            }
        })
    }
}
