//! Custom error types for feature pipelines.
//!
//! Errors split into two groups: fatal ones that abort `fit`/`transform`
//! (shape mismatches, use before fit, missing columns, bad configuration) and
//! [`FeatureError::NonNumeric`], which stages raise and the composite
//! transform recovers from locally by passing the column through.
//!
//! Errors are serializable so they can be reported as `{code, message}`.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for feature pipelines.
#[derive(Error, Debug)]
pub enum FeatureError {
    /// A wrapped transform returned a different number of columns than it received.
    #[error("Shape mismatch: expected {expected} output columns, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    /// A wrapped transform returned a different number of rows than it received.
    #[error("Row count mismatch in column '{column}': expected {expected} rows, got {actual}")]
    RowCountMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    /// A stateful stage or pipeline was used before `fit`.
    #[error("{0} is not fitted; call fit before transform")]
    NotFitted(String),

    /// Column was not found in the table.
    #[error("Column '{0}' not found in table")]
    ColumnNotFound(String),

    /// A table column reached a depth that has no sub-transform for it.
    #[error("No stage planned for column '{column}' at depth {depth}")]
    MissingStagePlan { column: String, depth: usize },

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The same feature name appears twice in the configuration.
    #[error("Feature '{0}' is configured more than once")]
    DuplicateFeature(String),

    /// A numeric stage received a column it cannot coerce to Float64.
    #[error("Column '{column}' has non-numeric dtype {dtype}")]
    NonNumeric { column: String, dtype: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML deserialization error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<FeatureError>,
    },
}

impl FeatureError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        FeatureError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Stable error code, independent of the message text.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ShapeMismatch { .. } => "SHAPE_MISMATCH",
            Self::RowCountMismatch { .. } => "ROW_COUNT_MISMATCH",
            Self::NotFitted(_) => "NOT_FITTED",
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::MissingStagePlan { .. } => "MISSING_STAGE_PLAN",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::DuplicateFeature(_) => "DUPLICATE_FEATURE",
            Self::NonNumeric { .. } => "NON_NUMERIC",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::Yaml(_) => "YAML_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if this is the locally recoverable non-numeric failure.
    ///
    /// Everything else aborts the pipeline.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::NonNumeric { .. } => true,
            Self::WithContext { source, .. } => source.is_recoverable(),
            _ => false,
        }
    }

    /// Check if this error aborts `fit`/`transform`.
    pub fn is_fatal(&self) -> bool {
        !self.is_recoverable()
    }

    /// Check if this error represents use of an unfitted stage or pipeline.
    pub fn is_not_fitted(&self) -> bool {
        match self {
            Self::NotFitted(_) => true,
            Self::WithContext { source, .. } => source.is_not_fitted(),
            _ => false,
        }
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for FeatureError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("FeatureError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for feature pipeline operations.
pub type Result<T> = std::result::Result<T, FeatureError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| FeatureError::Polars(e).with_context(context))
    }
}
