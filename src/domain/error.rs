// ============================================================
// Layer 3 — Domain Errors
// ============================================================
// Typed failures raised by the pure pipeline stages (table
// manipulation, encoding, training, evaluation).
//
// IO-heavy layers (loader, storage, use cases) wrap these in
// anyhow with extra context; tests match on the variants.

use polars::prelude::PolarsError;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum PipelineError {
    /// A column the pipeline depends on is not in the table
    #[error("column '{0}' not found")]
    MissingColumn(String),

    #[error("column '{0}' appears more than once")]
    DuplicateColumn(String),

    /// A numeric column was required but the column holds text
    #[error("column '{0}' is not numeric")]
    NotNumeric(String),

    #[error("missing value in column '{column}' at row {row}")]
    MissingValue { column: String, row: usize },

    /// ln(count) is undefined for non-positive counts
    #[error("target value {value} at row {row} must be positive to take its logarithm")]
    NonPositiveTarget { row: usize, value: f64 },

    /// A category level that the fitted encoder never saw
    #[error("column '{column}' has level '{level}' that was not seen during fitting")]
    UnseenCategory { column: String, level: String },

    #[error("invalid model name '{0}' (supported: random_forest_regressor)")]
    InvalidModel(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("empty input: {0}")]
    EmptyInput(&'static str),

    #[error("length mismatch: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },

    #[error("feature count mismatch: model expects {expected}, got {found}")]
    FeatureMismatch { expected: usize, found: usize },

    /// A persisted model whose structure cannot be walked safely
    #[error("corrupt model: {0}")]
    CorruptModel(String),

    #[error("table operation failed: {0}")]
    Polars(String),
}

impl From<PolarsError> for PipelineError {
    fn from(e: PolarsError) -> Self {
        Self::Polars(e.to_string())
    }
}

pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
