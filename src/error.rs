use polars::prelude::PolarsError;
use thiserror::Error;

/// Errors raised while loading, splitting, vectorizing or classifying messages
#[derive(Debug, Error)]
pub enum SpamError {
    #[error("expected at least {expected} columns in the input file, found {found}")]
    MissingColumns { expected: usize, found: usize },

    #[error("row {row}: unrecognized label {value:?} (expected \"ham\" or \"spam\")")]
    UnknownLabel { row: usize, value: String },

    #[error("row {row}: missing value in column '{column}'")]
    MissingValue { row: usize, column: &'static str },

    #[error("test split fraction must be strictly between 0 and 1, got {0}")]
    InvalidSplitFraction(f64),

    #[error("cannot split {rows} rows with test fraction {fraction}: one side would be empty")]
    DatasetTooSmall { rows: usize, fraction: f64 },

    #[error("training split produced no tokens; sequence width would be zero")]
    EmptySequences,

    #[error("sequence width mismatch: classifier was trained on width {expected}, got {actual}")]
    SequenceWidthMismatch { expected: usize, actual: usize },

    #[error("vocabulary has {actual} embedding rows but the model was built for {expected}")]
    VocabularyMismatch { expected: usize, actual: usize },

    #[error("failed to read tensor data: {0}")]
    TensorData(String),

    #[error(transparent)]
    Polars(#[from] PolarsError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type SpamResult<T> = std::result::Result<T, SpamError>;
