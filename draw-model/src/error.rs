use thiserror::Error;

/// Errors raised while constructing or validating the plain data types in
/// this crate. Nothing in here does I/O; these are shape/invariant
/// violations caught at construction time.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("issue must be exactly 7 ASCII digits, got {0:?}")]
    InvalidIssue(String),

    #[error("open_nums must match ^\\d+\\+\\d+\\+\\d+$ with digits 0-9, got {0:?}")]
    InvalidNumbers(String),

    #[error("declared sum {declared} does not match digit sum {computed}")]
    SumMismatch { declared: u8, computed: u8 },

    #[error("sum {0} is out of range 0..=27")]
    SumOutOfRange(u8),

    #[error("unrecognized predicted value {0:?} for prediction type {1:?}")]
    InvalidPredictedValue(String, crate::prediction::PredictionType),
}

pub type Result<T> = std::result::Result<T, ModelError>;
