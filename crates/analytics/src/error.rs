//! Error types for the statistics engine.

use thiserror::Error;

/// Failures of the descriptive-statistics helpers.
///
/// No helper falls back to a default value (such as 0.0 for an undefined mean);
/// each of these is returned to the caller instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StatsError {
    /// Statistics requested over an empty collection
    #[error("Cannot compute statistics over an empty collection")]
    EmptyInput,

    /// Bucket boundaries are too few, unordered or non-finite
    #[error("Invalid bucket boundaries: {reason}")]
    InvalidBoundary { reason: String },

    /// Paired inputs differ in length
    #[error("Length mismatch: {left} values vs {right} values")]
    LengthMismatch { left: usize, right: usize },

    /// NaN or infinity in the input
    #[error("Non-finite value {value} at position {index}")]
    NonFiniteValue { index: usize, value: f64 },

    /// NaN or infinity as the score being ranked
    #[error("Non-finite score {0}")]
    NonFiniteScore(f64),

    /// Fewer values than the statistic is defined for
    #[error("Need at least {required} values, got {actual}")]
    TooFewValues { required: usize, actual: usize },

    /// Correlation requested against a constant series
    #[error("Correlation is undefined for a constant series")]
    ZeroVariance,

    /// Rating timestamp outside the representable calendar range
    #[error("Timestamp {0} is out of range")]
    InvalidTimestamp(i64),
}

pub type Result<T> = std::result::Result<T, StatsError>;
