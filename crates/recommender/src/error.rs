//! Error types for the recommender.

use analytics::StatsError;
use pipeline::EncodingError;
use thiserror::Error;

/// Everything that can stop a recommendation request.
///
/// All variants are raised synchronously and none are retried internally.
/// Callers are expected to catch `InsufficientData` and substitute their own
/// non-personalized list.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecommendError {
    /// A rated or candidate movie could not be encoded
    #[error(transparent)]
    Encoding(#[from] EncodingError),

    /// Too few distinct feature rows for a meaningful fit
    #[error("Insufficient data: {distinct_rows} distinct training rows, need at least {required}")]
    InsufficientData { distinct_rows: usize, required: usize },

    /// A request parameter is out of range
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The regression system could not be solved
    #[error("Fit failed: {0}")]
    Fit(String),

    /// A statistics helper rejected its input
    #[error(transparent)]
    Stats(#[from] StatsError),
}

pub type Result<T> = std::result::Result<T, RecommendError>;
