//! Error types for feature encoding.

use data_loader::MovieId;
use thiserror::Error;

/// A catalog record could not be turned into a feature vector.
///
/// Raised to the caller as-is; missing metadata is never silently defaulted.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EncodingError {
    /// A field the encoder needs is absent
    #[error("Movie {movie_id} is missing required field `{field}`")]
    MissingField { movie_id: MovieId, field: &'static str },

    /// A field is present but unusable (negative or non-finite)
    #[error("Movie {movie_id} has invalid {field}: {value}")]
    InvalidField {
        movie_id: MovieId,
        field: &'static str,
        value: String,
    },
}

pub type Result<T> = std::result::Result<T, EncodingError>;
