//! Request parameters for the recommender.

use crate::error::{RecommendError, Result};
use serde::{Deserialize, Serialize};

/// Ridge penalty used when the caller does not pick one
pub const DEFAULT_LAMBDA: f64 = 1.0;

/// List length used when the caller does not pick one
pub const DEFAULT_TOP_N: usize = 10;

/// Tunables for one recommendation request.
///
/// Missing fields fall back to the defaults when deserialized.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommenderConfig {
    /// L2 penalty λ; must be finite and non-negative
    pub lambda: f64,
    /// Number of recommendations to return; must be at least 1
    pub top_n: usize,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            lambda: DEFAULT_LAMBDA,
            top_n: DEFAULT_TOP_N,
        }
    }
}

impl RecommenderConfig {
    pub fn with_lambda(mut self, lambda: f64) -> Self {
        self.lambda = lambda;
        self
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.top_n == 0 {
            return Err(RecommendError::InvalidArgument(
                "top_n must be at least 1".to_string(),
            ));
        }
        if !self.lambda.is_finite() || self.lambda < 0.0 {
            return Err(RecommendError::InvalidArgument(format!(
                "lambda must be a finite, non-negative number (got {})",
                self.lambda
            )));
        }
        Ok(())
    }
}
