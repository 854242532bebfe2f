//! # Recommender Crate
//!
//! Per-user ridge regression over movie feature vectors, refitted from scratch
//! on every request.
//!
//! ## Components
//!
//! - **config**: `RecommenderConfig` (λ and list length) with validation
//! - **ridge**: closed-form ridge fit, `FittedModel`
//! - **ranking**: deterministic ordering of scored candidates
//! - **recommender**: the `Recommender` entry points
//!
//! ## Example Usage
//!
//! ```ignore
//! use recommender::{Recommender, RecommenderConfig, RecommendError};
//!
//! let recommender = Recommender::new(RecommenderConfig::default().with_top_n(5));
//! match recommender.recommend(index.user_history(42), index.catalog()) {
//!     Ok(list) => {
//!         for rec in list {
//!             println!("#{} {} ({:.2})", rec.rank, rec.movie_id, rec.predicted_score);
//!         }
//!     }
//!     Err(RecommendError::InsufficientData { .. }) => { /* fall back to popular movies */ }
//!     Err(e) => return Err(e.into()),
//! }
//! ```
//!
//! No state is kept between calls; a `Recommender` can be shared freely
//! across threads.

pub mod config;
pub mod error;
pub mod ranking;
pub mod recommender;
pub mod ridge;

pub use config::{RecommenderConfig, DEFAULT_LAMBDA, DEFAULT_TOP_N};
pub use error::{RecommendError, Result};
pub use ranking::{compare_candidates, rank_candidates, Recommendation, ScoredCandidate};
pub use recommender::{
    recommend, FitReport, GenrePicks, RecommendationReport, Recommender, SimilarMovie,
    MIN_DISTINCT_ROWS, TOP_GENRE_COUNT,
};
pub use ridge::{fit_ridge, FittedModel};
