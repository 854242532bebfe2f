//! # Analytics Crate
//!
//! Descriptive statistics and chart-series builders over raw numeric
//! collections (ratings, popularity, runtime) and genre/tag aggregates.
//!
//! ## Components
//!
//! - **stats**: `summarize`, `bucket`, percentiles, weighted rating, RMSE, Pearson
//! - **genre**: per-genre star collections and summaries, tag usage
//! - **charts**: `(label, value)` series ready for external rendering
//! - **trends**: per-day rating timeline, attribute/rating correlations
//!
//! ## Example Usage
//!
//! ```ignore
//! use analytics::{build_series, genre_counts, summarize};
//!
//! let summary = summarize(&[3.0, 3.0, 3.0, 5.0, 5.0])?;
//! assert_eq!(summary.median, 3.0);
//!
//! let series = build_series(genre_counts(&catalog), 8);
//! ```
//!
//! Every function is pure; callers supply an immutable snapshot.

pub mod charts;
pub mod error;
pub mod genre;
pub mod stats;
pub mod trends;

pub use charts::{build_series, histogram_series, metric_series, Metric, SeriesPoint};
pub use error::{Result, StatsError};
pub use genre::{genre_counts, genre_ratings, genre_statistics, tag_counts, top_genres};
pub use stats::{
    bucket, pearson, percentile_of_score, rating_distribution, rmse, summarize, weighted_rating,
    BucketCount, StatSummary, RATING_BOUNDARIES,
};
pub use trends::{
    rating_correlations, rating_day, ratings_timeline, DayActivity, RatingCorrelations,
    MIN_CORRELATION_MOVIES,
};
