//! Feature pipeline for the scoring core.
//!
//! This crate provides:
//! - `FeatureEncoder`, `Vocabulary` and `Normalization` for turning catalog
//!   records into fixed-length vectors
//! - `RatingIterator` for lazily pairing a user's ratings with those vectors
//! - `TrainingSet`, the materialized pairs for one request
//!
//! ## Example Usage
//! ```ignore
//! use pipeline::{CatalogLookup, FeatureEncoder, RatingIterator, TrainingSet};
//!
//! let lookup = CatalogLookup::new(&catalog);
//! let encoder = FeatureEncoder::for_movies(lookup.movies());
//! let ratings = RatingIterator::new(&history, &lookup, &encoder);
//! let training = TrainingSet::collect(&ratings)?;
//! println!("{} pairs, {} skipped", training.len(), training.skipped());
//! ```

pub mod catalog;
pub mod error;
pub mod features;
pub mod rating_iter;

pub use catalog::CatalogLookup;
pub use error::EncodingError;
pub use features::{FeatureEncoder, FeatureVector, Normalization, Vocabulary, NUMERIC_SLOTS};
pub use rating_iter::{RatingIterator, TrainingPair, TrainingPairs, TrainingSet};
