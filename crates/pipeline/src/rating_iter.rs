//! Lazy traversal of a rating history into training pairs.
//!
//! `RatingIterator` is a reusable description of the traversal; each call to
//! `iter()` starts a fresh `TrainingPairs` pass with its own skip counter, so a
//! pass never observes state from an earlier one.

use crate::catalog::CatalogLookup;
use crate::error::{EncodingError, Result};
use crate::features::{FeatureEncoder, FeatureVector};
use data_loader::{MovieId, RatingRecord};
use std::collections::HashSet;
use std::slice;
use tracing::debug;

/// One encoded rating: the movie's features labelled with the user's stars
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingPair {
    pub movie_id: MovieId,
    pub features: FeatureVector,
    pub label: f64,
}

/// Restartable source of training pairs over one user's history
#[derive(Debug, Clone, Copy)]
pub struct RatingIterator<'a> {
    history: &'a [RatingRecord],
    catalog: &'a CatalogLookup<'a>,
    encoder: &'a FeatureEncoder,
}

impl<'a> RatingIterator<'a> {
    pub fn new(
        history: &'a [RatingRecord],
        catalog: &'a CatalogLookup<'a>,
        encoder: &'a FeatureEncoder,
    ) -> Self {
        Self {
            history,
            catalog,
            encoder,
        }
    }

    /// Start a new pass from the first rating
    pub fn iter(&self) -> TrainingPairs<'a> {
        TrainingPairs {
            ratings: self.history.iter(),
            catalog: self.catalog,
            encoder: self.encoder,
            skipped: 0,
        }
    }

    /// Number of ratings in the underlying history (resolvable or not)
    pub fn history_len(&self) -> usize {
        self.history.len()
    }
}

impl<'a> IntoIterator for &RatingIterator<'a> {
    type Item = Result<TrainingPair>;
    type IntoIter = TrainingPairs<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// A single pass over the history.
///
/// Ratings whose movie is not in the catalog are skipped and counted; pairs come
/// out in history order. An encoding failure is yielded as an `Err` item.
#[derive(Debug, Clone)]
pub struct TrainingPairs<'a> {
    ratings: slice::Iter<'a, RatingRecord>,
    catalog: &'a CatalogLookup<'a>,
    encoder: &'a FeatureEncoder,
    skipped: usize,
}

impl TrainingPairs<'_> {
    /// Ratings skipped so far in this pass
    pub fn skip_count(&self) -> usize {
        self.skipped
    }
}

impl Iterator for TrainingPairs<'_> {
    type Item = Result<TrainingPair>;

    fn next(&mut self) -> Option<Self::Item> {
        for rating in self.ratings.by_ref() {
            let Some(movie) = self.catalog.get(&rating.movie_id) else {
                self.skipped += 1;
                debug!("Skipping rating for unknown movie {}", rating.movie_id);
                continue;
            };
            return Some(self.encoder.encode(movie).map(|features| TrainingPair {
                movie_id: rating.movie_id.clone(),
                features,
                label: rating.stars,
            }));
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.ratings.size_hint().1)
    }
}

/// Materialized training data for one request
#[derive(Debug, Clone, Default)]
pub struct TrainingSet {
    pairs: Vec<TrainingPair>,
    skipped: usize,
}

impl TrainingSet {
    /// Drain one full pass of `ratings`, stopping at the first encoding failure
    pub fn collect(ratings: &RatingIterator<'_>) -> std::result::Result<Self, EncodingError> {
        let mut pass = ratings.iter();
        let mut pairs = Vec::with_capacity(ratings.history_len());
        for pair in pass.by_ref() {
            pairs.push(pair?);
        }
        let skipped = pass.skip_count();
        if skipped > 0 {
            debug!("Training set skipped {} unresolvable ratings", skipped);
        }
        Ok(Self { pairs, skipped })
    }

    pub fn pairs(&self) -> &[TrainingPair] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Ratings dropped because their movie was not in the catalog
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Number of distinct feature rows (exact equality)
    pub fn distinct_rows(&self) -> usize {
        self.pairs
            .iter()
            .map(|p| p.features.row_key())
            .collect::<HashSet<_>>()
            .len()
    }

    pub fn labels(&self) -> Vec<f64> {
        self.pairs.iter().map(|p| p.label).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_loader::MovieRecord;

    fn catalog() -> Vec<MovieRecord> {
        vec![
            MovieRecord::new("m1", "One", ["Drama"])
                .with_year(2000)
                .with_popularity(5.0),
            MovieRecord::new("m2", "Two", ["Comedy"])
                .with_year(2010)
                .with_popularity(50.0),
            MovieRecord::new("m3", "Three", ["Drama", "Comedy"])
                .with_year(2005)
                .with_popularity(0.0),
        ]
    }

    #[test]
    fn test_skips_unknown_movies_and_counts_them() {
        let movies = catalog();
        let lookup = CatalogLookup::new(&movies);
        let encoder = FeatureEncoder::for_movies(&movies);
        let history = vec![
            RatingRecord::new("m1", 4.0, 1),
            RatingRecord::new("gone", 2.0, 2),
            RatingRecord::new("m3", 3.5, 3),
        ];

        let ratings = RatingIterator::new(&history, &lookup, &encoder);
        let mut pass = ratings.iter();
        let pairs: Vec<TrainingPair> = pass.by_ref().collect::<Result<_>>().unwrap();

        assert_eq!(pairs.len(), history.len() - 1);
        assert_eq!(pass.skip_count(), 1);
        assert_eq!(pairs[0].movie_id, "m1");
        assert_eq!(pairs[1].movie_id, "m3");
        assert_eq!(pairs[1].label, 3.5);
    }

    #[test]
    fn test_restartable() {
        let movies = catalog();
        let lookup = CatalogLookup::new(&movies);
        let encoder = FeatureEncoder::for_movies(&movies);
        let history = vec![RatingRecord::new("m2", 5.0, 1), RatingRecord::new("nope", 1.0, 2)];
        let ratings = RatingIterator::new(&history, &lookup, &encoder);

        let mut first = ratings.iter();
        let first_pairs: Vec<_> = first.by_ref().collect();
        let mut second = ratings.iter();
        assert_eq!(second.skip_count(), 0);
        let second_pairs: Vec<_> = second.by_ref().collect();

        assert_eq!(first_pairs, second_pairs);
        assert_eq!(first.skip_count(), 1);
        assert_eq!(second.skip_count(), 1);
    }

    #[test]
    fn test_lazy_encoding_error_surfaces_in_order() {
        let mut movies = catalog();
        movies.push(MovieRecord::new("bad", "Bad", ["Drama"]).with_popularity(1.0));
        let lookup = CatalogLookup::new(&movies);
        let encoder = FeatureEncoder::for_movies(&movies);
        let history = vec![RatingRecord::new("m1", 4.0, 1), RatingRecord::new("bad", 2.0, 2)];
        let ratings = RatingIterator::new(&history, &lookup, &encoder);

        let mut pass = ratings.iter();
        assert!(pass.next().unwrap().is_ok());
        assert!(matches!(
            pass.next(),
            Some(Err(EncodingError::MissingField { field: "year", .. }))
        ));
        assert!(pass.next().is_none());

        assert!(TrainingSet::collect(&ratings).is_err());
    }

    #[test]
    fn test_training_set_distinct_rows() {
        let movies = catalog();
        let lookup = CatalogLookup::new(&movies);
        let encoder = FeatureEncoder::for_movies(&movies);
        let history = vec![
            RatingRecord::new("m1", 4.0, 1),
            RatingRecord::new("m1", 3.0, 2),
            RatingRecord::new("m2", 2.0, 3),
            RatingRecord::new("missing", 2.0, 4),
        ];
        let ratings = RatingIterator::new(&history, &lookup, &encoder);
        let set = TrainingSet::collect(&ratings).unwrap();

        assert_eq!(set.len(), 3);
        assert_eq!(set.distinct_rows(), 2);
        assert_eq!(set.skipped(), 1);
        assert_eq!(set.labels(), vec![4.0, 3.0, 2.0]);
    }
}
