//! Feature encoding for catalog records.
//!
//! A movie becomes a fixed-length vector:
//!
//! ```text
//! [ genre_0 .. genre_{k-1} | year | popularity ]
//! ```
//!
//! - Genre slots are multi-hot over the request's `Vocabulary`
//! - Year is min-max normalized over the request's movies
//! - Popularity is `log1p(p) / log1p(max_p)`
//!
//! One `FeatureEncoder` is built per request and used for every vector in that
//! request, so all vectors share one layout and one set of normalization constants.

use crate::error::{EncodingError, Result};
use data_loader::{normalize_genres, MovieRecord};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// Number of non-genre slots appended after the genre block (year, popularity)
pub const NUMERIC_SLOTS: usize = 2;

// =============================================================================
// Vocabulary
// =============================================================================

/// Sorted, de-duplicated genre list defining the genre block of every vector.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Vocabulary {
    genres: Vec<String>,
    positions: HashMap<String, usize>,
}

impl Vocabulary {
    /// Union of the genres of `movies`, sorted lexicographically so the layout is
    /// reproducible for identical inputs regardless of record order.
    pub fn build<'a, I>(movies: I) -> Self
    where
        I: IntoIterator<Item = &'a MovieRecord>,
    {
        let genres: BTreeSet<String> = movies
            .into_iter()
            .flat_map(|m| normalize_genres(&m.genres))
            .collect();
        Self::from_genres(genres)
    }

    /// Vocabulary over an explicit genre list (normalized, sorted, de-duplicated)
    pub fn from_genres<I, S>(genres: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut genres = normalize_genres(genres);
        genres.sort();
        let positions = genres
            .iter()
            .enumerate()
            .map(|(idx, g)| (g.clone(), idx))
            .collect();
        Self { genres, positions }
    }

    pub fn len(&self) -> usize {
        self.genres.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genres.is_empty()
    }

    pub fn genres(&self) -> &[String] {
        &self.genres
    }

    /// Slot of `genre`, if it is part of the vocabulary
    pub fn index_of(&self, genre: &str) -> Option<usize> {
        self.positions.get(genre).copied()
    }
}

// =============================================================================
// Normalization constants
// =============================================================================

/// Per-request constants for the year and popularity slots
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Normalization {
    pub min_year: i32,
    pub max_year: i32,
    pub max_popularity: f64,
}

impl Normalization {
    /// Bounds over every record that carries the field; records lacking it are
    /// ignored here and rejected later by `encode`.
    pub fn from_movies<'a, I>(movies: I) -> Self
    where
        I: IntoIterator<Item = &'a MovieRecord>,
    {
        let mut years: Option<(i32, i32)> = None;
        let mut max_popularity = 0.0_f64;

        for movie in movies {
            if let Some(year) = movie.year {
                years = Some(match years {
                    Some((lo, hi)) => (lo.min(year), hi.max(year)),
                    None => (year, year),
                });
            }
            if let Some(p) = movie.popularity.filter(|p| p.is_finite()) {
                max_popularity = max_popularity.max(p);
            }
        }

        let (min_year, max_year) = years.unwrap_or((0, 0));
        Self {
            min_year,
            max_year,
            max_popularity,
        }
    }

    /// `(year - min) / (max - min)` clamped to [0, 1]; 0 when the range is empty
    pub fn year_slot(&self, year: i32) -> f64 {
        if self.max_year == self.min_year {
            return 0.0;
        }
        let span = f64::from(self.max_year) - f64::from(self.min_year);
        ((f64::from(year) - f64::from(self.min_year)) / span).clamp(0.0, 1.0)
    }

    /// `log1p(p) / log1p(max)` clamped to [0, 1]; 0 when max is 0
    pub fn popularity_slot(&self, popularity: f64) -> f64 {
        if self.max_popularity <= 0.0 {
            return 0.0;
        }
        (popularity.ln_1p() / self.max_popularity.ln_1p()).clamp(0.0, 1.0)
    }
}

// =============================================================================
// FeatureVector
// =============================================================================

/// Encoded movie: genre block followed by the year and popularity slots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector(Vec<f64>);

impl FeatureVector {
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn dot(&self, other: &[f64]) -> f64 {
        self.0.iter().zip(other).map(|(a, b)| a * b).sum()
    }

    pub fn norm(&self) -> f64 {
        self.dot(&self.0).sqrt()
    }

    /// Cosine similarity, 0 when either vector has zero norm
    pub fn cosine(&self, other: &FeatureVector) -> f64 {
        let denom = self.norm() * other.norm();
        if denom == 0.0 {
            0.0
        } else {
            self.dot(&other.0) / denom
        }
    }

    /// Bit patterns of every slot, usable as an exact-equality hash key
    pub fn row_key(&self) -> Vec<u64> {
        self.0.iter().map(|v| v.to_bits()).collect()
    }
}

// =============================================================================
// FeatureEncoder
// =============================================================================

/// Encodes catalog records against a fixed vocabulary and normalization.
#[derive(Debug, Clone)]
pub struct FeatureEncoder {
    vocabulary: Vocabulary,
    normalization: Normalization,
}

impl FeatureEncoder {
    pub fn new(vocabulary: Vocabulary, normalization: Normalization) -> Self {
        Self {
            vocabulary,
            normalization,
        }
    }

    /// Build the vocabulary and normalization constants from one pass over the
    /// request's movies (rated movies plus candidates).
    pub fn for_movies<'a, I>(movies: I) -> Self
    where
        I: IntoIterator<Item = &'a MovieRecord> + Clone,
    {
        let vocabulary = Vocabulary::build(movies.clone());
        let normalization = Normalization::from_movies(movies);
        debug!(
            "Encoder built: {} genres, years {}..={}, max popularity {:.2}",
            vocabulary.len(),
            normalization.min_year,
            normalization.max_year,
            normalization.max_popularity
        );
        Self::new(vocabulary, normalization)
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn normalization(&self) -> &Normalization {
        &self.normalization
    }

    /// Length of every vector this encoder produces
    pub fn dimension(&self) -> usize {
        self.vocabulary.len() + NUMERIC_SLOTS
    }

    /// Slot names in vector order, handy for explaining fitted weights
    pub fn slot_names(&self) -> Vec<String> {
        self.vocabulary
            .genres()
            .iter()
            .cloned()
            .chain(["year".to_string(), "popularity".to_string()])
            .collect()
    }

    /// Encode one movie.
    ///
    /// Fails when year or popularity is absent, or popularity is negative or
    /// non-finite. Genres outside the vocabulary are ignored.
    pub fn encode(&self, movie: &MovieRecord) -> Result<FeatureVector> {
        let year = movie.year.ok_or_else(|| EncodingError::MissingField {
            movie_id: movie.id.clone(),
            field: "year",
        })?;
        let popularity = movie.popularity.ok_or_else(|| EncodingError::MissingField {
            movie_id: movie.id.clone(),
            field: "popularity",
        })?;
        if !popularity.is_finite() || popularity < 0.0 {
            return Err(EncodingError::InvalidField {
                movie_id: movie.id.clone(),
                field: "popularity",
                value: popularity.to_string(),
            });
        }

        let mut values = vec![0.0; self.dimension()];
        for genre in normalize_genres(&movie.genres) {
            if let Some(slot) = self.vocabulary.index_of(&genre) {
                values[slot] = 1.0;
            }
        }
        let genre_block = self.vocabulary.len();
        values[genre_block] = self.normalization.year_slot(year);
        values[genre_block + 1] = self.normalization.popularity_slot(popularity);

        Ok(FeatureVector(values))
    }
}
