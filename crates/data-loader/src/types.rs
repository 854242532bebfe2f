//! Core record types for the movie catalog and rating history.
//!
//! This module defines the fundamental data structures shared by every crate:
//! - Type aliases for identifiers (UserId, MovieId)
//! - `MovieRecord` and `RatingRecord`, the read-only inputs of the scoring core
//! - `Timestamps`, the created/updated pair embedded in stored records
//! - `DataIndex`, the in-memory store the CLI queries

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};

// =============================================================================
// Type Aliases
// =============================================================================

/// Unique identifier for a user
pub type UserId = u32;

/// Unique identifier for a movie.
///
/// Kept as a string so ranking tie-breaks order ids lexicographically.
pub type MovieId = String;

/// Lowest star value a rating may carry
pub const MIN_STARS: f64 = 0.5;

/// Highest star value a rating may carry
pub const MAX_STARS: f64 = 5.0;

// =============================================================================
// Timestamps
// =============================================================================

/// Creation and last-update instants (unix seconds) carried alongside a record's
/// identity fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timestamps {
    pub created_at: i64,
    pub updated_at: i64,
}

impl Timestamps {
    /// A record created and last touched at the same instant
    pub fn at(instant: i64) -> Self {
        Self {
            created_at: instant,
            updated_at: instant,
        }
    }

    /// Mark the record as updated at `instant`
    pub fn touch(&mut self, instant: i64) {
        self.updated_at = instant.max(self.created_at);
    }

    /// Whole days elapsed between creation and `now`.
    ///
    /// Returns 0 when `now` precedes the creation instant.
    pub fn age_days(&self, now: i64) -> i64 {
        (now - self.created_at).max(0) / 86_400
    }
}

// =============================================================================
// Movie
// =============================================================================

/// A catalog entry.
///
/// `year` and `popularity` are optional because source data can omit them; the
/// feature encoder rejects records missing either one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieRecord {
    pub id: MovieId,
    pub title: String,
    /// Normalized, de-duplicated genres in first-seen order
    pub genres: Vec<String>,
    pub year: Option<i32>,
    pub popularity: Option<f64>,
    pub runtime: Option<u32>,
    #[serde(default)]
    pub timestamps: Timestamps,
}

impl MovieRecord {
    /// Create a movie with no optional metadata.
    ///
    /// Genres go through `normalize_genres`, so duplicates and stray whitespace in
    /// source data are collapsed here.
    pub fn new<I, S>(id: impl Into<MovieId>, title: impl Into<String>, genres: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            id: id.into(),
            title: title.into(),
            genres: normalize_genres(genres),
            year: None,
            popularity: None,
            runtime: None,
            timestamps: Timestamps::default(),
        }
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn with_popularity(mut self, popularity: f64) -> Self {
        self.popularity = Some(popularity);
        self
    }

    pub fn with_runtime(mut self, runtime: u32) -> Self {
        self.runtime = Some(runtime);
        self
    }

    pub fn with_timestamps(mut self, timestamps: Timestamps) -> Self {
        self.timestamps = timestamps;
        self
    }

    /// Case-insensitive genre membership
    pub fn has_genre(&self, genre: &str) -> bool {
        let wanted = genre.trim().to_lowercase();
        self.genres.iter().any(|g| g.to_lowercase() == wanted)
    }

    /// Runtime formatted as `1h 49m`, or `None` when unknown
    pub fn display_runtime(&self) -> Option<String> {
        let minutes = self.runtime?;
        Some(match (minutes / 60, minutes % 60) {
            (0, m) => format!("{}m", m),
            (h, 0) => format!("{}h", h),
            (h, m) => format!("{}h {}m", h, m),
        })
    }
}

// =============================================================================
// Rating
// =============================================================================

/// A single rating in a user's history.
///
/// Immutable once created; the scoring core only reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingRecord {
    pub movie_id: MovieId,
    /// Star value in [0.5, 5.0]
    pub stars: f64,
    /// Lower-cased tags, kept sorted
    pub tags: BTreeSet<String>,
    /// Unix timestamp when the rating was made
    pub timestamp: i64,
}

impl RatingRecord {
    pub fn new(movie_id: impl Into<MovieId>, stars: f64, timestamp: i64) -> Self {
        Self {
            movie_id: movie_id.into(),
            stars,
            tags: BTreeSet::new(),
            timestamp,
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.tags = normalize_tags(tags);
        self
    }

    /// Whether the star value lies in the accepted range
    pub fn has_valid_stars(&self) -> bool {
        (MIN_STARS..=MAX_STARS).contains(&self.stars)
    }

    /// Star display such as `★★★½☆`
    pub fn star_display(&self) -> String {
        let full = self.stars.floor() as usize;
        let half = self.stars - self.stars.floor() >= 0.5;
        let empty = 5usize.saturating_sub(full + usize::from(half));
        let mut out = "★".repeat(full.min(5));
        if half {
            out.push('½');
        }
        out.push_str(&"☆".repeat(empty));
        out
    }
}

// =============================================================================
// Normalization helpers
// =============================================================================

/// Trim and title-case genres, dropping empties and keeping the first
/// occurrence of each.
///
/// Example: `[" sci-fi", "Drama", "drama"]` -> `["Sci-Fi", "Drama"]`
pub fn normalize_genres<I, S>(genres: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    genres
        .into_iter()
        .map(|g| title_case(g.as_ref().trim()))
        .filter(|g| !g.is_empty())
        .filter(|g| seen.insert(g.clone()))
        .collect()
}

/// Trim and lower-case tags into an ordered set
pub fn normalize_tags<I, S>(tags: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tags.into_iter()
        .map(|t| t.as_ref().trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Upper-case the first letter of every alphabetic run, lower-case the rest
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            // Apostrophes stay inside a word ("Children's")
            at_word_start = c != '\'';
        }
    }
    out
}

// =============================================================================
// DataIndex - the in-memory store
// =============================================================================

/// Holds the catalog and every user's rating history.
///
/// The catalog keeps file order so callers get a stable snapshot; `movie_positions`
/// gives O(1) lookups by id.
#[derive(Debug, Default)]
pub struct DataIndex {
    pub(crate) movies: Vec<MovieRecord>,
    pub(crate) movie_positions: HashMap<MovieId, usize>,
    /// Each user's ratings in insertion order
    pub(crate) user_ratings: HashMap<UserId, Vec<RatingRecord>>,
}

impl DataIndex {
    /// Creates a new, empty DataIndex
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a movie by ID
    pub fn get_movie(&self, id: &str) -> Option<&MovieRecord> {
        self.movie_positions.get(id).map(|&pos| &self.movies[pos])
    }

    /// The full catalog in load order
    pub fn catalog(&self) -> &[MovieRecord] {
        &self.movies
    }

    /// A user's rating history in load order.
    ///
    /// Returns an empty slice for unknown users.
    pub fn user_history(&self, user_id: UserId) -> &[RatingRecord] {
        self.user_ratings
            .get(&user_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Every user with at least one rating, ascending
    pub fn user_ids(&self) -> Vec<UserId> {
        let mut ids: Vec<UserId> = self.user_ratings.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Every rating in the index, grouped by user in ascending user order
    pub fn all_ratings(&self) -> Vec<&RatingRecord> {
        self.user_ids()
            .into_iter()
            .flat_map(|id| self.user_history(id))
            .collect()
    }

    /// Insert a movie; a record with an existing id replaces the old one in place
    pub fn insert_movie(&mut self, movie: MovieRecord) {
        match self.movie_positions.get(&movie.id) {
            Some(&pos) => self.movies[pos] = movie,
            None => {
                self.movie_positions.insert(movie.id.clone(), self.movies.len());
                self.movies.push(movie);
            }
        }
    }

    /// Append a rating to a user's history
    pub fn insert_rating(&mut self, user_id: UserId, rating: RatingRecord) {
        self.user_ratings.entry(user_id).or_default().push(rating);
    }

    /// (users, movies, ratings)
    pub fn counts(&self) -> (usize, usize, usize) {
        let total_ratings = self.user_ratings.values().map(|v| v.len()).sum();
        (self.user_ratings.len(), self.movies.len(), total_ratings)
    }
}
