//! DataIndex loading and validation.
//!
//! Builds the in-memory store from the two data files and checks that every
//! rating points at a catalog entry.

use crate::error::{DataLoadError, Result};
use crate::parser;
use crate::types::*;
use std::path::Path;
use tracing::{debug, info};

impl DataIndex {
    /// Load the catalog and rating history from a directory holding
    /// `movies.dat` and `ratings.dat`.
    ///
    /// Steps:
    /// 1. Parse both files in parallel
    /// 2. Insert movies, then ratings (file order is preserved)
    /// 3. Validate that ratings reference known movies
    pub fn load_from_files(data_dir: &Path) -> Result<Self> {
        info!("Loading catalog from {:?}", data_dir);

        let movies_path = data_dir.join("movies.dat");
        let ratings_path = data_dir.join("ratings.dat");

        // Rayon's `join` runs the two parsers in parallel
        let (movies, ratings) = rayon::join(
            || parser::parse_movies(&movies_path),
            || parser::parse_ratings(&ratings_path),
        );
        let movies = movies?;
        let ratings = ratings?;

        debug!("Parsed {} movies, {} ratings", movies.len(), ratings.len());

        let mut index = DataIndex::new();
        for movie in movies {
            index.insert_movie(movie);
        }
        for (user_id, rating) in ratings {
            index.insert_rating(user_id, rating);
        }

        index.validate()?;

        let (users, movies, ratings) = index.counts();
        info!(
            "Loaded {} users, {} movies, {} ratings",
            users, movies, ratings
        );
        Ok(index)
    }

    /// Validate data integrity
    ///
    /// Check that:
    /// - every rating's movie_id exists in the catalog
    /// - every star value is within [0.5, 5.0]
    pub fn validate(&self) -> Result<()> {
        for rating in self.user_ratings.values().flatten() {
            if !self.movie_positions.contains_key(&rating.movie_id) {
                return Err(DataLoadError::MissingReference {
                    entity: "Movie".to_string(),
                    id: rating.movie_id.clone(),
                });
            }
            if !rating.has_valid_stars() {
                return Err(DataLoadError::InvalidValue {
                    field: "stars".to_string(),
                    value: rating.stars.to_string(),
                });
            }
        }
        Ok(())
    }
}
