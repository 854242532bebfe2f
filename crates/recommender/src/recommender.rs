//! # Recommender
//!
//! Per-request personalized ranking:
//! 1. Build a vocabulary and encoder from the catalog snapshot
//! 2. Encode the user's ratings into a training set (unknown movies skipped)
//! 3. Guard against degenerate data (fewer than 2 distinct rows)
//! 4. Fit a ridge model in closed form
//! 5. Score every unrated catalog movie with the same encoder
//! 6. Rank by score, then popularity, then id, and keep the top N
//!
//! Nothing survives a call: the vocabulary, encoder and fitted model are dropped
//! when it returns, so concurrent requests share no state.

use std::collections::HashSet;
use std::time::Instant;

use analytics::{genre_statistics, rmse, top_genres};
use data_loader::{MovieId, MovieRecord, RatingRecord};
use pipeline::{CatalogLookup, FeatureEncoder, RatingIterator, TrainingSet};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::config::RecommenderConfig;
use crate::error::{RecommendError, Result};
use crate::ranking::{rank_candidates, Recommendation, ScoredCandidate};
use crate::ridge::{fit_ridge, FittedModel};

/// Fewest distinct feature rows a fit accepts
pub const MIN_DISTINCT_ROWS: usize = 2;

/// How many favourite genres `recommend_by_genre` reports
pub const TOP_GENRE_COUNT: usize = 5;

/// Diagnostics of the model fitted for one request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitReport {
    pub n_samples: usize,
    pub n_features: usize,
    pub distinct_rows: usize,
    /// Ratings whose movie was not in the catalog
    pub skipped: usize,
    pub lambda: f64,
    /// Mean squared error on the training pairs
    pub mse: f64,
    /// Coefficient of determination; `None` when every label is identical
    pub r2: Option<f64>,
}

/// Ranked list plus the fit that produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationReport {
    pub recommendations: Vec<Recommendation>,
    pub fit: FitReport,
}

/// Best unrated movies within one of the user's favourite genres
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenrePicks {
    pub genre: String,
    /// The user's mean rating for the genre
    pub mean_rating: f64,
    /// Picks in overall rank order; `rank` is the position in the full list
    pub picks: Vec<Recommendation>,
}

/// A catalog movie and its cosine similarity to a target movie
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarMovie {
    pub movie_id: MovieId,
    pub similarity: f64,
}

/// Stateless entry point; holds only the request parameters
#[derive(Debug, Clone, Copy, Default)]
pub struct Recommender {
    config: RecommenderConfig,
}

/// Output of the shared fit-and-score phases
struct Scored {
    fit: FitReport,
    candidates: Vec<ScoredCandidate>,
}

impl Recommender {
    pub fn new(config: RecommenderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RecommenderConfig {
        &self.config
    }

    /// Top-N unrated movies for the user behind `history`
    pub fn recommend(
        &self,
        history: &[RatingRecord],
        catalog: &[MovieRecord],
    ) -> Result<Vec<Recommendation>> {
        self.recommend_with_report(history, catalog)
            .map(|report| report.recommendations)
    }

    /// Same as `recommend`, also returning the fit diagnostics
    #[instrument(skip_all, fields(history = history.len(), catalog = catalog.len()))]
    pub fn recommend_with_report(
        &self,
        history: &[RatingRecord],
        catalog: &[MovieRecord],
    ) -> Result<RecommendationReport> {
        let start = Instant::now();
        self.config.validate()?;

        let Scored { fit, candidates } = self.fit_and_score(history, catalog)?;
        let candidate_count = candidates.len();
        let recommendations = rank_candidates(candidates, self.config.top_n);

        info!(
            "Ranked {} of {} candidates from {} ratings in {:.2?}",
            recommendations.len(),
            candidate_count,
            fit.n_samples,
            start.elapsed()
        );
        Ok(RecommendationReport {
            recommendations,
            fit,
        })
    }

    /// Best `per_genre` unrated movies in each of the user's top genres.
    ///
    /// Genres are ordered by the user's mean rating (ties by name); a genre with
    /// no unrated movies yields an empty pick list.
    #[instrument(skip_all, fields(history = history.len(), per_genre = per_genre))]
    pub fn recommend_by_genre(
        &self,
        history: &[RatingRecord],
        catalog: &[MovieRecord],
        per_genre: usize,
    ) -> Result<Vec<GenrePicks>> {
        self.config.validate()?;
        if per_genre == 0 {
            return Err(RecommendError::InvalidArgument(
                "per_genre must be at least 1".to_string(),
            ));
        }

        let Scored { candidates, .. } = self.fit_and_score(history, catalog)?;
        let ranked = rank_candidates(candidates, usize::MAX);
        let lookup = CatalogLookup::new(catalog);
        let stats = genre_statistics(history, catalog)?;

        let picks = top_genres(&stats, TOP_GENRE_COUNT)
            .into_iter()
            .map(|genre| {
                let picks = ranked
                    .iter()
                    .filter(|r| lookup.get(&r.movie_id).is_some_and(|m| m.has_genre(&genre)))
                    .take(per_genre)
                    .cloned()
                    .collect();
                let mean_rating = stats.get(&genre).map(|s| s.mean).unwrap_or_default();
                GenrePicks {
                    genre,
                    mean_rating,
                    picks,
                }
            })
            .collect();
        Ok(picks)
    }

    /// Catalog movies closest to `target_id` by cosine similarity of their
    /// feature vectors, highest first (ties by id), at most `n`.
    #[instrument(skip(self, catalog), fields(catalog = catalog.len()))]
    pub fn similar_movies(
        &self,
        target_id: &str,
        catalog: &[MovieRecord],
        n: usize,
    ) -> Result<Vec<SimilarMovie>> {
        if n == 0 {
            return Err(RecommendError::InvalidArgument(
                "n must be at least 1".to_string(),
            ));
        }
        let lookup = CatalogLookup::new(catalog);
        let target = lookup.get(target_id).ok_or_else(|| {
            RecommendError::InvalidArgument(format!("movie {} is not in the catalog", target_id))
        })?;

        let encoder = FeatureEncoder::for_movies(lookup.movies());
        let target_features = encoder.encode(target)?;

        let mut similar = lookup
            .movies()
            .filter(|m| m.id != target.id)
            .map(|m| {
                Ok(SimilarMovie {
                    movie_id: m.id.clone(),
                    similarity: target_features.cosine(&encoder.encode(m)?),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        similar.sort_by(|a, b| {
            b.similarity
                .total_cmp(&a.similarity)
                .then_with(|| a.movie_id.cmp(&b.movie_id))
        });
        similar.truncate(n);
        Ok(similar)
    }

    /// Build, guard, fit and score phases shared by every ranking entry point
    fn fit_and_score(&self, history: &[RatingRecord], catalog: &[MovieRecord]) -> Result<Scored> {
        // Build phase: one encoder for training and scoring alike
        let lookup = CatalogLookup::new(catalog);
        let encoder = FeatureEncoder::for_movies(lookup.movies());
        let ratings = RatingIterator::new(history, &lookup, &encoder);
        let training = TrainingSet::collect(&ratings)?;
        debug!(
            "Built training set: {} pairs, {} skipped, {} features",
            training.len(),
            training.skipped(),
            encoder.dimension()
        );

        // Guard
        let distinct_rows = training.distinct_rows();
        if distinct_rows < MIN_DISTINCT_ROWS {
            return Err(RecommendError::InsufficientData {
                distinct_rows,
                required: MIN_DISTINCT_ROWS,
            });
        }

        // Fit phase
        let labels = training.labels();
        let model = fit_ridge(
            training.pairs().iter().map(|p| &p.features),
            &labels,
            self.config.lambda,
        )?;
        let fit = fit_report(&model, &training, distinct_rows)?;
        debug!("Fitted model: mse {:.4}, r2 {:?}", fit.mse, fit.r2);

        // Score phase: every catalog movie the user has not rated
        let rated: HashSet<&str> = history.iter().map(|r| r.movie_id.as_str()).collect();
        let candidates = lookup
            .movies()
            .filter(|m| !rated.contains(m.id.as_str()))
            .map(|m| {
                let features = encoder.encode(m)?;
                Ok(ScoredCandidate {
                    movie_id: m.id.clone(),
                    score: model.predict(&features),
                    popularity: m.popularity.unwrap_or_default(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        debug!("Scored {} unrated candidates", candidates.len());

        Ok(Scored { fit, candidates })
    }
}

/// Training-set error and R² for a fitted model
fn fit_report(
    model: &FittedModel,
    training: &TrainingSet,
    distinct_rows: usize,
) -> Result<FitReport> {
    let labels = training.labels();
    let predictions: Vec<f64> = training
        .pairs()
        .iter()
        .map(|p| model.predict(&p.features))
        .collect();

    let mse = rmse(&labels, &predictions)?.powi(2);
    let mean = labels.iter().sum::<f64>() / labels.len() as f64;
    let total: f64 = labels.iter().map(|y| (y - mean).powi(2)).sum();
    let r2 = (total > 0.0).then(|| 1.0 - mse * labels.len() as f64 / total);

    Ok(FitReport {
        n_samples: training.len(),
        n_features: model.feature_count(),
        distinct_rows,
        skipped: training.skipped(),
        lambda: model.lambda(),
        mse,
        r2,
    })
}

/// Convenience wrapper: rank `top_n` movies with penalty `lambda`
/// (default `DEFAULT_LAMBDA` when `None`)
pub fn recommend(
    history: &[RatingRecord],
    catalog: &[MovieRecord],
    top_n: usize,
    lambda: Option<f64>,
) -> Result<Vec<Recommendation>> {
    let mut config = RecommenderConfig::default().with_top_n(top_n);
    if let Some(lambda) = lambda {
        config = config.with_lambda(lambda);
    }
    Recommender::new(config).recommend(history, catalog)
}
