//! Deterministic ranking of scored candidates.

use data_loader::MovieId;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Final recommendation returned to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub movie_id: MovieId,
    pub predicted_score: f64,
    /// 1-based position in the ranked list
    pub rank: usize,
}

/// A candidate with its model score, before ranking
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub movie_id: MovieId,
    pub score: f64,
    pub popularity: f64,
}

/// Ordering used for every ranked list:
/// 1. predicted score, descending
/// 2. popularity, descending
/// 3. movie id, ascending (lexicographic)
pub fn compare_candidates(a: &ScoredCandidate, b: &ScoredCandidate) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| b.popularity.total_cmp(&a.popularity))
        .then_with(|| a.movie_id.cmp(&b.movie_id))
}

/// Sort, truncate to `top_n` and assign ranks starting at 1
pub fn rank_candidates(mut candidates: Vec<ScoredCandidate>, top_n: usize) -> Vec<Recommendation> {
    candidates.sort_by(compare_candidates);
    candidates
        .into_iter()
        .take(top_n)
        .enumerate()
        .map(|(idx, c)| Recommendation {
            movie_id: c.movie_id,
            predicted_score: c.score,
            rank: idx + 1,
        })
        .collect()
}
