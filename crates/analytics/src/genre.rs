//! Genre and tag aggregation over a rating history.
//!
//! These helpers gather raw collections (stars per genre, movies per genre,
//! tag usage) that feed `summarize` and the chart-series builders.

use crate::error::Result;
use crate::stats::{summarize, StatSummary};
use data_loader::{normalize_genres, MovieRecord, RatingRecord};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Star values per genre for every rating whose movie is in `catalog`.
///
/// A rating counts once toward each genre of its movie. Ratings for unknown
/// movies are skipped.
pub fn genre_ratings(
    history: &[RatingRecord],
    catalog: &[MovieRecord],
) -> BTreeMap<String, Vec<f64>> {
    let by_id = first_by_id(catalog);

    let mut genre_stars: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for rating in history {
        if let Some(movie) = by_id.get(rating.movie_id.as_str()) {
            for genre in normalize_genres(&movie.genres) {
                genre_stars.entry(genre).or_default().push(rating.stars);
            }
        }
    }
    genre_stars
}

/// Id to record, first occurrence winning. Same rule as `pipeline::CatalogLookup`,
/// kept local since this crate sits below `pipeline`.
pub(crate) fn first_by_id(catalog: &[MovieRecord]) -> HashMap<&str, &MovieRecord> {
    let mut by_id = HashMap::with_capacity(catalog.len());
    for movie in catalog {
        by_id.entry(movie.id.as_str()).or_insert(movie);
    }
    by_id
}

/// `StatSummary` of the stars given within each genre
pub fn genre_statistics(
    history: &[RatingRecord],
    catalog: &[MovieRecord],
) -> Result<BTreeMap<String, StatSummary>> {
    let stats = genre_ratings(history, catalog)
        .into_iter()
        .map(|(genre, stars)| summarize(&stars).map(|summary| (genre, summary)))
        .collect::<Result<BTreeMap<_, _>>>()?;
    debug!("Summarized {} genres from {} ratings", stats.len(), history.len());
    Ok(stats)
}

/// Genres ordered by mean rating (highest first, ties by name), at most `limit`
pub fn top_genres(stats: &BTreeMap<String, StatSummary>, limit: usize) -> Vec<String> {
    let mut ranked: Vec<(&String, f64)> = stats.iter().map(|(g, s)| (g, s.mean)).collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked.into_iter().take(limit).map(|(g, _)| g.clone()).collect()
}

/// Number of catalog movies carrying each genre
pub fn genre_counts(catalog: &[MovieRecord]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for movie in catalog {
        for genre in normalize_genres(&movie.genres) {
            *counts.entry(genre).or_insert(0) += 1;
        }
    }
    counts
}

/// Number of ratings using each tag
pub fn tag_counts<'a, I>(ratings: I) -> BTreeMap<String, usize>
where
    I: IntoIterator<Item = &'a RatingRecord>,
{
    let mut counts = BTreeMap::new();
    for rating in ratings {
        for tag in &rating.tags {
            *counts.entry(tag.clone()).or_insert(0) += 1;
        }
    }
    counts
}
