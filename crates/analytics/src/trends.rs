//! Rating activity over time, and how movie attributes relate to the ratings
//! they receive.

use crate::charts::SeriesPoint;
use crate::error::{Result, StatsError};
use crate::genre::first_by_id;
use crate::stats::pearson;
use chrono::{DateTime, NaiveDate};
use data_loader::{MovieRecord, RatingRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Fewest rated movies a correlation is reported for
pub const MIN_CORRELATION_MOVIES: usize = 3;

/// Ratings given on one calendar day
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DayActivity {
    pub count: usize,
    pub average: f64,
}

/// Pearson correlations between movie attributes and their mean rating
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingCorrelations {
    /// Distinct rated movies found in the catalog
    pub movies: usize,
    /// `None` with fewer than `MIN_CORRELATION_MOVIES` movies carrying a
    /// popularity, or when either side is constant
    pub popularity_rating: Option<f64>,
    /// Same rules as `popularity_rating`, over release years
    pub year_rating: Option<f64>,
}

/// UTC calendar day of a timestamp in Unix seconds
pub fn rating_day(timestamp: i64) -> Result<NaiveDate> {
    DateTime::from_timestamp(timestamp, 0)
        .map(|instant| instant.date_naive())
        .ok_or(StatsError::InvalidTimestamp(timestamp))
}

/// Per-day rating count and mean stars, in date order, labelled `YYYY-MM-DD`.
///
/// Only days with at least one rating appear.
pub fn ratings_timeline<'a, I>(ratings: I) -> Result<Vec<SeriesPoint<DayActivity>>>
where
    I: IntoIterator<Item = &'a RatingRecord>,
{
    let mut days: BTreeMap<NaiveDate, (usize, f64)> = BTreeMap::new();
    for rating in ratings {
        let day = days.entry(rating_day(rating.timestamp)?).or_insert((0, 0.0));
        day.0 += 1;
        day.1 += rating.stars;
    }
    debug!("Rating timeline spans {} active days", days.len());

    Ok(days
        .into_iter()
        .map(|(day, (count, total))| {
            let activity = DayActivity {
                count,
                average: total / count as f64,
            };
            SeriesPoint::new(day.format("%Y-%m-%d").to_string(), activity)
        })
        .collect())
}

/// Correlate popularity and release year with each rated movie's mean rating.
///
/// Ratings for movies missing from `catalog` are skipped.
pub fn rating_correlations<'a, I>(
    ratings: I,
    catalog: &[MovieRecord],
) -> Result<RatingCorrelations>
where
    I: IntoIterator<Item = &'a RatingRecord>,
{
    let by_id = first_by_id(catalog);

    // Keyed by id so the pairing order is stable
    let mut per_movie: BTreeMap<&str, (usize, f64)> = BTreeMap::new();
    for rating in ratings {
        if let Some((&id, _)) = by_id.get_key_value(rating.movie_id.as_str()) {
            let entry = per_movie.entry(id).or_insert((0, 0.0));
            entry.0 += 1;
            entry.1 += rating.stars;
        }
    }

    let mut popularity = (Vec::new(), Vec::new());
    let mut year = (Vec::new(), Vec::new());
    for (id, (count, total)) in &per_movie {
        let mean = total / *count as f64;
        let movie = by_id[id];
        if let Some(p) = movie.popularity {
            popularity.0.push(p);
            popularity.1.push(mean);
        }
        if let Some(y) = movie.year {
            year.0.push(f64::from(y));
            year.1.push(mean);
        }
    }

    let correlations = RatingCorrelations {
        movies: per_movie.len(),
        popularity_rating: correlate(&popularity.0, &popularity.1)?,
        year_rating: correlate(&year.0, &year.1)?,
    };
    debug!("Rating correlations: {:?}", correlations);
    Ok(correlations)
}

fn correlate(x: &[f64], y: &[f64]) -> Result<Option<f64>> {
    if x.len() < MIN_CORRELATION_MOVIES {
        return Ok(None);
    }
    match pearson(x, y) {
        Ok(r) => Ok(Some(r)),
        Err(StatsError::ZeroVariance) => Ok(None),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: i64 = 86_400;

    #[test]
    fn test_timeline_groups_by_utc_day_in_date_order() {
        let ratings = vec![
            RatingRecord::new("a", 4.0, DAY + 10),
            RatingRecord::new("b", 2.0, 0),
            RatingRecord::new("c", 3.0, DAY - 1),
            RatingRecord::new("d", 5.0, DAY * 2 + 5),
            RatingRecord::new("e", 3.0, DAY + 20),
        ];
        let timeline = ratings_timeline(&ratings).unwrap();

        let labels: Vec<&str> = timeline.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["1970-01-01", "1970-01-02", "1970-01-03"]);
        assert_eq!(timeline[0].value, DayActivity { count: 2, average: 2.5 });
        assert_eq!(timeline[1].value, DayActivity { count: 2, average: 3.5 });
        assert_eq!(timeline[2].value.count, 1);
    }

    #[test]
    fn test_timeline_edge_cases() {
        assert!(ratings_timeline(&Vec::<RatingRecord>::new()).unwrap().is_empty());
        assert_eq!(rating_day(978_300_760).unwrap().to_string(), "2000-12-31");

        let bad = vec![RatingRecord::new("a", 4.0, i64::MAX)];
        assert_eq!(ratings_timeline(&bad), Err(StatsError::InvalidTimestamp(i64::MAX)));
    }

    fn movie(id: &str, popularity: f64, year: i32) -> MovieRecord {
        MovieRecord::new(id, id, ["Drama"])
            .with_popularity(popularity)
            .with_year(year)
    }

    #[test]
    fn test_correlations_follow_mean_ratings() {
        let catalog = vec![
            movie("a", 10.0, 1990),
            movie("b", 20.0, 2000),
            movie("c", 30.0, 2010),
        ];
        let ratings = vec![
            RatingRecord::new("a", 2.0, 1),
            RatingRecord::new("b", 3.0, 2),
            RatingRecord::new("c", 4.0, 3),
            RatingRecord::new("c", 5.0, 4),
            RatingRecord::new("ghost", 1.0, 5),
        ];
        let result = rating_correlations(&ratings, &catalog).unwrap();

        assert_eq!(result.movies, 3);
        let popularity = result.popularity_rating.unwrap();
        let year = result.year_rating.unwrap();
        assert!(popularity > 0.99 && popularity <= 1.0);
        // Year is a linear function of popularity here
        assert!((popularity - year).abs() < 1e-9);
    }

    #[test]
    fn test_correlations_need_enough_varied_movies() {
        let two = vec![movie("a", 10.0, 1990), movie("b", 20.0, 2000)];
        let ratings = vec![RatingRecord::new("a", 2.0, 1), RatingRecord::new("b", 3.0, 2)];
        let result = rating_correlations(&ratings, &two).unwrap();
        assert_eq!(result.popularity_rating, None);
        assert_eq!(result.year_rating, None);

        let flat = vec![
            movie("a", 5.0, 1990),
            movie("b", 5.0, 2000),
            movie("c", 5.0, 2010),
        ];
        let ratings = vec![
            RatingRecord::new("a", 1.0, 1),
            RatingRecord::new("b", 3.0, 2),
            RatingRecord::new("c", 5.0, 3),
        ];
        let result = rating_correlations(&ratings, &flat).unwrap();
        assert_eq!(result.popularity_rating, None);
        assert!(result.year_rating.is_some_and(|r| (r - 1.0).abs() < 1e-9));
    }
}
