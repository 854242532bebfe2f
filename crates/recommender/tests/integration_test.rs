//! Integration tests for the recommender.
//!
//! These run the full build, fit, score and rank path over a small synthetic
//! catalog where one user clearly prefers dramas over comedies.

use data_loader::{MovieRecord, RatingRecord};
use pipeline::EncodingError;
use recommender::{recommend, RecommendError, Recommender, RecommenderConfig};

fn movie(id: &str, genre: &str, year: i32, popularity: f64) -> MovieRecord {
    MovieRecord::new(id, format!("{} ({})", id, year), [genre])
        .with_year(year)
        .with_popularity(popularity)
}

/// Four dramas and four comedies; `dN` and `cN` share year and popularity so
/// only the genre tells them apart.
fn create_catalog() -> Vec<MovieRecord> {
    let mut catalog = Vec::new();
    for (n, (year, popularity)) in [(1990, 10.0), (1995, 25.0), (2000, 40.0), (2005, 80.0)]
        .into_iter()
        .enumerate()
    {
        catalog.push(movie(&format!("d{}", n + 1), "Drama", year, popularity));
        catalog.push(movie(&format!("c{}", n + 1), "Comedy", year, popularity));
    }
    catalog
}

fn drama_lover() -> Vec<RatingRecord> {
    vec![
        RatingRecord::new("d1", 5.0, 1_000),
        RatingRecord::new("d2", 4.5, 1_001),
        RatingRecord::new("d3", 5.0, 1_002),
        RatingRecord::new("c1", 1.0, 1_003),
        RatingRecord::new("c2", 1.5, 1_004),
        RatingRecord::new("c3", 1.0, 1_005),
    ]
}

#[test]
fn test_drama_lover_gets_drama_first() {
    let catalog = create_catalog();
    let recs = recommend(&drama_lover(), &catalog, 2, None).unwrap();

    assert_eq!(recs.len(), 2);
    assert_eq!(recs[0].movie_id, "d4");
    assert_eq!(recs[0].rank, 1);
    assert_eq!(recs[1].movie_id, "c4");
    assert_eq!(recs[1].rank, 2);
    assert!(recs[0].predicted_score > recs[1].predicted_score);
}

#[test]
fn test_only_unrated_movies_are_returned() {
    let catalog = create_catalog();
    let history = drama_lover();
    let recs = recommend(&history, &catalog, 10, Some(0.5)).unwrap();

    // 8 movies, 6 rated
    assert_eq!(recs.len(), 2);
    for rec in &recs {
        assert!(history.iter().all(|r| r.movie_id != rec.movie_id));
    }
}

#[test]
fn test_identical_requests_give_identical_lists() {
    let catalog = create_catalog();
    let history = drama_lover();
    let recommender = Recommender::new(RecommenderConfig::default().with_top_n(5));

    let first = recommender.recommend(&history, &catalog).unwrap();
    let second = recommender.recommend(&history, &catalog).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_single_distinct_movie_is_insufficient() {
    let catalog = create_catalog();
    let history = vec![RatingRecord::new("d1", 5.0, 1_000)];

    let err = recommend(&history, &catalog, 5, None).unwrap_err();
    assert_eq!(
        err,
        RecommendError::InsufficientData {
            distinct_rows: 1,
            required: 2
        }
    );
}

#[test]
fn test_identical_feature_rows_are_insufficient() {
    let catalog = vec![
        movie("a", "Drama", 2000, 5.0),
        movie("b", "Drama", 2000, 5.0),
        movie("c", "Comedy", 2010, 9.0),
    ];
    let history = vec![RatingRecord::new("a", 4.0, 1), RatingRecord::new("b", 2.0, 2)];

    assert!(matches!(
        recommend(&history, &catalog, 5, None),
        Err(RecommendError::InsufficientData { distinct_rows: 1, .. })
    ));
}

#[test]
fn test_invalid_parameters_are_rejected() {
    let catalog = create_catalog();
    let history = drama_lover();

    assert!(matches!(
        recommend(&history, &catalog, 0, None),
        Err(RecommendError::InvalidArgument(_))
    ));
    assert!(matches!(
        recommend(&history, &catalog, 5, Some(-1.0)),
        Err(RecommendError::InvalidArgument(_))
    ));
}

#[test]
fn test_report_counts_skipped_ratings() {
    let catalog = create_catalog();
    let mut history = drama_lover();
    history.push(RatingRecord::new("ghost", 3.0, 2_000));

    let report = Recommender::default()
        .recommend_with_report(&history, &catalog)
        .unwrap();

    assert_eq!(report.fit.n_samples, 6);
    assert_eq!(report.fit.skipped, 1);
    assert_eq!(report.fit.distinct_rows, 6);
    // Drama, Comedy, year, popularity
    assert_eq!(report.fit.n_features, 4);
    assert_eq!(report.fit.lambda, 1.0);
    assert!(report.fit.mse >= 0.0);
    assert!(report.fit.r2.is_some_and(|r2| r2 > 0.5));
}

#[test]
fn test_broken_candidate_fails_the_request() {
    let mut catalog = create_catalog();
    catalog.push(MovieRecord::new("broken", "Broken", ["Drama"]).with_year(2001));

    let err = recommend(&drama_lover(), &catalog, 5, None).unwrap_err();
    assert_eq!(
        err,
        RecommendError::Encoding(EncodingError::MissingField {
            movie_id: "broken".to_string(),
            field: "popularity",
        })
    );
}

#[test]
fn test_genre_picks_follow_user_preference() {
    let catalog = create_catalog();
    let picks = Recommender::default()
        .recommend_by_genre(&drama_lover(), &catalog, 3)
        .unwrap();

    let genres: Vec<&str> = picks.iter().map(|p| p.genre.as_str()).collect();
    assert_eq!(genres, vec!["Drama", "Comedy"]);
    assert!((picks[0].mean_rating - 14.5 / 3.0).abs() < 1e-9);
    assert_eq!(picks[0].picks.len(), 1);
    assert_eq!(picks[0].picks[0].movie_id, "d4");
    assert_eq!(picks[1].picks[0].movie_id, "c4");
    assert_eq!(picks[1].picks[0].rank, 2);
}

#[test]
fn test_similar_movies_prefer_same_genre() {
    let catalog = create_catalog();
    let similar = Recommender::default()
        .similar_movies("d4", &catalog, 3)
        .unwrap();

    assert_eq!(similar.len(), 3);
    assert!(similar.iter().all(|s| s.movie_id != "d4"));
    assert!(similar[0].movie_id.starts_with('d'));
    assert!(similar
        .windows(2)
        .all(|w| w[0].similarity >= w[1].similarity));
}

#[test]
fn test_similar_movies_rejects_unknown_target() {
    let catalog = create_catalog();
    assert!(matches!(
        Recommender::default().similar_movies("nope", &catalog, 3),
        Err(RecommendError::InvalidArgument(_))
    ));
    assert!(matches!(
        Recommender::default().similar_movies("d1", &catalog, 0),
        Err(RecommendError::InvalidArgument(_))
    ));
}

#[test]
fn test_recommendations_serialize_for_callers() {
    let recs = recommend(&drama_lover(), &create_catalog(), 1, None).unwrap();
    let json = serde_json::to_value(&recs).unwrap();
    assert_eq!(json[0]["movie_id"], "d4");
    assert_eq!(json[0]["rank"], 1);
}
