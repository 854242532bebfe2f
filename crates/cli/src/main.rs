use analytics::{
    build_series, genre_counts, genre_statistics, histogram_series, rating_correlations,
    rating_distribution, ratings_timeline, summarize, tag_counts, DayActivity,
    RatingCorrelations, SeriesPoint, StatSummary,
};
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use data_loader::{DataIndex, MovieRecord, RatingRecord, UserId};
use recommender::{
    FitReport, GenrePicks, Recommendation, RecommendError, Recommender, RecommenderConfig,
    DEFAULT_LAMBDA,
};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::{debug, warn};

/// CineSense - per-user movie recommendations and rating analytics
#[derive(Parser)]
#[command(name = "cinesense")]
#[command(about = "Movie recommendations via per-user ridge regression", long_about = None)]
struct Cli {
    /// Directory holding movies.dat and ratings.dat
    #[arg(short, long, default_value = "data")]
    data_dir: PathBuf,

    /// Print JSON instead of formatted text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Get movie recommendations for a user
    Recommend {
        /// User ID to get recommendations for
        #[arg(long)]
        user_id: UserId,

        /// Number of recommendations to return
        #[arg(long, default_value = "10")]
        limit: usize,

        /// Ridge penalty
        #[arg(long, default_value_t = DEFAULT_LAMBDA)]
        lambda: f64,

        /// Show the fit report and per-genre picks
        #[arg(long)]
        explain: bool,
    },

    /// Show rating statistics for one user or the whole dataset
    Stats {
        /// Restrict statistics to this user
        #[arg(long)]
        user_id: Option<UserId>,
    },

    /// Print a chart-ready series
    Chart {
        /// Which series to build
        #[arg(long, value_enum)]
        kind: ChartKind,

        /// Keep only the K largest entries (the K most recent days for timeline)
        #[arg(long, default_value = "10")]
        top: usize,
    },

    /// Find movies with the most similar features
    Similar {
        /// Movie ID to compare against
        #[arg(long)]
        movie_id: String,

        /// Number of movies to return
        #[arg(long, default_value = "10")]
        limit: usize,
    },

    /// Run benchmark to test performance
    Benchmark {
        /// Number of requests to make
        #[arg(long, default_value = "100")]
        requests: usize,

        /// Number of concurrent requests
        #[arg(long, default_value = "10")]
        concurrent: usize,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ChartKind {
    /// Movies per genre
    Genres,
    /// Ratings per tag
    Tags,
    /// Ratings per star bucket
    Ratings,
    /// Ratings count and mean stars per day
    Timeline,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    // Load the snapshot once; every command works on it read-only
    if !cli.json {
        println!("Loading dataset from {}...", cli.data_dir.display());
    }
    let start = Instant::now();
    let data_index = Arc::new(
        DataIndex::load_from_files(&cli.data_dir).context("Failed to load dataset")?,
    );
    if !cli.json {
        println!("{} Loaded dataset in {:?}", "✓".green(), start.elapsed());
    }

    match cli.command {
        Commands::Recommend {
            user_id,
            limit,
            lambda,
            explain,
        } => handle_recommend(&data_index, user_id, limit, lambda, explain, cli.json)?,
        Commands::Stats { user_id } => handle_stats(&data_index, user_id, cli.json)?,
        Commands::Chart { kind, top } => handle_chart(&data_index, kind, top, cli.json)?,
        Commands::Similar { movie_id, limit } => {
            handle_similar(&data_index, &movie_id, limit, cli.json)?
        }
        Commands::Benchmark {
            requests,
            concurrent,
        } => handle_benchmark(data_index, requests, concurrent).await?,
    }

    Ok(())
}

/// Handle the 'recommend' command
fn handle_recommend(
    data_index: &DataIndex,
    user_id: UserId,
    limit: usize,
    lambda: f64,
    explain: bool,
    json: bool,
) -> Result<()> {
    let history = data_index.user_history(user_id);
    if history.is_empty() {
        return Err(anyhow!("User {} has no ratings", user_id));
    }

    let config = RecommenderConfig::default()
        .with_top_n(limit)
        .with_lambda(lambda);
    let recommender = Recommender::new(config);

    let report = match recommender.recommend_with_report(history, data_index.catalog()) {
        Ok(report) => report,
        Err(RecommendError::InsufficientData { distinct_rows, .. }) => {
            warn!(
                "User {} has only {} distinct rated profiles, falling back to popular movies",
                user_id, distinct_rows
            );
            let fallback = popular_unrated(data_index.catalog(), history, limit);
            if json {
                println!("{}", serde_json::to_string_pretty(&fallback)?);
            } else {
                println!(
                    "{}",
                    "Not enough rating variety for a personal model; most popular unrated movies:"
                        .yellow()
                );
                print_recommendations(data_index, &fallback, "Popularity");
            }
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let picks = if explain {
        recommender.recommend_by_genre(history, data_index.catalog(), 3)?
    } else {
        Vec::new()
    };

    if json {
        let value = serde_json::json!({
            "user_id": user_id,
            "recommendations": report.recommendations,
            "fit": explain.then_some(&report.fit),
            "genre_picks": explain.then_some(&picks),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("{}", format!("Recommendations for user {}:", user_id).bold().blue());
    print_recommendations(data_index, &report.recommendations, "Score");
    if explain {
        print_fit_report(&report.fit);
        print_genre_picks(data_index, &picks);
    }
    Ok(())
}

/// Most popular catalog movies the user has not rated, ranked like model output
fn popular_unrated(
    catalog: &[MovieRecord],
    history: &[RatingRecord],
    limit: usize,
) -> Vec<Recommendation> {
    let rated: HashSet<&str> = history.iter().map(|r| r.movie_id.as_str()).collect();
    let mut unrated: Vec<&MovieRecord> = catalog
        .iter()
        .filter(|m| !rated.contains(m.id.as_str()))
        .collect();
    unrated.sort_by(|a, b| {
        let (pa, pb) = (a.popularity.unwrap_or_default(), b.popularity.unwrap_or_default());
        pb.total_cmp(&pa).then_with(|| a.id.cmp(&b.id))
    });

    unrated
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(idx, m)| Recommendation {
            movie_id: m.id.clone(),
            predicted_score: m.popularity.unwrap_or_default(),
            rank: idx + 1,
        })
        .collect()
}

/// Handle the 'stats' command
fn handle_stats(data_index: &DataIndex, user_id: Option<UserId>, json: bool) -> Result<()> {
    let ratings: Vec<RatingRecord> = match user_id {
        Some(id) => data_index.user_history(id).to_vec(),
        None => data_index.all_ratings().into_iter().cloned().collect(),
    };
    if ratings.is_empty() {
        return Err(anyhow!("No ratings to summarize"));
    }

    let stars: Vec<f64> = ratings.iter().map(|r| r.stars).collect();
    let summary = summarize(&stars)?;
    let distribution = histogram_series(&rating_distribution(&stars)?);
    let genres = genre_statistics(&ratings, data_index.catalog())?;
    let timeline = ratings_timeline(&ratings)?;
    let correlations = rating_correlations(&ratings, data_index.catalog())?;

    if json {
        let value = serde_json::json!({
            "user_id": user_id,
            "summary": summary,
            "distribution": distribution,
            "genres": genres,
            "timeline": timeline,
            "correlations": correlations,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    let scope = match user_id {
        Some(id) => format!("user {}", id),
        None => {
            let (users, movies, _) = data_index.counts();
            format!("{} users, {} movies", users, movies)
        }
    };
    println!("{}", format!("Rating statistics ({}):", scope).bold().blue());
    print_summary(&summary);

    println!("{}", "Rating distribution:".bold());
    print_bars(&distribution);

    println!("{}", "Genres:".bold());
    let mut by_mean: Vec<(&String, &StatSummary)> = genres.iter().collect();
    by_mean.sort_by(|a, b| b.1.mean.total_cmp(&a.1.mean).then_with(|| a.0.cmp(b.0)));
    for (genre, s) in by_mean {
        println!(
            "  - {:<12} mean {:.2}  median {:.1}  std {:.2} ({} ratings)",
            genre, s.mean, s.median, s.std, s.count
        );
    }

    println!("{}", "Activity:".bold());
    print_activity(&timeline);
    print_correlations(&correlations);
    Ok(())
}

/// Handle the 'chart' command
fn handle_chart(data_index: &DataIndex, kind: ChartKind, top: usize, json: bool) -> Result<()> {
    let (title, series) = match kind {
        ChartKind::Genres => (
            "Movies per genre",
            build_series(genre_counts(data_index.catalog()), top),
        ),
        ChartKind::Tags => (
            "Ratings per tag",
            build_series(tag_counts(data_index.all_ratings()), top),
        ),
        ChartKind::Ratings => {
            let stars: Vec<f64> = data_index.all_ratings().iter().map(|r| r.stars).collect();
            ("Rating distribution", histogram_series(&rating_distribution(&stars)?))
        }
        ChartKind::Timeline => return handle_timeline_chart(data_index, top, json),
    };
    debug!("Built {} series points", series.len());

    if json {
        println!("{}", serde_json::to_string_pretty(&series)?);
    } else {
        println!("{}", format!("{}:", title).bold().blue());
        print_bars(&series);
    }
    Ok(())
}

/// The 'chart --kind timeline' variant: the most recent `top` active days
fn handle_timeline_chart(data_index: &DataIndex, top: usize, json: bool) -> Result<()> {
    let timeline = ratings_timeline(data_index.all_ratings())?;
    let recent = &timeline[timeline.len().saturating_sub(top)..];
    debug!("Timeline has {} days, showing {}", timeline.len(), recent.len());

    if json {
        println!("{}", serde_json::to_string_pretty(recent)?);
        return Ok(());
    }

    println!("{}", "Ratings per day:".bold().blue());
    let counts: Vec<SeriesPoint<usize>> = recent
        .iter()
        .map(|p| SeriesPoint::new(p.label.clone(), p.value.count))
        .collect();
    print_bars(&counts);
    Ok(())
}

/// Handle the 'similar' command
fn handle_similar(data_index: &DataIndex, movie_id: &str, limit: usize, json: bool) -> Result<()> {
    let similar = Recommender::default().similar_movies(movie_id, data_index.catalog(), limit)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&similar)?);
        return Ok(());
    }

    let title = data_index
        .get_movie(movie_id)
        .map(|m| m.title.as_str())
        .unwrap_or(movie_id);
    println!("{}", format!("Movies similar to {}:", title).bold().blue());
    for (idx, s) in similar.iter().enumerate() {
        println!(
            "{}. {} - Similarity: {:.3}",
            (idx + 1).to_string().green(),
            describe_movie(data_index, &s.movie_id),
            s.similarity
        );
    }
    Ok(())
}

/// Handle the 'benchmark' command
async fn handle_benchmark(
    data_index: Arc<DataIndex>,
    requests: usize,
    concurrent: usize,
) -> Result<()> {
    let user_ids = data_index.user_ids();
    if user_ids.is_empty() || requests == 0 {
        return Err(anyhow!("Benchmark needs at least one user and one request"));
    }

    // Pick random users with replacement
    let picks: Vec<UserId> = (0..requests)
        .map(|_| user_ids[rand::random::<u64>() as usize % user_ids.len()])
        .collect();

    let permits = Arc::new(Semaphore::new(concurrent.max(1)));
    let recommender = Recommender::default();
    let wall = Instant::now();

    let mut handles = Vec::with_capacity(requests);
    for user in picks {
        let data_index = data_index.clone();
        let permits = permits.clone();
        handles.push(tokio::spawn(async move {
            let _permit = permits.acquire_owned().await?;
            // The fit is CPU-bound; keep it off the async workers
            tokio::task::spawn_blocking(move || {
                let start = Instant::now();
                let outcome =
                    recommender.recommend(data_index.user_history(user), data_index.catalog());
                (start.elapsed(), outcome)
            })
            .await
            .map_err(anyhow::Error::from)
        }));
    }

    let mut timings: Vec<Duration> = Vec::with_capacity(requests);
    let mut fallbacks = 0usize;
    for handle in handles {
        let (elapsed, outcome) = handle.await??;
        match outcome {
            Ok(_) => {}
            Err(RecommendError::InsufficientData { .. }) => fallbacks += 1,
            Err(e) => return Err(e.into()),
        }
        timings.push(elapsed);
    }
    let total_time = wall.elapsed();

    timings.sort();
    let busy: Duration = timings.iter().sum();
    let avg_latency = busy / timings.len() as u32;
    let percentile = |p: f64| timings[((timings.len() as f64 * p) as usize).min(timings.len() - 1)];
    let throughput = requests as f64 / total_time.as_secs_f64();

    println!("{}", "Benchmark results:".bold().blue());
    println!("Requests: {} ({} concurrent)", requests, concurrent);
    println!("Fallbacks (insufficient data): {}", fallbacks);
    println!("Total time: {:?}", total_time);
    println!("Average latency: {:?}", avg_latency);
    println!("P50 latency: {:?}", percentile(0.50));
    println!("P95 latency: {:?}", percentile(0.95));
    println!("P99 latency: {:?}", percentile(0.99));
    println!("Throughput: {:.2} requests/second", throughput);

    Ok(())
}

/// "Title [Genre, Genre]" for a movie id, or the bare id when unknown
fn describe_movie(data_index: &DataIndex, movie_id: &str) -> String {
    match data_index.get_movie(movie_id) {
        Some(movie) => format!("{} [{}]", movie.title, movie.genres.join(", ")),
        None => movie_id.to_string(),
    }
}

fn print_recommendations(data_index: &DataIndex, recommendations: &[Recommendation], label: &str) {
    for rec in recommendations {
        println!(
            "{}. {} - {}: {:.2}",
            rec.rank.to_string().green(),
            describe_movie(data_index, &rec.movie_id),
            label,
            rec.predicted_score
        );
    }
}

fn print_fit_report(fit: &FitReport) {
    println!("{}", "Model:".bold());
    println!(
        "{}{} training ratings ({} skipped), {} distinct profiles",
        "• ".cyan(),
        fit.n_samples,
        fit.skipped,
        fit.distinct_rows
    );
    println!("{}{} features, lambda {}", "• ".cyan(), fit.n_features, fit.lambda);
    match fit.r2 {
        Some(r2) => println!("{}Training MSE {:.3}, R² {:.3}", "• ".cyan(), fit.mse, r2),
        None => println!("{}Training MSE {:.3}", "• ".cyan(), fit.mse),
    }
}

fn print_genre_picks(data_index: &DataIndex, picks: &[GenrePicks]) {
    println!("{}", "Top picks in your favourite genres:".bold());
    for group in picks {
        println!("  {} (your mean {:.2})", group.genre.yellow(), group.mean_rating);
        if group.picks.is_empty() {
            println!("    (nothing left to recommend)");
        }
        for rec in &group.picks {
            println!(
                "    #{} {} - Score: {:.2}",
                rec.rank,
                describe_movie(data_index, &rec.movie_id),
                rec.predicted_score
            );
        }
    }
}

fn print_summary(s: &StatSummary) {
    println!("{}Ratings: {}", "• ".green(), s.count);
    println!("{}Mean: {:.2}  Median: {:.1}", "• ".green(), s.mean, s.median);
    let mode_note = if s.mode_is_unique { "" } else { " (tied)" };
    println!("{}Mode: {:.1}{}", "• ".green(), s.mode, mode_note);
    println!("{}Std: {:.2}  Variance: {:.2}", "• ".green(), s.std, s.variance);
    println!("{}Range: {:.1} - {:.1}", "• ".green(), s.min, s.max);
}

fn print_activity(timeline: &[SeriesPoint<DayActivity>]) {
    let (Some(first), Some(last)) = (timeline.first(), timeline.last()) else {
        println!("  (no dated ratings)");
        return;
    };
    println!(
        "{}{} active days, {} to {}",
        "• ".green(),
        timeline.len(),
        first.label,
        last.label
    );
    if let Some(busiest) = timeline.iter().max_by_key(|p| p.value.count) {
        println!(
            "{}Busiest day {}: {} ratings, mean {:.2}",
            "• ".green(),
            busiest.label,
            busiest.value.count,
            busiest.value.average
        );
    }
}

fn print_correlations(c: &RatingCorrelations) {
    let show = |r: Option<f64>| r.map_or_else(|| "n/a".to_string(), |r| format!("{:+.3}", r));
    println!("{}", "Correlation with mean rating:".bold());
    println!("{}Popularity: {}", "• ".cyan(), show(c.popularity_rating));
    println!("{}Release year: {}", "• ".cyan(), show(c.year_rating));
    println!("{}Over {} rated movies", "• ".cyan(), c.movies);
}

/// Horizontal bar chart scaled to the largest value
fn print_bars(series: &[SeriesPoint<usize>]) {
    const WIDTH: usize = 40;
    let max = series.iter().map(|p| p.value).max().unwrap_or(0).max(1);
    let label_width = series.iter().map(|p| p.label.len()).max().unwrap_or(0);
    for point in series {
        let bar = "█".repeat(point.value * WIDTH / max);
        println!(
            "  {:<width$} {} {}",
            point.label,
            bar.cyan(),
            point.value,
            width = label_width
        );
    }
}

