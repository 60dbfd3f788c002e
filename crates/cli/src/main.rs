use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use colored::Colorize;
use data_loader::{ModelSnapshot, MovieId, MovieRecord};
use recommender::{EngineConfig, RawQuery, RecommendError, RecommendationEngine, RecommendationQuery};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::info;

/// movie-recs - similar-movie lookups over a precomputed similarity matrix
#[derive(Parser)]
#[command(name = "movie-recs")]
#[command(about = "Find movies similar to a given movie", long_about = None)]
struct Cli {
    /// Path to the serialized similarity artifact
    #[arg(short, long, default_value = "app/models/recommendation_model.json")]
    model: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Get movies similar to a given movie
    Recommend {
        /// TMDB id of the reference movie
        #[arg(long)]
        tmdb_id: i64,

        /// Number of recommendations to return
        #[arg(long)]
        limit: Option<i64>,

        /// Minimum number of ratings a recommended movie must have
        #[arg(long)]
        min_rating_count: Option<i64>,

        /// Keep only movies with at least one of these genres (repeatable)
        #[arg(long = "genre")]
        genres: Vec<String>,

        /// Keep only movies with at least one of these tags (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,
    },

    /// Show the catalog record for a movie
    Movie {
        #[arg(long)]
        tmdb_id: MovieId,
    },

    /// Search for movies by title
    Search {
        /// Title to search for (case-insensitive substring match)
        #[arg(long)]
        title: String,
    },

    /// Run benchmark to test performance
    Benchmark {
        /// Number of requests to make
        #[arg(long, default_value = "1000")]
        requests: usize,

        /// Number of concurrent requests
        #[arg(long, default_value = "10")]
        concurrent: usize,
    },
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

    info!("Loading similarity snapshot from {}", cli.model.display());
    let start = Instant::now();
    let snapshot = Arc::new(
        ModelSnapshot::load_from_file(&cli.model).context("Failed to load similarity snapshot")?,
    );
    let (movies, dim) = snapshot.counts();
    info!(
        "Loaded {} movies ({}x{} matrix) in {:?}",
        movies,
        dim,
        dim,
        start.elapsed()
    );

    let engine = RecommendationEngine::new(snapshot, EngineConfig::default());

    match cli.command {
        Commands::Recommend {
            tmdb_id,
            limit,
            min_rating_count,
            genres,
            tags,
        } => {
            let raw = RawQuery {
                movie_id: tmdb_id,
                limit,
                min_rating_count,
                genres: (!genres.is_empty()).then_some(genres),
                tags: (!tags.is_empty()).then_some(tags),
            };
            handle_recommend(&engine, raw)?
        }
        Commands::Movie { tmdb_id } => handle_movie(&engine, tmdb_id)?,
        Commands::Search { title } => handle_search(&engine, &title),
        Commands::Benchmark {
            requests,
            concurrent,
        } => handle_benchmark(engine, requests, concurrent).await?,
    }

    Ok(())
}

/// Handle the 'recommend' command
fn handle_recommend(engine: &RecommendationEngine, raw: RawQuery) -> Result<()> {
    let query = RecommendationQuery::try_from_raw(raw, engine.config())?;

    let recommendations = engine.recommend(&query).map_err(|err| {
        let kind = match err {
            RecommendError::NotFound { .. } => "not found",
            RecommendError::EmptyResult { .. } => "empty result",
            RecommendError::Validation(_) => "invalid request",
        };
        println!("{} [{}] {}", "✗".red(), kind.yellow(), err);
        anyhow::Error::new(err).context(format!("Recommendation failed ({})", kind))
    })?;

    let catalog = engine.snapshot().catalog();
    let index = engine.snapshot().index();
    println!(
        "{}",
        format!("Movies similar to {}:", query.movie_id).bold().blue()
    );
    for (rank, rec) in recommendations.iter().enumerate() {
        let Some(record) = index.resolve(rec.movie_id).map(|row| catalog.get(row)) else {
            continue;
        };
        println!(
            "{}. {} ({}) [{}] - Score: {:.5} - Avg {:.2} from {} ratings",
            (rank + 1).to_string().green(),
            display_title(record),
            rec.movie_id,
            join(&record.genres),
            rec.similarity_score,
            record.average_rating,
            record.rating_count
        );
    }
    Ok(())
}

/// Handle the 'movie' command
fn handle_movie(engine: &RecommendationEngine, tmdb_id: MovieId) -> Result<()> {
    let snapshot = engine.snapshot();
    let row = snapshot
        .index()
        .resolve(tmdb_id)
        .ok_or_else(|| anyhow!("Movie {} not found", tmdb_id))?;
    let record = snapshot.catalog().get(row);

    println!("{}", format!("TMDB ID: {}", tmdb_id).bold().blue());
    println!("{}Title: {}", "• ".green(), display_title(record));
    println!("{}Row: {}", "• ".green(), record.row_index);
    println!("{}Genres: {}", "• ".green(), join(&record.genres));
    println!("{}Tags: {}", "• ".green(), join(&record.tags));
    println!("{}Number of ratings: {}", "• ".cyan(), record.rating_count);
    println!("{}Average rating: {:.2}", "• ".cyan(), record.average_rating);
    Ok(())
}

/// Handle the 'search' command
fn handle_search(engine: &RecommendationEngine, title: &str) {
    let needle = title.trim().to_lowercase();
    let mut matches = engine.snapshot().catalog().find_by_title(&needle);

    // Exact matches first, then the most rated
    matches.sort_by(|a, b| {
        let exact_a = a.title.as_deref().is_some_and(|t| t.to_lowercase() == needle);
        let exact_b = b.title.as_deref().is_some_and(|t| t.to_lowercase() == needle);
        exact_b
            .cmp(&exact_a)
            .then_with(|| b.rating_count.cmp(&a.rating_count))
    });

    println!("{}", format!("Search results for '{}':", title).bold().blue());
    if matches.is_empty() {
        println!("  no matches");
        return;
    }
    for record in matches.iter().take(20) {
        println!(
            "{}: {} [{}] avg {:.2} ({} ratings)",
            record.movie_id,
            display_title(record),
            join(&record.genres),
            record.average_rating,
            record.rating_count
        );
    }
}

#[derive(Debug, Default)]
struct BenchmarkTally {
    ok: usize,
    not_found: usize,
    empty: usize,
}

/// Handle the 'benchmark' command
async fn handle_benchmark(
    engine: RecommendationEngine,
    requests: usize,
    concurrent: usize,
) -> Result<()> {
    if requests == 0 || concurrent == 0 {
        bail!("--requests and --concurrent must both be at least 1");
    }
    let ids = engine.snapshot().index().ids().to_vec();
    if ids.is_empty() {
        bail!("Snapshot has no movies to benchmark");
    }

    info!(requests, concurrent, "Starting benchmark");
    let permits = Arc::new(Semaphore::new(concurrent));
    let started = Instant::now();

    let mut handles = Vec::with_capacity(requests);
    for _ in 0..requests {
        let movie_id = ids[rand::random::<u32>() as usize % ids.len()];
        let engine = engine.clone();
        let permits = permits.clone();
        handles.push(tokio::spawn(async move {
            let _permit = permits.acquire_owned().await?;
            let start = Instant::now();
            let query = engine.query(movie_id);
            let outcome = tokio::task::spawn_blocking(move || engine.recommend(&query)).await?;
            Ok::<_, anyhow::Error>((start.elapsed(), outcome))
        }));
    }

    let mut timings = Vec::with_capacity(requests);
    let mut tally = BenchmarkTally::default();
    for handle in handles {
        let (elapsed, outcome) = handle.await??;
        timings.push(elapsed);
        match outcome {
            Ok(_) => tally.ok += 1,
            Err(RecommendError::NotFound { .. }) => tally.not_found += 1,
            Err(RecommendError::EmptyResult { .. }) => tally.empty += 1,
            Err(err @ RecommendError::Validation(_)) => return Err(err.into()),
        }
    }
    let wall = started.elapsed();

    timings.sort();
    let mean = timings.iter().sum::<Duration>() / timings.len() as u32;
    let throughput = requests as f64 / wall.as_secs_f64();

    println!("{}", "Benchmark results:".bold().blue());
    println!("Requests: {} ({} concurrent)", requests, concurrent);
    println!(
        "Outcomes: {} ok, {} not found, {} empty",
        tally.ok, tally.not_found, tally.empty
    );
    println!("Total time: {:?}", wall);
    println!("Average latency: {:?}", mean);
    println!("P50 latency: {:?}", percentile(&timings, 0.50));
    println!("P95 latency: {:?}", percentile(&timings, 0.95));
    println!("P99 latency: {:?}", percentile(&timings, 0.99));
    println!("Throughput: {:.2} requests/second", throughput);

    Ok(())
}

/// Nearest-rank percentile of an ascending, non-empty slice
fn percentile(sorted: &[Duration], p: f64) -> Duration {
    let rank = ((sorted.len() as f64 * p).ceil() as usize).clamp(1, sorted.len());
    sorted[rank - 1]
}

fn display_title(record: &MovieRecord) -> &str {
    record.title.as_deref().unwrap_or("(untitled)")
}

fn join<'a>(values: impl IntoIterator<Item = &'a String>) -> String {
    values
        .into_iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
