//! movies - browse popular TMDB movies with a local read-through cache.

/// Application configuration (TOML).
mod config;

use std::path::{Path, PathBuf};
use std::pin::pin;

use anyhow::{Context, Result, bail};
use chrono::{TimeDelta, Utc};
use clap::{Parser, Subcommand};
use futures::StreamExt;
use tracing::instrument;
use tracing_subscriber::filter::EnvFilter;
#[cfg(not(feature = "otel"))]
use tracing_subscriber::fmt;
#[cfg(feature = "otel")]
use tracing_subscriber::layer::SubscriberExt;
#[cfg(feature = "otel")]
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::{AppConfig, TmdbConfig, resolve_config_path};
use movies_api::tmdb::paging::NETWORK_PAGE_SIZE;
use movies_api::tmdb::{PagingConfig, TmdbClient};
use movies_core::{
    Movie, MovieSource, MoviesRepository, collect_failures, filter_by_title, first_failure,
    is_fresh,
};
use movies_db::{load_movies, open_db};

/// CLI argument parser.
#[derive(Parser)]
#[command(about, version)]
struct Cli {
    /// Override config/data directory.
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// List popular movies from TMDB.
    Popular(PopularArgs),
    /// Show movie details (served from the local cache when fresh).
    Movie(MovieArgs),
    /// Local cache operations.
    Db(DbCommand),
}

/// Arguments for the `popular` subcommand.
#[derive(clap::Args)]
struct PopularArgs {
    /// Number of TMDB pages to load (20 movies per page).
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pages: u32,

    /// Only show movies whose title contains this text (case-insensitive).
    #[arg(long)]
    filter: Option<String>,
}

/// Arguments for the `movie` subcommand.
#[derive(clap::Args)]
struct MovieArgs {
    /// Comma-separated TMDB movie IDs (e.g. "550,13").
    #[arg(long, required = true, value_delimiter = ',')]
    id: Vec<u64>,
}

/// Arguments for the `db` subcommand.
#[derive(clap::Args)]
struct DbCommand {
    /// Db subcommand to run.
    #[command(subcommand)]
    command: DbSubcommands,
}

/// Available database subcommands.
#[derive(Subcommand)]
enum DbSubcommands {
    /// List cached movies with their age.
    List,
}

/// Builds a `TmdbClient` from `TMDB_API_KEY` and the `[tmdb]` config table.
///
/// # Errors
///
/// Returns an error if `TMDB_API_KEY` is not set, the config cannot be
/// loaded, or the client fails to build.
#[instrument(skip_all)]
fn build_tmdb_client(dir: Option<&Path>) -> Result<TmdbClient> {
    let api_key =
        std::env::var("TMDB_API_KEY").context("TMDB_API_KEY environment variable is required")?;

    let config_path = resolve_config_path(dir).context("failed to resolve config path")?;
    let config = AppConfig::load(&config_path).context("failed to load config")?;

    tmdb_client_from_config(api_key, &config.tmdb)
}

/// Applies the `[tmdb]` settings on top of the client defaults.
///
/// # Errors
///
/// Returns an error if `base_url` is invalid or the client fails to build.
fn tmdb_client_from_config(api_key: String, tmdb: &TmdbConfig) -> Result<TmdbClient> {
    let mut builder = TmdbClient::builder().api_key(api_key).user_agent(concat!(
        env!("CARGO_PKG_NAME"),
        "/",
        env!("CARGO_PKG_VERSION")
    ));
    if let Some(base_url) = tmdb.parsed_base_url()? {
        builder = builder.base_url(base_url);
    }
    if let Some(language) = tmdb.language.as_deref() {
        builder = builder.language(language);
    }

    builder.build().context("failed to build TMDB client")
}

/// Opens the cache and wraps it with a TMDB client in a repository.
///
/// # Errors
///
/// Returns an error if the client fails to build or the database cannot be opened.
fn build_repository(dir: Option<&Path>) -> Result<MoviesRepository<TmdbClient>> {
    let client = build_tmdb_client(dir)?;
    tracing::debug!(language = client.language(), "TMDB client ready");
    let conn = open_db(dir).context("failed to open database")?;
    Ok(MoviesRepository::new(client, conn))
}

/// Formats a cache age as `"3d4h"`, `"5h12m"` or `"42m"`.
fn format_age(age: TimeDelta) -> String {
    let minutes = age.num_minutes().max(0);
    let (days, hours, mins) = (minutes / 1440, (minutes / 60) % 24, minutes % 60);
    if days > 0 {
        format!("{days}d{hours}h")
    } else if hours > 0 {
        format!("{hours}h{mins}m")
    } else {
        format!("{mins}m")
    }
}

/// Logs one row of the popular movies table.
fn log_movie_row(movie: &Movie) {
    tracing::info!(
        "{:>8}\t{:>4}\t{:>4}\t{}",
        movie.id,
        movie
            .release_date
            .map_or_else(|| String::from("-"), |d| d.format("%Y").to_string()),
        movie
            .rating_percent()
            .map_or_else(|| String::from("-"), |r| format!("{r}%")),
        movie.title,
    );
}

/// Runs the `popular` subcommand.
///
/// Loads `--pages` pages, then applies `--filter` to everything loaded.
///
/// # Errors
///
/// Returns an error if the repository cannot be built or any page fails to load.
#[instrument(skip_all)]
async fn run_popular(args: &PopularArgs, dir: Option<&Path>) -> Result<()> {
    let repo = build_repository(dir)?;

    let movies = if args.pages <= 1 {
        repo.popular_movies().await?
    } else {
        let target = usize::try_from(NETWORK_PAGE_SIZE.saturating_mul(args.pages))
            .context("--pages is too large")?;
        let config = PagingConfig {
            page_size: NETWORK_PAGE_SIZE,
            initial_load_size: NETWORK_PAGE_SIZE.saturating_mul(args.pages),
        };
        let mut stream = pin!(repo.popular_movies_stream(config));
        let mut loads: Vec<Result<Vec<Movie>>> = Vec::new();
        let mut loaded: usize = 0;
        while loaded < target {
            let Some(load) = stream.next().await else {
                break;
            };
            if let Ok(movies) = &load {
                loaded = loaded.saturating_add(movies.len());
            }
            loads.push(load);
        }
        let mut movies: Vec<Movie> = first_failure(loads)
            .context("failed to load popular movies")?
            .into_iter()
            .flatten()
            .collect();
        movies.truncate(target);
        movies
    };

    let shown = filter_by_title(&movies, args.filter.as_deref().unwrap_or_default());
    tracing::info!("Loaded {} movies, showing {}", movies.len(), shown.len());
    tracing::info!("      ID\tYear\tRate\tTitle");
    for movie in shown {
        log_movie_row(movie);
    }

    Ok(())
}

/// Logs the detail view of one movie.
fn log_movie_details(movie: &Movie, source: MovieSource) {
    let not_available = "-";
    tracing::info!("ID: {}", movie.id);
    tracing::info!("Title: {}", movie.title);
    if let Some(tagline) = movie.tagline.as_deref().filter(|t| !t.is_empty()) {
        tracing::info!("Tagline: {tagline}");
    }
    tracing::info!("Details: {}", movie.details_line());
    tracing::info!(
        "Rating: {} ({} votes)",
        movie
            .rating_percent()
            .map_or_else(|| String::from(not_available), |r| format!("{r}%")),
        movie.vote_count.unwrap_or_default(),
    );
    tracing::info!(
        "Language: {}",
        movie.language.as_deref().unwrap_or(not_available)
    );
    tracing::info!("Status: {}", movie.status.as_deref().unwrap_or(not_available));
    tracing::info!(
        "Budget: {}",
        movie
            .budget
            .filter(|b| *b > 0)
            .map_or_else(|| String::from(not_available), |b| format!("${b}"))
    );
    tracing::info!(
        "Homepage: {}",
        movie
            .homepage
            .as_deref()
            .filter(|h| !h.is_empty())
            .unwrap_or(not_available)
    );
    tracing::info!("Poster: {}", movie.poster_url);
    tracing::info!("Overview: {}", movie.overview);
    tracing::info!(
        "Source: {}",
        match source {
            MovieSource::Cache => "cache",
            MovieSource::Network => "network",
        }
    );
}

/// Runs the `movie` subcommand.
///
/// Every ID is looked up even if an earlier one fails; all failures are
/// reported at the end.
///
/// # Errors
///
/// Returns an error if the repository cannot be built or any lookup fails.
#[instrument(skip_all)]
async fn run_movie(args: &MovieArgs, dir: Option<&Path>) -> Result<()> {
    let repo = build_repository(dir)?;

    let mut outcomes = Vec::with_capacity(args.id.len());
    for &movie_id in &args.id {
        let outcome = repo
            .movie_by_id_with_source(movie_id)
            .await
            .map(|(movie, source)| log_movie_details(&movie, source));
        outcomes.push(outcome);
    }

    if let Err(failures) = collect_failures(outcomes) {
        for err in &failures {
            tracing::error!("{err:#}");
        }
        bail!("{} of {} movie lookups failed", failures.len(), args.id.len());
    }

    Ok(())
}

/// Runs the `db list` subcommand.
///
/// # Errors
///
/// Returns an error if DB operations fail.
#[instrument(skip_all)]
fn run_db_list(dir: Option<&Path>) -> Result<()> {
    let conn = open_db(dir).context("failed to open database")?;
    let movies = load_movies(&conn).context("failed to load movies")?;

    if movies.is_empty() {
        tracing::info!("No movies cached. Run `movie --id <ID>` first.");
        return Ok(());
    }

    let now = Utc::now();
    tracing::info!("{} cached movies:", movies.len());
    tracing::info!("      ID\tAge\tState\tTitle");
    for movie in &movies {
        let state = if is_fresh(movie.updated_at, now) {
            "fresh"
        } else {
            "stale"
        };
        tracing::info!(
            "{:>8}\t{}\t{}\t{}",
            movie.movie_id,
            format_age(now.signed_duration_since(movie.updated_at)),
            state,
            movie.title,
        );
    }

    Ok(())
}

/// Entry point.
///
/// # Errors
///
/// Returns an error if subcommand execution fails.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    #[cfg(not(feature = "otel"))]
    {
        fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_target(false)
            .init();
    }

    #[cfg(feature = "otel")]
    {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);

        let otel_layer = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
            .ok()
            .and_then(|_| {
                let exporter = opentelemetry_otlp::SpanExporter::builder()
                    .with_http()
                    .build()
                    .ok()?;

                let tracer_provider = opentelemetry_sdk::trace::SdkTracerProvider::builder()
                    .with_simple_exporter(exporter)
                    .build();

                let tracer = opentelemetry::trace::TracerProvider::tracer(
                    &tracer_provider,
                    env!("CARGO_PKG_NAME"),
                );
                opentelemetry::global::set_tracer_provider(tracer_provider);

                Some(tracing_opentelemetry::layer().with_tracer(tracer))
            });

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .with(otel_layer)
            .init();
    }

    let cli = Cli::parse();
    let dir = cli.dir.as_deref();
    match cli.command {
        Commands::Popular(args) => run_popular(&args, dir).await,
        Commands::Movie(args) => run_movie(&args, dir).await,
        Commands::Db(db) => match db.command {
            DbSubcommands::List => run_db_list(dir),
        },
    }
}
