//! Movie cache CRUD operations.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

/// Date format used for the `release_date` column.
const RELEASE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Column list shared by every `SELECT`.
const MOVIE_COLUMNS: &str = "movie_id, title, poster_url, backdrop_url, overview, genres,
    release_date, language, popularity, vote_average, vote_count,
    budget, homepage, runtime_minutes, tagline, status, updated_at";

/// A genre stored inline in the `genres` JSON column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedGenre {
    /// TMDB genre ID.
    pub id: u32,
    /// Genre name (may be empty).
    pub name: String,
}

/// A cached movie row.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedMovie {
    /// TMDB movie ID (primary key).
    pub movie_id: u64,
    /// Display title.
    pub title: String,
    /// Full poster URL (empty when unknown).
    pub poster_url: String,
    /// Full backdrop URL (empty when unknown).
    pub backdrop_url: String,
    /// Overview text.
    pub overview: String,
    /// Genres.
    pub genres: Vec<CachedGenre>,
    /// Release date.
    pub release_date: Option<NaiveDate>,
    /// Original language tag.
    pub language: Option<String>,
    /// Popularity score.
    pub popularity: Option<f64>,
    /// Vote average in `[0, 10]`.
    pub vote_average: Option<f64>,
    /// Vote count.
    pub vote_count: Option<u64>,
    /// Budget in USD.
    pub budget: Option<u64>,
    /// Homepage URL.
    pub homepage: Option<String>,
    /// Runtime in minutes.
    pub runtime_minutes: Option<u32>,
    /// Tagline.
    pub tagline: Option<String>,
    /// Release status.
    pub status: Option<String>,
    /// When this row was last written.
    pub updated_at: DateTime<Utc>,
}

/// Raw column values before JSON/date decoding.
struct MovieRow {
    movie_id: u64,
    title: String,
    poster_url: String,
    backdrop_url: String,
    overview: String,
    genres: String,
    release_date: Option<String>,
    language: Option<String>,
    popularity: Option<f64>,
    vote_average: Option<f64>,
    vote_count: Option<u64>,
    budget: Option<u64>,
    homepage: Option<String>,
    runtime_minutes: Option<u32>,
    tagline: Option<String>,
    status: Option<String>,
    updated_at: i64,
}

impl MovieRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            movie_id: row.get(0)?,
            title: row.get(1)?,
            poster_url: row.get(2)?,
            backdrop_url: row.get(3)?,
            overview: row.get(4)?,
            genres: row.get(5)?,
            release_date: row.get(6)?,
            language: row.get(7)?,
            popularity: row.get(8)?,
            vote_average: row.get(9)?,
            vote_count: row.get(10)?,
            budget: row.get(11)?,
            homepage: row.get(12)?,
            runtime_minutes: row.get(13)?,
            tagline: row.get(14)?,
            status: row.get(15)?,
            updated_at: row.get(16)?,
        })
    }

    fn decode(self) -> Result<CachedMovie> {
        let movie_id = self.movie_id;
        let genres: Vec<CachedGenre> = if self.genres.is_empty() {
            Vec::new()
        } else {
            serde_json::from_str(&self.genres)
                .with_context(|| format!("invalid genres JSON for movie {movie_id}"))?
        };
        let release_date = self
            .release_date
            .filter(|d| !d.is_empty())
            .map(|d| NaiveDate::parse_from_str(&d, RELEASE_DATE_FORMAT))
            .transpose()
            .with_context(|| format!("invalid release_date for movie {movie_id}"))?;
        let updated_at = DateTime::from_timestamp_millis(self.updated_at)
            .with_context(|| format!("invalid updated_at for movie {movie_id}"))?;

        Ok(CachedMovie {
            movie_id,
            title: self.title,
            poster_url: self.poster_url,
            backdrop_url: self.backdrop_url,
            overview: self.overview,
            genres,
            release_date,
            language: self.language,
            popularity: self.popularity,
            vote_average: self.vote_average,
            vote_count: self.vote_count,
            budget: self.budget,
            homepage: self.homepage,
            runtime_minutes: self.runtime_minutes,
            tagline: self.tagline,
            status: self.status,
            updated_at,
        })
    }
}

/// Inserts a movie, replacing any existing row with the same ID.
///
/// # Errors
///
/// Returns an error if genre serialization or the database operation fails.
#[allow(clippy::module_name_repetitions)]
pub fn insert_movie(conn: &Connection, movie: &CachedMovie) -> Result<()> {
    let genres =
        serde_json::to_string(&movie.genres).context("failed to serialize genres to JSON")?;
    let release_date = movie
        .release_date
        .map(|d| d.format(RELEASE_DATE_FORMAT).to_string());

    conn.execute(
        "INSERT OR REPLACE INTO movies (
            movie_id, title, poster_url, backdrop_url, overview, genres,
            release_date, language, popularity, vote_average, vote_count,
            budget, homepage, runtime_minutes, tagline, status, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
        rusqlite::params![
            movie.movie_id,
            movie.title,
            movie.poster_url,
            movie.backdrop_url,
            movie.overview,
            genres,
            release_date,
            movie.language,
            movie.popularity,
            movie.vote_average,
            movie.vote_count,
            movie.budget,
            movie.homepage,
            movie.runtime_minutes,
            movie.tagline,
            movie.status,
            movie.updated_at.timestamp_millis(),
        ],
    )
    .with_context(|| format!("failed to insert movie {}", movie.movie_id))?;

    tracing::debug!(movie_id = movie.movie_id, "movie cached");
    Ok(())
}

/// Loads a single movie by ID. Returns `None` when it is not cached.
///
/// # Errors
///
/// Returns an error if the database query or row decoding fails.
#[allow(clippy::module_name_repetitions)]
pub fn load_movie(conn: &Connection, movie_id: u64) -> Result<Option<CachedMovie>> {
    let sql = format!("SELECT {MOVIE_COLUMNS} FROM movies WHERE movie_id = ?1");
    let row = conn
        .query_row(&sql, [movie_id], MovieRow::from_row)
        .optional()
        .with_context(|| format!("failed to query movie {movie_id}"))?;

    row.map(MovieRow::decode).transpose()
}

/// Loads every cached movie ordered by ID.
///
/// # Errors
///
/// Returns an error if the database query or row decoding fails.
#[allow(clippy::module_name_repetitions)]
pub fn load_movies(conn: &Connection) -> Result<Vec<CachedMovie>> {
    let sql = format!("SELECT {MOVIE_COLUMNS} FROM movies ORDER BY movie_id");
    let mut stmt = conn
        .prepare(&sql)
        .context("failed to prepare movies query")?;

    let rows = stmt
        .query_map([], MovieRow::from_row)
        .context("failed to query movies")?;

    let movies = rows
        .map(|row| row.context("failed to read movies row")?.decode())
        .collect::<Result<Vec<_>>>()?;
    Ok(movies)
}
