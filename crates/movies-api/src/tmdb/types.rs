//! TMDB API response types.

use serde::Deserialize;

// --- Popular Movies ---

/// Response from `movie/popular` endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbPopularMoviesResponse {
    /// Current page number.
    pub page: u32,
    /// Movies on this page.
    pub results: Vec<TmdbMovieListItem>,
    /// Total number of pages.
    pub total_pages: u32,
    /// Total number of results.
    pub total_results: u32,
}

/// A single movie entry in a list response.
///
/// TMDB occasionally sends `null` for any of the descriptive fields, so
/// everything except the ID is optional.
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbMovieListItem {
    /// TMDB movie ID.
    pub id: u64,
    /// Adult flag.
    #[serde(default)]
    pub adult: Option<bool>,
    /// Backdrop image path.
    #[serde(default)]
    pub backdrop_path: Option<String>,
    /// Genre IDs.
    #[serde(default)]
    pub genre_ids: Option<Vec<u32>>,
    /// Original language (ISO 639-1).
    #[serde(default)]
    pub original_language: Option<String>,
    /// Original title.
    #[serde(default)]
    pub original_title: Option<String>,
    /// Overview text.
    #[serde(default)]
    pub overview: Option<String>,
    /// Popularity score.
    #[serde(default)]
    pub popularity: Option<f64>,
    /// Poster image path.
    #[serde(default)]
    pub poster_path: Option<String>,
    /// Release date (YYYY-MM-DD, may be empty).
    #[serde(default)]
    pub release_date: Option<String>,
    /// Localized title.
    #[serde(default)]
    pub title: Option<String>,
    /// Vote average.
    #[serde(default)]
    pub vote_average: Option<f64>,
    /// Vote count.
    #[serde(default)]
    pub vote_count: Option<u64>,
}

// --- Movie Details ---

/// Response from `movie/{movie_id}` endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbMovieDetails {
    /// TMDB movie ID.
    pub id: u64,
    /// IMDb ID.
    #[serde(default)]
    pub imdb_id: Option<String>,
    /// Adult flag.
    #[serde(default)]
    pub adult: Option<bool>,
    /// Backdrop image path.
    #[serde(default)]
    pub backdrop_path: Option<String>,
    /// Budget in USD.
    #[serde(default)]
    pub budget: Option<u64>,
    /// Genres.
    #[serde(default)]
    pub genres: Option<Vec<TmdbGenre>>,
    /// Homepage URL.
    #[serde(default)]
    pub homepage: Option<String>,
    /// Original language (ISO 639-1).
    #[serde(default)]
    pub original_language: Option<String>,
    /// Original title.
    #[serde(default)]
    pub original_title: Option<String>,
    /// Overview text.
    #[serde(default)]
    pub overview: Option<String>,
    /// Popularity score.
    #[serde(default)]
    pub popularity: Option<f64>,
    /// Poster image path.
    #[serde(default)]
    pub poster_path: Option<String>,
    /// Release date (YYYY-MM-DD, may be empty).
    #[serde(default)]
    pub release_date: Option<String>,
    /// Revenue in USD.
    #[serde(default)]
    pub revenue: Option<u64>,
    /// Runtime in minutes.
    #[serde(default)]
    pub runtime: Option<u32>,
    /// Status (e.g., "Released", "Post Production").
    #[serde(default)]
    pub status: Option<String>,
    /// Tagline.
    #[serde(default)]
    pub tagline: Option<String>,
    /// Localized title.
    #[serde(default)]
    pub title: Option<String>,
    /// Vote average.
    #[serde(default)]
    pub vote_average: Option<f64>,
    /// Vote count.
    #[serde(default)]
    pub vote_count: Option<u64>,
}

/// Genre entry.
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbGenre {
    /// Genre ID.
    pub id: u32,
    /// Genre name.
    #[serde(default)]
    pub name: Option<String>,
}

// --- Error Response ---

/// TMDB API error response body.
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbErrorResponse {
    /// TMDB error code.
    pub status_code: u32,
    /// Error message.
    pub status_message: String,
    /// Success flag (always false for errors).
    #[allow(dead_code)]
    #[serde(default)]
    pub success: bool,
}
