//! `TmdbApi` trait definition.
#![allow(clippy::future_not_send)]

use anyhow::Result;

use super::types::{TmdbMovieDetails, TmdbPopularMoviesResponse};

/// TMDB movie API trait.
///
/// Abstracts API operations for mock substitution in tests.
/// Uses `trait_variant::make` to generate a `Send`-bound async trait.
#[allow(clippy::module_name_repetitions)]
#[trait_variant::make(TmdbApi: Send)]
pub trait LocalTmdbApi {
    /// Fetches one page of the popular movies list (pages start at 1).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON parsing fails.
    async fn popular_movies(&self, page: u32) -> Result<TmdbPopularMoviesResponse>;

    /// Fetches full details for a single movie.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON parsing fails.
    async fn movie_details(&self, movie_id: u64) -> Result<TmdbMovieDetails>;
}
