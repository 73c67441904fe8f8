//! TMDB API client module.
//!
//! Handles HTTP requests to the TMDB API v3 movie endpoints and
//! walks the popular-movies listing page by page.

mod api;
mod client;
mod pacer;
pub mod paging;
mod query;
mod types;

#[allow(clippy::module_name_repetitions)]
pub use api::{LocalTmdbApi, TmdbApi};
#[allow(clippy::module_name_repetitions)]
pub use client::{TmdbClient, TmdbClientBuilder};
pub use paging::{
    LoadParams, LoadResult, Page, PagingConfig, PagingState, PopularMoviesPagingSource,
    popular_movies_pages,
};
#[allow(clippy::module_name_repetitions)]
pub use types::{
    TmdbErrorResponse, TmdbGenre, TmdbMovieDetails, TmdbMovieListItem, TmdbPopularMoviesResponse,
};

/// Prefix turning a TMDB image path into a full-size image URL.
pub const IMAGE_URL_PREFIX: &str = "https://image.tmdb.org/t/p/original";
