//! API client library for movies.
//!
//! Provides the TMDB client and the page-keyed loader for the
//! popular-movies listing.

/// TMDB API client.
pub mod tmdb;
