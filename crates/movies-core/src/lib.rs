//! Movie domain model, mappers and the read-through repository.
//!
//! Sits between the TMDB client (`movies-api`) and the local cache
//! (`movies-db`): network DTOs and cached rows are both mapped into the
//! same immutable [`Movie`] value.

/// DTO and cache-row mappers.
pub mod mappers;
/// Domain value objects and display helpers.
pub mod model;
/// Read-through repository over the API and the cache.
pub mod repository;
/// Helpers for lists of results.
pub mod results;

pub use model::{Genre, Movie, filter_by_title};
pub use repository::{CACHE_TTL, Clock, MovieSource, MoviesRepository, SystemClock, is_fresh};
pub use results::{collect_failures, first_failure, reduce_failures};
