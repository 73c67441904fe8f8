//! Database module for caching movie details.
//!
//! Uses `rusqlite` (bundled `SQLite`) to keep one row per movie,
//! overwritten wholesale whenever fresh details are fetched.

mod connection;
mod migrations;
/// Movie cache CRUD operations.
pub mod movies;

#[allow(clippy::module_name_repetitions)]
pub use connection::open_db;
#[allow(clippy::module_name_repetitions)]
pub use movies::{CachedGenre, CachedMovie, insert_movie, load_movie, load_movies};
