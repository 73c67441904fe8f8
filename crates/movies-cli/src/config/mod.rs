//! Application configuration module.
//!
//! Manages the TOML config file holding TMDB request settings
//! (response language and an optional base URL override).

#[allow(clippy::module_inception)]
mod config;
mod paths;

#[allow(clippy::module_name_repetitions)]
pub use config::{AppConfig, TmdbConfig};
pub use paths::resolve_config_path;
