//! `AppConfig` struct and TOML loading.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use url::Url;

/// Top-level application configuration.
#[derive(Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct AppConfig {
    /// TMDB request settings.
    #[serde(default)]
    pub tmdb: TmdbConfig,
}

/// TMDB request configuration.
#[derive(Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct TmdbConfig {
    /// Response language (e.g. `"en"`, `"es-ES"`). Client default when unset.
    #[serde(default)]
    pub language: Option<String>,
    /// API base URL override, e.g. a local mirror.
    #[serde(default)]
    pub base_url: Option<String>,
}

impl AppConfig {
    /// Loads config from a TOML file. Returns default if file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
    }
}

impl TmdbConfig {
    /// Parses `base_url`, adding the trailing slash relative joins rely on.
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` is set but is not a valid URL.
    pub fn parsed_base_url(&self) -> Result<Option<Url>> {
        let Some(raw) = self.base_url.as_deref().map(str::trim) else {
            return Ok(None);
        };
        let with_slash = if raw.ends_with('/') {
            String::from(raw)
        } else {
            format!("{raw}/")
        };
        let url =
            Url::parse(&with_slash).with_context(|| format!("invalid tmdb.base_url: {raw}"))?;
        Ok(Some(url))
    }
}
