//! `TmdbClient` - TMDB API client implementation.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use reqwest::Client;
use tokio::sync::Mutex;
use tracing::instrument;
use url::Url;

use super::api::LocalTmdbApi;
use super::pacer::RequestPacer;
use super::query::normalize_query;
use super::types::{TmdbErrorResponse, TmdbMovieDetails, TmdbPopularMoviesResponse};

/// Default base URL for TMDB API v3.
const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3/";

/// Default response language.
const DEFAULT_LANGUAGE: &str = "en";

/// Maximum number of retries for HTTP 429 responses.
const MAX_RETRIES: u32 = 3;

/// Backoff duration between retries (multiplied by the attempt number).
const RETRY_BACKOFF: Duration = Duration::from_secs(1);

/// TMDB API client.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct TmdbClient {
    /// HTTP client.
    http_client: Client,
    /// Base URL for API requests.
    base_url: Url,
    /// v3 API key, sent as the `api_key` query parameter.
    api_key: String,
    /// Response language, sent as the `language` query parameter.
    language: String,
    /// Request pacer.
    pacer: Arc<Mutex<RequestPacer>>,
}

/// Builder for `TmdbClient`.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct TmdbClientBuilder {
    base_url: Option<Url>,
    api_key: Option<String>,
    user_agent: Option<String>,
    language: Option<String>,
    min_interval: Option<Duration>,
}

impl TmdbClientBuilder {
    /// Creates a new builder.
    const fn new() -> Self {
        Self {
            base_url: None,
            api_key: None,
            user_agent: None,
            language: None,
            min_interval: None,
        }
    }

    /// Overrides the base URL (for wiremock in tests).
    #[must_use]
    pub fn base_url(mut self, url: Url) -> Self {
        self.base_url = Some(url);
        self
    }

    /// Sets the API key (required).
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the User-Agent (required).
    #[must_use]
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Sets the response language (default: "en").
    #[must_use]
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Sets the minimum request interval (default: 25ms).
    #[must_use]
    pub const fn min_interval(mut self, interval: Duration) -> Self {
        self.min_interval = Some(interval);
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// - `api_key` is not set or blank.
    /// - `user_agent` is not set.
    /// - `reqwest::Client` build fails.
    pub fn build(self) -> Result<TmdbClient> {
        let api_key = self.api_key.context("api_key is required")?;
        if api_key.trim().is_empty() {
            bail!("api_key must not be blank");
        }
        let user_agent = self.user_agent.context("user_agent is required")?;

        let base_url = if let Some(url) = self.base_url {
            url
        } else {
            Url::parse(DEFAULT_BASE_URL).context("invalid default base URL")?
        };

        let language = self
            .language
            .filter(|l| !l.trim().is_empty())
            .unwrap_or_else(|| String::from(DEFAULT_LANGUAGE));

        let pacer = self
            .min_interval
            .map_or_else(RequestPacer::with_default_interval, RequestPacer::new);

        let http_client = Client::builder()
            .user_agent(&user_agent)
            .gzip(true)
            .build()
            .context("failed to build HTTP client")?;

        Ok(TmdbClient {
            http_client,
            base_url,
            api_key,
            language,
            pacer: Arc::new(Mutex::new(pacer)),
        })
    }
}

impl TmdbClient {
    /// Creates a new builder.
    #[must_use]
    pub const fn builder() -> TmdbClientBuilder {
        TmdbClientBuilder::new()
    }

    /// Response language sent with every request.
    #[must_use]
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Builds the request URL for `path` with auth params first, then `query`.
    fn request_url(&self, path: &str, query: &[(&str, String)]) -> Result<Url> {
        let mut url = self
            .base_url
            .join(path)
            .with_context(|| format!("failed to join URL path: {path}"))?;
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        normalize_query(
            &mut url,
            &[
                ("api_key", self.api_key.as_str()),
                ("language", self.language.as_str()),
            ],
        );
        Ok(url)
    }

    /// Sends a GET request with normalised query params and pacing.
    /// Retries up to `MAX_RETRIES` times on HTTP 429.
    #[instrument(skip_all, fields(path = path))]
    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = self.request_url(path, query)?;

        let mut retries = 0u32;
        loop {
            self.pacer.lock().await.acquire().await;

            tracing::debug!(path, ?query, "TMDB API request");

            let result = self.http_client.get(url.clone()).send().await;
            let response = result.with_context(|| format!("request failed: {path}"))?;

            let status = response.status();

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                retries = retries.saturating_add(1);
                if retries > MAX_RETRIES {
                    bail!("TMDB API rate limit exceeded after {MAX_RETRIES} retries: {path}");
                }
                tracing::warn!(
                    retry = retries,
                    max_retries = MAX_RETRIES,
                    "TMDB API rate limited (429). Retrying..."
                );
                tokio::time::sleep(RETRY_BACKOFF.saturating_mul(retries)).await;
                continue;
            }

            let body = response
                .text()
                .await
                .with_context(|| format!("failed to read response body: {path}"))?;

            if !status.is_success() {
                if let Ok(error) = serde_json::from_str::<TmdbErrorResponse>(&body) {
                    bail!(
                        "TMDB API error (HTTP {status}): code={}, message={}",
                        error.status_code,
                        error.status_message,
                    );
                }
                bail!("TMDB API error (HTTP {status}): {body}");
            }

            return serde_json::from_str(&body)
                .with_context(|| format!("failed to decode JSON response: {path}"));
        }
    }
}

impl LocalTmdbApi for TmdbClient {
    #[instrument(skip_all, fields(page = page))]
    async fn popular_movies(&self, page: u32) -> Result<TmdbPopularMoviesResponse> {
        let query = [("page", page.to_string())];
        self.get_json("movie/popular", &query).await
    }

    #[instrument(skip_all, fields(movie_id = movie_id))]
    async fn movie_details(&self, movie_id: u64) -> Result<TmdbMovieDetails> {
        let path = format!("movie/{movie_id}");
        self.get_json(&path, &[]).await
    }
}
