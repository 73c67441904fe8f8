//! Read-through movie repository.
//!
//! Single-movie lookups are served from the local cache while the cached row
//! is at most [`CACHE_TTL`] old; otherwise the movie is fetched from TMDB,
//! written through to the cache and read back. Popular-movie listings always
//! come from the network.
#![allow(clippy::future_not_send)]

use anyhow::{Context, Result};
use chrono::{DateTime, TimeDelta, Utc};
use futures::{Stream, StreamExt};
use movies_api::tmdb::paging::STARTING_PAGE_INDEX;
use movies_api::tmdb::{
    LocalTmdbApi, PagingConfig, PopularMoviesPagingSource, popular_movies_pages,
};
use rusqlite::Connection;
use tracing::instrument;

use crate::mappers::{
    cached_from_details, movie_from_cached, movie_from_list_item, movies_from_popular,
};
use crate::model::Movie;

/// How long a cached movie is served without contacting TMDB.
pub const CACHE_TTL: TimeDelta = TimeDelta::days(1);

/// Returns `true` when a row written at `updated_at` is still usable at `now`.
///
/// The boundary is inclusive: a row exactly [`CACHE_TTL`] old is fresh.
#[must_use]
pub fn is_fresh(updated_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now.signed_duration_since(updated_at) <= CACHE_TTL
}

/// Source of the current time.
pub trait Clock {
    /// Current UTC time.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock [`Clock`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Where a movie returned by [`MoviesRepository::movie_by_id_with_source`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovieSource {
    /// A fresh cached row.
    Cache,
    /// Fetched from TMDB and written to the cache.
    Network,
}

/// Movie data access over a TMDB API and a local cache connection.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct MoviesRepository<A, C = SystemClock> {
    api: A,
    conn: Connection,
    clock: C,
}

impl<A: LocalTmdbApi> MoviesRepository<A> {
    /// Creates a repository using the system clock.
    pub const fn new(api: A, conn: Connection) -> Self {
        Self {
            api,
            conn,
            clock: SystemClock,
        }
    }
}

impl<A: LocalTmdbApi, C: Clock> MoviesRepository<A, C> {
    /// Creates a repository with a custom clock.
    pub const fn with_clock(api: A, conn: Connection, clock: C) -> Self {
        Self { api, conn, clock }
    }

    /// Fetches the first page of popular movies.
    ///
    /// # Errors
    ///
    /// Returns an error if the TMDB request fails.
    #[instrument(skip_all)]
    pub async fn popular_movies(&self) -> Result<Vec<Movie>> {
        let response = self
            .api
            .popular_movies(STARTING_PAGE_INDEX)
            .await
            .context("failed to fetch popular movies")?;
        Ok(movies_from_popular(&response))
    }

    /// Streams popular movies page window by page window.
    ///
    /// The stream ends after the last page, or right after yielding the
    /// first error.
    pub fn popular_movies_stream(
        &self,
        config: PagingConfig,
    ) -> impl Stream<Item = Result<Vec<Movie>>> + '_ {
        let source = PopularMoviesPagingSource::new(&self.api);
        popular_movies_pages(source, config).map(|page| {
            page.map(|items| items.iter().map(movie_from_list_item).collect())
        })
    }

    /// Returns a movie by ID, going to TMDB only when the cache is stale.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache cannot be read or written, or if the
    /// movie is not freshly cached and the TMDB request fails.
    pub async fn movie_by_id(&self, movie_id: u64) -> Result<Movie> {
        let (movie, _) = self.movie_by_id_with_source(movie_id).await?;
        Ok(movie)
    }

    /// Like [`Self::movie_by_id`], also reporting whether the cache was used.
    ///
    /// # Errors
    ///
    /// Same as [`Self::movie_by_id`].
    #[instrument(skip(self))]
    pub async fn movie_by_id_with_source(&self, movie_id: u64) -> Result<(Movie, MovieSource)> {
        let now = self.clock.now();
        let cached = movies_db::load_movie(&self.conn, movie_id)
            .with_context(|| format!("failed to read cached movie {movie_id}"))?;

        if let Some(cached) = cached {
            if is_fresh(cached.updated_at, now) {
                tracing::debug!(movie_id, title = %cached.title, "movie served from cache");
                return Ok((movie_from_cached(cached), MovieSource::Cache));
            }
            tracing::debug!(movie_id, updated_at = %cached.updated_at, "cached movie is stale");
        }

        let details = self
            .api
            .movie_details(movie_id)
            .await
            .with_context(|| format!("failed to fetch movie {movie_id}"))?;
        movies_db::insert_movie(&self.conn, &cached_from_details(&details, now))
            .with_context(|| format!("failed to cache movie {movie_id}"))?;

        let stored = movies_db::load_movie(&self.conn, movie_id)
            .with_context(|| format!("failed to read cached movie {movie_id}"))?
            .with_context(|| format!("movie {movie_id} missing from cache after write"))?;
        tracing::debug!(movie_id, title = %stored.title, "movie fetched and cached");

        Ok((movie_from_cached(stored), MovieSource::Network))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::indexing_slicing)]
    #![allow(clippy::arithmetic_side_effects)]

    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use anyhow::bail;
    use chrono::TimeZone;
    use movies_api::tmdb::{TmdbMovieDetails, TmdbPopularMoviesResponse};

    use super::*;

    /// Fake API serving `total_pages` pages and a fixed set of movie details.
    #[derive(Default)]
    struct FakeApi {
        total_pages: u32,
        details_offline: bool,
        title: RefCell<String>,
        detail_calls: Rc<Cell<u32>>,
        popular_calls: Rc<RefCell<Vec<u32>>>,
    }

    impl LocalTmdbApi for FakeApi {
        async fn popular_movies(&self, page: u32) -> Result<TmdbPopularMoviesResponse> {
            self.popular_calls.borrow_mut().push(page);
            let results = (0..2_u64)
                .map(|i| {
                    serde_json::from_value(serde_json::json!({
                        "id": u64::from(page) * 10 + i,
                        "title": format!("Movie {page}-{i}"),
                    }))
                    .unwrap()
                })
                .collect();
            Ok(TmdbPopularMoviesResponse {
                page,
                results,
                total_pages: self.total_pages,
                total_results: self.total_pages * 2,
            })
        }

        async fn movie_details(&self, movie_id: u64) -> Result<TmdbMovieDetails> {
            self.detail_calls.set(self.detail_calls.get() + 1);
            if self.details_offline {
                bail!("network unreachable");
            }
            Ok(serde_json::from_value(serde_json::json!({
                "id": movie_id,
                "title": self.title.borrow().as_str(),
                "runtime": 139,
                "genres": [{ "id": 18, "name": "Drama" }],
            }))
            .unwrap())
        }
    }

    /// Clock that only moves when told to.
    #[derive(Clone)]
    struct ManualClock(Rc<Cell<DateTime<Utc>>>);

    impl ManualClock {
        fn starting_at(now: DateTime<Utc>) -> Self {
            Self(Rc::new(Cell::new(now)))
        }

        fn advance(&self, by: TimeDelta) {
            self.0.set(self.0.get() + by);
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            self.0.get()
        }
    }

    fn start_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    type TestRepo = MoviesRepository<FakeApi, ManualClock>;

    fn setup(api: FakeApi) -> (TestRepo, ManualClock, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let conn = movies_db::open_db(Some(dir.path())).unwrap();
        let clock = ManualClock::starting_at(start_time());
        let repo = MoviesRepository::with_clock(api, conn, clock.clone());
        (repo, clock, dir)
    }

    fn online_api(title: &str) -> FakeApi {
        FakeApi {
            total_pages: 3,
            title: RefCell::new(String::from(title)),
            ..FakeApi::default()
        }
    }

    #[test]
    fn test_is_fresh_boundary() {
        // Arrange
        let written = start_time();

        // Act & Assert
        assert!(is_fresh(written, written));
        assert!(is_fresh(written, written + CACHE_TTL));
        assert!(!is_fresh(
            written,
            written + CACHE_TTL + TimeDelta::milliseconds(1)
        ));
    }

    #[tokio::test]
    async fn test_miss_fetches_and_caches() {
        // Arrange
        let api = online_api("Fight Club");
        let calls = Rc::clone(&api.detail_calls);
        let (repo, _clock, _dir) = setup(api);

        // Act
        let (movie, source) = repo.movie_by_id_with_source(550).await.unwrap();

        // Assert
        assert_eq!(source, MovieSource::Network);
        assert_eq!(movie.title, "Fight Club");
        assert_eq!(movie.runtime_minutes, Some(139));
        assert_eq!(calls.get(), 1);
        let cached = movies_db::load_movie(&repo.conn, 550).unwrap().unwrap();
        assert_eq!(cached.updated_at, start_time());
    }

    #[tokio::test]
    async fn test_fresh_hit_skips_network() {
        // Arrange
        let api = online_api("Fight Club");
        let calls = Rc::clone(&api.detail_calls);
        let (repo, clock, _dir) = setup(api);
        repo.movie_by_id(550).await.unwrap();

        // Act: exactly one TTL later is still fresh
        clock.advance(CACHE_TTL);
        let (movie, source) = repo.movie_by_id_with_source(550).await.unwrap();

        // Assert
        assert_eq!(source, MovieSource::Cache);
        assert_eq!(movie.genres[0].name, "Drama");
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn test_stale_entry_is_refetched_and_overwritten() {
        // Arrange
        let api = online_api("Old Title");
        let calls = Rc::clone(&api.detail_calls);
        let (repo, clock, _dir) = setup(api);
        repo.movie_by_id(550).await.unwrap();
        *repo.api.title.borrow_mut() = String::from("New Title");

        // Act
        clock.advance(CACHE_TTL + TimeDelta::milliseconds(1));
        let (movie, source) = repo.movie_by_id_with_source(550).await.unwrap();

        // Assert
        assert_eq!(source, MovieSource::Network);
        assert_eq!(movie.title, "New Title");
        assert_eq!(calls.get(), 2);
        let cached = movies_db::load_movie(&repo.conn, 550).unwrap().unwrap();
        assert_eq!(cached.updated_at, clock.now());
    }

    #[tokio::test]
    async fn test_network_failure_on_miss_is_error() {
        // Arrange
        let api = FakeApi {
            details_offline: true,
            ..FakeApi::default()
        };
        let (repo, _clock, _dir) = setup(api);

        // Act
        let result = repo.movie_by_id(7).await;

        // Assert
        let err = result.unwrap_err();
        assert!(format!("{err:#}").contains("network unreachable"));
        assert!(movies_db::load_movie(&repo.conn, 7).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_network_failure_on_stale_entry_is_error() {
        // Arrange
        let (repo, clock, _dir) = setup(online_api("Cached"));
        repo.movie_by_id(550).await.unwrap();
        let offline = FakeApi {
            details_offline: true,
            ..FakeApi::default()
        };
        let repo = MoviesRepository::with_clock(offline, repo.conn, clock.clone());

        // Act
        clock.advance(TimeDelta::days(2));
        let result = repo.movie_by_id(550).await;

        // Assert
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_popular_movies_requests_first_page() {
        // Arrange
        let api = online_api("");
        let pages = Rc::clone(&api.popular_calls);
        let (repo, _clock, _dir) = setup(api);

        // Act
        let movies = repo.popular_movies().await.unwrap();

        // Assert
        assert_eq!(*pages.borrow(), vec![1]);
        let titles: Vec<&str> = movies.iter().map(|m| m.title.as_str()).collect();
        assert_eq!(titles, vec!["Movie 1-0", "Movie 1-1"]);
    }

    #[tokio::test]
    async fn test_popular_movies_stream_maps_every_page() {
        // Arrange
        let api = online_api("");
        let pages = Rc::clone(&api.popular_calls);
        let (repo, _clock, _dir) = setup(api);
        let config = PagingConfig {
            page_size: 20,
            initial_load_size: 40,
        };

        // Act
        let loads: Vec<Vec<Movie>> = repo
            .popular_movies_stream(config)
            .map(Result::unwrap)
            .collect()
            .await;

        // Assert
        assert_eq!(loads.len(), 2);
        let ids: Vec<u64> = loads.iter().flatten().map(|m| m.id).collect();
        assert_eq!(ids, vec![10, 11, 20, 21, 30, 31]);
        assert_eq!(*pages.borrow(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_row_missing_after_write_is_error() {
        // Arrange: every insert is immediately undone
        let (repo, _clock, _dir) = setup(online_api("Vanishing"));
        repo.conn
            .execute_batch(
                "CREATE TRIGGER drop_new_movie AFTER INSERT ON movies
                 BEGIN DELETE FROM movies WHERE movie_id = NEW.movie_id; END;",
            )
            .unwrap();

        // Act
        let result = repo.movie_by_id(550).await;

        // Assert
        let err = result.unwrap_err();
        assert!(
            format!("{err:#}").contains("missing from cache after write"),
            "unexpected error: {err:#}"
        );
    }
}
