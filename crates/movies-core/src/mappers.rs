//! Conversions between TMDB DTOs, cached rows and [`Movie`].
//!
//! All three sources share the same field rules:
//!
//! - the title falls back to the original title when blank,
//! - image paths are expanded to full URLs (empty when absent),
//! - unparsable release dates become `None` with a warning,
//! - the vote average is clamped into `[0, 10]`.

use chrono::{DateTime, NaiveDate, Utc};
use movies_api::tmdb::{
    IMAGE_URL_PREFIX, TmdbGenre, TmdbMovieDetails, TmdbMovieListItem, TmdbPopularMoviesResponse,
};
use movies_db::{CachedGenre, CachedMovie};

use crate::model::{Genre, Movie};

/// Highest vote average TMDB can report.
const MAX_VOTE_AVERAGE: f64 = 10.0;

/// Localized title when present and not blank, else the original title.
fn display_title(title: Option<&str>, original_title: Option<&str>) -> String {
    match title {
        Some(t) if !t.trim().is_empty() => String::from(t),
        _ => original_title.map(String::from).unwrap_or_default(),
    }
}

/// Expands a TMDB image path into a full URL, or empty when absent.
fn image_url(path: Option<&str>) -> String {
    path.map(|p| format!("{IMAGE_URL_PREFIX}{p}"))
        .unwrap_or_default()
}

/// Parses a `YYYY-MM-DD` release date.
///
/// Absent or empty values are `None`; malformed values are logged and also
/// treated as `None`.
fn parse_release_date(movie_id: u64, date: Option<&str>) -> Option<NaiveDate> {
    let raw = date.filter(|d| !d.is_empty())?;
    match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            tracing::warn!(
                movie_id,
                release_date = raw,
                error = %e,
                "could not parse release date"
            );
            None
        }
    }
}

/// Language tag, `None` when absent or blank.
fn language_tag(language: Option<&str>) -> Option<String> {
    language
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
}

fn clamp_vote_average(vote_average: Option<f64>) -> Option<f64> {
    vote_average.map(|v| v.clamp(0.0, MAX_VOTE_AVERAGE))
}

fn genre_from_dto(genre: &TmdbGenre) -> Genre {
    Genre {
        id: genre.id,
        name: genre.name.clone().unwrap_or_default(),
    }
}

/// Maps a popular-list item. Detail-only fields are left `None`.
#[must_use]
pub fn movie_from_list_item(item: &TmdbMovieListItem) -> Movie {
    Movie {
        id: item.id,
        title: display_title(item.title.as_deref(), item.original_title.as_deref()),
        poster_url: image_url(item.poster_path.as_deref()),
        backdrop_url: image_url(item.backdrop_path.as_deref()),
        overview: item.overview.clone().unwrap_or_default(),
        genres: item
            .genre_ids
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|&id| Genre {
                id,
                name: String::new(),
            })
            .collect(),
        release_date: parse_release_date(item.id, item.release_date.as_deref()),
        language: language_tag(item.original_language.as_deref()),
        popularity: item.popularity,
        vote_average: clamp_vote_average(item.vote_average),
        vote_count: item.vote_count,
        budget: None,
        homepage: None,
        runtime_minutes: None,
        tagline: None,
        status: None,
    }
}

/// Maps every item of a popular-movies page, preserving order.
#[must_use]
pub fn movies_from_popular(response: &TmdbPopularMoviesResponse) -> Vec<Movie> {
    response.results.iter().map(movie_from_list_item).collect()
}

/// Maps a full details response.
#[must_use]
pub fn movie_from_details(details: &TmdbMovieDetails) -> Movie {
    Movie {
        id: details.id,
        title: display_title(details.title.as_deref(), details.original_title.as_deref()),
        poster_url: image_url(details.poster_path.as_deref()),
        backdrop_url: image_url(details.backdrop_path.as_deref()),
        overview: details.overview.clone().unwrap_or_default(),
        genres: details
            .genres
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(genre_from_dto)
            .collect(),
        release_date: parse_release_date(details.id, details.release_date.as_deref()),
        language: language_tag(details.original_language.as_deref()),
        popularity: details.popularity,
        vote_average: clamp_vote_average(details.vote_average),
        vote_count: details.vote_count,
        budget: details.budget,
        homepage: details.homepage.clone(),
        runtime_minutes: details.runtime,
        tagline: details.tagline.clone(),
        status: details.status.clone(),
    }
}

/// Maps a details response into a cache row stamped with `updated_at`.
#[must_use]
pub fn cached_from_details(details: &TmdbMovieDetails, updated_at: DateTime<Utc>) -> CachedMovie {
    let movie = movie_from_details(details);
    CachedMovie {
        movie_id: movie.id,
        title: movie.title,
        poster_url: movie.poster_url,
        backdrop_url: movie.backdrop_url,
        overview: movie.overview,
        genres: movie
            .genres
            .into_iter()
            .map(|g| CachedGenre {
                id: g.id,
                name: g.name,
            })
            .collect(),
        release_date: movie.release_date,
        language: movie.language,
        popularity: movie.popularity,
        vote_average: movie.vote_average,
        vote_count: movie.vote_count,
        budget: movie.budget,
        homepage: movie.homepage,
        runtime_minutes: movie.runtime_minutes,
        tagline: movie.tagline,
        status: movie.status,
        updated_at,
    }
}

/// Maps a cache row back into a [`Movie`], dropping the timestamp.
#[must_use]
pub fn movie_from_cached(cached: CachedMovie) -> Movie {
    Movie {
        id: cached.movie_id,
        title: cached.title,
        poster_url: cached.poster_url,
        backdrop_url: cached.backdrop_url,
        overview: cached.overview,
        genres: cached
            .genres
            .into_iter()
            .map(|g| Genre {
                id: g.id,
                name: g.name,
            })
            .collect(),
        release_date: cached.release_date,
        language: cached.language,
        popularity: cached.popularity,
        vote_average: cached.vote_average,
        vote_count: cached.vote_count,
        budget: cached.budget,
        homepage: cached.homepage,
        runtime_minutes: cached.runtime_minutes,
        tagline: cached.tagline,
        status: cached.status,
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::indexing_slicing)]
    #![allow(clippy::float_cmp)]

    use chrono::TimeZone;
    use tracing::subscriber::with_default;
    use tracing_mock::{expect, subscriber};

    use super::*;

    fn popular_fixture() -> TmdbPopularMoviesResponse {
        serde_json::from_str(include_str!(
            "../../../fixtures/tmdb/popular_movies_page1.json"
        ))
        .unwrap()
    }

    fn details_fixture() -> TmdbMovieDetails {
        serde_json::from_str(include_str!("../../../fixtures/tmdb/movie_details_550.json")).unwrap()
    }

    #[test]
    fn test_list_item_full() {
        // Arrange
        let response = popular_fixture();

        // Act
        let movie = movie_from_list_item(&response.results[0]);

        // Assert
        assert_eq!(movie.id, 550);
        assert_eq!(movie.title, "Fight Club");
        assert!(movie.poster_url.starts_with(IMAGE_URL_PREFIX));
        assert_eq!(
            movie.genres,
            vec![
                Genre {
                    id: 18,
                    name: String::new()
                },
                Genre {
                    id: 53,
                    name: String::new()
                },
            ]
        );
        assert_eq!(movie.release_date, NaiveDate::from_ymd_opt(1999, 10, 15));
        assert_eq!(movie.vote_average, Some(8.4));
        assert!(movie.budget.is_none());
        assert!(movie.runtime_minutes.is_none());
        assert!(movie.tagline.is_none());
    }

    #[test]
    fn test_list_item_falls_back_to_original_title() {
        // Arrange
        let response = popular_fixture();

        // Act
        let movie = movie_from_list_item(&response.results[1]);

        // Assert
        assert_eq!(movie.title, "千と千尋の神隠し");
        assert_eq!(movie.backdrop_url, "");
    }

    #[test]
    fn test_list_item_sparse_fields() {
        // Arrange
        let response = popular_fixture();

        // Act
        let movie = movie_from_list_item(&response.results[2]);

        // Assert
        assert_eq!(movie.title, "");
        assert_eq!(movie.poster_url, "");
        assert_eq!(movie.overview, "");
        assert!(movie.genres.is_empty());
        assert!(movie.release_date.is_none());
        assert!(movie.language.is_none());
        assert_eq!(movie.vote_average, Some(10.0));
    }

    #[test]
    fn test_movies_from_popular_preserves_order() {
        // Arrange
        let response = popular_fixture();

        // Act
        let movies = movies_from_popular(&response);

        // Assert
        let ids: Vec<u64> = movies.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![550, 129, 999_999]);
    }

    #[test]
    fn test_details_full() {
        // Arrange
        let details = details_fixture();

        // Act
        let movie = movie_from_details(&details);

        // Assert
        assert_eq!(movie.title, "Fight Club");
        assert_eq!(movie.genres.len(), 3);
        assert_eq!(movie.genres[0].name, "Drama");
        assert_eq!(movie.language.as_deref(), Some("en"));
        assert_eq!(movie.budget, Some(63_000_000));
        assert_eq!(movie.runtime_minutes, Some(139));
        assert_eq!(movie.tagline.as_deref(), Some("Mischief. Mayhem. Soap."));
        assert_eq!(movie.status.as_deref(), Some("Released"));
    }

    #[test]
    fn test_negative_vote_average_clamped_to_zero() {
        // Arrange
        let details: TmdbMovieDetails =
            serde_json::from_value(serde_json::json!({ "id": 1, "vote_average": -3.5 })).unwrap();

        // Act
        let movie = movie_from_details(&details);

        // Assert
        assert_eq!(movie.vote_average, Some(0.0));
    }

    #[test]
    fn test_genre_without_name_is_empty() {
        // Arrange
        let details: TmdbMovieDetails = serde_json::from_value(serde_json::json!({
            "id": 1,
            "genres": [{ "id": 27, "name": null }]
        }))
        .unwrap();

        // Act
        let movie = movie_from_details(&details);

        // Assert
        assert_eq!(
            movie.genres,
            vec![Genre {
                id: 27,
                name: String::new()
            }]
        );
    }

    #[test]
    fn test_malformed_release_date_logs_warning() {
        // Arrange
        let details: TmdbMovieDetails = serde_json::from_value(serde_json::json!({
            "id": 1,
            "release_date": "15/10/1999"
        }))
        .unwrap();
        let (subscriber, handle) = subscriber::mock()
            .event(expect::event().at_level(tracing::Level::WARN))
            .only()
            .run_with_handle();

        // Act
        let movie = with_default(subscriber, || movie_from_details(&details));

        // Assert
        assert!(movie.release_date.is_none());
        handle.assert_finished();
    }

    #[test]
    fn test_cached_round_trip_keeps_fields() {
        // Arrange
        let details = details_fixture();
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

        // Act
        let cached = cached_from_details(&details, now);
        let from_cache = movie_from_cached(cached.clone());

        // Assert
        assert_eq!(cached.updated_at, now);
        assert_eq!(cached.movie_id, 550);
        assert_eq!(from_cache, movie_from_details(&details));
    }
}
