//! `Movie` and `Genre` value objects.

use chrono::{Datelike, NaiveDate};

/// Separator used between the parts of [`Movie::details_line`].
const DETAILS_SEPARATOR: &str = " · ";

/// A movie genre. `name` is empty when only the ID is known (list results).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Genre {
    /// TMDB genre ID.
    pub id: u32,
    /// Display name.
    pub name: String,
}

/// A movie as presented to callers, regardless of where it was loaded from.
#[derive(Debug, Clone, PartialEq)]
pub struct Movie {
    /// TMDB movie ID.
    pub id: u64,
    /// Display title (falls back to the original title).
    pub title: String,
    /// Full poster URL, empty when unknown.
    pub poster_url: String,
    /// Full backdrop URL, empty when unknown.
    pub backdrop_url: String,
    /// Overview text.
    pub overview: String,
    /// Genres.
    pub genres: Vec<Genre>,
    /// Release date.
    pub release_date: Option<NaiveDate>,
    /// Original language tag (e.g. `"en"`).
    pub language: Option<String>,
    /// Popularity score.
    pub popularity: Option<f64>,
    /// Vote average in `[0, 10]`.
    pub vote_average: Option<f64>,
    /// Number of votes.
    pub vote_count: Option<u64>,
    /// Budget in USD.
    pub budget: Option<u64>,
    /// Homepage URL.
    pub homepage: Option<String>,
    /// Runtime in minutes.
    pub runtime_minutes: Option<u32>,
    /// Tagline.
    pub tagline: Option<String>,
    /// Release status (e.g. `"Released"`).
    pub status: Option<String>,
}

impl Movie {
    /// Vote average as a whole percentage (`8.47` -> `84`).
    #[must_use]
    #[allow(
        clippy::as_conversions,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn rating_percent(&self) -> Option<u32> {
        // Clamped to [0, 100] before the cast, so truncation is the only effect.
        self.vote_average
            .map(|v| (v * 10.0).clamp(0.0, 100.0).trunc() as u32)
    }

    /// Runtime formatted as `"2h15m"`, or `"45m"` under an hour.
    #[must_use]
    pub fn runtime_label(&self) -> Option<String> {
        self.runtime_minutes.map(|total| {
            let hours = total / 60;
            let minutes = total % 60;
            if hours > 0 {
                format!("{hours}h{minutes}m")
            } else {
                format!("{minutes}m")
            }
        })
    }

    /// One-line summary: `year · runtime · genre, genre`.
    ///
    /// Missing parts, and genres without a name, are skipped.
    #[must_use]
    pub fn details_line(&self) -> String {
        let mut parts = Vec::with_capacity(3);
        if let Some(date) = self.release_date {
            parts.push(date.year().to_string());
        }
        if let Some(runtime) = self.runtime_label() {
            parts.push(runtime);
        }
        let names: Vec<&str> = self
            .genres
            .iter()
            .map(|g| g.name.as_str())
            .filter(|name| !name.is_empty())
            .collect();
        if !names.is_empty() {
            parts.push(names.join(", "));
        }
        parts.join(DETAILS_SEPARATOR)
    }
}

/// Keeps the movies whose title contains `query`, ignoring case.
///
/// A blank query keeps everything.
#[must_use]
pub fn filter_by_title<'a>(movies: &'a [Movie], query: &str) -> Vec<&'a Movie> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return movies.iter().collect();
    }
    movies
        .iter()
        .filter(|m| m.title.to_lowercase().contains(&needle))
        .collect()
}
