//! Page-keyed loading over the `movie/popular` endpoint.
//!
//! Keys are TMDB page numbers starting at 1. A load is asked for a window of
//! `load_size` items; since TMDB always serves 20 items per page, a window
//! larger than one page is covered by fetching consecutive pages so that the
//! next key never overlaps or skips what was already returned.

use anyhow::Result;
use futures::{Stream, stream};
use tracing::instrument;

use super::api::LocalTmdbApi;
use super::types::TmdbMovieListItem;

/// First page index served by TMDB.
pub const STARTING_PAGE_INDEX: u32 = 1;

/// Items per page returned by TMDB list endpoints.
pub const NETWORK_PAGE_SIZE: u32 = 20;

/// Parameters for a single load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadParams {
    /// Page to start from. `None` means the first page.
    pub key: Option<u32>,
    /// Requested number of items.
    pub load_size: u32,
}

/// A loaded page of items with its neighbouring keys.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// Items in server order.
    pub data: Vec<T>,
    /// Key for loading the items before this page.
    pub prev_key: Option<u32>,
    /// Key for loading the items after this page.
    pub next_key: Option<u32>,
}

/// Outcome of a load.
#[derive(Debug)]
pub enum LoadResult<T> {
    /// Successfully loaded page.
    Page(Page<T>),
    /// The load failed; carries the underlying error.
    Error(anyhow::Error),
}

/// Snapshot of what has been loaded so far, used to pick a refresh key.
#[derive(Debug)]
pub struct PagingState<'a, T> {
    /// Loaded pages in order.
    pub pages: &'a [Page<T>],
    /// Index of the most recently accessed item across all pages.
    pub anchor_position: Option<usize>,
}

impl<T> PagingState<'_, T> {
    /// Returns the page holding `anchor_position`, or the last page when the
    /// anchor lies past the loaded items.
    #[must_use]
    pub fn closest_page_to_anchor(&self) -> Option<&Page<T>> {
        let mut remaining = self.anchor_position?;
        for page in self.pages {
            if remaining < page.data.len() {
                return Some(page);
            }
            remaining = remaining.saturating_sub(page.data.len());
        }
        self.pages.last()
    }

    /// Key to reload from after invalidation, so the anchor stays in view.
    #[must_use]
    pub fn refresh_key(&self) -> Option<u32> {
        let page = self.closest_page_to_anchor()?;
        page.prev_key
            .and_then(|k| k.checked_add(1))
            .or_else(|| page.next_key.and_then(|k| k.checked_sub(1)))
    }
}

/// Loads popular movies page by page from a TMDB API implementation.
#[derive(Debug)]
pub struct PopularMoviesPagingSource<'a, A> {
    api: &'a A,
}

impl<A> Clone for PopularMoviesPagingSource<'_, A> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<A> Copy for PopularMoviesPagingSource<'_, A> {}

impl<'a, A: LocalTmdbApi> PopularMoviesPagingSource<'a, A> {
    /// Creates a paging source over `api`.
    pub const fn new(api: &'a A) -> Self {
        Self { api }
    }

    /// Loads the window described by `params`.
    ///
    /// The window spans `max(1, load_size / NETWORK_PAGE_SIZE)` pages and
    /// stops early at the last page reported by the server. If a page after
    /// the first one fails, the pages already fetched are returned and the
    /// failing page becomes the next key.
    #[instrument(skip_all, fields(key = ?params.key, load_size = params.load_size))]
    pub async fn load(&self, params: &LoadParams) -> LoadResult<TmdbMovieListItem> {
        let position = params.key.unwrap_or(STARTING_PAGE_INDEX).max(STARTING_PAGE_INDEX);
        let window = (params.load_size / NETWORK_PAGE_SIZE).max(1);

        let mut data = Vec::new();
        let mut page = position;
        let mut fetched: u32 = 0;
        let next_key = loop {
            let response = match self.api.popular_movies(page).await {
                Ok(response) => response,
                Err(err) if fetched == 0 => return LoadResult::Error(err),
                Err(err) => {
                    tracing::warn!(
                        page,
                        error = %err,
                        "popular movies page failed mid-window, returning partial window"
                    );
                    break Some(page);
                }
            };
            tracing::debug!(
                page,
                items = response.results.len(),
                total_pages = response.total_pages,
                "popular movies page loaded"
            );
            data.extend(response.results);
            fetched = fetched.saturating_add(1);

            if page >= response.total_pages {
                break None;
            }
            let Some(next) = page.checked_add(1) else {
                break None;
            };
            if fetched >= window {
                break Some(next);
            }
            page = next;
        };

        let prev_key = if position == STARTING_PAGE_INDEX {
            None
        } else {
            position.checked_sub(1)
        };

        LoadResult::Page(Page {
            data,
            prev_key,
            next_key,
        })
    }
}

/// Window sizes used when driving a paging source forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagingConfig {
    /// Items requested by every load after the first.
    pub page_size: u32,
    /// Items requested by the first load.
    pub initial_load_size: u32,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            page_size: NETWORK_PAGE_SIZE,
            initial_load_size: NETWORK_PAGE_SIZE.saturating_mul(3),
        }
    }
}

/// Drives `source` forward from the first page.
///
/// Yields the items of each load in order. The stream ends after the last
/// page, or right after yielding the first error.
pub fn popular_movies_pages<'a, A: LocalTmdbApi>(
    source: PopularMoviesPagingSource<'a, A>,
    config: PagingConfig,
) -> impl Stream<Item = Result<Vec<TmdbMovieListItem>>> + 'a {
    let first = Some(LoadParams {
        key: Some(STARTING_PAGE_INDEX),
        load_size: config.initial_load_size,
    });
    stream::unfold(first, move |params| async move {
        let params = params?;
        match source.load(&params).await {
            LoadResult::Page(page) => {
                let next = page.next_key.map(|key| LoadParams {
                    key: Some(key),
                    load_size: config.page_size,
                });
                Some((Ok(page.data), next))
            }
            LoadResult::Error(err) => Some((Err(err), None)),
        }
    })
}
