//! Query string normalisation for TMDB requests.
//!
//! TMDB sorts `movie/popular` differently depending on where `api_key`
//! appears in the query string. Requests are therefore rebuilt so that the
//! authentication parameters always come first, followed by the caller's
//! parameters in their original order.

use url::Url;

/// Rewrites the query of `url` as `leading` followed by the existing pairs.
///
/// Existing pairs whose key also appears in `leading` are dropped so the
/// authentication parameters cannot be overridden or duplicated.
pub fn normalize_query(url: &mut Url, leading: &[(&str, &str)]) {
    let original: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !leading.iter().any(|(lead, _)| **lead == **key))
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    url.set_query(None);
    let mut pairs = url.query_pairs_mut();
    for (key, value) in leading {
        pairs.append_pair(key, value);
    }
    for (key, value) in &original {
        pairs.append_pair(key, value);
    }
    drop(pairs);
}
