//! Combinators for lists of `Result`s.
//!
//! Unlike `collect::<Result<Vec<_>, _>>()`, which stops at the first error,
//! these helpers look at every element so that all failures can be reported.

/// Turns a list of results into either all values or all failures.
///
/// Returns `Ok` with every value (in order) when nothing failed, otherwise
/// `Err` with every failure (in order). An empty input is `Ok(vec![])`.
///
/// # Errors
///
/// Returns every failure when at least one element is `Err`.
pub fn collect_failures<T, E, I>(results: I) -> Result<Vec<T>, Vec<E>>
where
    I: IntoIterator<Item = Result<T, E>>,
{
    let mut values = Vec::new();
    let mut failures = Vec::new();
    for result in results {
        match result {
            Ok(value) => values.push(value),
            Err(err) => failures.push(err),
        }
    }
    if failures.is_empty() {
        Ok(values)
    } else {
        Err(failures)
    }
}

/// Like [`collect_failures`], folding the failures into one with `reduce`.
///
/// `reduce` receives the first failure and the remaining ones.
///
/// # Errors
///
/// Returns the reduced failure when at least one element is `Err`.
pub fn reduce_failures<T, E, I, F>(results: I, reduce: F) -> Result<Vec<T>, E>
where
    I: IntoIterator<Item = Result<T, E>>,
    F: FnOnce(E, Vec<E>) -> E,
{
    let mut values = Vec::new();
    let mut first = None;
    let mut rest = Vec::new();
    for result in results {
        match result {
            Ok(value) => values.push(value),
            Err(err) if first.is_none() => first = Some(err),
            Err(err) => rest.push(err),
        }
    }
    first.map_or(Ok(values), |first| Err(reduce(first, rest)))
}

/// [`reduce_failures`] keeping only the first failure.
///
/// # Errors
///
/// Returns the first failure when at least one element is `Err`.
pub fn first_failure<T, E, I>(results: I) -> Result<Vec<T>, E>
where
    I: IntoIterator<Item = Result<T, E>>,
{
    reduce_failures(results, |first, _| first)
}
