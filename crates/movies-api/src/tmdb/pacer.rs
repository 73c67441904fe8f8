//! Request pacing for the TMDB API.

use std::time::{Duration, Instant};

/// Default spacing between requests (TMDB allows roughly 40 req/s).
const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(25);

/// Keeps consecutive requests at least `min_interval` apart.
#[derive(Debug)]
pub struct RequestPacer {
    /// Minimum spacing between two requests.
    min_interval: Duration,
    /// When the previous request was released.
    last_sent: Option<Instant>,
}

impl RequestPacer {
    /// Creates a pacer with the given spacing.
    pub(crate) const fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_sent: None,
        }
    }

    /// Creates a pacer with the default spacing (25ms).
    pub(crate) const fn with_default_interval() -> Self {
        Self::new(DEFAULT_MIN_INTERVAL)
    }

    /// How long a request issued at `now` has to wait.
    fn delay_at(&self, now: Instant) -> Duration {
        self.last_sent.map_or(Duration::ZERO, |last| {
            self.min_interval
                .saturating_sub(now.saturating_duration_since(last))
        })
    }

    /// Sleeps until the next request may be sent, then records it.
    pub async fn acquire(&mut self) {
        let delay = self.delay_at(Instant::now());
        if !delay.is_zero() {
            tracing::trace!(delay_ms = delay.as_millis(), "pacing TMDB request");
            tokio::time::sleep(delay).await;
        }
        self.last_sent = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_first_request_has_no_delay() {
        // Arrange
        let pacer = RequestPacer::new(Duration::from_secs(1));

        // Act
        let delay = pacer.delay_at(Instant::now());

        // Assert
        assert_eq!(delay, Duration::ZERO);
    }

    #[test]
    fn test_delay_is_remaining_interval() {
        // Arrange
        let start = Instant::now();
        let pacer = RequestPacer {
            min_interval: Duration::from_millis(100),
            last_sent: Some(start),
        };

        // Act
        let delay = pacer.delay_at(start + Duration::from_millis(30));

        // Assert
        assert_eq!(delay, Duration::from_millis(70));
    }

    #[test]
    fn test_no_delay_after_interval_elapsed() {
        // Arrange
        let start = Instant::now();
        let pacer = RequestPacer {
            min_interval: Duration::from_millis(100),
            last_sent: Some(start),
        };

        // Act
        let delay = pacer.delay_at(start + Duration::from_millis(250));

        // Assert
        assert_eq!(delay, Duration::ZERO);
    }

    #[tokio::test]
    async fn test_acquire_spaces_requests() {
        // Arrange
        let mut pacer = RequestPacer::new(Duration::from_millis(50));

        // Act
        let start = Instant::now();
        pacer.acquire().await;
        pacer.acquire().await;

        // Assert
        assert!(start.elapsed() >= Duration::from_millis(50));
        assert!(pacer.last_sent.is_some());
    }

    #[test]
    fn test_default_interval() {
        // Arrange & Act
        let pacer = RequestPacer::with_default_interval();

        // Assert
        assert_eq!(pacer.min_interval, Duration::from_millis(25));
    }
}
