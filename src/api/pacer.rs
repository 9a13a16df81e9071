use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Keeps a fixed minimum gap between consecutive API requests
///
/// The crawler issues one request at a time; the pacer only spaces them out
/// to stay under the informal secondary rate limits.
#[derive(Debug)]
pub struct Pacer {
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl Pacer {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: Mutex::new(None),
        }
    }

    /// Calculates the time until the next request may be sent
    ///
    /// Returns None if a request can be sent now.
    pub fn time_until_next_request(
        min_interval: Duration,
        last: Option<Instant>,
        now: Instant,
    ) -> Option<Duration> {
        let elapsed = now.duration_since(last?);
        if elapsed >= min_interval {
            None
        } else {
            Some(min_interval - elapsed)
        }
    }

    /// Waits for the gap to pass and records a new request
    pub async fn wait_turn(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(wait) = Self::time_until_next_request(self.min_interval, *last, Instant::now())
        {
            tokio::time::sleep(wait).await;
        }
        *last = Some(Instant::now());
    }
}
