//! Request pacing shared by every account of a source.
//!
//! Rate-limited APIs allow one request per interval for the whole login, not
//! per account. The aggregator fetches accounts concurrently, so a connector
//! holds one [`RequestGate`] and every request of every account waits on it.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::trace;

/// Spaces requests at least `interval` apart across all clones.
#[derive(Debug, Clone)]
pub struct RequestGate {
    interval: Duration,
    last: Arc<Mutex<Option<Instant>>>,
}

impl RequestGate {
    /// Creates a gate. A zero interval never waits.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: Arc::new(Mutex::new(None)),
        }
    }

    /// Minimum spacing between requests.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Waits until the interval since the previous request has passed.
    ///
    /// The lock is held while sleeping, so waiters are released one at a
    /// time in the order they arrived.
    pub async fn wait(&self) {
        if self.interval.is_zero() {
            return;
        }
        let mut last = self.last.lock().await;
        if let Some(previous) = *last {
            let ready = previous + self.interval;
            let now = Instant::now();
            if ready > now {
                trace!(wait_ms = (ready - now).as_millis(), "Pacing request");
                tokio::time::sleep_until(ready).await;
            }
        }
        *last = Some(Instant::now());
    }
}

impl Default for RequestGate {
    fn default() -> Self {
        Self::new(Duration::ZERO)
    }
}
