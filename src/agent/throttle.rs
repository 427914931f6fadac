//! Minimum-interval request scheduler.
//!
//! Replaces fixed sleeps between calls: a call waits only for whatever part
//! of the interval has not already elapsed since the previous call started.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Spaces consecutive requests at least `interval` apart.
#[derive(Debug)]
pub struct Throttle {
    interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl Throttle {
    /// Creates a throttle with the given minimum spacing.
    #[must_use]
    pub const fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: Mutex::const_new(None),
        }
    }

    /// Waits until the next request may be sent, then records it.
    pub async fn wait(&self) {
        let mut last = self.last.lock().await;
        if !self.interval.is_zero()
            && let Some(prev) = *last
            && let Some(ready_at) = prev.checked_add(self.interval)
            && ready_at > Instant::now()
        {
            tokio::time::sleep_until(ready_at).await;
        }
        *last = Some(Instant::now());
    }
}
