// src/extract/pacing.rs
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Per-source courtesy pacing: keeps at least `min_interval` between two
/// outbound requests to the same source, whichever request or strategy issues
/// them.
#[derive(Debug)]
pub struct Pacer {
    min_interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl Pacer {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last: Mutex::new(None),
        }
    }

    pub fn unpaced() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Sleep until the interval since the previous request has elapsed, then
    /// record this request.
    pub async fn wait(&self) {
        if self.min_interval.is_zero() {
            return;
        }
        let mut last = self.last.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}
