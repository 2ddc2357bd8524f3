use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::Duration;

use lru::LruCache;
use tokio::time::Instant;
use tracing::warn;

struct Window {
    started_at: Instant,
    count: u32,
}

/// Fixed-window click limiter keyed by `(client, offer)`.
///
/// The table is bounded: beyond `capacity` live keys, the least-recently-used
/// window is evicted regardless of whether it has expired, so high offer-id
/// cardinality cannot grow it without bound.
#[derive(Debug)]
pub struct ClickRateLimiter {
    window: Duration,
    max_hits: u32,
    windows: Mutex<LruCache<String, Window>>,
}

impl ClickRateLimiter {
    pub fn new(window: Duration, max_hits: u32, capacity: NonZeroUsize) -> Self {
        Self {
            window,
            max_hits,
            windows: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Record one attempt and report whether it is allowed. An expired window
    /// restarts at count one; a live window increments, and the attempt is
    /// rejected once the post-increment count exceeds the threshold.
    pub fn allow(&self, client: &str, offer_ref: &str) -> bool {
        let key = format!("{client}:{offer_ref}");
        let now = Instant::now();

        let mut windows = match self.windows.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!(
                    lock_kind = "mutex.lock",
                    result = "poisoned_recovered",
                    "Recovered from poisoned rate limiter lock"
                );
                poisoned.into_inner()
            }
        };

        match windows.get_mut(&key) {
            Some(window) if now.duration_since(window.started_at) <= self.window => {
                window.count += 1;
                window.count <= self.max_hits
            }
            _ => {
                windows.put(
                    key,
                    Window {
                        started_at: now,
                        count: 1,
                    },
                );
                true
            }
        }
    }

    pub fn retry_after_secs(&self) -> u64 {
        self.window.as_secs().max(1)
    }

    pub fn limit(&self) -> u32 {
        self.max_hits
    }
}
