use std::collections::HashMap;

use tokio::sync::Mutex;

use crate::request::RequesterId;

/// Per-requester request counter over a trailing window.
///
/// A requester's history is dropped as a whole as soon as any entry in it is
/// older than the window, so a burst right after a reset is counted from zero.
pub struct RateLimiter {
    threshold: usize,
    window_secs: i64,
    /// Request timestamps (unix seconds) per requester
    windows: Mutex<HashMap<RequesterId, Vec<i64>>>,
}

impl RateLimiter {
    pub fn new(threshold: usize, window_minutes: u64) -> Self {
        Self {
            threshold,
            window_secs: (window_minutes as i64).saturating_mul(60),
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Record a request made at `now` and report whether it goes over the threshold.
    pub async fn exceeds_limit(&self, requester: RequesterId, now: i64) -> bool {
        let mut windows = self.windows.lock().await;
        let window = windows.entry(requester).or_default();

        let cutoff = now.saturating_sub(self.window_secs);
        if window.iter().any(|&t| t < cutoff) {
            window.clear();
        }

        window.push(now);
        window.len() > self.threshold
    }

    /// Number of requests currently recorded for `requester`
    #[cfg(test)]
    pub async fn recorded(&self, requester: RequesterId) -> usize {
        let windows = self.windows.lock().await;
        windows.get(&requester).map_or(0, Vec::len)
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    pub fn window_minutes(&self) -> i64 {
        self.window_secs / 60
    }
}
