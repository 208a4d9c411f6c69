//! Fixed-window request counter per credential.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::warn;

/// Maximum number of credential windows kept in memory.
const MAX_TRACKED_WINDOWS: usize = 10_000;

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    reset_at: Instant,
}

/// Per-credential rate limiter.
///
/// The first request opens a window of `window` length; up to
/// `max_requests` requests are allowed until it expires.
#[derive(Debug)]
pub struct RateWindowLimiter {
    max_requests: u32,
    window: Duration,
    windows: Mutex<HashMap<String, Window>>,
}

impl RateWindowLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Create from `RATE_LIMIT_REQUESTS` / `RATE_LIMIT_WINDOW` (seconds).
    pub fn from_env() -> Self {
        let max_requests = std::env::var("RATE_LIMIT_REQUESTS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(100);
        let window_secs = std::env::var("RATE_LIMIT_WINDOW")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3600);
        Self::new(max_requests, Duration::from_secs(window_secs))
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Count a request for `key`; returns `false` if the ceiling is reached.
    pub fn check(&self, key: &str) -> bool {
        self.check_at(key, Instant::now())
    }

    /// Same as [`check`](Self::check) with an explicit clock.
    pub fn check_at(&self, key: &str, now: Instant) -> bool {
        let mut windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(window) = windows.get_mut(key) {
            if now > window.reset_at {
                *window = self.open_window(now);
                return true;
            }
            if window.count < self.max_requests {
                window.count += 1;
                return true;
            }
            return false;
        }

        if windows.len() >= MAX_TRACKED_WINDOWS {
            Self::prune(&mut windows, now);
        }
        windows.insert(key.to_string(), self.open_window(now));
        self.max_requests > 0
    }

    fn open_window(&self, now: Instant) -> Window {
        Window {
            count: 1,
            reset_at: now + self.window,
        }
    }

    /// Drop expired windows; if still full, drop the ones closest to expiry.
    fn prune(windows: &mut HashMap<String, Window>, now: Instant) {
        windows.retain(|_, w| w.reset_at >= now);

        if windows.len() >= MAX_TRACKED_WINDOWS {
            let mut by_reset: Vec<_> = windows.iter().map(|(k, w)| (k.clone(), w.reset_at)).collect();
            by_reset.sort_by_key(|(_, reset_at)| *reset_at);

            let to_remove = windows.len() + 1 - MAX_TRACKED_WINDOWS;
            for (key, _) in by_reset.into_iter().take(to_remove) {
                windows.remove(&key);
            }
            warn!("Rate window map at capacity, evicted {} entries", to_remove);
        }
    }

    #[cfg(test)]
    pub(crate) fn tracked(&self) -> usize {
        self.windows.lock().unwrap().len()
    }

    #[cfg(test)]
    pub(crate) fn is_tracked(&self, key: &str) -> bool {
        self.windows.lock().unwrap().contains_key(key)
    }
}
