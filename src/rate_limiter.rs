use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use crate::error::RandomError;

/// Sliding window request limiter keyed by client.
///
/// Each key tracks hits in the current fixed window and the one before it.
/// The previous window's hits are weighted by how much of it still overlaps
/// the sliding window ending now, which smooths out bursts at window
/// boundaries without storing per-request timestamps.
#[derive(Clone)]
pub struct RateLimiter {
    max_requests: u64,
    window: Duration,
    windows: Arc<RwLock<HashMap<String, ClientWindow>>>,
}

/// Per-key counter state.
#[derive(Debug, Clone)]
struct ClientWindow {
    previous_hits: u64,
    current_hits: u64,
    window_start: Instant,
}

/// Outcome of a single rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitStatus {
    pub allowed: bool,
    pub limit: u64,
    pub remaining: u64,
    /// Whole seconds until the current window ends.
    pub reset: u64,
}

impl RateLimiter {
    pub fn new(max_requests: u64, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            windows: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Record a request for `key` if it fits within the limit.
    pub fn check(&self, key: &str) -> Result<RateLimitStatus, RandomError> {
        self.check_at(key, Instant::now())
    }

    pub fn check_at(&self, key: &str, now: Instant) -> Result<RateLimitStatus, RandomError> {
        let mut windows = self.windows.write()
            .map_err(|_| RandomError::Internal("Failed to acquire write lock on rate limit windows".to_string()))?;

        let entry = windows.entry(key.to_string()).or_insert_with(|| ClientWindow {
            previous_hits: 0,
            current_hits: 0,
            window_start: now,
        });

        self.roll_window(entry, now);

        let elapsed = now.saturating_duration_since(entry.window_start);
        let rate = self.estimated_rate(entry, elapsed);
        let reset = self.seconds_until_reset(elapsed);

        if rate + 1 > self.max_requests {
            return Ok(RateLimitStatus {
                allowed: false,
                limit: self.max_requests,
                remaining: 0,
                reset,
            });
        }

        entry.current_hits += 1;

        Ok(RateLimitStatus {
            allowed: true,
            limit: self.max_requests,
            remaining: self.max_requests - (rate + 1),
            reset,
        })
    }

    /// Advance `entry` so that `window_start` is the start of the window
    /// containing `now`.
    fn roll_window(&self, entry: &mut ClientWindow, now: Instant) {
        let elapsed = now.saturating_duration_since(entry.window_start);
        if elapsed < self.window {
            return;
        }

        let window_nanos = self.window.as_nanos().max(1);
        let windows_passed = elapsed.as_nanos() / window_nanos;
        let into_window = Duration::from_nanos((elapsed.as_nanos() % window_nanos) as u64);

        entry.previous_hits = if windows_passed == 1 { entry.current_hits } else { 0 };
        entry.current_hits = 0;
        entry.window_start = now - into_window;
    }

    fn estimated_rate(&self, entry: &ClientWindow, elapsed: Duration) -> u64 {
        let overlap = 1.0 - elapsed.as_secs_f64() / self.window.as_secs_f64();
        let weighted_previous = (entry.previous_hits as f64 * overlap.clamp(0.0, 1.0)).floor() as u64;
        weighted_previous + entry.current_hits
    }

    fn seconds_until_reset(&self, elapsed: Duration) -> u64 {
        let left = self.window.saturating_sub(elapsed);
        let secs = left.as_secs();
        if left.subsec_nanos() > 0 { secs + 1 } else { secs }
    }

    /// Drop keys idle for at least two windows; their state no longer
    /// affects any decision.
    pub fn cleanup_expired(&self) -> Result<usize, RandomError> {
        self.cleanup_expired_at(Instant::now())
    }

    pub fn cleanup_expired_at(&self, now: Instant) -> Result<usize, RandomError> {
        let mut windows = self.windows.write()
            .map_err(|_| RandomError::Internal("Failed to acquire write lock on rate limit windows".to_string()))?;

        let initial_count = windows.len();
        let horizon = self.window * 2;

        windows.retain(|_, entry| now.saturating_duration_since(entry.window_start) < horizon);

        Ok(initial_count - windows.len())
    }

    /// Number of keys currently tracked.
    pub fn len(&self) -> Result<usize, RandomError> {
        let windows = self.windows.read()
            .map_err(|_| RandomError::Internal("Failed to acquire read lock on rate limit windows".to_string()))?;
        Ok(windows.len())
    }

    pub fn is_empty(&self) -> Result<bool, RandomError> {
        Ok(self.len()? == 0)
    }
}
