//! Fixed-window request counting, per key (caller identity or IP).
//!
//! Best-effort and non-durable: counts reset on restart, and the upstream
//! provider's own 429s remain the real enforcement authority. This exists
//! to keep one caller from burning the whole deployment's quota.

use std::time::{Duration, Instant};

use dashmap::DashMap;

struct Window {
    count: u32,
    reset_at: Instant,
}

pub struct FixedWindow {
    limit: u32,
    window: Duration,
    windows: DashMap<String, Window>,
}

impl FixedWindow {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            windows: DashMap::new(),
        }
    }

    /// Count one call against `key`. Returns `false` once the window's
    /// budget is spent; the counter keeps advancing so the window still
    /// resets on schedule.
    pub fn check(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut entry = self.windows.entry(key.to_string()).or_insert_with(|| Window {
            count: 0,
            reset_at: now + self.window,
        });
        if now >= entry.reset_at {
            entry.count = 0;
            entry.reset_at = now + self.window;
        }
        entry.count += 1;
        let allowed = entry.count <= self.limit;
        if !allowed {
            tracing::warn!(key = %key, count = entry.count, limit = self.limit, "rate.limited");
        }
        allowed
    }
}
