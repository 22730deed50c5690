//! Rate Limiting Infrastructure
//!
//! Common rate limiting primitives. The storage-backed implementation
//! lives with the service that owns the external store; these types are
//! the shared vocabulary between tiers.

use std::time::Duration;

/// Rate limit configuration for one window
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum requests allowed in the window
    pub max_requests: u32,
    /// Time window duration
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window: Duration::from_secs(60),
        }
    }
}

impl RateLimitConfig {
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window: Duration::from_secs(window_secs),
        }
    }

    pub fn window_ms(&self) -> i64 {
        self.window.as_millis() as i64
    }
}

/// Outcome of one rate limit check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub success: bool,
    /// The window's request budget
    pub limit: u32,
    /// Requests left in the current window
    pub remaining: u32,
    /// Unix milliseconds at which the window resets
    pub reset_at_ms: i64,
}

impl RateLimitDecision {
    /// Decision for a disabled limiter (fail-open operating mode)
    pub fn pass_through(limit: u32, now_ms: i64) -> Self {
        Self {
            success: true,
            limit,
            remaining: limit,
            reset_at_ms: now_ms,
        }
    }

    /// Seconds until the window resets, rounded up, never negative.
    /// Used for the `Retry-After` response header.
    pub fn retry_after_secs(&self, now_ms: i64) -> i64 {
        let delta = self.reset_at_ms - now_ms;
        if delta <= 0 { 0 } else { (delta + 999) / 1000 }
    }
}
