//! Per-client request rate limiter
//!
//! Fixed-window counter keyed by client IP. Each client gets `limit`
//! requests per window; the window starts with the client's first request
//! and resets once it has elapsed.

use std::{
    collections::HashMap,
    net::IpAddr,
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Default request allowance per client per window
pub const DEFAULT_REQUESTS_PER_WINDOW: u32 = 100;

/// Default window length (1 minute)
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Outcome of a rate limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed {
        limit: u32,
        remaining: u32,
        /// Time until the client's window resets
        reset_after: Duration,
    },
    Limited {
        limit: u32,
        retry_after: Duration,
    },
}

impl RateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateDecision::Allowed { .. })
    }
}

/// Rate limiter that admits at most `limit` requests per client per window
///
/// The check and the increment happen under one lock, so concurrent
/// requests from the same client can never overshoot the limit.
#[derive(Debug)]
pub struct RateLimiter {
    windows: Mutex<HashMap<IpAddr, Window>>,
    limit: u32,
    window: Duration,
    /// Name for logging purposes
    name: String,
    /// Counter for debugging - total requests checked
    total_requests: AtomicU64,
    /// Counter for debugging - requests that were rejected
    rejected_requests: AtomicU64,
}

impl RateLimiter {
    /// Create a new rate limiter
    pub fn new(limit: u32, window: Duration, name: &str) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            limit,
            window,
            name: name.to_string(),
            total_requests: AtomicU64::new(0),
            rejected_requests: AtomicU64::new(0),
        }
    }

    /// Create a rate limiter with a one-minute window
    pub fn per_minute(limit: u32, name: &str) -> Self {
        Self::new(limit, DEFAULT_WINDOW, name)
    }

    /// Count a request from `client` and decide whether to admit it
    pub fn check(&self, client: IpAddr) -> RateDecision {
        let request_num = self.total_requests.fetch_add(1, Ordering::Relaxed) + 1;
        let now = Instant::now();

        let mut windows = self.windows.lock();
        let window = windows.entry(client).or_insert(Window {
            started: now,
            count: 0,
        });

        let elapsed = now.saturating_duration_since(window.started);
        if elapsed >= self.window {
            *window = Window {
                started: now,
                count: 0,
            };
        }

        let reset_after = self
            .window
            .saturating_sub(now.saturating_duration_since(window.started));

        if window.count >= self.limit {
            self.rejected_requests.fetch_add(1, Ordering::Relaxed);
            warn!(
                "[RATE_LIMITER:{}] #{} REJECTED {} - {} requests in window, resets in {:?}",
                self.name, request_num, client, window.count, reset_after
            );
            return RateDecision::Limited {
                limit: self.limit,
                retry_after: reset_after,
            };
        }

        window.count += 1;
        let remaining = self.limit - window.count;

        debug!(
            "[RATE_LIMITER:{}] #{} ALLOWED {} - {} remaining",
            self.name, request_num, client, remaining
        );

        RateDecision::Allowed {
            limit: self.limit,
            remaining,
            reset_after,
        }
    }

    /// Drop windows that have fully elapsed, returning how many were removed
    pub fn prune_expired(&self) -> usize {
        let now = Instant::now();
        let mut windows = self.windows.lock();
        let before = windows.len();
        windows.retain(|_, w| now.saturating_duration_since(w.started) < self.window);
        before - windows.len()
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Get statistics about this rate limiter (for debugging)
    pub fn stats(&self) -> RateLimiterStats {
        RateLimiterStats {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            rejected_requests: self.rejected_requests.load(Ordering::Relaxed),
            tracked_clients: self.windows.lock().len(),
            limit: self.limit,
            name: self.name.clone(),
        }
    }
}

/// Statistics about rate limiter usage
#[derive(Debug, Clone)]
pub struct RateLimiterStats {
    pub total_requests: u64,
    pub rejected_requests: u64,
    pub tracked_clients: usize,
    pub limit: u32,
    pub name: String,
}
