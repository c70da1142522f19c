//! Per-client request limiting.

use crate::config::RateLimitConfig;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};
use tokio::time::Instant;

/// Sliding-window rate limiter keyed by client.
///
/// Timestamps of accepted requests are kept per key; a request is allowed when
/// fewer than `max_requests` fall inside the trailing window.
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    hits: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl RateLimiter {
    /// Creates a limiter.
    #[must_use]
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            hits: Mutex::new(HashMap::new()),
        }
    }

    /// Records a request from `key` and reports whether it is allowed.
    pub fn check(&self, key: &str) -> bool {
        self.check_at(key, Instant::now())
    }

    fn check_at(&self, key: &str, now: Instant) -> bool {
        let mut hits = self.hits.lock().unwrap_or_else(PoisonError::into_inner);

        // Drop idle clients so the map does not grow without bound
        hits.retain(|_, times| {
            times
                .back()
                .is_some_and(|last| now.duration_since(*last) < self.config.window)
        });

        let times = hits.entry(key.to_string()).or_default();
        while times
            .front()
            .is_some_and(|first| now.duration_since(*first) >= self.config.window)
        {
            times.pop_front();
        }

        if times.len() >= self.config.max_requests as usize {
            return false;
        }
        times.push_back(now);
        true
    }
}
