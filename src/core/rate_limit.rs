// src/core/rate_limit.rs

//! C7 — sliding-window rate limiting and the auth-token gate.
//!
//! The rate-limit bucket table is a `DashMap` keyed by `(client_ip, path)`,
//! the same shape as the teacher's per-key lock tables (`fetch_locks`,
//! `swr_locks`); expired buckets are swept by a background task the same
//! way `CacheLockCleanerTask` prunes stale entries.

use crate::config::RateLimitConfig;
use base64::Engine;
use dashmap::DashMap;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tracing::debug;

/// Endpoints that never require auth or count against the rate limit
/// (spec.md §4.7).
pub const EXEMPT_PATHS: &[&str] = &["/health", "/status", "/metrics", "/info", "/docs"];

struct Window {
    started_at: Instant,
    count: u32,
}

/// Sliding fixed-window limiter: one bucket per `(client_ip, path)`, reset
/// when the window elapses.
pub struct RateLimiter {
    buckets: DashMap<(String, String), Window>,
    window: Duration,
    max_requests: u32,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            buckets: DashMap::new(),
            window: Duration::from_millis(config.window_ms),
            max_requests: config.max_requests,
        }
    }

    /// Returns `Ok(())` if the request is within budget, `Err(retry_after)`
    /// otherwise.
    pub fn check(&self, client_ip: &str, path: &str) -> Result<(), Duration> {
        let key = (client_ip.to_string(), path.to_string());
        let mut entry = self
            .buckets
            .entry(key)
            .or_insert_with(|| Window {
                started_at: Instant::now(),
                count: 0,
            });

        if entry.started_at.elapsed() >= self.window {
            entry.started_at = Instant::now();
            entry.count = 0;
        }

        if entry.count >= self.max_requests {
            let retry_after = self.window.saturating_sub(entry.started_at.elapsed());
            return Err(retry_after);
        }

        entry.count += 1;
        Ok(())
    }

    pub async fn run_sweep(&self, mut shutdown_rx: broadcast::Receiver<()>) {
        let mut interval = tokio::time::interval(self.window.max(Duration::from_secs(1)));
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let window = self.window;
                    let removed_before = self.buckets.len();
                    self.buckets.retain(|_, w| w.started_at.elapsed() < window * 2);
                    let removed = removed_before.saturating_sub(self.buckets.len());
                    if removed > 0 {
                        debug!(removed, "rate limit sweep removed expired buckets");
                    }
                }
                _ = shutdown_rx.recv() => {
                    debug!("rate limit sweep task shutting down");
                    return;
                }
            }
        }
    }
}

/// Parses an `Authorization` header value and checks it against the
/// configured API token. Accepts `Bearer <token>`, `Basic
/// base64(user:token)` (the token is the portion after the colon), or the
/// raw token with no scheme prefix (spec.md §4.7).
pub fn check_auth(header_value: Option<&str>, expected_token: &str) -> bool {
    let Some(value) = header_value else {
        return false;
    };

    if let Some(token) = value.strip_prefix("Bearer ") {
        return token == expected_token;
    }

    if let Some(encoded) = value.strip_prefix("Basic ") {
        if let Ok(decoded) = base64::engine::general_purpose::STANDARD.decode(encoded) {
            if let Ok(text) = String::from_utf8(decoded) {
                if let Some((_, token)) = text.split_once(':') {
                    return token == expected_token;
                }
            }
        }
        return false;
    }

    value == expected_token
}

pub fn is_exempt_path(path: &str) -> bool {
    EXEMPT_PATHS.iter().any(|p| *p == path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_token_matches() {
        assert!(check_auth(Some("Bearer secret"), "secret"));
        assert!(!check_auth(Some("Bearer wrong"), "secret"));
    }

    #[test]
    fn raw_token_matches() {
        assert!(check_auth(Some("secret"), "secret"));
    }

    #[test]
    fn missing_header_fails() {
        assert!(!check_auth(None, "secret"));
    }

    #[test]
    fn exempt_paths_recognized() {
        assert!(is_exempt_path("/health"));
        assert!(!is_exempt_path("/v1/decrypt"));
    }
}
