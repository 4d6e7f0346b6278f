// src/core/health.rs

//! Windowed health-status classification (spec.md §9, Open Question 1).
//!
//! Resolves the ambiguity in favor of a sliding window rather than a
//! monotonic cumulative counter: a fixed-size ring of per-second
//! success/error buckets, the same shape as the teacher's `LatencyMonitor`
//! ring-buffer sampler, so a transient error spike recovers once it scrolls
//! out of the window instead of permanently dragging the status down.

use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, Copy, Default)]
struct Bucket {
    second: u64,
    total: u32,
    errors: u32,
}

/// Tracks request outcomes over the last `window_secs` one-second buckets.
pub struct HealthTracker {
    buckets: Mutex<Vec<Bucket>>,
    window_secs: usize,
}

/// Coarse health classification returned by `/status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl HealthTracker {
    pub fn new(window_secs: usize) -> Self {
        Self {
            buckets: Mutex::new(vec![Bucket::default(); window_secs.max(1)]),
            window_secs: window_secs.max(1),
        }
    }

    fn now_secs() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }

    /// Records the outcome of one request.
    pub fn record(&self, is_error: bool) {
        let now = Self::now_secs();
        let idx = (now as usize) % self.window_secs;
        let mut buckets = self.buckets.lock().unwrap();
        if buckets[idx].second != now {
            buckets[idx] = Bucket {
                second: now,
                total: 0,
                errors: 0,
            };
        }
        buckets[idx].total += 1;
        if is_error {
            buckets[idx].errors += 1;
        }
    }

    /// The error rate over the live portion of the window (buckets whose
    /// timestamp falls within the last `window_secs` seconds).
    pub fn error_rate(&self) -> f64 {
        let now = Self::now_secs();
        let buckets = self.buckets.lock().unwrap();
        let (mut total, mut errors) = (0u64, 0u64);
        for bucket in buckets.iter() {
            if now.saturating_sub(bucket.second) < self.window_secs as u64 {
                total += bucket.total as u64;
                errors += bucket.errors as u64;
            }
        }
        if total == 0 {
            0.0
        } else {
            errors as f64 / total as f64
        }
    }

    pub fn status(&self) -> HealthStatus {
        let rate = self.error_rate();
        if rate > 0.30 {
            HealthStatus::Unhealthy
        } else if rate > 0.10 {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        }
    }
}

impl Default for HealthTracker {
    fn default() -> Self {
        Self::new(120)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_healthy_with_no_traffic() {
        let tracker = HealthTracker::new(10);
        assert_eq!(tracker.status(), HealthStatus::Healthy);
    }

    #[test]
    fn classifies_unhealthy_above_30_percent_errors() {
        let tracker = HealthTracker::new(10);
        for _ in 0..10 {
            tracker.record(true);
        }
        tracker.record(false);
        assert_eq!(tracker.status(), HealthStatus::Unhealthy);
    }

    #[test]
    fn classifies_degraded_between_10_and_30_percent() {
        let tracker = HealthTracker::new(10);
        for _ in 0..2 {
            tracker.record(true);
        }
        for _ in 0..8 {
            tracker.record(false);
        }
        assert_eq!(tracker.status(), HealthStatus::Degraded);
    }
}
