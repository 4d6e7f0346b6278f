// src/core/tasks/rate_limit_sweep.rs

use crate::core::rate_limit::RateLimiter;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Periodically removes expired rate-limit buckets, mirroring the teacher's
/// `CacheLockCleanerTask` strong-count sweep cadence but for fixed-window
/// counters instead of `Arc` lock handles.
pub struct RateLimitSweepTask {
    limiter: Arc<RateLimiter>,
}

impl RateLimitSweepTask {
    pub fn new(limiter: Arc<RateLimiter>) -> Self {
        Self { limiter }
    }

    pub async fn run(self, shutdown_rx: broadcast::Receiver<()>) {
        self.limiter.run_sweep(shutdown_rx).await;
    }
}
