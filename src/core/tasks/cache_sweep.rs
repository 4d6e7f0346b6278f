// src/core/tasks/cache_sweep.rs

use crate::core::cache::CacheRegistry;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Periodically purges expired entries from the three in-memory caches.
pub struct CacheSweepTask {
    caches: Arc<CacheRegistry>,
}

impl CacheSweepTask {
    pub fn new(caches: Arc<CacheRegistry>) -> Self {
        Self { caches }
    }

    pub async fn run(self, shutdown_rx: broadcast::Receiver<()>) {
        self.caches.run_sweep(shutdown_rx).await;
    }
}
