// src/core/cache/registry.rs

//! Wires up the three concrete in-memory caches (preprocessed, solver, sts)
//! and their shared periodic sweep task.

use crate::config::CachesConfig;
use crate::core::domain::{PreprocessedScript, SolversPair, Sts};
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::debug;

use super::tiered::TieredCache;

/// The three named in-memory caches from spec.md §3's cache-identities table.
pub struct CacheRegistry {
    pub preprocessed: TieredCache<PreprocessedScript>,
    pub solver: TieredCache<SolversPair>,
    pub sts: TieredCache<Sts>,
    sweep_interval: Duration,
}

impl CacheRegistry {
    pub fn new(config: &CachesConfig) -> Self {
        Self {
            preprocessed: TieredCache::new(
                "preprocessed",
                config.preprocessed.max_size,
                Duration::from_secs(config.preprocessed.ttl_secs),
            ),
            solver: TieredCache::new(
                "solver",
                config.solver.max_size,
                Duration::from_secs(config.solver.ttl_secs),
            ),
            sts: TieredCache::new(
                "sts",
                config.sts.max_size,
                Duration::from_secs(config.sts.ttl_secs),
            ),
            sweep_interval: Duration::from_secs(config.sweep_interval_secs),
        }
    }

    /// Clears the named cache(s). Returns the list of cache names cleared,
    /// used by the `clear_cache` resolver (§4.5.6).
    pub async fn clear(&self, cache_type: &str) -> Result<Vec<&'static str>, String> {
        match cache_type {
            "all" => {
                self.preprocessed.clear().await;
                self.solver.clear().await;
                self.sts.clear().await;
                Ok(vec!["preprocessed", "solver", "sts"])
            }
            "preprocessed" => {
                self.preprocessed.clear().await;
                Ok(vec!["preprocessed"])
            }
            "solver" => {
                self.solver.clear().await;
                Ok(vec!["solver"])
            }
            "sts" => {
                self.sts.clear().await;
                Ok(vec!["sts"])
            }
            other => Err(format!("unknown cache_type '{other}'")),
        }
    }

    /// Runs the periodic sweep that purges expired entries from every tier
    /// (spec.md §4.2). Never lets a single sweep failure take the process
    /// down, matching spec.md §7's sweep-resilience requirement.
    pub async fn run_sweep(&self, mut shutdown_rx: broadcast::Receiver<()>) {
        let mut interval = tokio::time::interval(self.sweep_interval);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let pp = self.preprocessed.sweep_expired().await;
                    let sv = self.solver.sweep_expired().await;
                    let st = self.sts.sweep_expired().await;
                    if pp + sv + st > 0 {
                        debug!(
                            preprocessed = pp, solver = sv, sts = st,
                            "cache sweep purged expired entries"
                        );
                    }
                }
                _ = shutdown_rx.recv() => {
                    debug!("cache sweep task shutting down");
                    return;
                }
            }
        }
    }
}
