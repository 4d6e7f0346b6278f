// src/server/spawner.rs

//! Spawns all of the server's long-running background tasks.

use super::context::ServerContext;
use crate::core::tasks::{CacheSweepTask, PlayerStoreMaintenanceTask, RateLimitSweepTask};
use std::time::Duration;
use tracing::info;

const PLAYER_STORE_SWEEP_INTERVAL: Duration = Duration::from_secs(3600);

/// Spawns all background maintenance tasks into the context's `JoinSet`.
pub fn spawn_all(ctx: &mut ServerContext) {
    let state = &ctx.state;
    let shutdown_tx = &ctx.shutdown_tx;
    let background_tasks = &mut ctx.background_tasks;

    let cache_sweep = CacheSweepTask::new(state.caches.clone());
    let shutdown_rx = shutdown_tx.subscribe();
    background_tasks.spawn(async move {
        cache_sweep.run(shutdown_rx).await;
    });

    let player_store_maintenance =
        PlayerStoreMaintenanceTask::new(state.player_store.clone(), PLAYER_STORE_SWEEP_INTERVAL);
    let shutdown_rx = shutdown_tx.subscribe();
    background_tasks.spawn(async move {
        player_store_maintenance.run(shutdown_rx).await;
    });

    let rate_limit_sweep = RateLimitSweepTask::new(state.rate_limiter.clone());
    let shutdown_rx = shutdown_tx.subscribe();
    background_tasks.spawn(async move {
        rate_limit_sweep.run(shutdown_rx).await;
    });

    info!("all background tasks have been spawned");
}
