// src/core/tasks/player_store_maintenance.rs

use crate::core::player_store::PlayerStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

/// Periodically sweeps the on-disk player-script store for retention-expired
/// files and cleans stale fetch-coalescing locks.
pub struct PlayerStoreMaintenanceTask {
    store: Arc<PlayerStore>,
    interval: Duration,
}

impl PlayerStoreMaintenanceTask {
    pub fn new(store: Arc<PlayerStore>, interval: Duration) -> Self {
        Self { store, interval }
    }

    pub async fn run(self, shutdown_rx: broadcast::Receiver<()>) {
        self.store.run_maintenance(self.interval, shutdown_rx).await;
    }
}
