// src/core/state.rs

//! The central `ServerState`, wrapped in `Arc` and shared with every
//! resolver and background task, mirroring the teacher's
//! `core::state::ServerState` aggregation role.

use crate::config::Config;
use crate::core::analyzer::{Extractor, NaiveAnalyzer, Preprocessor};
use crate::core::cache::CacheRegistry;
use crate::core::health::HealthTracker;
use crate::core::player_store::PlayerStore;
use crate::core::rate_limit::RateLimiter;
use crate::core::solver_registry::SolverRegistry;
use crate::core::worker_pool::WorkerPool;
use anyhow::Result;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::broadcast;

/// All shared, server-wide state, constructed once at startup.
pub struct ServerState {
    pub config: Config,
    pub caches: Arc<CacheRegistry>,
    pub player_store: Arc<PlayerStore>,
    pub workers: Arc<WorkerPool>,
    pub solvers: Arc<SolverRegistry>,
    pub rate_limiter: Arc<RateLimiter>,
    pub health: Arc<HealthTracker>,
    pub preprocessor: Arc<dyn Preprocessor>,
    pub extractor: Arc<dyn Extractor>,
    pub started_at: Instant,
}

/// Background-task receivers/handles produced during initialization, handed
/// off to the spawner the way the teacher's `ServerInit` hands its channels
/// to `spawner::spawn_all`.
pub struct ServerInit {
    pub state: Arc<ServerState>,
    pub worker_join_handles: Vec<tokio::task::JoinHandle<()>>,
}

impl ServerState {
    /// Builds the full shared state from a resolved `Config`.
    pub fn initialize(config: Config, shutdown_tx: &broadcast::Sender<()>) -> Result<ServerInit> {
        let caches = Arc::new(CacheRegistry::new(&config.caches));
        let player_store = Arc::new(PlayerStore::new(
            &config.player_store,
            config.allowed_player_hosts.clone(),
        )?);
        let rate_limiter = Arc::new(RateLimiter::new(&config.rate_limit));
        let solvers = Arc::new(SolverRegistry::new());
        let health = Arc::new(HealthTracker::default());

        let (workers, worker_join_handles) = WorkerPool::spawn(&config.workers, || shutdown_tx.subscribe());

        let analyzer = Arc::new(NaiveAnalyzer::default());

        let state = Arc::new(Self {
            config,
            caches,
            player_store,
            workers,
            solvers,
            rate_limiter,
            health,
            preprocessor: analyzer.clone(),
            extractor: analyzer,
            started_at: Instant::now(),
        });

        Ok(ServerInit {
            state,
            worker_join_handles,
        })
    }

    pub fn uptime_seconds(&self) -> f64 {
        self.started_at.elapsed().as_secs_f64()
    }
}
