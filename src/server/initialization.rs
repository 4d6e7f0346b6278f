// src/server/initialization.rs

//! Handles the complete server initialization process: configuration is
//! already resolved by the caller, so this module builds shared state, lays
//! out the on-disk player store, and binds the listening socket.

use super::context::ServerContext;
use crate::config::Config;
use crate::core::state::ServerState;
use anyhow::Result;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tracing::info;

/// Initializes all server components before starting the main loop.
pub async fn setup(config: Config) -> Result<ServerContext> {
    log_startup_info(&config);
    let (shutdown_tx, _) = broadcast::channel(1);

    let server_init = ServerState::initialize(config, &shutdown_tx)?;
    let state = server_init.state;
    info!("resolver state initialized");

    state.player_store.ensure_root().await?;
    let removed = state.player_store.sweep_retention().await?;
    if removed > 0 {
        info!(removed, "startup retention sweep removed stale player scripts");
    }

    let listener = TcpListener::bind((state.config.host.as_str(), state.config.port)).await?;
    info!("resolver listening on {}:{}", state.config.host, state.config.port);

    Ok(ServerContext {
        state,
        listener,
        shutdown_tx,
        background_tasks: JoinSet::new(),
        worker_join_handles: server_init.worker_join_handles,
    })
}

fn log_startup_info(config: &Config) {
    info!(
        allowed_hosts = ?config.allowed_player_hosts,
        workers = config.workers.count,
        "resolver starting up"
    );
    if config.api_token.is_none() {
        tracing::warn!("no api_token configured; all non-exempt endpoints are unauthenticated");
    }
}
