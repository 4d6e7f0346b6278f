// src/server/mod.rs

use crate::config::Config;
use anyhow::Result;
use std::net::SocketAddr;
use std::time::Duration;
use tracing::{info, warn};

mod context;
mod errors;
mod handlers;
mod initialization;
mod middleware;
mod routes;
mod spawner;

/// The main server startup function, orchestrating all setup phases.
pub async fn run(config: Config) -> Result<()> {
    let mut ctx = initialization::setup(config).await?;
    spawner::spawn_all(&mut ctx);

    let app = routes::build_router(ctx.state.clone());
    let listener = ctx.listener;
    let mut http_shutdown_rx = ctx.shutdown_tx.subscribe();

    let http_server = tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            http_shutdown_rx.recv().await.ok();
        })
        .await
    });

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("ctrl-c received, initiating shutdown");
        }
        Some(res) = ctx.background_tasks.join_next() => {
            if let Err(e) = res {
                warn!(error = ?e, "a background task panicked; shutting down");
            }
        }
    }

    let _ = ctx.shutdown_tx.send(());

    if let Err(e) = http_server.await {
        warn!(error = ?e, "http server task panicked during shutdown");
    }

    if tokio::time::timeout(Duration::from_secs(10), async {
        while ctx.background_tasks.join_next().await.is_some() {}
    })
    .await
    .is_err()
    {
        warn!("timed out waiting for background tasks to finish cleanly");
    }

    for handle in ctx.worker_join_handles {
        let _ = handle.await;
    }

    info!("server shutdown complete");
    Ok(())
}
