// src/server/spawner.rs

//! Spawns all of the server's long-running background tasks.

use super::context::ServerContext;
use super::metrics_server;
use crate::core::tasks::{PoolReaperTask, SessionReaperTask};
use tracing::info;

/// Spawns all background tasks into the context's JoinSet.
pub fn spawn_all(ctx: &mut ServerContext) {
    let state = &ctx.state;
    let shutdown_tx = &ctx.shutdown_tx;
    let background_tasks = &mut ctx.background_tasks;

    // --- Metrics Server ---
    if state.config.metrics.enabled {
        let metrics_state = state.clone();
        let shutdown_rx_metrics = shutdown_tx.subscribe();
        background_tasks.spawn(async move {
            metrics_server::run_metrics_server(metrics_state, shutdown_rx_metrics).await
        });
    } else {
        info!("Prometheus metrics server is disabled in the configuration.");
    }

    // --- Maintenance Tasks ---
    let session_reaper = SessionReaperTask::new(
        state.sessions.clone(),
        state.config.sessions.sweep_interval(),
        state.config.sessions.idle_timeout(),
    );
    let shutdown_rx_sessions = shutdown_tx.subscribe();
    background_tasks.spawn(async move {
        session_reaper.run(shutdown_rx_sessions).await;
        Ok(())
    });

    let pool_reaper = PoolReaperTask::new(state.pool.clone(), state.config.pool.reap_interval());
    let shutdown_rx_pool = shutdown_tx.subscribe();
    background_tasks.spawn(async move {
        pool_reaper.run(shutdown_rx_pool).await;
        Ok(())
    });

    info!("All background tasks have been spawned.");
}
