// src/server/initialization.rs

//! Builds the gateway state and binds the client listener.

use super::context::{LogReloadHandle, ServerContext};
use crate::config::Config;
use crate::core::backend::MemoryBackend;
use crate::core::state::GatewayState;
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::{Semaphore, broadcast};
use tokio::task::JoinSet;
use tracing::{info, warn};

/// Initializes all server components before starting the main loop.
pub async fn setup(
    config: Config,
    config_path: String,
    log_reload_handle: Arc<LogReloadHandle>,
) -> Result<ServerContext> {
    log_startup_info(&config);
    let (shutdown_tx, _) = broadcast::channel(1);

    let backend = MemoryBackend::new(config.backend.latency());
    let state = Arc::new(GatewayState::new(config, Arc::new(backend)));
    info!("Gateway state initialized.");

    let listener = TcpListener::bind((state.config.host.as_str(), state.config.port))
        .await
        .with_context(|| {
            format!(
                "Failed to bind listener on {}:{}",
                state.config.host, state.config.port
            )
        })?;
    info!(
        "docgate listening on {}:{}",
        state.config.host, state.config.port
    );
    let connection_permits = Arc::new(Semaphore::new(state.config.max_clients));

    Ok(ServerContext {
        state,
        listener,
        shutdown_tx,
        background_tasks: JoinSet::new(),
        connection_permits,
        config_path,
        log_reload_handle,
    })
}

/// Logs key configuration parameters at startup.
fn log_startup_info(config: &Config) {
    info!(
        "Backend pool: up to {} connections ({} kept idle), acquire timeout {:?}.",
        config.pool.max_connections,
        config.pool.min_idle,
        config.pool.acquire_timeout()
    );
    info!(
        "Sessions expire after {:?} of inactivity.",
        config.sessions.idle_timeout()
    );
    if config.auth.enabled {
        info!(
            "Authentication is enabled with {} configured users.",
            config.auth.users.len()
        );
    } else {
        warn!("WARNING: Authentication is disabled. Every client may run every command.");
    }
    if !config.backend.latency().is_zero() {
        info!(
            "In-memory backend adds {:?} of latency to each operation.",
            config.backend.latency()
        );
    }
}
