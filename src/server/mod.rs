// src/server/mod.rs

use crate::config::Config;
use anyhow::Result;
use std::sync::Arc;

mod connection_loop;
mod context;
mod initialization;
mod metrics_server;
mod spawner;

pub use context::LogReloadHandle;

/// The main server startup function, orchestrating all setup phases.
///
/// `config_path` is re-read on SIGHUP to apply a new `log_level`.
pub async fn run(
    config: Config,
    config_path: String,
    log_reload_handle: Arc<LogReloadHandle>,
) -> Result<()> {
    // 1. Initialize gateway state and the listener.
    let mut server_context = initialization::setup(config, config_path, log_reload_handle).await?;

    // 2. Spawn all background tasks.
    spawner::spawn_all(&mut server_context);

    // 3. Start the main connection acceptance loop. This function will run until shutdown.
    connection_loop::run(server_context).await;

    Ok(())
}
