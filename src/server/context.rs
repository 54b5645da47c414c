// src/server/context.rs

use crate::core::state::GatewayState;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::{Semaphore, broadcast};
use tokio::task::JoinSet;
use tracing_subscriber::{filter::EnvFilter, reload};

/// Handle to the reloadable log filter installed by `main`.
pub type LogReloadHandle = reload::Handle<EnvFilter, tracing_subscriber::Registry>;

/// Holds all the initialized state required to run the server's main loop.
pub struct ServerContext {
    pub state: Arc<GatewayState>,
    pub listener: TcpListener,
    pub shutdown_tx: broadcast::Sender<()>,
    pub background_tasks: JoinSet<Result<(), anyhow::Error>>,
    /// Bounds concurrent client connections to `max_clients`.
    pub connection_permits: Arc<Semaphore>,
    pub config_path: String,
    pub log_reload_handle: Arc<LogReloadHandle>,
}
