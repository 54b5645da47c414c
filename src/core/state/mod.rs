// src/core/state/mod.rs

//! Defines `GatewayState`, the shared services every connection and task uses.

use crate::config::Config;
use crate::core::auth::UserStore;
use crate::core::backend::ConnectionFactory;
use crate::core::metrics;
use crate::core::pool::Pool;
use crate::core::session::SessionRegistry;
use std::sync::Arc;

/// The central struct holding gateway-wide state.
///
/// It is wrapped in an `Arc` and handed to every connection handler and
/// background task. Each instance owns its own registry and pool, so tests can
/// build as many isolated gateways as they need.
#[derive(Clone)]
pub struct GatewayState {
    pub config: Arc<Config>,
    pub sessions: Arc<SessionRegistry>,
    pub pool: Pool,
    pub users: UserStore,
}

impl GatewayState {
    pub fn new(config: Config, factory: Arc<dyn ConnectionFactory>) -> Self {
        let sessions = Arc::new(SessionRegistry::new(config.sessions.max_sessions));
        let pool = Pool::new(config.pool.clone(), factory);
        let users = UserStore::from_config(&config.auth);
        Self {
            config: Arc::new(config),
            sessions,
            pool,
            users,
        }
    }

    /// Copies the registry and pool occupancy into the exported gauges.
    pub fn publish_gauges(&self) {
        let stats = self.pool.stats();
        metrics::ACTIVE_SESSIONS.set(self.sessions.len() as f64);
        metrics::POOL_CONNECTIONS_OPEN.set(stats.open as f64);
        metrics::POOL_CONNECTIONS_IN_USE.set(stats.in_use as f64);
    }
}

impl std::fmt::Debug for GatewayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayState")
            .field("sessions", &self.sessions.len())
            .field("pool", &self.pool.stats())
            .finish()
    }
}
