// src/core/tasks/pool_reaper.rs

use crate::core::metrics;
use crate::core::pool::Pool;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tracing::{debug, info};

/// A task that periodically closes surplus idle backend connections.
pub struct PoolReaperTask {
    pool: Pool,
    interval: Duration,
}

impl PoolReaperTask {
    pub fn new(pool: Pool, interval: Duration) -> Self {
        Self { pool, interval }
    }

    /// Runs the reaper loop until a shutdown signal is received.
    pub async fn run(self, mut shutdown_rx: broadcast::Receiver<()>) {
        info!("Pool reaper task started. Check interval: {:?}", self.interval);
        let mut interval = tokio::time::interval(self.interval);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let closed = self.pool.reap_idle(Instant::now());
                    let stats = self.pool.stats();
                    if closed > 0 {
                        debug!(
                            "Pool reaper: closed {} idle connections ({} open, {} idle).",
                            closed, stats.open, stats.idle
                        );
                    }
                    metrics::POOL_CONNECTIONS_OPEN.set(stats.open as f64);
                    metrics::POOL_CONNECTIONS_IN_USE.set(stats.in_use as f64);
                }
                _ = shutdown_rx.recv() => {
                    info!("Pool reaper task shutting down.");
                    return;
                }
            }
        }
    }
}
