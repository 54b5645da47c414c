// src/core/tasks/session_reaper.rs

use crate::core::metrics;
use crate::core::session::SessionRegistry;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tracing::{debug, info};

/// A task that periodically removes logical sessions that have been idle for
/// longer than the configured timeout.
pub struct SessionReaperTask {
    sessions: Arc<SessionRegistry>,
    interval: Duration,
    idle_timeout: Duration,
}

impl SessionReaperTask {
    pub fn new(sessions: Arc<SessionRegistry>, interval: Duration, idle_timeout: Duration) -> Self {
        Self {
            sessions,
            interval,
            idle_timeout,
        }
    }

    /// Runs the sweep loop until a shutdown signal is received.
    pub async fn run(self, mut shutdown_rx: broadcast::Receiver<()>) {
        info!(
            "Session reaper task started. Sweep interval: {:?}, idle timeout: {:?}",
            self.interval, self.idle_timeout
        );
        let mut interval = tokio::time::interval(self.interval);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.sweep(Instant::now());
                }
                _ = shutdown_rx.recv() => {
                    info!("Session reaper task shutting down.");
                    return;
                }
            }
        }
    }

    /// Performs one sweep and returns the number of sessions removed.
    pub fn sweep(&self, now: Instant) -> usize {
        let expired = self.sessions.expire(now, self.idle_timeout);
        if expired > 0 {
            metrics::EXPIRED_SESSIONS_TOTAL.inc_by(expired as f64);
            debug!(
                "Session reaper: expired {} idle sessions, {} remain.",
                expired,
                self.sessions.len()
            );
        }
        metrics::ACTIVE_SESSIONS.set(self.sessions.len() as f64);
        expired
    }
}
