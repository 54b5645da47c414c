// src/core/pool/mod.rs

//! A bounded pool of backend connections.
//!
//! A semaphore with `max_connections` permits bounds the number of connections
//! that exist at any time: a permit is held for as long as a connection is
//! checked out, and idle connections wait in a free list without one. Handing a
//! connection back (see [`PooledConnection`]) returns it to the free list first
//! and only then releases the permit, so a woken waiter always finds it.

mod guard;

pub use guard::PooledConnection;

use crate::config::PoolConfig;
use crate::core::GatewayError;
use crate::core::backend::{BackendConnection, ConnectionFactory};
use crate::core::metrics;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// A connection sitting in the free list.
struct IdleConnection {
    id: u64,
    conn: Box<dyn BackendConnection>,
    idle_since: Instant,
}

/// A point-in-time view of the pool's occupancy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolStats {
    pub max: usize,
    /// Connections that currently exist (idle + checked out).
    pub open: usize,
    pub idle: usize,
    /// Slots currently held by callers, including ones still connecting.
    pub in_use: usize,
}

pub(crate) struct PoolInner {
    factory: Arc<dyn ConnectionFactory>,
    config: PoolConfig,
    slots: Arc<Semaphore>,
    idle: Mutex<Vec<IdleConnection>>,
    open: AtomicUsize,
    next_id: AtomicU64,
    closed: AtomicBool,
}

impl PoolInner {
    /// Puts a released connection back into the free list, or closes it.
    fn check_in(&self, id: u64, conn: Box<dyn BackendConnection>, reusable: bool) {
        let mut idle = self.idle.lock();
        if reusable && !self.closed.load(Ordering::SeqCst) {
            idle.push(IdleConnection {
                id,
                conn,
                idle_since: Instant::now(),
            });
            debug!(
                "Returned backend connection #{} to the pool ({} idle).",
                id,
                idle.len()
            );
        } else {
            drop(idle);
            self.open.fetch_sub(1, Ordering::SeqCst);
            debug!("Closed backend connection #{} on release.", id);
        }
    }
}

/// The shared connection pool. Cloning is cheap and yields a handle to the same pool.
#[derive(Clone)]
pub struct Pool {
    inner: Arc<PoolInner>,
}

impl Pool {
    /// Creates an empty pool. Connections are opened lazily on demand.
    pub fn new(config: PoolConfig, factory: Arc<dyn ConnectionFactory>) -> Self {
        let slots = Arc::new(Semaphore::new(config.max_connections));
        Self {
            inner: Arc::new(PoolInner {
                factory,
                config,
                slots,
                idle: Mutex::new(Vec::new()),
                open: AtomicUsize::new(0),
                next_id: AtomicU64::new(1),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Checks out a connection for the exclusive use of the caller.
    ///
    /// Waits for a free slot until the acquire timeout elapses (`PoolExhausted`)
    /// or `cancel` fires (`Canceled`). An idle connection is reused when one is
    /// available; otherwise a new one is opened. A failure at any point frees
    /// the slot again.
    pub async fn acquire(
        &self,
        cancel: &CancellationToken,
    ) -> Result<PooledConnection, GatewayError> {
        if self.is_closed() {
            return Err(GatewayError::PoolClosed);
        }

        let started = Instant::now();
        let timeout = self.inner.config.acquire_timeout();
        let permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(GatewayError::Canceled),
            res = tokio::time::timeout(timeout, self.inner.slots.clone().acquire_owned()) => {
                match res {
                    Ok(Ok(permit)) => permit,
                    Ok(Err(_)) => return Err(GatewayError::PoolClosed),
                    Err(_) => {
                        metrics::POOL_ACQUIRE_TIMEOUTS_TOTAL.inc();
                        return Err(GatewayError::PoolExhausted { waited: started.elapsed() });
                    }
                }
            }
        };

        loop {
            let candidate = self.inner.idle.lock().pop();
            let Some(idle) = candidate else { break };
            if idle.conn.is_healthy() {
                debug!("Reusing idle backend connection #{}.", idle.id);
                return Ok(PooledConnection::new(
                    idle.id,
                    idle.conn,
                    permit,
                    self.inner.clone(),
                ));
            }
            self.inner.open.fetch_sub(1, Ordering::SeqCst);
            debug!("Discarded unhealthy idle backend connection #{}.", idle.id);
        }

        let conn = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(GatewayError::Canceled),
            res = self.inner.factory.connect() => res?,
        };
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.open.fetch_add(1, Ordering::SeqCst);
        debug!("Opened backend connection #{}.", id);
        Ok(PooledConnection::new(id, conn, permit, self.inner.clone()))
    }

    /// Closes idle connections that exceed `min_idle` and have been idle longer
    /// than the configured idle timeout. Returns how many were closed.
    pub fn reap_idle(&self, now: Instant) -> usize {
        let idle_timeout = self.inner.config.idle_timeout();
        let min_idle = self.inner.config.min_idle;
        let mut idle = self.inner.idle.lock();

        // The free list is ordered oldest first.
        let surplus = idle.len().saturating_sub(min_idle);
        let expired = idle
            .iter()
            .take(surplus)
            .take_while(|c| now.saturating_duration_since(c.idle_since) >= idle_timeout)
            .count();
        if expired == 0 {
            return 0;
        }
        idle.drain(..expired);
        drop(idle);
        self.inner.open.fetch_sub(expired, Ordering::SeqCst);
        expired
    }

    /// Stops handing out connections. Waiters fail with `PoolClosed`, idle
    /// connections are closed now and checked-out ones when they are released.
    pub fn close(&self) {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.inner.slots.close();
        let drained = {
            let mut idle = self.inner.idle.lock();
            let n = idle.len();
            idle.clear();
            n
        };
        self.inner.open.fetch_sub(drained, Ordering::SeqCst);
        info!("Connection pool closed ({} idle connections dropped).", drained);
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    pub fn stats(&self) -> PoolStats {
        let max = self.inner.config.max_connections;
        let idle = self.inner.idle.lock().len();
        let in_use = if self.is_closed() {
            self.inner.open.load(Ordering::SeqCst).saturating_sub(idle)
        } else {
            max.saturating_sub(self.inner.slots.available_permits())
        };
        PoolStats {
            max,
            open: self.inner.open.load(Ordering::SeqCst),
            idle,
            in_use,
        }
    }
}
