// src/core/pool/guard.rs

//! Defines `PooledConnection`, an RAII guard over one checked-out backend connection.

use super::PoolInner;
use crate::core::GatewayError;
use crate::core::backend::BackendConnection;
use crate::core::errors::BackendError;
use std::sync::Arc;
use tokio::sync::OwnedSemaphorePermit;
use tracing::debug;

/// Exclusive ownership of one backend connection until the guard is released
/// or dropped. Dropping the guard is the release: it cannot be skipped on any
/// exit path, including early returns with `?` and task cancellation.
pub struct PooledConnection {
    id: u64,
    /// `None` only while the guard is being dropped.
    conn: Option<Box<dyn BackendConnection>>,
    broken: bool,
    /// Set while a backend call may be running; cleared by `settle`.
    in_flight: bool,
    permit: Option<OwnedSemaphorePermit>,
    pool: Arc<PoolInner>,
}

impl PooledConnection {
    pub(super) fn new(
        id: u64,
        conn: Box<dyn BackendConnection>,
        permit: OwnedSemaphorePermit,
        pool: Arc<PoolInner>,
    ) -> Self {
        Self {
            id,
            conn: Some(conn),
            broken: false,
            in_flight: false,
            permit: Some(permit),
            pool,
        }
    }

    /// Identifier of the underlying connection, stable across reuse.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The backend connection, for one operation at a time.
    ///
    /// The call's outcome must be passed to [`settle`](Self::settle). If the
    /// guard is dropped first, the call was abandoned mid-operation and the
    /// connection is closed instead of recycled.
    pub fn conn(&mut self) -> Result<&mut dyn BackendConnection, GatewayError> {
        let conn = self.conn.as_deref_mut().ok_or_else(|| {
            GatewayError::Internal(format!("pooled connection #{} already released", self.id))
        })?;
        self.in_flight = true;
        Ok(conn)
    }

    /// Flags the connection so it is closed instead of recycled on release.
    pub fn mark_broken(&mut self) {
        self.broken = true;
    }

    /// True if the connection will be closed rather than recycled on release.
    pub fn is_broken(&self) -> bool {
        self.broken || self.in_flight
    }

    /// Converts the outcome of a backend call, marking the connection broken
    /// when the error leaves it unusable.
    pub fn settle<T>(&mut self, result: Result<T, BackendError>) -> Result<T, GatewayError> {
        self.in_flight = false;
        if let Err(e) = &result
            && e.is_fatal()
        {
            self.mark_broken();
        }
        result.map_err(GatewayError::from)
    }

    /// Returns the connection to the pool. Equivalent to dropping the guard.
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            if self.in_flight {
                debug!("Backend connection #{} released mid-operation.", self.id);
            }
            let reusable = !self.is_broken() && conn.is_healthy();
            self.pool.check_in(self.id, conn, reusable);
        }
        // Free the slot only after the connection is back in the free list.
        drop(self.permit.take());
    }
}

impl std::fmt::Debug for PooledConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledConnection")
            .field("id", &self.id)
            .field("broken", &self.broken)
            .field("in_flight", &self.in_flight)
            .finish()
    }
}
