// src/connection/guard.rs

//! Defines `ConnectionGuard`, an RAII guard for connection resource management.

use crate::core::metrics;
use std::net::SocketAddr;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Keeps per-connection bookkeeping consistent however the handler exits.
///
/// Dropping the guard cancels the connection's token, so any request still in
/// flight is aborted, and decrements the connected-clients gauge.
pub struct ConnectionGuard {
    client_id: u64,
    addr: SocketAddr,
    cancel: CancellationToken,
}

impl ConnectionGuard {
    pub(crate) fn new(client_id: u64, addr: SocketAddr, cancel: CancellationToken) -> Self {
        metrics::CONNECTED_CLIENTS.inc();
        Self {
            client_id,
            addr,
            cancel,
        }
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.cancel.cancel();
        metrics::CONNECTED_CLIENTS.dec();
        debug!(
            "ConnectionGuard dropping, cleaned up client {} ({}).",
            self.client_id, self.addr
        );
    }
}
