// src/core/commands/context.rs

use crate::core::session::{Session, SessionId};
use crate::core::state::GatewayState;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// Everything a command needs while it executes.
pub struct ExecutionContext<'a> {
    pub state: &'a GatewayState,
    /// Fires when the client disconnects or the gateway shuts down.
    pub cancel: &'a CancellationToken,
    /// The time the request was received.
    pub now: Instant,
    /// The request's logical session, if it carried an `lsid`.
    pub session: Option<Session>,
}

impl ExecutionContext<'_> {
    pub fn session_id(&self) -> Option<&SessionId> {
        self.session.as_ref().map(|s| &s.id)
    }
}
