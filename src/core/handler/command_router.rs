// src/core/handler/command_router.rs

//! The central component for turning a raw request into a response.
//!
//! The `Router` runs every request through the same pipeline: decode, touch the
//! request's logical session, check authorization, parse and validate the
//! command, check gateway state, execute it, and encode the outcome. Whatever
//! happens, the caller gets back an encoded document: either a success body
//! with `ok: 1.0` or a protocol error document.

use super::pipeline::{auth_check, state_check};
use crate::core::GatewayError;
use crate::core::commands::{Command, ExecutableCommand, ExecutionContext};
use crate::core::errors::translate;
use crate::core::metrics;
use crate::core::protocol::{self, Document};
use crate::core::state::GatewayState;
use bytes::Bytes;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info_span};

/// Routes the requests of one client connection.
pub struct Router {
    state: Arc<GatewayState>,
    client_id: u64,
    addr: SocketAddr,
}

impl Router {
    pub fn new(state: Arc<GatewayState>, client_id: u64, addr: SocketAddr) -> Self {
        Self {
            state,
            client_id,
            addr,
        }
    }

    /// Handles one request frame and returns the encoded response frame.
    pub async fn handle(&self, raw: &[u8], cancel: &CancellationToken) -> Bytes {
        protocol::encode(&self.route(raw, cancel).await)
    }

    /// Handles one request frame and returns the response document.
    pub async fn route(&self, raw: &[u8], cancel: &CancellationToken) -> Document {
        let start_time = Instant::now();
        metrics::COMMANDS_PROCESSED_TOTAL.inc();

        let result = match protocol::decode(raw) {
            Ok(request) => {
                let name = request.command().unwrap_or_default().to_string();
                let span = info_span!(
                    "command",
                    name = %name,
                    client.addr = %self.addr,
                    client.id = %self.client_id,
                );
                self.dispatch(&request, &name, start_time, cancel)
                    .instrument(span)
                    .await
            }
            Err(e) => Err(e),
        };

        metrics::COMMAND_LATENCY_SECONDS.observe(start_time.elapsed().as_secs_f64());
        self.state.publish_gauges();

        match result {
            Ok(mut body) => {
                body.insert("ok", 1.0);
                body
            }
            Err(e) => {
                let err = translate(&e);
                metrics::COMMAND_ERRORS_TOTAL
                    .with_label_values(&[err.code_name()])
                    .inc();
                debug!("Client {} request failed: {}", self.client_id, err);
                err.to_document()
            }
        }
    }

    async fn dispatch(
        &self,
        request: &Document,
        name: &str,
        now: Instant,
        cancel: &CancellationToken,
    ) -> Result<Document, GatewayError> {
        let session = self
            .state
            .sessions
            .create_or_update_by_lsid(request, now)?
            .map(|(session, _created)| session);

        auth_check::check_authorization(&self.state, name, session.as_ref())?;

        let command = Command::from_request(request)?;
        state_check::check_gateway_state(&self.state, &command)?;
        debug!("Executing {} for client {}.", command.name(), self.client_id);

        let mut ctx = ExecutionContext {
            state: &self.state,
            cancel,
            now,
            session,
        };
        command.execute(&mut ctx).await
    }
}
