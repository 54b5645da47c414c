// src/connection/handler.rs

//! Defines the `ConnectionHandler` which manages the full lifecycle of a client connection.
//!
//! Each connection is served by two tasks. A reader task pulls frames off the
//! socket and queues them; the handler task executes them one at a time, in
//! order, and writes the responses back. When the reader sees the peer go away
//! or the gateway shut down, it cancels the connection's token, which aborts
//! the request currently executing.

use super::guard::ConnectionGuard;
use crate::core::GatewayError;
use crate::core::handler::Router;
use crate::core::state::GatewayState;
use bytes::BytesMut;
use futures::{SinkExt, StreamExt};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc};
use tokio_util::codec::{Framed, LengthDelimitedCodec};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Requests a client may pipeline ahead of the one being executed.
const PIPELINE_DEPTH: usize = 16;

/// Manages the full lifecycle of a client connection.
pub struct ConnectionHandler {
    addr: SocketAddr,
    state: Arc<GatewayState>,
    client_id: u64,
    shutdown_rx: broadcast::Receiver<()>,
}

impl ConnectionHandler {
    pub fn new(
        addr: SocketAddr,
        state: Arc<GatewayState>,
        client_id: u64,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Self {
        Self {
            addr,
            state,
            client_id,
            shutdown_rx,
        }
    }

    /// Serves the connection until the peer disconnects or the gateway shuts down.
    pub async fn run(self, socket: TcpStream) -> Result<(), GatewayError> {
        let cancel = CancellationToken::new();
        let _guard = ConnectionGuard::new(self.client_id, self.addr, cancel.clone());

        let codec = LengthDelimitedCodec::builder()
            .max_frame_length(self.state.config.max_frame_bytes)
            .new_codec();
        let (mut sink, stream) = Framed::new(socket, codec).split();
        let (tx, mut rx) = mpsc::channel::<BytesMut>(PIPELINE_DEPTH);

        let reader = tokio::spawn(read_frames(
            stream,
            tx,
            self.shutdown_rx,
            cancel.clone(),
            self.addr,
        ));

        let router = Router::new(self.state.clone(), self.client_id, self.addr);
        let mut result = Ok(());
        while let Some(frame) = rx.recv().await {
            if cancel.is_cancelled() {
                break;
            }
            let response = router.handle(&frame, &cancel).await;
            if let Err(e) = sink.send(response).await {
                if !is_normal_disconnect(&e) {
                    warn!("Failed to write response to {}: {}", self.addr, e);
                    result = Err(e.into());
                }
                break;
            }
        }

        cancel.cancel();
        reader.abort();
        debug!("Connection handler for {} finished.", self.addr);
        result
    }
}

/// Reads frames until the peer disconnects, a read fails, or shutdown is
/// signalled, then cancels the connection's token.
async fn read_frames<S>(
    mut stream: S,
    tx: mpsc::Sender<BytesMut>,
    mut shutdown_rx: broadcast::Receiver<()>,
    cancel: CancellationToken,
    addr: SocketAddr,
) where
    S: futures::Stream<Item = Result<BytesMut, io::Error>> + Unpin,
{
    loop {
        tokio::select! {
            biased;
            _ = shutdown_rx.recv() => {
                info!("Connection handler for {} received shutdown signal.", addr);
                break;
            }
            _ = cancel.cancelled() => break,
            frame = stream.next() => match frame {
                Some(Ok(frame)) => {
                    tokio::select! {
                        biased;
                        _ = shutdown_rx.recv() => break,
                        _ = cancel.cancelled() => break,
                        sent = tx.send(frame) => {
                            if sent.is_err() {
                                break;
                            }
                        }
                    }
                }
                Some(Err(e)) => {
                    if is_normal_disconnect(&e) {
                        debug!("Connection from {} closed by peer: {}", addr, e);
                    } else {
                        warn!("Connection error for {}: {}", addr, e);
                    }
                    break;
                }
                None => {
                    debug!("Connection from {} closed by peer.", addr);
                    break;
                }
            }
        }
    }
    cancel.cancel();
}

/// True for I/O errors that just mean the client went away.
fn is_normal_disconnect(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionReset
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::UnexpectedEof
    )
}
