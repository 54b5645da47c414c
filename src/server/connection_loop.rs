// src/server/connection_loop.rs

//! Contains the main server loop for accepting connections and handling graceful shutdown.

use super::context::ServerContext;
use crate::config::Config;
use crate::connection::ConnectionHandler;
use crate::core::metrics;
use std::time::Duration;
use tokio::signal::unix::{SignalKind, signal};
use tokio::task::JoinSet;
use tracing::{error, info, warn};
use tracing_subscriber::filter::EnvFilter;

/// How long shutdown waits for connections and tasks to wind down.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// The main server loop that accepts connections and handles graceful shutdown.
pub async fn run(mut ctx: ServerContext) {
    let mut client_id_counter: u64 = 0;
    let mut client_tasks = JoinSet::new();

    let (mut sigint, mut sigterm, mut sighup) = match (
        signal(SignalKind::interrupt()),
        signal(SignalKind::terminate()),
        signal(SignalKind::hangup()),
    ) {
        (Ok(int), Ok(term), Ok(hup)) => (int, term, hup),
        _ => {
            error!("Failed to register signal handlers. Shutting down.");
            return;
        }
    };

    loop {
        tokio::select! {
            biased;

            _ = sigint.recv() => {
                info!("SIGINT received, initiating graceful shutdown.");
                break;
            }
            _ = sigterm.recv() => {
                info!("SIGTERM received, initiating graceful shutdown.");
                break;
            }
            _ = sighup.recv() => {
                reload_log_level(&ctx);
            }

            Some(res) = ctx.background_tasks.join_next() => {
                match res {
                    Ok(Ok(())) => warn!("A background task finished unexpectedly without an error."),
                    Ok(Err(e)) => { error!("CRITICAL: Background task failed: {}. Shutting down.", e); break; }
                    Err(e) => { error!("CRITICAL: Background task panicked: {e:?}. Shutting down."); break; }
                }
            },

            res = ctx.listener.accept() => {
                match res {
                    Ok((socket, addr)) => {
                        let Ok(permit) = ctx.connection_permits.clone().try_acquire_owned() else {
                            warn!("Rejecting connection from {}: max_clients reached.", addr);
                            continue;
                        };
                        info!("Accepted new connection from: {}", addr);
                        metrics::CONNECTIONS_RECEIVED_TOTAL.inc();

                        client_id_counter = client_id_counter.wrapping_add(1);
                        let handler = ConnectionHandler::new(
                            addr,
                            ctx.state.clone(),
                            client_id_counter,
                            ctx.shutdown_tx.subscribe(),
                        );
                        client_tasks.spawn(async move {
                            let _permit = permit;
                            if let Err(e) = handler.run(socket).await {
                                warn!("Connection from {} terminated unexpectedly: {}", addr, e);
                            }
                        });
                    }
                    Err(e) => error!("Failed to accept connection: {}", e),
                }
            },

            Some(res) = client_tasks.join_next() => {
                if let Err(e) = res
                    && e.is_panic()
                {
                    error!("A client handler panicked: {e:?}");
                }
            },
        }
    }

    info!("Shutting down. Sending signal to all tasks.");
    if ctx.shutdown_tx.send(()).is_err() {
        error!("Failed to send shutdown signal. Some tasks may not terminate gracefully.");
    }
    ctx.state.pool.close();

    if tokio::time::timeout(SHUTDOWN_GRACE, async {
        while client_tasks.join_next().await.is_some() {}
    })
    .await
    .is_err()
    {
        warn!("Timed out waiting for client connections to close; aborting the rest.");
        client_tasks.shutdown().await;
    }
    info!("All client connections closed.");

    info!("Waiting for background tasks to finish...");
    if tokio::time::timeout(SHUTDOWN_GRACE, async {
        while ctx.background_tasks.join_next().await.is_some() {}
    })
    .await
    .is_err()
    {
        warn!("Timed out waiting for background tasks to finish cleanly.");
    };
    info!("Server shutdown complete.");
}

/// Re-reads `log_level` from the configuration file and applies it.
fn reload_log_level(ctx: &ServerContext) {
    let config = match Config::from_file(&ctx.config_path) {
        Ok(config) => config,
        Err(e) => {
            warn!("SIGHUP: keeping the current log level, config reload failed: {:#}", e);
            return;
        }
    };
    let filter = match EnvFilter::try_new(&config.log_level) {
        Ok(filter) => filter,
        Err(e) => {
            warn!("SIGHUP: invalid log_level '{}': {}", config.log_level, e);
            return;
        }
    };
    match ctx.log_reload_handle.reload(filter) {
        Ok(()) => info!("SIGHUP: log level set to '{}'.", config.log_level),
        Err(e) => warn!("SIGHUP: failed to apply log level: {}", e),
    }
}
