// tests/integration/connection_test.rs

//! End-to-end tests over a real TCP socket using the length-delimited framing.

use super::test_helpers::{SLOW_BACKEND, TestContext};
use bytes::Bytes;
use docgate::config::Config;
use docgate::connection::ConnectionHandler;
use docgate::core::protocol::{self, Document, Value};
use docgate::core::state::GatewayState;
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::codec::{Framed, LengthDelimitedCodec};

type Client = Framed<TcpStream, LengthDelimitedCodec>;

/// Accepts one connection and serves it with a `ConnectionHandler`.
async fn serve_one(
    state: Arc<GatewayState>,
    shutdown_rx: broadcast::Receiver<()>,
) -> (Client, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let server_addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (socket, addr) = listener.accept().await.unwrap();
        let _ = ConnectionHandler::new(addr, state, 1, shutdown_rx)
            .run(socket)
            .await;
    });

    let socket = TcpStream::connect(server_addr).await.unwrap();
    (Framed::new(socket, LengthDelimitedCodec::new()), server)
}

async fn roundtrip(client: &mut Client, request: Document) -> Document {
    client.send(protocol::encode(&request)).await.unwrap();
    let frame = client.next().await.unwrap().unwrap();
    protocol::decode(&frame).unwrap()
}

/// Polls `condition` until it holds or two seconds pass.
async fn eventually(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}

#[tokio::test]
async fn test_requests_over_tcp() {
    let ctx = TestContext::new().await;
    let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let (mut client, _server) = serve_one(ctx.state.clone(), shutdown_rx).await;

    let response = roundtrip(&mut client, Document::new().with("ping", 1)).await;
    assert_eq!(response.get("ok"), Some(&Value::Double(1.0)));

    let response = roundtrip(
        &mut client,
        Document::new().with("create", "users").with("$db", "test"),
    )
    .await;
    assert_eq!(response.get("ok"), Some(&Value::Double(1.0)));
    assert!(ctx.backend.store().contains("test", "users"));

    // Malformed frames get an error response and the connection stays usable.
    client.send(Bytes::from_static(b"not json")).await.unwrap();
    let frame = client.next().await.unwrap().unwrap();
    let response = protocol::decode(&frame).unwrap();
    assert_eq!(response.get("code"), Some(&Value::Int32(9)));

    let response = roundtrip(&mut client, Document::new().with("ping", 1)).await;
    assert_eq!(response.get("ok"), Some(&Value::Double(1.0)));
}

#[tokio::test]
async fn test_pipelined_requests_are_answered_in_order() {
    let ctx = TestContext::new().await;
    let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let (mut client, _server) = serve_one(ctx.state.clone(), shutdown_rx).await;

    for name in ["a", "b", "a"] {
        client
            .feed(protocol::encode(
                &Document::new().with("create", name).with("$db", "test"),
            ))
            .await
            .unwrap();
    }
    SinkExt::<Bytes>::flush(&mut client).await.unwrap();

    let mut codes = Vec::new();
    for _ in 0..3 {
        let frame = client.next().await.unwrap().unwrap();
        let response = protocol::decode(&frame).unwrap();
        codes.push(response.get("code").cloned());
    }
    assert_eq!(codes, vec![None, None, Some(Value::Int32(48))]);
}

#[tokio::test]
async fn test_disconnect_mid_request_releases_pool_slot() {
    let mut config = Config::default();
    config.backend.latency_ms = SLOW_BACKEND.as_millis() as u64;
    let ctx = TestContext::with_config(config).await;
    let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let (mut client, server) = serve_one(ctx.state.clone(), shutdown_rx).await;

    client
        .send(protocol::encode(
            &Document::new().with("create", "users").with("$db", "test"),
        ))
        .await
        .unwrap();

    let pool = ctx.state.pool.clone();
    assert!(eventually(|| pool.stats().in_use == 1).await);

    drop(client);

    assert!(eventually(|| pool.stats().in_use == 0).await);
    tokio::time::timeout(Duration::from_secs(2), server)
        .await
        .expect("handler exits after the peer disconnects")
        .unwrap();
    assert!(!ctx.backend.store().contains("test", "users"));
}

#[tokio::test]
async fn test_shutdown_signal_ends_connection() {
    let ctx = TestContext::new().await;
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let (mut client, server) = serve_one(ctx.state.clone(), shutdown_rx).await;

    let response = roundtrip(&mut client, Document::new().with("ping", 1)).await;
    assert_eq!(response.get("ok"), Some(&Value::Double(1.0)));

    shutdown_tx.send(()).unwrap();
    tokio::time::timeout(Duration::from_secs(2), server)
        .await
        .expect("handler exits on shutdown")
        .unwrap();
    assert!(client.next().await.is_none());
}
