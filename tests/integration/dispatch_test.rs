// tests/integration/dispatch_test.rs

//! Integration tests for the request pipeline: decoding, authorization,
//! unknown commands, cancellation and pool exhaustion.

use super::test_helpers::{SLOW_BACKEND, TestContext, assert_error, assert_ok_only, errmsg, lsid};
use docgate::config::Config;
use docgate::core::protocol::{self, Document, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn test_ping() {
    let ctx = TestContext::new().await;
    assert_ok_only(&ctx.run(Document::new().with("ping", 1).with("$db", "admin")).await);
}

#[tokio::test]
async fn test_unknown_command() {
    let ctx = TestContext::new().await;
    let response = ctx
        .run(Document::new().with("frobnicate", 1).with("$db", "admin"))
        .await;
    assert_error(&response, 59, "CommandNotFound");
    assert_eq!(errmsg(&response), "no such command: 'frobnicate'");
}

#[tokio::test]
async fn test_malformed_payload() {
    let ctx = TestContext::new().await;
    assert_error(&ctx.run_raw(b"{not json").await, 9, "FailedToParse");
    assert_error(&ctx.run_raw(b"[1, 2, 3]").await, 9, "FailedToParse");
    assert_error(&ctx.run_raw(b"{}").await, 9, "FailedToParse");
    assert_error(
        &ctx.run_raw(br#"{"ping": 1, "lsid": {"id": {"$binary": "zz"}}}"#)
            .await,
        9,
        "FailedToParse",
    );
}

#[tokio::test]
async fn test_protected_command_requires_authentication() {
    let ctx = TestContext::with_auth().await;
    let request = Document::new()
        .with("create", "users")
        .with("$db", "test")
        .with("lsid", lsid(b"s1"));

    let response = ctx.run(request.clone()).await;
    assert_error(&response, 13, "Unauthorized");
    assert_eq!(errmsg(&response), "Command create requires authentication");
    assert!(ctx.backend.store().is_empty());

    let auth = Document::new()
        .with("authenticate", 1)
        .with("user", "alice")
        .with("pwd", "secret")
        .with("$db", "admin")
        .with("lsid", lsid(b"s1"));
    assert_eq!(ctx.run(auth).await.get("ok"), Some(&Value::Double(1.0)));

    assert_ok_only(&ctx.run(request.clone()).await);

    let logout = Document::new()
        .with("logout", 1)
        .with("$db", "admin")
        .with("lsid", lsid(b"s1"));
    assert_ok_only(&ctx.run(logout).await);
    assert_error(&ctx.run(request).await, 13, "Unauthorized");
}

#[tokio::test]
async fn test_requests_without_session_are_unauthorized() {
    let ctx = TestContext::with_auth().await;
    let response = ctx
        .run(Document::new().with("drop", "users").with("$db", "test"))
        .await;
    assert_error(&response, 13, "Unauthorized");

    // Commands allowed without authentication still work.
    assert_ok_only(&ctx.run(Document::new().with("ping", 1)).await);
}

#[tokio::test]
async fn test_session_cap() {
    let mut config = Config::default();
    config.sessions.max_sessions = 1;
    let ctx = TestContext::with_config(config).await;

    let ping = |id: &[u8]| Document::new().with("ping", 1).with("lsid", lsid(id));
    assert_ok_only(&ctx.run(ping(b"first")).await);
    assert_error(&ctx.run(ping(b"second")).await, 261, "TooManyLogicalSessions");
    // Existing sessions keep working.
    assert_ok_only(&ctx.run(ping(b"first")).await);
}

#[tokio::test]
async fn test_cancellation_interrupts_backend_call_and_releases_connection() {
    let mut config = Config::default();
    config.backend.latency_ms = SLOW_BACKEND.as_millis() as u64;
    let ctx = Arc::new(TestContext::with_config(config).await);

    let cancel = CancellationToken::new();
    let request = protocol::encode(
        &Document::new().with("create", "users").with("$db", "test"),
    );
    let task = {
        let ctx = ctx.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { ctx.router.route(&request, &cancel).await })
    };

    // Let the request reach the backend call.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(ctx.state.pool.stats().in_use, 1);

    let started = Instant::now();
    cancel.cancel();
    let response = task.await.unwrap();
    assert!(started.elapsed() < Duration::from_secs(1));
    assert_error(&response, 11601, "Interrupted");

    // The slot is free again and the interrupted connection was discarded.
    let stats = ctx.state.pool.stats();
    assert_eq!(stats.in_use, 0);
    assert_eq!(stats.open, 0);
    assert!(!ctx.backend.store().contains("test", "users"));
}

#[tokio::test]
async fn test_pool_exhaustion_maps_to_exceeded_time_limit() {
    let mut config = Config::default();
    config.pool.max_connections = 1;
    config.pool.min_idle = 0;
    config.pool.acquire_timeout_ms = 50;
    config.backend.latency_ms = 500;
    let ctx = Arc::new(TestContext::with_config(config).await);

    let slow = {
        let ctx = ctx.clone();
        tokio::spawn(async move {
            ctx.run(Document::new().with("create", "slow").with("$db", "test"))
                .await
        })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;

    let response = ctx
        .run(Document::new().with("create", "fast").with("$db", "test"))
        .await;
    assert_error(&response, 50, "ExceededTimeLimit");

    assert_ok_only(&slow.await.unwrap());
    // Once the slow request finished, the pool serves requests again.
    assert_ok_only(
        &ctx.run(Document::new().with("create", "fast").with("$db", "test"))
            .await,
    );
}

#[tokio::test]
async fn test_closed_pool_maps_to_shutdown_in_progress() {
    let ctx = TestContext::new().await;
    ctx.state.pool.close();
    let response = ctx
        .run(Document::new().with("create", "users").with("$db", "test"))
        .await;
    assert_error(&response, 91, "ShutdownInProgress");

    // Commands that never touch the backend keep working during shutdown.
    assert_ok_only(&ctx.run(Document::new().with("ping", 1)).await);
    let logout = Document::new()
        .with("logout", 1)
        .with("$db", "admin")
        .with("lsid", lsid(b"s1"));
    assert_ok_only(&ctx.run(logout).await);
    assert_eq!(ctx.backend.connections_opened(), 0);
}

#[tokio::test]
async fn test_dropped_request_discards_its_connection() {
    let mut config = Config::default();
    config.backend.latency_ms = SLOW_BACKEND.as_millis() as u64;
    let ctx = TestContext::with_config(config).await;

    let request = protocol::encode(&Document::new().with("create", "users").with("$db", "test"));
    let outcome = tokio::time::timeout(
        Duration::from_millis(20),
        ctx.router.route(&request, &ctx.cancel),
    )
    .await;
    assert!(outcome.is_err());

    let stats = ctx.state.pool.stats();
    assert_eq!(stats.in_use, 0);
    assert_eq!(stats.open, 0);
    assert_eq!(stats.idle, 0);
}
