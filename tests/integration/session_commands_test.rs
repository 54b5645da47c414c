// tests/integration/session_commands_test.rs

//! Integration tests for session-scoped commands: `refreshSessions`,
//! `endSessions`, `authenticate`, `logout` and `connectionStatus`.

use super::test_helpers::{TestContext, assert_error, assert_ok_only, errmsg, lsid};
use docgate::core::protocol::{Document, Value};
use docgate::core::session::SessionId;

fn connection_status(id: &[u8]) -> Document {
    Document::new()
        .with("connectionStatus", 1)
        .with("$db", "admin")
        .with("lsid", lsid(id))
}

fn authenticate(id: &[u8], user: &str, pwd: &str) -> Document {
    Document::new()
        .with("authenticate", 1)
        .with("user", user)
        .with("pwd", pwd)
        .with("$db", "admin")
        .with("lsid", lsid(id))
}

fn logout(id: &[u8]) -> Document {
    Document::new()
        .with("logout", 1)
        .with("$db", "admin")
        .with("lsid", lsid(id))
}

fn authenticated_users(response: &Document) -> Vec<Value> {
    match response
        .get("authInfo")
        .and_then(Value::as_document)
        .and_then(|info| info.get("authenticatedUsers"))
    {
        Some(Value::Array(users)) => users.clone(),
        other => panic!("unexpected authInfo: {other:?}"),
    }
}

#[tokio::test]
async fn test_logout_is_idempotent() {
    let ctx = TestContext::new().await;
    assert_ok_only(&ctx.run(Document::new().with("logout", 1).with("$db", "test")).await);
    assert_ok_only(&ctx.run(Document::new().with("logout", 1).with("$db", "test")).await);

    assert_ok_only(&ctx.run(logout(b"s1")).await);
    assert_ok_only(&ctx.run(logout(b"s1")).await);
}

#[tokio::test]
async fn test_connection_status_unauthenticated() {
    let ctx = TestContext::new().await;
    let response = ctx.run(connection_status(b"s1")).await;

    let expected = Document::new()
        .with(
            "authInfo",
            Document::new()
                .with("authenticatedUsers", Vec::<Value>::new())
                .with("authenticatedUserRoles", Vec::<Value>::new()),
        )
        .with("ok", 1.0);
    assert_eq!(response, expected);
}

#[tokio::test]
async fn test_authenticate_then_logout() {
    let ctx = TestContext::with_auth().await;

    let response = ctx.run(authenticate(b"s1", "alice", "secret")).await;
    assert_eq!(response.get("ok"), Some(&Value::Double(1.0)));
    assert_eq!(response.get("user"), Some(&Value::from("alice")));

    let response = ctx.run(connection_status(b"s1")).await;
    let expected_user = Value::Document(Document::new().with("user", "alice").with("db", "admin"));
    assert_eq!(authenticated_users(&response), vec![expected_user]);

    assert_ok_only(&ctx.run(logout(b"s1")).await);
    let response = ctx.run(connection_status(b"s1")).await;
    assert!(authenticated_users(&response).is_empty());

    // The record survives logout.
    assert!(ctx.state.sessions.get(&SessionId::new(&b"s1"[..])).is_some());

    // A second logout has no effect.
    assert_ok_only(&ctx.run(logout(b"s1")).await);
}

#[tokio::test]
async fn test_authentication_is_per_session() {
    let ctx = TestContext::with_auth().await;
    ctx.run(authenticate(b"s1", "alice", "secret")).await;

    let response = ctx.run(connection_status(b"s2")).await;
    assert!(authenticated_users(&response).is_empty());
}

#[tokio::test]
async fn test_authenticate_wrong_password() {
    let ctx = TestContext::with_auth().await;
    let response = ctx.run(authenticate(b"s1", "alice", "wrong")).await;
    assert_error(&response, 18, "AuthenticationFailed");

    let response = ctx.run(authenticate(b"s1", "mallory", "secret")).await;
    assert_error(&response, 18, "AuthenticationFailed");
}

#[tokio::test]
async fn test_authenticate_requires_session() {
    let ctx = TestContext::with_auth().await;
    let request = Document::new()
        .with("authenticate", 1)
        .with("user", "alice")
        .with("pwd", "secret")
        .with("$db", "admin");
    assert_error(&ctx.run(request).await, 2, "BadValue");
}

#[tokio::test]
async fn test_authenticate_requires_user_field() {
    let ctx = TestContext::with_auth().await;
    let request = Document::new()
        .with("authenticate", 1)
        .with("pwd", "secret")
        .with("$db", "admin")
        .with("lsid", lsid(b"s1"));
    let response = ctx.run(request).await;
    assert_error(&response, 40414, "Location40414");
    assert_eq!(
        errmsg(&response),
        "BSON field 'authenticate.user' is missing but a required field"
    );
}

#[tokio::test]
async fn test_refresh_sessions_tolerates_invalid_entries() {
    let ctx = TestContext::new().await;
    let ids = vec![
        Value::Document(lsid(b"good-1")),
        Value::Int32(7),
        Value::Document(Document::new().with("id", "not-binary")),
        Value::Document(Document::new()),
        Value::Document(lsid(b"good-2")),
    ];
    let request = Document::new()
        .with("refreshSessions", ids)
        .with("$db", "admin");

    assert_ok_only(&ctx.run(request).await);
    assert_eq!(ctx.state.sessions.len(), 2);
    assert!(ctx.state.sessions.get(&SessionId::new(&b"good-1"[..])).is_some());
    assert!(ctx.state.sessions.get(&SessionId::new(&b"good-2"[..])).is_some());
}

#[tokio::test]
async fn test_refresh_sessions_requires_array() {
    let ctx = TestContext::new().await;
    let request = Document::new()
        .with("refreshSessions", 1)
        .with("$db", "admin");
    assert_error(&ctx.run(request).await, 14, "TypeMismatch");
}

#[tokio::test]
async fn test_end_sessions_removes_listed_sessions() {
    let ctx = TestContext::new().await;
    ctx.run(logout(b"a")).await;
    ctx.run(logout(b"b")).await;
    assert_eq!(ctx.state.sessions.len(), 2);

    let request = Document::new()
        .with(
            "endSessions",
            vec![
                Value::Document(lsid(b"a")),
                Value::Document(lsid(b"unknown")),
                Value::Null,
            ],
        )
        .with("$db", "admin");
    assert_ok_only(&ctx.run(request).await);
    assert_eq!(ctx.state.sessions.len(), 1);
    assert!(ctx.state.sessions.get(&SessionId::new(&b"b"[..])).is_some());
}

#[tokio::test]
async fn test_requests_touch_their_session() {
    let ctx = TestContext::new().await;
    let request = Document::new()
        .with("ping", 1)
        .with("$db", "admin")
        .with("lsid", lsid(b"pinger"));

    ctx.run(request.clone()).await;
    let first = ctx
        .state
        .sessions
        .get(&SessionId::new(&b"pinger"[..]))
        .unwrap()
        .last_use;
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    ctx.run(request).await;
    let second = ctx
        .state
        .sessions
        .get(&SessionId::new(&b"pinger"[..]))
        .unwrap()
        .last_use;

    assert!(second > first);
    assert_eq!(ctx.state.sessions.len(), 1);
}

#[tokio::test]
async fn test_malformed_lsid_is_rejected() {
    let ctx = TestContext::new().await;

    let request = Document::new().with("ping", 1).with("lsid", 5);
    let response = ctx.run(request).await;
    assert_error(&response, 14, "TypeMismatch");

    let request = Document::new().with("ping", 1).with("lsid", Document::new());
    let response = ctx.run(request).await;
    assert_error(&response, 40414, "Location40414");

    let request = Document::new()
        .with("ping", 1)
        .with("lsid", Document::new().with("id", "text"));
    assert_error(&ctx.run(request).await, 14, "TypeMismatch");

    let request = Document::new().with("ping", 1).with("lsid", lsid(b""));
    assert_error(&ctx.run(request).await, 2, "BadValue");

    assert!(ctx.state.sessions.is_empty());
}
