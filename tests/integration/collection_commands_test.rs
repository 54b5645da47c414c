// tests/integration/collection_commands_test.rs

//! Integration tests for the `create`, `drop` and `collStats` commands.

use super::test_helpers::{TestContext, assert_error, assert_ok_only, errmsg};
use docgate::core::protocol::{Document, Value};

fn create(db: &str, coll: &str) -> Document {
    Document::new().with("create", coll).with("$db", db)
}

fn drop_cmd(db: &str, coll: &str) -> Document {
    Document::new().with("drop", coll).with("$db", db)
}

fn coll_stats(db: &str, coll: &str, scale: Option<Value>) -> Document {
    let mut doc = Document::new().with("collStats", coll).with("$db", db);
    if let Some(scale) = scale {
        doc.insert("scale", scale);
    }
    doc
}

#[tokio::test]
async fn test_create_collection() {
    let ctx = TestContext::new().await;
    assert_ok_only(&ctx.run(create("test", "users")).await);
    assert!(ctx.backend.store().contains("test", "users"));
}

#[tokio::test]
async fn test_create_existing_collection_fails() {
    let ctx = TestContext::new().await;
    assert_ok_only(&ctx.run(create("test", "users")).await);

    let response = ctx.run(create("test", "users")).await;
    assert_error(&response, 48, "NamespaceExists");
    assert_eq!(errmsg(&response), "Collection test.users already exists.");
}

#[tokio::test]
async fn test_create_rejects_invalid_names() {
    let ctx = TestContext::new().await;
    for name in ["", ".hidden", "a$b", "nul\0byte"] {
        let response = ctx.run(create("test", name)).await;
        assert_error(&response, 73, "InvalidNamespace");
        assert_eq!(errmsg(&response), format!("Invalid collection name: {name}"));
    }
    assert!(ctx.backend.store().is_empty());
    assert_eq!(ctx.backend.connections_opened(), 0);
}

#[tokio::test]
async fn test_create_name_length_boundary() {
    let ctx = TestContext::new().await;
    assert_ok_only(&ctx.run(create("test", &"a".repeat(235))).await);
    assert_error(&ctx.run(create("test", &"a".repeat(236))).await, 73, "InvalidNamespace");
}

#[tokio::test]
async fn test_create_requires_string_name_and_db() {
    let ctx = TestContext::new().await;

    let response = ctx
        .run(Document::new().with("create", 1).with("$db", "test"))
        .await;
    assert_error(&response, 14, "TypeMismatch");

    let response = ctx.run(Document::new().with("create", "users")).await;
    assert_error(&response, 40414, "Location40414");
    assert_eq!(
        errmsg(&response),
        "BSON field 'create.$db' is missing but a required field"
    );
}

#[tokio::test]
async fn test_drop_missing_collection_returns_ok_only() {
    let ctx = TestContext::new().await;
    assert_ok_only(&ctx.run(drop_cmd("test", "nothing_here")).await);
}

#[tokio::test]
async fn test_drop_existing_collection() {
    let ctx = TestContext::new().await;
    ctx.run(create("test", "users")).await;

    let response = ctx.run(drop_cmd("test", "users")).await;
    let expected = Document::new()
        .with("nIndexesWas", 1)
        .with("ns", "test.users")
        .with("ok", 1.0);
    assert_eq!(response, expected);
    assert!(!ctx.backend.store().contains("test", "users"));

    // A second drop finds nothing.
    assert_ok_only(&ctx.run(drop_cmd("test", "users")).await);
}

#[tokio::test]
async fn test_drop_invalid_namespace() {
    let ctx = TestContext::new().await;
    let response = ctx.run(drop_cmd("test", "bad$name")).await;
    assert_error(&response, 73, "InvalidNamespace");
    assert_eq!(errmsg(&response), "Invalid namespace specified 'test.bad$name'");
}

#[tokio::test]
async fn test_coll_stats_default_scale() {
    let ctx = TestContext::new().await;
    ctx.run(create("test", "users")).await;

    let response = ctx.run(coll_stats("test", "users", None)).await;
    let keys: Vec<&str> = response.keys().collect();
    assert_eq!(
        keys,
        [
            "ns",
            "size",
            "count",
            "storageSize",
            "nindexes",
            "totalIndexSize",
            "totalSize",
            "indexSizes",
            "scaleFactor",
            "ok"
        ]
    );
    assert_eq!(response.get("ns"), Some(&Value::from("test.users")));
    assert_eq!(response.get("count"), Some(&Value::Int32(0)));
    assert_eq!(response.get("storageSize"), Some(&Value::Int32(8192)));
    assert_eq!(response.get("totalSize"), Some(&Value::Int32(16384)));
    assert_eq!(response.get("scaleFactor"), Some(&Value::Int32(1)));
    assert_eq!(response.get("ok"), Some(&Value::Double(1.0)));
}

#[tokio::test]
async fn test_coll_stats_scale_forms_are_equivalent() {
    let ctx = TestContext::new().await;
    ctx.run(create("test", "users")).await;

    let baseline = ctx.run(coll_stats("test", "users", Some(Value::Int32(2)))).await;
    assert_eq!(baseline.get("storageSize"), Some(&Value::Int32(4096)));
    assert_eq!(baseline.get("scaleFactor"), Some(&Value::Int32(2)));

    for scale in [Value::Double(2.0), Value::Int64(2)] {
        let response = ctx.run(coll_stats("test", "users", Some(scale))).await;
        assert_eq!(response, baseline);
    }

    let null_scale = ctx.run(coll_stats("test", "users", Some(Value::Null))).await;
    let no_scale = ctx.run(coll_stats("test", "users", None)).await;
    assert_eq!(null_scale, no_scale);
}

#[tokio::test]
async fn test_coll_stats_rejects_non_numeric_scale() {
    let ctx = TestContext::new().await;
    ctx.run(create("test", "users")).await;

    let response = ctx
        .run(coll_stats("test", "users", Some(Value::from("x"))))
        .await;
    assert_error(&response, 14, "TypeMismatch");
    assert!(errmsg(&response).contains("collStats.scale"));
    // Validation failed before any backend work.
    assert_eq!(ctx.state.pool.stats().in_use, 0);
}

#[tokio::test]
async fn test_coll_stats_rejects_scale_below_one() {
    let ctx = TestContext::new().await;
    ctx.run(create("test", "users")).await;

    let response = ctx
        .run(coll_stats("test", "users", Some(Value::Int32(0))))
        .await;
    assert_error(&response, 2, "BadValue");
}

#[tokio::test]
async fn test_coll_stats_missing_collection() {
    let ctx = TestContext::new().await;
    let response = ctx.run(coll_stats("test", "ghost", None)).await;
    assert_error(&response, 26, "NamespaceNotFound");
    assert_eq!(errmsg(&response), "Collection [test.ghost] not found.");
}

#[tokio::test]
async fn test_backend_connections_are_reused() {
    let ctx = TestContext::new().await;
    for i in 0..10 {
        ctx.run(create("test", &format!("c{i}"))).await;
    }
    assert_eq!(ctx.backend.connections_opened(), 1);
    let stats = ctx.state.pool.stats();
    assert_eq!(stats.open, 1);
    assert_eq!(stats.idle, 1);
    assert_eq!(stats.in_use, 0);
}
