// tests/property/namespace_test.rs

//! Property-based tests for collection name validation
//! Tests that `create` accepts exactly the names the namespace rule allows

use crate::test_helpers::{TestContext, errmsg};
use docgate::core::commands::helpers::is_valid_collection_name;
use docgate::core::protocol::{Document, Value};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        max_shrink_iters: 500,
        ..ProptestConfig::default()
    })]

    #[test]
    fn test_valid_names_are_created(name in "[a-zA-Z0-9_][a-zA-Z0-9_.-]{0,100}") {
        prop_assert!(is_valid_collection_name(&name));
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let ctx = TestContext::new().await;
            let response = ctx
                .run(Document::new().with("create", name.as_str()).with("$db", "test"))
                .await;
            assert_eq!(response, Document::new().with("ok", 1.0));
            assert!(ctx.backend.store().contains("test", &name));
        });
    }

    #[test]
    fn test_names_with_forbidden_characters_are_rejected(
        prefix in "[a-z]{0,20}",
        forbidden in prop::sample::select(vec!["$", "\0"]),
        suffix in "[a-z]{0,20}",
    ) {
        let name = format!("{prefix}{forbidden}{suffix}");
        prop_assert!(!is_valid_collection_name(&name));
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let ctx = TestContext::new().await;
            let response = ctx
                .run(Document::new().with("create", name.as_str()).with("$db", "test"))
                .await;
            assert_eq!(response.get("code"), Some(&Value::Int32(73)));
            assert_eq!(errmsg(&response), format!("Invalid collection name: {name}"));
            assert!(ctx.backend.store().is_empty());
        });
    }

    #[test]
    fn test_length_limit(len in 1usize..400) {
        let name = "c".repeat(len);
        prop_assert_eq!(is_valid_collection_name(&name), len <= 235);
    }

    #[test]
    fn test_leading_dot_is_rejected(rest in "[a-z.]{0,50}") {
        let name = format!(".{rest}");
        prop_assert!(!is_valid_collection_name(&name));
    }
}
