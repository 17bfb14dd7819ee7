//! ConfigStore integration tests
//!
//! Exercises materialize, recursive writes, `key=value` parsing, unset, and
//! project-to-project cloning against the in-memory runtime config backend.

mod common;

use fnship::error::FnshipError;
use fnship::remote::MemoryRuntimeConfig;
use fnship::runtime_config::{clone_config, parse_set_args, ConfigKey};
use serde_json::json;

#[tokio::test]
async fn test_set_then_materialize_round_trip() {
    let (store, _) = common::memory_store(MemoryRuntimeConfig::new());

    store
        .set_variables_recursive("demo", "ns", "a/b/c", &json!(5))
        .await
        .unwrap();

    assert_eq!(
        store.materialize_config("demo", "ns").await.unwrap(),
        json!({"a": {"b": {"c": 5}}})
    );
}

#[tokio::test]
async fn test_set_args_flow_through_store() {
    let (store, memory) = common::memory_store(MemoryRuntimeConfig::new());
    let tokens: Vec<String> = [
        "app.name=\"My App\"",
        "app.limits={\"rps\":10,\"burst\":20}",
        "app.count=123",
        "mail.key='\"quoted\"'",
    ]
    .iter()
    .map(ToString::to_string)
    .collect();

    for arg in parse_set_args(&tokens).unwrap() {
        store
            .set_variables_recursive("demo", &arg.namespace, &arg.path, &arg.value)
            .await
            .unwrap();
    }

    assert_eq!(memory.writes().len(), 5);
    assert_eq!(
        store.get("demo", None).await.unwrap(),
        json!({
            "app": {
                "name": "My App",
                "limits": {"rps": 10, "burst": 20},
                "count": "123"
            },
            "mail": {"key": "\"quoted\""}
        })
    );
}

#[tokio::test]
async fn test_partial_failure_leaves_mixed_state() {
    let (store, memory) = common::memory_store(
        MemoryRuntimeConfig::new()
            .with_variable("demo", "app", "a", "\"old-a\"")
            .with_variable("demo", "app", "b", "\"old-b\"")
            .fail_writes_to("projects/demo/configs/app/variables/b"),
    );

    let err = store
        .set_variables_recursive("demo", "app", "", &json!({"a": "new-a", "b": "new-b"}))
        .await
        .unwrap_err();

    assert_eq!(FnshipError::remote_status(&err), Some(500));
    assert_eq!(memory.text("demo", "app", "a"), Some("\"new-a\"".to_string()));
    assert_eq!(memory.text("demo", "app", "b"), Some("\"old-b\"".to_string()));
}

#[tokio::test]
async fn test_clone_only_subpath_writes_only_matching_variables() {
    let (store, memory) = common::memory_store(
        MemoryRuntimeConfig::new()
            .with_variable("src", "ns", "sub/x", "1")
            .with_variable("src", "ns", "sub/y/z", "2")
            .with_variable("src", "ns", "subway", "3")
            .with_variable("src", "ns", "other", "4")
            .with_variable("src", "elsewhere", "sub", "5"),
    );

    clone_config(&store, "src", "dst", &["ns.sub".to_string()], &[])
        .await
        .unwrap();

    let mut writes = memory.writes();
    writes.sort();
    assert_eq!(
        writes,
        vec![
            "projects/dst/configs/ns/variables/sub/x".to_string(),
            "projects/dst/configs/ns/variables/sub/y/z".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_full_clone_never_writes_reserved_namespace() {
    let (store, memory) = common::memory_store(
        MemoryRuntimeConfig::new()
            .with_variable("src", "firebase", "meta", r#"{"version":"v1"}"#)
            .with_variable("src", "firebase", "v1", r#"{"old":true}"#)
            .with_variable("src", "app", "key", "\"v\""),
    );

    clone_config(&store, "src", "dst", &[], &[]).await.unwrap();

    assert!(memory
        .writes()
        .iter()
        .all(|name| !name.contains("/configs/firebase/")));
    assert_eq!(memory.config_ids("dst"), vec!["app".to_string()]);
}

#[tokio::test]
async fn test_clone_reserved_namespace_rejected() {
    let (store, memory) = common::memory_store(MemoryRuntimeConfig::new());

    let err = clone_config(&store, "src", "dst", &["firebase.meta".to_string()], &[])
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<FnshipError>(),
        Some(FnshipError::FilterConflict(_))
    ));
    assert!(memory.writes().is_empty());
}

#[tokio::test]
async fn test_unset_namespace_and_key() {
    let (store, memory) = common::memory_store(
        MemoryRuntimeConfig::new()
            .with_variable("demo", "app", "db/host", "\"h\"")
            .with_variable("demo", "app", "db/port", "1")
            .with_variable("demo", "app", "name", "\"n\"")
            .with_variable("demo", "mail", "key", "\"k\""),
    );

    store
        .unset("demo", &ConfigKey::parse("app.db").unwrap())
        .await
        .unwrap();
    store
        .unset("demo", &ConfigKey::parse("mail").unwrap())
        .await
        .unwrap();

    assert_eq!(
        store.get("demo", None).await.unwrap(),
        json!({"app": {"name": "n"}})
    );
}

#[tokio::test]
async fn test_legacy_probe_tolerates_missing_config() {
    let (store, _) = common::memory_store(
        MemoryRuntimeConfig::new().with_variable("demo", "app", "key", "\"v\""),
    );
    assert_eq!(store.legacy_config("demo").await.unwrap(), None);
}
