//! Release planning integration tests
//!
//! Drives the path from a declaration manifest to a classified release plan:
//! manifest parsing, trigger extraction, region expansion, filter parsing,
//! and reconciliation against a deployed inventory.

mod common;

use std::sync::Arc;

use fnship::deploy::filter::parse_filters;
use fnship::deploy::names::{function_names, FunctionName, DEFAULT_REGION};
use fnship::deploy::pipeline::DeployPipeline;
use fnship::deploy::planner::{release_names, ReleasePlan};
use fnship::error::FnshipError;
use fnship::remote::MemoryFunctions;
use fnship::triggers::{extract_triggers, load_manifest, parse_manifest};

const MANIFEST: &str = r#"
api:
  trigger:
    kind: http
reports:
  daily:
    trigger:
      kind: event
      eventType: providers/cloud.pubsub/eventTypes/topic.publish
      resource: projects/demo/topics/daily
      regions: [us-east1, europe-west1]
  weekly:
    trigger:
      kind: event
      eventType: providers/cloud.pubsub/eventTypes/topic.publish
helperValue: 42
"#;

fn f(id: &str) -> FunctionName {
    FunctionName::new("demo", DEFAULT_REGION, id)
}

#[test]
fn test_manifest_to_function_names() {
    let (_dir, path) = common::temp_file("functions.yaml", MANIFEST);
    let tree = load_manifest(&path).expect("manifest should load");
    assert_eq!(tree.function_count(), 3);

    let triggers = extract_triggers(&tree).expect("names are valid");
    let names: Vec<String> = function_names(&triggers, "demo", DEFAULT_REGION)
        .iter()
        .map(ToString::to_string)
        .collect();

    assert_eq!(
        names,
        vec![
            "projects/demo/locations/us-central1/functions/api",
            "projects/demo/locations/us-east1/functions/reports-daily",
            "projects/demo/locations/europe-west1/functions/reports-daily",
            "projects/demo/locations/us-central1/functions/reports-weekly",
        ]
    );
    assert_eq!(triggers[1].entry_point, "reports.daily");
}

#[test]
fn test_dashed_group_fails_extraction() {
    let tree = parse_manifest(
        r#"
good:
  trigger:
    kind: http
bad-group:
  fn:
    trigger:
      kind: http
"#,
    )
    .unwrap();

    let err = extract_triggers(&tree).unwrap_err();
    assert!(err.to_string().contains("bad-group"));
}

#[test]
fn test_group_filter_expands_to_whole_group() {
    let groups = parse_filters("functions:reports,hosting");
    let upload = vec![f("reports-daily"), f("api")];
    let existing = vec![f("reports-monthly"), f("api")];

    assert_eq!(
        release_names(&upload, &existing, &groups),
        vec![f("reports-daily"), f("reports-monthly")]
    );
}

#[test]
fn test_plan_with_except() {
    let only = parse_filters("functions:reports");
    let except = parse_filters("functions:reports.monthly");
    let plan = ReleasePlan::build(
        &[f("reports-daily"), f("api")],
        &[f("reports-monthly"), f("reports-daily")],
        &only,
        &except,
    );

    assert_eq!(plan.release_names, vec![f("reports-daily")]);
    assert_eq!(plan.to_update, vec![f("reports-daily")]);
    assert!(plan.to_create.is_empty());
    assert!(plan.to_delete.is_empty());
    assert!(plan.check_filters().is_ok());
}

#[tokio::test]
async fn test_pipeline_end_to_end_with_memory_backend() {
    let functions = Arc::new(
        MemoryFunctions::new()
            .with_function(f("api"))
            .with_function(f("retired")),
    );
    let tree = parse_manifest(MANIFEST).unwrap();
    let pipeline = DeployPipeline::new("demo", functions.clone());

    let prepared = pipeline.prepare(&tree, None, None).await.unwrap();
    let report = pipeline.release(&prepared).await.unwrap();
    report.ensure_success().unwrap();

    assert_eq!(functions.updated(), vec![f("api")]);
    assert_eq!(functions.deleted(), vec![f("retired")]);
    assert_eq!(functions.created().len(), 3);
    assert_eq!(functions.deployed().len(), 4);
}

#[tokio::test]
async fn test_pipeline_all_filters_unmatched_makes_no_changes() {
    let functions = Arc::new(MemoryFunctions::new().with_function(f("api")));
    let tree = parse_manifest(MANIFEST).unwrap();
    let pipeline = DeployPipeline::new("demo", functions.clone());

    let err = pipeline
        .prepare(&tree, Some("functions:missing,functions:gone.too"), None)
        .await
        .unwrap_err();

    match err.downcast_ref::<FnshipError>() {
        Some(FnshipError::UnmatchedFilters(filters)) => {
            assert_eq!(filters, &vec!["missing".to_string(), "gone.too".to_string()]);
        }
        other => panic!("expected UnmatchedFilters, got {:?}", other),
    }
    assert!(functions.created().is_empty());
    assert!(functions.deleted().is_empty());
}
