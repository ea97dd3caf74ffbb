//! CLI route table over the in-memory backend

use super::test_utils::{d, mock_backend, PROJECT};
use clap::Parser;
use std::sync::Arc;
use structsync::backend::MockBackend;
use structsync::cli::{Cli, RunContext};
use structsync::sync::SyncPhase;
use structsync::types::NodeKey;
use tempfile::TempDir;

fn run(backend: &Arc<MockBackend>, args: &[&str]) -> Result<String, structsync::error::ApiError> {
    let mut argv = vec!["structsync"];
    argv.extend_from_slice(args);
    let cli = Cli::try_parse_from(argv).unwrap();
    let context = RunContext::with_backend(backend.clone(), PROJECT).unwrap();
    context.execute(&cli.command)
}

#[test]
fn test_tree_json_lists_all_nodes() {
    let backend = Arc::new(mock_backend());
    let out = run(&backend, &["tree", "--format", "json"]).unwrap();
    let value: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(value["nodes"].as_array().unwrap().len(), 11);
    assert_eq!(value["project_id"], PROJECT);
}

#[test]
fn test_set_model_writes_subtree() {
    let backend = Arc::new(mock_backend());
    let out = run(&backend, &["set-model", "floor", "100", "6"]).unwrap();
    assert!(out.contains("3 node write(s)"));
    assert_eq!(backend.persisted(NodeKey::unit(1001)), Some((Some(6), None)));
}

#[test]
fn test_set_model_rejects_unknown_model() {
    let backend = Arc::new(mock_backend());
    assert!(run(&backend, &["set-model", "unit", "1000", "77"]).is_err());
    assert!(backend.node_writes().is_empty());
}

#[test]
fn test_commit_date_clears_with_none() {
    let backend = Arc::new(mock_backend());
    run(&backend, &["commit-date", "unit", "1010", "none"]).unwrap();
    assert_eq!(backend.persisted(NodeKey::unit(1010)), Some((None, None)));
}

#[test]
fn test_sync_dry_run_sends_nothing() {
    let backend = Arc::new(mock_backend());
    let out = run(&backend, &["sync", "--units", "1000,1010", "--dry-run"]).unwrap();
    assert!(out.contains("Scheduled units: 2"));
    assert!(backend.syncs().is_empty());
}

#[test]
fn test_sync_with_edit_script() {
    let backend = Arc::new(mock_backend());
    let temp = TempDir::new().unwrap();
    let script = temp.path().join("edits.toml");
    std::fs::write(
        &script,
        r#"
[[edit]]
level = "floor"
id = 100
attribute = "start_date"

[[edit]]
level = "unit"
id = 2000
attribute = "start_date"
value = "2025-04-01"
"#,
    )
    .unwrap();

    let context = RunContext::with_backend(backend.clone(), PROJECT).unwrap();
    let cli = Cli::try_parse_from([
        "structsync",
        "sync",
        "--edits",
        script.to_str().unwrap(),
        "--units",
        "1000,1001,2000",
        "--yes",
    ])
    .unwrap();
    let out = context.execute(&cli.command).unwrap();
    assert!(out.contains("Sync applied"));
    assert_eq!(context.coordinator().phase(), SyncPhase::Idle);

    let body = &backend.syncs()[0];
    assert_eq!(body.purge_unit_ids, vec![1000]);
    assert_eq!(body.start_map.unit.get(&2000), Some(&d("2025-04-01")));
    assert!(!body.start_map.unit.contains_key(&1000));
}
