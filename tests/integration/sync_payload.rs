//! Sync request construction: scope restriction and purge rules

use super::test_utils::{d, mock_backend, open};
use structsync::overrides::StagedValue;
use structsync::sync::SyncRequest;
use structsync::types::NodeKey;

#[tokio::test]
async fn test_cleared_unit_with_prior_tasks_is_purged() {
    let backend = mock_backend();
    let mut session = open(&backend).await;
    session
        .stage(NodeKey::unit(1000), StagedValue::StartDate(None))
        .unwrap();

    let request = SyncRequest::build(&session, &[1000]);
    assert_eq!(request.purge_unit_ids, vec![1000]);
    assert!(request.start_map.is_empty());
}

#[tokio::test]
async fn test_fresh_load_without_date_is_not_purged() {
    let backend = mock_backend();
    let session = open(&backend).await;
    // unit:1001 never had a date or tasks; unit:1000 resolves to its derived date.
    let request = SyncRequest::build(&session, &[1000, 1001]);
    assert!(request.purge_unit_ids.is_empty());
    assert_eq!(request.start_map.get(&1000), Some(&d("2024-01-10")));
    assert!(!request.start_map.contains_key(&1001));
}

#[tokio::test]
async fn test_cleared_then_reset_unit_is_scheduled_not_purged() {
    let backend = mock_backend();
    let mut session = open(&backend).await;
    session
        .stage(NodeKey::floor(100), StagedValue::StartDate(None))
        .unwrap();
    session
        .stage(NodeKey::unit(1000), StagedValue::StartDate(Some(d("2025-02-01"))))
        .unwrap();

    let request = SyncRequest::build(&session, &[1000, 1001]);
    assert!(request.purge_unit_ids.is_empty());
    assert_eq!(request.start_map.get(&1000), Some(&d("2025-02-01")));
}

#[tokio::test]
async fn test_start_map_never_leaves_visible_scope() {
    let backend = mock_backend();
    let mut session = open(&backend).await;
    session
        .stage(NodeKey::component(1), StagedValue::StartDate(Some(d("2025-04-01"))))
        .unwrap();
    session
        .stage(NodeKey::unit(2000), StagedValue::StartDate(None))
        .unwrap();

    let visible = [1001, 1010];
    let request = SyncRequest::build(&session, &visible);
    assert!(request.start_map.keys().all(|id| visible.contains(id)));
    assert_eq!(request.start_map.len(), 2);
    // unit:2000 is cleared and had tasks, but it is not visible.
    assert!(request.purge_unit_ids.is_empty());

    let body = request.to_body();
    assert_eq!(body.filters.unit_ids, vec![1001, 1010]);
}

#[tokio::test]
async fn test_non_unit_ids_are_ignored() {
    let backend = mock_backend();
    let session = open(&backend).await;
    // 100 is a floor id, 7 does not exist.
    let request = SyncRequest::build(&session, &[100, 7, 2000]);
    assert_eq!(request.visible_unit_ids, vec![2000]);
}
