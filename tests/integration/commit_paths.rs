//! End-to-end edit flows and convergence of the two commit paths

use super::test_utils::{d, mock_backend, open, PROJECT};
use structsync::backend::{AttributeWrite, BackendCall};
use structsync::overrides::StagedValue;
use structsync::sync::{Confirmation, SyncCoordinator, SyncOutcome};
use structsync::types::{Attribute, NodeKey};

#[tokio::test]
async fn test_stage_cascade_clear_and_sync() {
    let backend = mock_backend();
    let mut session = open(&backend).await;
    let coordinator = SyncCoordinator::new();

    session
        .stage(NodeKey::component(1), StagedValue::StartDate(Some(d("2025-04-01"))))
        .unwrap();
    for key in [NodeKey::riser(10), NodeKey::floor(100), NodeKey::unit(1000)] {
        assert_eq!(session.effective_start_date(key), Some(d("2025-04-01")));
    }

    session
        .stage(NodeKey::floor(100), StagedValue::StartDate(None))
        .unwrap();
    assert_eq!(session.effective_start_date(NodeKey::floor(100)), None);
    assert_eq!(session.effective_start_date(NodeKey::unit(1000)), None);
    assert_eq!(
        session.effective_start_date(NodeKey::riser(10)),
        Some(d("2025-04-01"))
    );

    let pending = coordinator.prepare(&session, &[1000]).unwrap();
    assert!(pending.request.start_map.is_empty());
    assert_eq!(pending.request.purge_unit_ids, vec![1000]);

    let outcome = coordinator
        .commit(&mut session, &backend, pending, Confirmation::Confirmed)
        .await
        .unwrap();
    assert!(matches!(outcome, SyncOutcome::Applied(_)));

    let syncs = backend.syncs();
    assert_eq!(syncs.len(), 1);
    assert_eq!(syncs[0].filters.unit_ids, vec![1000]);
    assert_eq!(syncs[0].purge_unit_ids, vec![1000]);
    assert!(backend.tasks().iter().all(|t| t.unit_id != 1000));
    assert!(session.overrides().is_empty());
    assert_eq!(session.effective_start_date(NodeKey::unit(1000)), None);
}

#[tokio::test]
async fn test_immediate_and_sync_time_process_model_commits_converge() {
    let immediate = mock_backend();
    let deferred = mock_backend();
    let visible = [1000, 1001, 1010, 2000];

    // Path 1: write at edit time, then sync.
    let mut session = open(&immediate).await;
    let report = session
        .set_process_model(&immediate, NodeKey::floor(100), Some(6))
        .await
        .unwrap();
    assert_eq!(report.written, 3);
    let coordinator = SyncCoordinator::new();
    let pending = coordinator.prepare(&session, &visible).unwrap();
    assert!(pending.process_model_writes.writes.is_empty());
    coordinator
        .commit(&mut session, &immediate, pending, Confirmation::Confirmed)
        .await
        .unwrap();

    // Path 2: stage only, flushed by the sync.
    let mut session = open(&deferred).await;
    session
        .stage(NodeKey::floor(100), StagedValue::ProcessModel(Some(6)))
        .unwrap();
    let coordinator = SyncCoordinator::new();
    let pending = coordinator.prepare(&session, &visible).unwrap();
    assert_eq!(pending.process_model_writes.writes.len(), 3);
    coordinator
        .commit(&mut session, &deferred, pending, Confirmation::Confirmed)
        .await
        .unwrap();

    assert_eq!(immediate.structure(), deferred.structure());
    assert_eq!(immediate.tasks(), deferred.tasks());
    assert!(immediate
        .tasks()
        .iter()
        .any(|t| t.unit_id == 1000 && t.process_model.as_deref() == Some("Ausbau")));
}

#[tokio::test]
async fn test_node_write_is_read_modify_write() {
    let backend = mock_backend();
    let mut session = open(&backend).await;
    backend.clear_calls();

    session
        .set_process_model(&backend, NodeKey::unit(1001), None)
        .await
        .unwrap_or_else(|e| panic!("commit failed: {}", e));

    let calls = backend.calls();
    // unit:1001 has nothing persisted, so clearing it settles without a write.
    assert!(!calls.iter().any(|c| matches!(c, BackendCall::PutNode(..))));

    session
        .stage_raw(NodeKey::unit(1001), Attribute::StartDate, "2025-05-05")
        .unwrap();
    backend.clear_calls();
    session
        .commit_node(&backend, NodeKey::unit(1001), Attribute::StartDate)
        .await
        .unwrap();
    let calls = backend.calls();
    assert_eq!(calls[0], BackendCall::GetNode(NodeKey::unit(1001)));
    match &calls[1] {
        BackendCall::PutNode(key, body) => {
            assert_eq!(*key, NodeKey::unit(1001));
            assert_eq!(body.name, "Top 2");
            assert_eq!(
                body.attribute,
                AttributeWrite::StartDate {
                    start_soll: Some(d("2025-05-05"))
                }
            );
        }
        other => panic!("expected a PUT, got {:?}", other),
    }
    assert_eq!(
        backend.persisted(NodeKey::unit(1001)),
        Some((None, Some(d("2025-05-05"))))
    );
    assert_eq!(
        session.effective_start_date(NodeKey::unit(1001)),
        Some(d("2025-05-05"))
    );
    assert_eq!(session.project_id(), PROJECT);
}

#[tokio::test]
async fn test_sessions_are_isolated() {
    let backend = mock_backend();
    let mut first = open(&backend).await;
    let second = open(&backend).await;
    first
        .stage(NodeKey::unit(1000), StagedValue::ProcessModel(Some(5)))
        .unwrap();
    assert_eq!(first.effective_process_model(NodeKey::unit(1000)), Some(5));
    assert_eq!(second.effective_process_model(NodeKey::unit(1000)), None);
}

#[tokio::test]
async fn test_immediate_date_clear_purges_like_sync() {
    let immediate = mock_backend();
    let deferred = mock_backend();

    // Path 1: clear and commit right away.
    let mut session = open(&immediate).await;
    session
        .stage(NodeKey::unit(1000), StagedValue::StartDate(None))
        .unwrap();
    let report = session
        .commit_node(&immediate, NodeKey::unit(1000), Attribute::StartDate)
        .await
        .unwrap();
    assert_eq!(report.purged_units, 1);
    assert_eq!(session.effective_start_date(NodeKey::unit(1000)), None);

    let syncs = immediate.syncs();
    assert_eq!(syncs.len(), 1);
    assert_eq!(syncs[0].filters.unit_ids, vec![1000]);
    assert_eq!(syncs[0].purge_unit_ids, vec![1000]);
    assert!(syncs[0].start_map.unit.is_empty());

    let coordinator = SyncCoordinator::new();
    let pending = coordinator.prepare(&session, &[1000]).unwrap();
    assert!(!pending.request.start_map.contains_key(&1000));
    coordinator
        .commit(&mut session, &immediate, pending, Confirmation::Confirmed)
        .await
        .unwrap();

    // Path 2: clear staged until the sync.
    let mut session = open(&deferred).await;
    session
        .stage(NodeKey::unit(1000), StagedValue::StartDate(None))
        .unwrap();
    let coordinator = SyncCoordinator::new();
    let pending = coordinator.prepare(&session, &[1000]).unwrap();
    assert_eq!(pending.request.purge_unit_ids, vec![1000]);
    coordinator
        .commit(&mut session, &deferred, pending, Confirmation::Confirmed)
        .await
        .unwrap();

    assert!(immediate.tasks().iter().all(|t| t.unit_id != 1000));
    assert_eq!(immediate.tasks(), deferred.tasks());
    assert_eq!(immediate.structure(), deferred.structure());
}

#[tokio::test]
async fn test_immediate_floor_commit_under_staged_component() {
    let backend = mock_backend();
    let mut session = open(&backend).await;
    session
        .stage(NodeKey::component(1), StagedValue::ProcessModel(Some(5)))
        .unwrap();
    session
        .set_process_model(&backend, NodeKey::floor(100), Some(6))
        .await
        .unwrap();

    assert_eq!(backend.persisted(NodeKey::floor(100)), Some((Some(6), None)));
    for key in [NodeKey::floor(100), NodeKey::unit(1000), NodeKey::unit(1001)] {
        assert_eq!(session.effective_process_model(key), Some(6));
    }
    assert_eq!(session.effective_process_model(NodeKey::floor(101)), Some(5));

    let coordinator = SyncCoordinator::new();
    let pending = coordinator
        .prepare(&session, &[1000, 1001, 1010, 2000])
        .unwrap();
    coordinator
        .commit(&mut session, &backend, pending, Confirmation::Confirmed)
        .await
        .unwrap();

    assert_eq!(backend.persisted(NodeKey::component(1)), Some((Some(5), None)));
    assert_eq!(backend.persisted(NodeKey::floor(100)), Some((Some(6), None)));
    assert_eq!(backend.persisted(NodeKey::unit(1000)), Some((Some(6), None)));
    assert_eq!(
        backend.persisted(NodeKey::unit(1010)),
        Some((Some(5), Some(d("2025-06-01"))))
    );
    assert_eq!(session.effective_process_model(NodeKey::unit(1000)), Some(6));
}
