//! Failure handling and the single-Sync guard

use super::test_utils::{d, mock_backend, open};
use structsync::error::SyncError;
use structsync::overrides::StagedValue;
use structsync::sync::{Confirmation, SyncCoordinator, SyncPhase};
use structsync::types::{Attribute, NodeKey};

#[tokio::test]
async fn test_failed_sync_preserves_staged_edits() {
    let backend = mock_backend();
    let mut session = open(&backend).await;
    session
        .stage(NodeKey::floor(100), StagedValue::StartDate(None))
        .unwrap();
    session
        .stage(NodeKey::unit(1010), StagedValue::StartDate(Some(d("2025-07-01"))))
        .unwrap();
    let staged = session.overrides().len();
    let tasks_before = backend.tasks();
    backend.set_fail_syncs(true);

    let coordinator = SyncCoordinator::new();
    let pending = coordinator.prepare(&session, &[1000, 1001, 1010]).unwrap();
    let expected = pending.request.clone();
    let err = coordinator
        .commit(&mut session, &backend, pending, Confirmation::Confirmed)
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::Transport(_)));
    assert_eq!(coordinator.phase(), SyncPhase::Idle);
    assert!(coordinator.last_failure().is_some());
    assert_eq!(session.overrides().len(), staged);
    assert_eq!(backend.tasks(), tasks_before);

    // Retry after the backend recovers sends the same request.
    backend.set_fail_syncs(false);
    let pending = coordinator.prepare(&session, &[1000, 1001, 1010]).unwrap();
    assert_eq!(pending.request, expected);
    coordinator
        .commit(&mut session, &backend, pending, Confirmation::Confirmed)
        .await
        .unwrap();
    assert!(session.overrides().is_empty());
    assert!(coordinator.last_failure().is_none());
}

#[tokio::test]
async fn test_failed_process_model_flush_stops_before_sync() {
    let backend = mock_backend();
    let mut session = open(&backend).await;
    session
        .stage(NodeKey::riser(10), StagedValue::ProcessModel(Some(6)))
        .unwrap();
    backend.set_fail_writes(true);

    let coordinator = SyncCoordinator::new();
    let pending = coordinator.prepare(&session, &[1000]).unwrap();
    assert!(coordinator
        .commit(&mut session, &backend, pending, Confirmation::Confirmed)
        .await
        .is_err());
    assert!(backend.syncs().is_empty());
    assert!(session.overrides().has_pending(Attribute::ProcessModel));
}

#[tokio::test]
async fn test_reload_failure_after_sync_still_clears_edits() {
    let backend = mock_backend();
    let mut session = open(&backend).await;
    session
        .stage(NodeKey::unit(1000), StagedValue::StartDate(None))
        .unwrap();
    let coordinator = SyncCoordinator::new();
    let pending = coordinator.prepare(&session, &[1000]).unwrap();

    backend.set_fail_reads(true);
    let err = coordinator
        .commit(&mut session, &backend, pending, Confirmation::Confirmed)
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::Reload(_)));
    assert!(session.overrides().is_empty());
    assert_eq!(backend.syncs().len(), 1);
    assert_eq!(coordinator.phase(), SyncPhase::Idle);
}

#[tokio::test]
async fn test_second_sync_rejected_while_committing() {
    let backend = mock_backend();
    let gate = backend.gate_syncs();
    let mut session = open(&backend).await;
    let other_session = session.clone();
    session
        .stage(NodeKey::unit(1000), StagedValue::StartDate(None))
        .unwrap();

    let coordinator = SyncCoordinator::new();
    let other = coordinator.clone();
    let pending = coordinator.prepare(&session, &[1000]).unwrap();

    let first = coordinator.commit(&mut session, &backend, pending, Confirmation::Confirmed);
    let second = async {
        while other.phase() != SyncPhase::Committing {
            tokio::task::yield_now().await;
        }
        let rejected = other.prepare(&other_session, &[1000]);
        gate.notify_one();
        rejected
    };
    let (first, second) = tokio::join!(first, second);

    assert!(first.is_ok());
    assert!(matches!(second, Err(SyncError::InProgress)));
    assert_eq!(backend.syncs().len(), 1);
    assert_eq!(coordinator.phase(), SyncPhase::Idle);
}

#[tokio::test]
async fn test_reload_drops_edits_for_removed_nodes() {
    let backend = mock_backend();
    let mut session = open(&backend).await;
    session
        .stage(NodeKey::unit(1000), StagedValue::ProcessModel(Some(5)))
        .unwrap();
    // Same project, unit 1000 gone.
    let mut structure = backend.structure();
    structure[0].risers[0].floors[0].units.remove(0);
    let shrunk = structsync::backend::MockBackend::new(
        structure,
        Vec::new(),
        super::test_utils::process_models(),
    );

    let report = session.reload(&shrunk).await.unwrap();
    assert_eq!(
        report.dropped_edits,
        vec![(NodeKey::unit(1000), Attribute::ProcessModel)]
    );
    assert!(session.overrides().is_empty());
    assert!(report.conflicts.is_empty());
}
