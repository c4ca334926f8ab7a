use castroom_client::{ConnectivityState, LinkPhase};
use castroom_core::{IceCandidate, ParticipantId};

use crate::integration::{create_test_viewer, init_tracing};
use crate::utils::{MockAdapterFactory, STEP_TIMEOUT_MS, settle, wait_for_viewer};

#[tokio::test]
async fn test_host_left_releases_the_link() {
    init_tracing();

    let factory = MockAdapterFactory::new();
    let (viewer, signaling, behavior) = create_test_viewer(&factory);
    let host = ParticipantId::new();

    viewer
        .offer_received(host, "offer".into(), Some(1))
        .await
        .unwrap();
    signaling.wait_for_answers(&host, 1, STEP_TIMEOUT_MS).await;

    // Someone else leaving does not matter.
    viewer.host_left(Some(ParticipantId::new())).await.unwrap();
    assert!(viewer.snapshot().await.unwrap().phase.is_some_and(|p| p.is_active()));

    viewer.host_left(None).await.unwrap();
    let snapshot = viewer.snapshot().await.unwrap();
    assert_eq!(snapshot.phase, Some(LinkPhase::Closed));
    assert_eq!(snapshot.host_id, Some(host));
    assert!(behavior.has_host_left(&host).await);

    viewer
        .remote_ice_candidate(host, IceCandidate::new("candidate:late"))
        .await
        .unwrap();
    settle().await;

    let adapter = factory.adapter_for(&host).await.unwrap();
    assert!(adapter.is_closed().await);
    assert!(adapter.remote_candidates().await.is_empty());
    assert_eq!(viewer.snapshot().await.unwrap().queued_candidates, 0);
}

#[tokio::test]
async fn test_failed_transport_closes_the_link() {
    init_tracing();

    let factory = MockAdapterFactory::new();
    let (viewer, signaling, behavior) = create_test_viewer(&factory);
    let host = ParticipantId::new();

    viewer
        .offer_received(host, "offer".into(), Some(1))
        .await
        .unwrap();
    signaling.wait_for_answers(&host, 1, STEP_TIMEOUT_MS).await;

    let adapter = factory.adapter_for(&host).await.unwrap();
    adapter.emit_connectivity(ConnectivityState::Failed).await;

    let snapshot = wait_for_viewer(&viewer, STEP_TIMEOUT_MS, |s| {
        s.phase == Some(LinkPhase::Closed)
    })
    .await;
    assert_eq!(snapshot.phase, Some(LinkPhase::Closed));
    settle().await;
    assert!(adapter.is_closed().await);
    assert!(!behavior.has_host_left(&host).await);
}

#[tokio::test]
async fn test_offer_after_host_left_is_ignored() {
    init_tracing();

    let factory = MockAdapterFactory::new();
    let (viewer, signaling, _behavior) = create_test_viewer(&factory);
    let host = ParticipantId::new();

    viewer
        .offer_received(host, "offer-1".into(), Some(1))
        .await
        .unwrap();
    signaling.wait_for_answers(&host, 1, STEP_TIMEOUT_MS).await;

    viewer.host_left(Some(host)).await.unwrap();
    viewer
        .offer_received(host, "offer-2".into(), Some(2))
        .await
        .unwrap();
    settle().await;

    let snapshot = viewer.snapshot().await.unwrap();
    assert_eq!(snapshot.phase, Some(LinkPhase::Closed));
    assert_eq!(snapshot.link_id, None);
    assert_eq!(factory.created_count().await, 1);
    assert_eq!(signaling.answers_to(&host).await.len(), 1);
}

#[tokio::test]
async fn test_joining_a_room_again_accepts_the_host() {
    init_tracing();

    let factory = MockAdapterFactory::new();
    let (viewer, signaling, _behavior) = create_test_viewer(&factory);
    let host = ParticipantId::new();

    viewer
        .offer_received(host, "offer-1".into(), Some(1))
        .await
        .unwrap();
    signaling.wait_for_answers(&host, 1, STEP_TIMEOUT_MS).await;
    viewer.host_left(Some(host)).await.unwrap();

    viewer.joined_room().await.unwrap();
    let snapshot = viewer.snapshot().await.unwrap();
    assert_eq!(snapshot.phase, None);
    assert_eq!(snapshot.host_id, None);

    viewer
        .offer_received(host, "offer-again".into(), Some(1))
        .await
        .unwrap();
    let answers = signaling.wait_for_answers(&host, 2, STEP_TIMEOUT_MS).await;
    assert_eq!(answers.len(), 2);
    assert_eq!(factory.created_count().await, 2);
}

#[tokio::test]
async fn test_adapter_creation_failure_closes_the_link() {
    init_tracing();

    let factory = MockAdapterFactory::new();
    let (viewer, signaling, _behavior) = create_test_viewer(&factory);
    let host = ParticipantId::new();
    factory.fail_create_for(host).await;

    viewer
        .offer_received(host, "offer".into(), Some(1))
        .await
        .unwrap();

    let snapshot = wait_for_viewer(&viewer, STEP_TIMEOUT_MS, |s| {
        s.phase == Some(LinkPhase::Closed)
    })
    .await;
    assert_eq!(snapshot.phase, Some(LinkPhase::Closed));
    assert_eq!(snapshot.host_id, Some(host));
    assert!(signaling.answers_to(&host).await.is_empty());
}
