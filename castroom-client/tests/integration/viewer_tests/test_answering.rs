use castroom_client::{ConnectivityState, Generation, LinkPhase};
use castroom_core::{ParticipantId, SdpKind};

use crate::integration::{create_test_viewer, init_tracing};
use crate::utils::{AdapterCall, MockAdapterFactory, STEP_TIMEOUT_MS, settle, wait_for_viewer};

#[tokio::test]
async fn test_viewer_answers_offer_and_echoes_negotiation() {
    init_tracing();

    let factory = MockAdapterFactory::new().with_auto_connect().await;
    let (viewer, signaling, behavior) = create_test_viewer(&factory);
    let host = ParticipantId::new();

    let snapshot = viewer.snapshot().await.unwrap();
    assert_eq!(snapshot.phase, None);

    viewer
        .offer_received(host, "offer-sdp".into(), Some(1))
        .await
        .unwrap();

    let answers = signaling.wait_for_answers(&host, 1, STEP_TIMEOUT_MS).await;
    assert_eq!(answers.len(), 1);
    assert_eq!(answers[0].1, Some(1));

    let snapshot = wait_for_viewer(&viewer, STEP_TIMEOUT_MS, |s| s.is_connected()).await;
    assert_eq!(snapshot.host_id, Some(host));
    assert_eq!(snapshot.phase, Some(LinkPhase::Connected(Generation(1))));
    assert!(behavior.wait_for_events(1, STEP_TIMEOUT_MS).await);
    assert!(behavior.has_connected(&host).await);

    let adapter = factory.adapter_for(&host).await.unwrap();
    assert_eq!(
        &adapter.calls().await[..3],
        &[
            AdapterCall::SetRemote(SdpKind::Offer, "offer-sdp".into()),
            AdapterCall::CreateAnswer,
            AdapterCall::SetLocal(SdpKind::Answer),
        ]
    );
}

#[tokio::test]
async fn test_reoffer_reuses_the_link() {
    init_tracing();

    let factory = MockAdapterFactory::new();
    let (viewer, signaling, _behavior) = create_test_viewer(&factory);
    let host = ParticipantId::new();

    viewer
        .offer_received(host, "offer-1".into(), Some(1))
        .await
        .unwrap();
    signaling.wait_for_answers(&host, 1, STEP_TIMEOUT_MS).await;
    viewer
        .offer_received(host, "offer-2".into(), Some(2))
        .await
        .unwrap();

    let answers = signaling.wait_for_answers(&host, 2, STEP_TIMEOUT_MS).await;
    let tags: Vec<_> = answers.iter().map(|(_, n)| *n).collect();
    assert_eq!(tags, vec![Some(1), Some(2)]);
    assert_eq!(factory.created_count().await, 1);

    let snapshot = wait_for_viewer(&viewer, STEP_TIMEOUT_MS, |s| {
        s.phase == Some(LinkPhase::AnswerSent(Generation(2)))
    })
    .await;
    assert_eq!(snapshot.phase, Some(LinkPhase::AnswerSent(Generation(2))));

    factory
        .adapter_for(&host)
        .await
        .unwrap()
        .emit_connectivity(ConnectivityState::Connected)
        .await;
    let snapshot = wait_for_viewer(&viewer, STEP_TIMEOUT_MS, |s| s.is_connected()).await;
    assert_eq!(snapshot.phase, Some(LinkPhase::Connected(Generation(2))));
}

#[tokio::test]
async fn test_offer_from_new_host_replaces_the_link() {
    init_tracing();

    let factory = MockAdapterFactory::new();
    let (viewer, signaling, _behavior) = create_test_viewer(&factory);
    let old_host = ParticipantId::new();
    let new_host = ParticipantId::new();

    viewer
        .offer_received(old_host, "offer-old".into(), Some(1))
        .await
        .unwrap();
    signaling.wait_for_answers(&old_host, 1, STEP_TIMEOUT_MS).await;
    viewer
        .offer_received(new_host, "offer-new".into(), Some(1))
        .await
        .unwrap();
    signaling.wait_for_answers(&new_host, 1, STEP_TIMEOUT_MS).await;
    settle().await;

    let snapshot = viewer.snapshot().await.unwrap();
    assert_eq!(snapshot.host_id, Some(new_host));
    assert!(factory.adapter_for(&old_host).await.unwrap().is_closed().await);
    assert!(!factory.adapter_for(&new_host).await.unwrap().is_closed().await);
}

#[tokio::test]
async fn test_local_candidates_go_to_the_host() {
    init_tracing();

    let factory = MockAdapterFactory::new();
    let (viewer, signaling, _behavior) = create_test_viewer(&factory);
    let host = ParticipantId::new();

    viewer
        .offer_received(host, "offer".into(), None)
        .await
        .unwrap();
    let answers = signaling.wait_for_answers(&host, 1, STEP_TIMEOUT_MS).await;
    assert_eq!(answers[0].1, None, "untagged offers get untagged answers");

    factory
        .adapter_for(&host)
        .await
        .unwrap()
        .emit_local_candidate("candidate:viewer")
        .await;
    settle().await;

    assert_eq!(signaling.ice_to(&host).await.len(), 1);
}

#[tokio::test]
async fn test_restarted_negotiation_opens_a_new_link() {
    init_tracing();

    let factory = MockAdapterFactory::new();
    let (viewer, signaling, _behavior) = create_test_viewer(&factory);
    let host = ParticipantId::new();

    for (count, (sdp, negotiation)) in [("offer-1", 1), ("offer-2", 2)].into_iter().enumerate() {
        viewer
            .offer_received(host, sdp.into(), Some(negotiation))
            .await
            .unwrap();
        signaling.wait_for_answers(&host, count + 1, STEP_TIMEOUT_MS).await;
    }
    assert_eq!(factory.created_count().await, 1);

    // The host tore its link down and started over at 1.
    viewer
        .offer_received(host, "offer-fresh".into(), Some(1))
        .await
        .unwrap();
    let answers = signaling.wait_for_answers(&host, 3, STEP_TIMEOUT_MS).await;
    assert_eq!(answers.len(), 3);
    assert_eq!(answers[2].1, Some(1));
    settle().await;

    let adapters = factory.adapters_for(&host).await;
    assert_eq!(adapters.len(), 2);
    assert!(adapters[0].is_closed().await);
    assert!(!adapters[1].is_closed().await);
    assert_eq!(
        adapters[1].calls().await[0],
        AdapterCall::SetRemote(SdpKind::Offer, "offer-fresh".into())
    );

    let snapshot = wait_for_viewer(&viewer, STEP_TIMEOUT_MS, |s| {
        s.phase == Some(LinkPhase::AnswerSent(Generation(1)))
    })
    .await;
    assert_eq!(snapshot.phase, Some(LinkPhase::AnswerSent(Generation(1))));
    assert_ne!(snapshot.link_id, Some(adapters[0].tag.link_id));
}
