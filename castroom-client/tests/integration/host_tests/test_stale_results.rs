use std::sync::Arc;
use std::time::Duration;

use castroom_client::{LinkPhase, MediaBundle};
use castroom_core::ParticipantId;

use crate::integration::{create_test_host, init_tracing};
use crate::utils::{CREATE_DELAY, MockAdapterFactory, STEP_TIMEOUT_MS, wait_for_host};

#[tokio::test]
async fn test_offer_finishing_after_leave_is_dropped() {
    init_tracing();

    let factory = MockAdapterFactory::new();
    factory.set_offer_delay(Some(Duration::from_millis(300))).await;
    let (host, signaling) = create_test_host(&factory);
    let viewer = ParticipantId::new();

    host.viewer_joined(viewer).await.unwrap();
    host.media_available(Arc::new(MediaBundle::screen("screen", false)))
        .await
        .unwrap();
    let adapter = factory.wait_for_adapter(&viewer, STEP_TIMEOUT_MS).await.unwrap();

    host.viewer_left(viewer).await.unwrap();
    let snapshot = host.snapshot().await.unwrap();
    assert_eq!(snapshot.phase_of(&viewer), None);

    tokio::time::sleep(Duration::from_millis(600)).await;

    assert!(signaling.offers_to(&viewer).await.is_empty());
    assert!(adapter.is_closed().await, "adapter is closed once its link is gone");
}

#[tokio::test]
async fn test_slow_viewer_does_not_block_others() {
    init_tracing();

    let factory = MockAdapterFactory::new();
    let (host, signaling) = create_test_host(&factory);
    let slow = ParticipantId::new();
    let fast = ParticipantId::new();

    host.media_available(Arc::new(MediaBundle::screen("screen", false)))
        .await
        .unwrap();

    factory.set_offer_delay(Some(Duration::from_millis(500))).await;
    host.viewer_joined(slow).await.unwrap();
    factory.wait_for_adapter(&slow, STEP_TIMEOUT_MS).await.unwrap();
    // Let the slow worker pick up its delay before lifting it.
    tokio::time::sleep(Duration::from_millis(50)).await;
    factory.set_offer_delay(None).await;

    host.viewer_joined(fast).await.unwrap();
    let fast_offers = signaling.wait_for_offers(&fast, 1, 300).await;
    assert_eq!(fast_offers.len(), 1);
    assert!(
        signaling.offers_to(&slow).await.is_empty(),
        "slow viewer is still negotiating"
    );

    let slow_offers = signaling.wait_for_offers(&slow, 1, STEP_TIMEOUT_MS).await;
    assert_eq!(slow_offers.len(), 1);
    let snapshot = wait_for_host(&host, STEP_TIMEOUT_MS, |s| {
        s.phase_of(&slow).is_some_and(|p| matches!(p, LinkPhase::OfferSent(_)))
    })
    .await;
    assert!(matches!(snapshot.phase_of(&slow), Some(LinkPhase::OfferSent(_))));
}

#[tokio::test]
async fn test_slow_adapter_creation_does_not_block_others() {
    init_tracing();

    let factory = MockAdapterFactory::new();
    let (host, signaling) = create_test_host(&factory);
    let slow = ParticipantId::new();
    let fast = ParticipantId::new();
    factory.delay_create_for(slow).await;

    host.media_available(Arc::new(MediaBundle::screen("screen", false)))
        .await
        .unwrap();
    host.viewer_joined(slow).await.unwrap();
    host.viewer_joined(fast).await.unwrap();

    let fast_offers = signaling.wait_for_offers(&fast, 1, 300).await;
    assert_eq!(fast_offers.len(), 1);

    // The host keeps answering while the slow adapter is still being built.
    let snapshot = host.snapshot().await.unwrap();
    assert!(matches!(snapshot.phase_of(&slow), Some(LinkPhase::Negotiating(_))));
    assert!(factory.adapter_for(&slow).await.is_none());

    let timeout = STEP_TIMEOUT_MS + CREATE_DELAY.as_millis() as u64;
    let slow_offers = signaling.wait_for_offers(&slow, 1, timeout).await;
    assert_eq!(slow_offers.len(), 1);
    assert_eq!(slow_offers[0].1, 1);
}

#[tokio::test]
async fn test_leave_during_adapter_creation_closes_the_adapter() {
    init_tracing();

    let factory = MockAdapterFactory::new();
    let (host, signaling) = create_test_host(&factory);
    let viewer = ParticipantId::new();
    factory.delay_create_for(viewer).await;

    host.media_available(Arc::new(MediaBundle::screen("screen", false)))
        .await
        .unwrap();
    host.viewer_joined(viewer).await.unwrap();
    host.viewer_left(viewer).await.unwrap();

    let timeout = STEP_TIMEOUT_MS + CREATE_DELAY.as_millis() as u64;
    let adapter = factory.wait_for_adapter(&viewer, timeout).await.unwrap();
    let start = std::time::Instant::now();
    while !adapter.is_closed().await && start.elapsed().as_millis() < 2000 {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(adapter.is_closed().await);
    assert!(signaling.offers_to(&viewer).await.is_empty());
    assert_eq!(host.snapshot().await.unwrap().phase_of(&viewer), None);
}
