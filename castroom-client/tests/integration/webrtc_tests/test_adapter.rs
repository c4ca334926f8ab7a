use castroom_client::{
    AdapterFactory, LinkId, LinkTag, MediaBundle, PeerLinkAdapter, TransportConfig,
    WebRtcAdapterFactory,
};
use castroom_core::{IceCandidate, ParticipantId, SdpKind};
use tokio::sync::mpsc;

use crate::integration::init_tracing;

fn tag() -> LinkTag {
    LinkTag {
        peer_id: ParticipantId::new(),
        link_id: LinkId(1),
    }
}

fn host_candidate() -> IceCandidate {
    IceCandidate {
        candidate: "candidate:1 1 udp 2122260223 192.168.1.10 54321 typ host".into(),
        sdp_mid: Some("0".into()),
        sdp_m_line_index: Some(0),
        username_fragment: None,
    }
}

#[tokio::test]
async fn test_candidate_before_remote_description_is_held() {
    init_tracing();

    let factory = WebRtcAdapterFactory::new(TransportConfig::local_only());
    let (events_tx, _events_rx) = mpsc::channel(64);

    let offerer = factory.create(tag(), events_tx.clone()).await.unwrap();
    let answerer = factory.create(tag(), events_tx).await.unwrap();

    let bundle = MediaBundle::screen("screen", false);
    offerer.attach_track(&bundle.tracks()[0]).await.unwrap();

    // No remote description yet: must be accepted and kept.
    answerer.add_remote_candidate(host_candidate()).await.unwrap();

    let offer = offerer.create_offer().await.unwrap();
    assert_eq!(offer.kind, SdpKind::Offer);
    offerer.set_local_description(offer.clone()).await.unwrap();

    answerer.set_remote_description(offer).await.unwrap();
    let answer = answerer.create_answer().await.unwrap();
    assert_eq!(answer.kind, SdpKind::Answer);
    answerer.set_local_description(answer.clone()).await.unwrap();
    offerer.set_remote_description(answer).await.unwrap();

    offerer.close().await.unwrap();
    answerer.close().await.unwrap();
}

#[tokio::test]
async fn test_detached_tracks_can_be_reattached() {
    init_tracing();

    let factory = WebRtcAdapterFactory::new(TransportConfig::local_only());
    let (events_tx, _events_rx) = mpsc::channel(64);
    let adapter = factory.create(tag(), events_tx).await.unwrap();

    let first = MediaBundle::screen("first", true);
    for track in first.tracks() {
        adapter.attach_track(track).await.unwrap();
    }
    adapter.detach_tracks().await.unwrap();

    let second = MediaBundle::screen("second", false);
    adapter.attach_track(&second.tracks()[0]).await.unwrap();

    let offer = adapter.create_offer().await.unwrap();
    assert!(offer.sdp.contains("m=video"));
    adapter.close().await.unwrap();
}
