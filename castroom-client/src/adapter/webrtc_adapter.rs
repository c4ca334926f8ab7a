use crate::adapter::{
    AdapterEvent, AdapterEventKind, AdapterFactory, ConnectivityState, LinkTag, PeerLinkAdapter,
    TransportConfig,
};
use crate::media::{MediaTrack, RemoteTrack, TrackKind};
use anyhow::{Context, Result};
use async_trait::async_trait;
use castroom_core::{IceCandidate, SdpKind, SessionDescription};
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info, warn};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::RTCRtpTransceiver;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::rtp_transceiver::rtp_sender::RTCRtpSender;
use webrtc::track::track_remote::TrackRemote;

/// Creates one `RTCPeerConnection` per link.
#[derive(Clone, Default)]
pub struct WebRtcAdapterFactory {
    config: TransportConfig,
}

impl WebRtcAdapterFactory {
    pub fn new(config: TransportConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl AdapterFactory for WebRtcAdapterFactory {
    async fn create(
        &self,
        tag: LinkTag,
        events: mpsc::Sender<AdapterEvent>,
    ) -> Result<Arc<dyn PeerLinkAdapter>> {
        let adapter = WebRtcAdapter::new(tag, self.config.clone(), events).await?;
        Ok(Arc::new(adapter))
    }
}

/// Remote candidates that arrive before the remote description are held
/// here and applied in arrival order once it is set.
#[derive(Default)]
struct CandidateGate {
    remote_set: bool,
    buffered: Vec<RTCIceCandidateInit>,
}

pub struct WebRtcAdapter {
    tag: LinkTag,
    peer_connection: Arc<RTCPeerConnection>,
    senders: Mutex<Vec<Arc<RTCRtpSender>>>,
    candidates: Mutex<CandidateGate>,
}

impl WebRtcAdapter {
    pub async fn new(
        tag: LinkTag,
        config: TransportConfig,
        events: mpsc::Sender<AdapterEvent>,
    ) -> Result<Self> {
        let mut media_engine = MediaEngine::default();
        media_engine.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut media_engine)?;

        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: config
                .ice_servers
                .into_iter()
                .map(|server| RTCIceServer {
                    urls: server.urls,
                    username: server.username.unwrap_or_default(),
                    credential: server.credential.unwrap_or_default(),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        };

        let peer_connection = Arc::new(
            api.new_peer_connection(rtc_config)
                .await
                .context("Failed to create peer connection")?,
        );

        let state_tx = events.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let tx = state_tx.clone();
                Box::pin(async move {
                    info!("Peer connection state for {}: {:?}", tag.peer_id, s);
                    let state = match s {
                        RTCPeerConnectionState::Unspecified | RTCPeerConnectionState::New => {
                            ConnectivityState::New
                        }
                        RTCPeerConnectionState::Connecting => ConnectivityState::Connecting,
                        RTCPeerConnectionState::Connected => ConnectivityState::Connected,
                        RTCPeerConnectionState::Disconnected => ConnectivityState::Disconnected,
                        RTCPeerConnectionState::Failed => ConnectivityState::Failed,
                        RTCPeerConnectionState::Closed => ConnectivityState::Closed,
                    };
                    let _ = tx
                        .send(AdapterEvent {
                            tag,
                            kind: AdapterEventKind::Connectivity(state),
                        })
                        .await;
                })
            },
        ));

        let ice_tx = events.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();
            Box::pin(async move {
                let Some(candidate) = c else { return };
                let Ok(init) = candidate.to_json() else {
                    return;
                };
                let candidate = IceCandidate {
                    candidate: init.candidate,
                    sdp_mid: init.sdp_mid,
                    sdp_m_line_index: init.sdp_mline_index,
                    username_fragment: init.username_fragment,
                };
                let _ = tx
                    .send(AdapterEvent {
                        tag,
                        kind: AdapterEventKind::LocalCandidate(candidate),
                    })
                    .await;
            })
        }));

        let track_tx = events;
        peer_connection.on_track(Box::new(
            move |track: Arc<TrackRemote>,
                  _receiver: Arc<RTCRtpReceiver>,
                  _transceiver: Arc<RTCRtpTransceiver>| {
                let tx = track_tx.clone();
                Box::pin(async move {
                    let remote = RemoteTrack {
                        track_id: track.id(),
                        stream_id: track.stream_id(),
                        kind: match track.kind() {
                            RTPCodecType::Audio => TrackKind::Audio,
                            _ => TrackKind::Video,
                        },
                    };
                    debug!("Remote track {} from {}", remote.track_id, tag.peer_id);
                    let _ = tx
                        .send(AdapterEvent {
                            tag,
                            kind: AdapterEventKind::RemoteTrack(remote),
                        })
                        .await;
                })
            },
        ));

        Ok(Self {
            tag,
            peer_connection,
            senders: Mutex::new(Vec::new()),
            candidates: Mutex::new(CandidateGate::default()),
        })
    }

    fn to_rtc(description: SessionDescription) -> Result<RTCSessionDescription> {
        let desc = match description.kind {
            SdpKind::Offer => RTCSessionDescription::offer(description.sdp)?,
            SdpKind::Answer => RTCSessionDescription::answer(description.sdp)?,
        };
        Ok(desc)
    }
}

#[async_trait]
impl PeerLinkAdapter for WebRtcAdapter {
    async fn attach_track(&self, track: &MediaTrack) -> Result<()> {
        let sender = self
            .peer_connection
            .add_track(Arc::clone(&track.local))
            .await
            .with_context(|| format!("Failed to add track {}", track.id))?;

        // RTCP has to be drained for the interceptors to work.
        let rtcp_sender = Arc::clone(&sender);
        tokio::spawn(async move {
            let mut buf = vec![0u8; 1500];
            while rtcp_sender.read(&mut buf).await.is_ok() {}
        });

        self.senders.lock().await.push(sender);
        Ok(())
    }

    async fn detach_tracks(&self) -> Result<()> {
        let senders: Vec<_> = self.senders.lock().await.drain(..).collect();
        for sender in senders {
            self.peer_connection
                .remove_track(&sender)
                .await
                .context("Failed to remove track")?;
        }
        Ok(())
    }

    async fn create_offer(&self) -> Result<SessionDescription> {
        let offer = self.peer_connection.create_offer(None).await?;
        Ok(SessionDescription::offer(offer.sdp))
    }

    async fn create_answer(&self) -> Result<SessionDescription> {
        let answer = self.peer_connection.create_answer(None).await?;
        Ok(SessionDescription::answer(answer.sdp))
    }

    async fn set_local_description(&self, description: SessionDescription) -> Result<()> {
        let desc = Self::to_rtc(description)?;
        self.peer_connection.set_local_description(desc).await?;
        Ok(())
    }

    async fn set_remote_description(&self, description: SessionDescription) -> Result<()> {
        let desc = Self::to_rtc(description)?;

        // Held across the await so a concurrent candidate cannot slip between
        // "remote set" and the flush.
        let mut gate = self.candidates.lock().await;
        self.peer_connection.set_remote_description(desc).await?;
        gate.remote_set = true;

        for init in gate.buffered.drain(..) {
            if let Err(e) = self.peer_connection.add_ice_candidate(init).await {
                warn!("Failed to add buffered ICE candidate for {}: {:?}", self.tag.peer_id, e);
            }
        }
        Ok(())
    }

    async fn add_remote_candidate(&self, candidate: IceCandidate) -> Result<()> {
        let init = RTCIceCandidateInit {
            candidate: candidate.candidate,
            sdp_mid: candidate.sdp_mid,
            sdp_mline_index: candidate.sdp_m_line_index,
            username_fragment: candidate.username_fragment,
        };

        let mut gate = self.candidates.lock().await;
        if !gate.remote_set {
            gate.buffered.push(init);
            return Ok(());
        }
        self.peer_connection
            .add_ice_candidate(init)
            .await
            .context("Failed to add ICE candidate")?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.peer_connection.close().await?;
        Ok(())
    }
}
