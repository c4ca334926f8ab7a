use std::sync::Arc;
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8};
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    Audio,
    Video,
}

/// One local track. Cloning shares the underlying track.
#[derive(Clone)]
pub struct MediaTrack {
    pub id: String,
    pub kind: TrackKind,
    pub local: Arc<dyn TrackLocal + Send + Sync>,
}

impl MediaTrack {
    pub fn new(id: impl Into<String>, kind: TrackKind, local: Arc<dyn TrackLocal + Send + Sync>) -> Self {
        Self {
            id: id.into(),
            kind,
            local,
        }
    }

    /// A sample-fed VP8 track; the capture pipeline writes frames into it.
    pub fn vp8(id: impl Into<String>, stream_id: impl Into<String>) -> Self {
        let id = id.into();
        let track = TrackLocalStaticSample::new(
            RTCRtpCodecCapability {
                mime_type: MIME_TYPE_VP8.to_owned(),
                clock_rate: 90000,
                ..Default::default()
            },
            id.clone(),
            stream_id.into(),
        );
        Self::new(id, TrackKind::Video, Arc::new(track))
    }

    pub fn opus(id: impl Into<String>, stream_id: impl Into<String>) -> Self {
        let id = id.into();
        let track = TrackLocalStaticSample::new(
            RTCRtpCodecCapability {
                mime_type: MIME_TYPE_OPUS.to_owned(),
                clock_rate: 48000,
                channels: 2,
                ..Default::default()
            },
            id.clone(),
            stream_id.into(),
        );
        Self::new(id, TrackKind::Audio, Arc::new(track))
    }
}

impl std::fmt::Debug for MediaTrack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaTrack")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .finish()
    }
}

/// Tracks captured once by the host and shared by every link.
///
/// Links hold an `Arc<MediaBundle>`; two bundles are "the same media" only if
/// they are the same allocation.
#[derive(Debug, Default)]
pub struct MediaBundle {
    tracks: Vec<MediaTrack>,
}

impl MediaBundle {
    pub fn new(tracks: Vec<MediaTrack>) -> Self {
        Self { tracks }
    }

    /// Screen capture shape: one video track plus an optional audio track.
    pub fn screen(stream_id: &str, with_audio: bool) -> Self {
        let mut tracks = vec![MediaTrack::vp8("screen-video", stream_id)];
        if with_audio {
            tracks.push(MediaTrack::opus("screen-audio", stream_id));
        }
        Self::new(tracks)
    }

    pub fn tracks(&self) -> &[MediaTrack] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

/// A track received from the remote side, surfaced to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTrack {
    pub track_id: String,
    pub stream_id: String,
    pub kind: TrackKind,
}
