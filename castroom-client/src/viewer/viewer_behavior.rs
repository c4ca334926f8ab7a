use crate::media::RemoteTrack;
use async_trait::async_trait;
use castroom_core::ParticipantId;

/// Presentation-layer hooks of a viewer.
#[async_trait]
pub trait ViewerBehavior: Send + Sync + 'static {
    async fn on_remote_track(&self, host_id: ParticipantId, track: RemoteTrack);

    async fn on_connected(&self, _host_id: ParticipantId) {}

    async fn on_host_left(&self, _host_id: ParticipantId) {}
}
