use crate::adapter::{AdapterEvent, LinkTag};
use crate::media::MediaTrack;
use anyhow::Result;
use async_trait::async_trait;
use castroom_core::{IceCandidate, SessionDescription};
use std::sync::Arc;
use tokio::sync::mpsc;

/// One point-to-point negotiation session.
///
/// The callback half of the capability (local candidates, connectivity
/// changes, remote tracks) is delivered as [`AdapterEvent`]s on the channel
/// handed to [`AdapterFactory::create`].
#[async_trait]
pub trait PeerLinkAdapter: Send + Sync {
    async fn attach_track(&self, track: &MediaTrack) -> Result<()>;

    /// Removes every track previously attached. Does not renegotiate.
    async fn detach_tracks(&self) -> Result<()>;

    async fn create_offer(&self) -> Result<SessionDescription>;

    async fn create_answer(&self) -> Result<SessionDescription>;

    async fn set_local_description(&self, description: SessionDescription) -> Result<()>;

    async fn set_remote_description(&self, description: SessionDescription) -> Result<()>;

    async fn add_remote_candidate(&self, candidate: IceCandidate) -> Result<()>;

    async fn close(&self) -> Result<()>;
}

#[async_trait]
pub trait AdapterFactory: Send + Sync {
    async fn create(
        &self,
        tag: LinkTag,
        events: mpsc::Sender<AdapterEvent>,
    ) -> Result<Arc<dyn PeerLinkAdapter>>;
}
