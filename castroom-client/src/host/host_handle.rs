use crate::error::OrchestratorError;
use crate::host::{HostCommand, HostSnapshot};
use crate::media::MediaBundle;
use castroom_core::{IceCandidate, ParticipantId};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// Cloneable sender side of a [`HostOrchestrator`](crate::HostOrchestrator).
#[derive(Clone, Debug)]
pub struct HostHandle {
    tx: mpsc::Sender<HostCommand>,
}

impl HostHandle {
    pub fn new(tx: mpsc::Sender<HostCommand>) -> Self {
        Self { tx }
    }

    pub async fn send(&self, cmd: HostCommand) -> Result<(), OrchestratorError> {
        self.tx.send(cmd).await.map_err(|_| OrchestratorError::Shutdown)
    }

    pub async fn viewer_joined(&self, viewer_id: ParticipantId) -> Result<(), OrchestratorError> {
        self.send(HostCommand::ViewerJoined { viewer_id }).await
    }

    pub async fn viewer_left(&self, viewer_id: ParticipantId) -> Result<(), OrchestratorError> {
        self.send(HostCommand::ViewerLeft { viewer_id }).await
    }

    pub async fn media_available(&self, bundle: Arc<MediaBundle>) -> Result<(), OrchestratorError> {
        self.send(HostCommand::MediaAvailable { bundle }).await
    }

    pub async fn media_stopped(&self) -> Result<(), OrchestratorError> {
        self.send(HostCommand::MediaStopped).await
    }

    pub async fn answer_received(
        &self,
        viewer_id: ParticipantId,
        sdp: String,
        negotiation: Option<u64>,
    ) -> Result<(), OrchestratorError> {
        self.send(HostCommand::AnswerReceived {
            viewer_id,
            sdp,
            negotiation,
        })
        .await
    }

    pub async fn remote_ice_candidate(
        &self,
        viewer_id: ParticipantId,
        candidate: IceCandidate,
    ) -> Result<(), OrchestratorError> {
        self.send(HostCommand::RemoteIceCandidate {
            viewer_id,
            candidate,
        })
        .await
    }

    pub async fn snapshot(&self) -> Result<HostSnapshot, OrchestratorError> {
        let (reply, rx) = oneshot::channel();
        self.send(HostCommand::Snapshot { reply }).await?;
        rx.await.map_err(|_| OrchestratorError::Shutdown)
    }
}
