use crate::error::OrchestratorError;
use crate::viewer::{ViewerCommand, ViewerSnapshot};
use castroom_core::{IceCandidate, ParticipantId};
use tokio::sync::{mpsc, oneshot};

/// Cloneable sender side of a [`ViewerSession`](crate::ViewerSession).
#[derive(Clone, Debug)]
pub struct ViewerHandle {
    tx: mpsc::Sender<ViewerCommand>,
}

impl ViewerHandle {
    pub fn new(tx: mpsc::Sender<ViewerCommand>) -> Self {
        Self { tx }
    }

    pub async fn send(&self, cmd: ViewerCommand) -> Result<(), OrchestratorError> {
        self.tx.send(cmd).await.map_err(|_| OrchestratorError::Shutdown)
    }

    pub async fn offer_received(
        &self,
        host_id: ParticipantId,
        sdp: String,
        negotiation: Option<u64>,
    ) -> Result<(), OrchestratorError> {
        self.send(ViewerCommand::OfferReceived {
            host_id,
            sdp,
            negotiation,
        })
        .await
    }

    pub async fn remote_ice_candidate(
        &self,
        from: ParticipantId,
        candidate: IceCandidate,
    ) -> Result<(), OrchestratorError> {
        self.send(ViewerCommand::RemoteIceCandidate { from, candidate })
            .await
    }

    pub async fn host_left(&self, host_id: Option<ParticipantId>) -> Result<(), OrchestratorError> {
        self.send(ViewerCommand::HostLeft { host_id }).await
    }

    pub async fn joined_room(&self) -> Result<(), OrchestratorError> {
        self.send(ViewerCommand::JoinedRoom).await
    }

    pub async fn snapshot(&self) -> Result<ViewerSnapshot, OrchestratorError> {
        let (reply, rx) = oneshot::channel();
        self.send(ViewerCommand::Snapshot { reply }).await?;
        rx.await.map_err(|_| OrchestratorError::Shutdown)
    }
}
