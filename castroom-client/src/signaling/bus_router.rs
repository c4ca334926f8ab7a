use crate::error::OrchestratorError;
use crate::host::HostHandle;
use crate::registry::RoomParticipantRegistry;
use crate::viewer::ViewerHandle;
use castroom_core::{BusEvent, Role};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// The orchestrator a participant drives, depending on its role.
#[derive(Clone, Debug)]
pub enum RoleHandle {
    Host(HostHandle),
    Viewer(ViewerHandle),
}

/// Feeds bus events into the registry and the participant's orchestrator.
pub struct BusRouter {
    registry: RoomParticipantRegistry,
    target: RoleHandle,
}

impl BusRouter {
    pub fn new(registry: RoomParticipantRegistry, target: RoleHandle) -> Self {
        Self { registry, target }
    }

    pub fn registry(&self) -> &RoomParticipantRegistry {
        &self.registry
    }

    /// Routes events until the bus closes or the orchestrator stops.
    pub async fn run(self, mut events: mpsc::Receiver<BusEvent>) {
        while let Some(event) = events.recv().await {
            if let Err(e) = self.route(event).await {
                warn!("Stopping bus router: {}", e);
                break;
            }
        }
        debug!("Bus router finished");
    }

    pub async fn route(&self, event: BusEvent) -> Result<(), OrchestratorError> {
        let departed = self.registry.apply(&event);

        match (&self.target, event) {
            (RoleHandle::Host(host), BusEvent::ViewerArrived { viewer_id, viewer_name }) => {
                info!("Viewer {} ({}) arrived", viewer_name, viewer_id);
                host.viewer_joined(viewer_id).await
            }
            (RoleHandle::Host(host), BusEvent::Answer { from, sdp, negotiation }) => {
                host.answer_received(from, sdp, negotiation).await
            }
            (RoleHandle::Host(host), BusEvent::IceCandidate { from, candidate }) => {
                host.remote_ice_candidate(from, candidate).await
            }
            (RoleHandle::Host(host), BusEvent::ParticipantLeft { id, .. }) => {
                host.viewer_left(id).await
            }

            (RoleHandle::Viewer(viewer), BusEvent::Offer { from, sdp, negotiation }) => {
                viewer.offer_received(from, sdp, negotiation).await
            }
            (RoleHandle::Viewer(viewer), BusEvent::IceCandidate { from, candidate }) => {
                viewer.remote_ice_candidate(from, candidate).await
            }
            (RoleHandle::Viewer(viewer), BusEvent::HostLeft) => viewer.host_left(None).await,
            (RoleHandle::Viewer(viewer), BusEvent::ParticipantLeft { id, .. }) => {
                match departed {
                    Some(p) if p.role == Role::Host => viewer.host_left(Some(id)).await,
                    _ => Ok(()),
                }
            }

            (_, BusEvent::ChatMessage { name, text, .. }) => {
                info!("[chat] {}: {}", name, text);
                Ok(())
            }
            (_, BusEvent::HostState { is_sharing }) => {
                info!("Host is {}sharing", if is_sharing { "" } else { "not " });
                Ok(())
            }
            (_, BusEvent::JoinError { error }) => {
                warn!("Failed to join room: {}", error);
                Ok(())
            }
            (target, BusEvent::Joined { room, host_online, participants }) => {
                info!(
                    "Joined room {} ({} participants, host online: {})",
                    room,
                    participants.len(),
                    host_online
                );
                match target {
                    RoleHandle::Viewer(viewer) => viewer.joined_room().await,
                    RoleHandle::Host(_) => Ok(()),
                }
            }
            (_, other) => {
                debug!("Bus event not routed: {:?}", other);
                Ok(())
            }
        }
    }
}
