use async_trait::async_trait;
use castroom_core::{IceCandidate, ParticipantId};

/// The sending half of the signaling bus, as the orchestrators need it.
///
/// Sends are fire-and-forget: a message that cannot be delivered (for
/// example while the bus is reconnecting) is dropped and logged.
#[async_trait]
pub trait SignalingOutput: Send + Sync {
    /// Send an offer for link generation `negotiation` to one viewer.
    async fn send_offer(&self, to: ParticipantId, sdp: String, negotiation: u64);

    /// Send an answer to the host, echoing the offer's negotiation tag.
    async fn send_answer(&self, to: ParticipantId, sdp: String, negotiation: Option<u64>);

    async fn send_ice(&self, to: ParticipantId, candidate: IceCandidate);

    async fn send_host_state(&self, is_sharing: bool);
}
