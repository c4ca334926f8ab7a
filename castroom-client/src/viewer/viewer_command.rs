use crate::viewer::ViewerSnapshot;
use castroom_core::{IceCandidate, ParticipantId};
use tokio::sync::oneshot;

#[derive(Debug)]
pub enum ViewerCommand {
    /// An offer (first or renegotiation) from the host.
    OfferReceived {
        host_id: ParticipantId,
        sdp: String,
        negotiation: Option<u64>,
    },

    RemoteIceCandidate {
        from: ParticipantId,
        candidate: IceCandidate,
    },

    /// `None` means whichever host the session is linked to.
    HostLeft { host_id: Option<ParticipantId> },

    /// This participant (re)entered a room. Links from before are forgotten.
    JoinedRoom,

    Snapshot { reply: oneshot::Sender<ViewerSnapshot> },
}
