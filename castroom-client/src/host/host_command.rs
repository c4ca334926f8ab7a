use crate::host::HostSnapshot;
use crate::media::MediaBundle;
use castroom_core::{IceCandidate, ParticipantId};
use std::sync::Arc;
use tokio::sync::oneshot;

/// Commands delivered to a host orchestrator, mostly translated from bus events.
#[derive(Debug)]
pub enum HostCommand {
    /// A viewer arrived in the room.
    ViewerJoined { viewer_id: ParticipantId },

    /// A viewer left or disconnected.
    ViewerLeft { viewer_id: ParticipantId },

    /// Capture started, or switched to a different bundle.
    MediaAvailable { bundle: Arc<MediaBundle> },

    MediaStopped,

    AnswerReceived {
        viewer_id: ParticipantId,
        sdp: String,
        negotiation: Option<u64>,
    },

    RemoteIceCandidate {
        viewer_id: ParticipantId,
        candidate: IceCandidate,
    },

    Snapshot { reply: oneshot::Sender<HostSnapshot> },
}
