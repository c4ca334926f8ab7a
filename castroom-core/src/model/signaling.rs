use crate::model::ice::IceCandidate;
use crate::model::participant::{Participant, ParticipantId, Role};
use crate::model::room::RoomCode;
use serde::{Deserialize, Serialize};

/// Events delivered by the relay to a participant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum BusEvent {
    /// First message on every connection: the id the relay assigned.
    Welcome { id: ParticipantId },
    RoomCreated { room: RoomCode },
    Joined {
        room: RoomCode,
        host_online: bool,
        #[serde(default)]
        participants: Vec<Participant>,
    },
    JoinError { error: String },
    ParticipantJoined {
        id: ParticipantId,
        name: String,
        role: Role,
    },
    ParticipantLeft { id: ParticipantId, name: String },
    /// Sent to the host only.
    ViewerArrived {
        viewer_id: ParticipantId,
        viewer_name: String,
    },
    HostLeft,
    Offer {
        from: ParticipantId,
        sdp: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        negotiation: Option<u64>,
    },
    Answer {
        from: ParticipantId,
        sdp: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        negotiation: Option<u64>,
    },
    IceCandidate {
        from: ParticipantId,
        candidate: IceCandidate,
    },
    HostState { is_sharing: bool },
    ChatMessage {
        from: ParticipantId,
        name: String,
        text: String,
    },
}

/// Messages a participant sends to the relay. Targets are optional where the
/// relay falls back to a room broadcast.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(
    tag = "op",
    content = "d",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ClientSignal {
    CreateRoom,
    JoinRoom {
        room: RoomCode,
        name: String,
        role: Role,
    },
    Offer {
        #[serde(default)]
        to: Option<ParticipantId>,
        sdp: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        negotiation: Option<u64>,
    },
    Answer {
        #[serde(default)]
        to: Option<ParticipantId>,
        sdp: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        negotiation: Option<u64>,
    },
    IceCandidate {
        #[serde(default)]
        to: Option<ParticipantId>,
        candidate: IceCandidate,
    },
    ChatMessage { text: String },
    HostState { is_sharing: bool },
}
