use crate::link::LinkId;
use crate::media::RemoteTrack;
use castroom_core::{IceCandidate, ParticipantId};

/// Identifies the link an adapter was created for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LinkTag {
    pub peer_id: ParticipantId,
    pub link_id: LinkId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityState {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

impl ConnectivityState {
    /// Failed and closed links never recover; disconnected ones may.
    pub fn is_terminal(self) -> bool {
        matches!(self, ConnectivityState::Failed | ConnectivityState::Closed)
    }
}

/// What an adapter reports back about itself.
#[derive(Debug, Clone)]
pub enum AdapterEventKind {
    /// A local ICE candidate to trickle to the remote side.
    LocalCandidate(IceCandidate),
    Connectivity(ConnectivityState),
    RemoteTrack(RemoteTrack),
}

#[derive(Debug, Clone)]
pub struct AdapterEvent {
    pub tag: LinkTag,
    pub kind: AdapterEventKind,
}
