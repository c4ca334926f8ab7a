use castroom_core::{Participant, ParticipantId, Role, RoomCode};
use serde::Serialize;

/// Membership of one room, in join order.
#[derive(Debug, Default)]
pub struct RoomState {
    participants: Vec<Participant>,
    host: Option<ParticipantId>,
    host_sharing: bool,
}

impl RoomState {
    /// Adds (or replaces) a participant. A joining host takes over the room.
    pub fn join(&mut self, participant: Participant) {
        self.participants.retain(|p| p.id != participant.id);
        if participant.role == Role::Host {
            if self.host != Some(participant.id) {
                self.host_sharing = false;
            }
            self.host = Some(participant.id);
        }
        self.participants.push(participant);
    }

    /// Removes a participant. Returns it and whether it was the host.
    pub fn leave(&mut self, id: &ParticipantId) -> Option<(Participant, bool)> {
        let index = self.participants.iter().position(|p| &p.id == id)?;
        let participant = self.participants.remove(index);
        let was_host = self.host == Some(*id);
        if was_host {
            self.host = None;
            self.host_sharing = false;
        }
        Some((participant, was_host))
    }

    pub fn host(&self) -> Option<ParticipantId> {
        self.host
    }

    pub fn is_host(&self, id: &ParticipantId) -> bool {
        self.host.as_ref() == Some(id)
    }

    pub fn host_sharing(&self) -> bool {
        self.host_sharing
    }

    pub fn set_host_sharing(&mut self, is_sharing: bool) {
        self.host_sharing = is_sharing;
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn get(&self, id: &ParticipantId) -> Option<&Participant> {
        self.participants.iter().find(|p| &p.id == id)
    }

    pub fn viewers(&self) -> impl Iterator<Item = &Participant> {
        self.participants.iter().filter(|p| p.role == Role::Viewer)
    }

    pub fn member_ids(&self) -> Vec<ParticipantId> {
        self.participants.iter().map(|p| p.id).collect()
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoomMeta {
    pub participants: Vec<Participant>,
    pub host_online: bool,
}

/// Body of `GET /room/{code}`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RoomInfo {
    pub room: RoomCode,
    pub meta: RoomMeta,
}
