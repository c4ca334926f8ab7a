use castroom_core::{BusEvent, Participant, ParticipantId, Role};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;

/// The room's member list as seen through bus events.
///
/// Shared with the UI; cloning is cheap and every clone sees the same table.
#[derive(Clone, Default)]
pub struct RoomParticipantRegistry {
    members: Arc<DashMap<ParticipantId, Participant>>,
}

impl RoomParticipantRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a bus event. Returns the removed participant on `participant-left`.
    pub fn apply(&self, event: &BusEvent) -> Option<Participant> {
        match event {
            BusEvent::Joined { participants, .. } => {
                self.members.clear();
                for p in participants {
                    self.members.insert(p.id, p.clone());
                }
                None
            }
            BusEvent::ParticipantJoined { id, name, role } => {
                debug!("Registry: {} joined as {}", id, role);
                self.members.insert(
                    *id,
                    Participant {
                        id: *id,
                        name: name.clone(),
                        role: *role,
                    },
                );
                None
            }
            BusEvent::ParticipantLeft { id, .. } => {
                debug!("Registry: {} left", id);
                self.members.remove(id).map(|(_, p)| p)
            }
            _ => None,
        }
    }

    pub fn get(&self, id: &ParticipantId) -> Option<Participant> {
        self.members.get(id).map(|entry| entry.value().clone())
    }

    pub fn host(&self) -> Option<Participant> {
        self.members
            .iter()
            .find(|entry| entry.role == Role::Host)
            .map(|entry| entry.value().clone())
    }

    pub fn list(&self) -> Vec<Participant> {
        let mut list: Vec<_> = self.members.iter().map(|e| e.value().clone()).collect();
        list.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        list
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
