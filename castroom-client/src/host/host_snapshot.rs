use crate::link::{LinkId, LinkPhase};
use castroom_core::ParticipantId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewerLinkSnapshot {
    pub viewer_id: ParticipantId,
    pub phase: LinkPhase,
    pub link_id: Option<LinkId>,
    pub attached_tracks: usize,
    /// Remote candidates held until the link exists.
    pub queued_candidates: usize,
}

/// Point-in-time view of a host orchestrator.
#[derive(Debug, Clone, Default)]
pub struct HostSnapshot {
    pub has_local_media: bool,
    pub viewers: Vec<ViewerLinkSnapshot>,
}

impl HostSnapshot {
    pub fn viewer(&self, viewer_id: &ParticipantId) -> Option<&ViewerLinkSnapshot> {
        self.viewers.iter().find(|v| &v.viewer_id == viewer_id)
    }

    pub fn phase_of(&self, viewer_id: &ParticipantId) -> Option<LinkPhase> {
        self.viewer(viewer_id).map(|v| v.phase)
    }

    pub fn pending_viewers(&self) -> Vec<ParticipantId> {
        self.viewers
            .iter()
            .filter(|v| v.phase == LinkPhase::Pending)
            .map(|v| v.viewer_id)
            .collect()
    }

    /// Links that own an adapter.
    pub fn active_links(&self) -> Vec<ParticipantId> {
        self.viewers
            .iter()
            .filter(|v| v.phase.is_active())
            .map(|v| v.viewer_id)
            .collect()
    }
}
