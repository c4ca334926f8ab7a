use crate::link::{Generation, LinkId, LinkPhase};
use castroom_core::ParticipantId;

/// Point-in-time view of a viewer session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewerSnapshot {
    pub host_id: Option<ParticipantId>,
    /// `None` before the first offer.
    pub phase: Option<LinkPhase>,
    pub link_id: Option<LinkId>,
    pub generation: Option<Generation>,
    pub queued_candidates: usize,
}

impl ViewerSnapshot {
    pub fn is_connected(&self) -> bool {
        matches!(self.phase, Some(LinkPhase::Connected(_)))
    }
}
