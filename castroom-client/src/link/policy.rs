use crate::link::LinkPhase;

/// What the host must do for one viewer given the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkAction {
    Noop,
    CreateLinkAndOffer,
    RenegotiateOffer,
}

/// Decides the next step for a viewer from `(has_local_media, phase, tracks_attached)` alone.
///
/// Media availability and viewer arrival are independent event streams. The
/// orchestrator calls this after every change to either of them, which makes
/// "join then share" and "share then join" converge on the same state with a
/// single offer.
pub fn compute_action(has_local_media: bool, phase: LinkPhase, tracks_attached: bool) -> LinkAction {
    if !has_local_media {
        return LinkAction::Noop;
    }
    match phase {
        LinkPhase::Closed => LinkAction::Noop,
        LinkPhase::Pending => LinkAction::CreateLinkAndOffer,
        _ if tracks_attached => LinkAction::Noop,
        _ => LinkAction::RenegotiateOffer,
    }
}
