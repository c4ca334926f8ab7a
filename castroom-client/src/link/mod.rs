mod link_worker;
mod peer_link;
mod phase;
mod policy;

pub use link_worker::{NegotiationOutcome, NegotiationStep};
pub use peer_link::PeerLink;
pub use phase::{Generation, LinkId, LinkPhase};
pub use policy::{LinkAction, compute_action};
