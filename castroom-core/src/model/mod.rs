mod description;
mod ice;
mod participant;
mod room;
mod signaling;

pub use description::{SdpKind, SessionDescription};
pub use ice::{IceCandidate, IceServerConfig};
pub use participant::{ParseIdError, Participant, ParticipantId, Role};
pub use room::RoomCode;
pub use signaling::{BusEvent, ClientSignal};
