pub use castroom_core::model::{ParticipantId, Role, RoomCode};

pub mod model {
    pub use castroom_core::model::*;
}

#[cfg(feature = "client")]
pub mod client {
    pub use castroom_client::*;
}

#[cfg(feature = "relay")]
pub mod relay {
    pub use castroom_relay::*;
}
