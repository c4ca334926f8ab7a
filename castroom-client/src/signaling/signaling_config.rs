use castroom_core::{RoomCode, Role};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct SignalingConfig {
    /// WebSocket endpoint of the relay, e.g. `ws://127.0.0.1:8000/ws`.
    pub url: String,
    pub room: RoomCode,
    pub display_name: String,
    pub role: Role,
    pub reconnect_delay: Duration,
}

impl SignalingConfig {
    pub fn new(url: impl Into<String>, room: RoomCode, display_name: impl Into<String>, role: Role) -> Self {
        Self {
            url: url.into(),
            room,
            display_name: display_name.into(),
            role,
            reconnect_delay: Duration::from_secs(2),
        }
    }
}
