use std::net::SocketAddr;

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub bind: SocketAddr,
    /// Length of generated room codes.
    pub room_code_len: usize,
    /// How many random codes to try before giving up on room creation.
    pub create_attempts: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 3001)),
            room_code_len: 6,
            create_attempts: 5,
        }
    }
}
