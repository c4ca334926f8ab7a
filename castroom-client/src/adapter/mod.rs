mod adapter_event;
mod peer_link_adapter;
mod transport_config;
mod webrtc_adapter;

pub use adapter_event::*;
pub use peer_link_adapter::*;
pub use transport_config::*;
pub use webrtc_adapter::*;
