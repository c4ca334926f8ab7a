mod bus_router;
mod signaling_config;
mod signaling_output;
mod ws_client;

pub use bus_router::*;
pub use signaling_config::*;
pub use signaling_output::*;
pub use ws_client::*;
