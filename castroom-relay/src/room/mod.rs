mod room_code;
mod room_state;

pub use room_code::*;
pub use room_state::*;
