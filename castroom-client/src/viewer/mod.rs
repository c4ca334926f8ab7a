mod viewer_behavior;
mod viewer_command;
mod viewer_handle;
mod viewer_session;
mod viewer_snapshot;

pub use viewer_behavior::*;
pub use viewer_command::*;
pub use viewer_handle::*;
pub use viewer_session::*;
pub use viewer_snapshot::*;
