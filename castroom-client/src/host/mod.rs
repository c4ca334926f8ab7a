mod host_command;
mod host_handle;
mod host_orchestrator;
mod host_snapshot;

pub use host_command::*;
pub use host_handle::*;
pub use host_orchestrator::*;
pub use host_snapshot::*;
