mod adapter;
mod error;
mod host;
mod link;
mod media;
mod registry;
mod signaling;
mod viewer;

pub use adapter::*;
pub use error::*;
pub use host::*;
pub use link::*;
pub use media::*;
pub use registry::*;
pub use signaling::*;
pub use viewer::*;
