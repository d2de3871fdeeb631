pub mod registry;
pub mod types;

pub use registry::ConnectionRegistry;
pub use types::{ChannelChange, Session};
