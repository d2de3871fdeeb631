pub mod channel;
pub mod config;
pub mod error;
pub mod types;

pub use channel::{channel_key, room_key, Channel};
pub use error::RelayError;
pub use types::{ConnId, UserId};
