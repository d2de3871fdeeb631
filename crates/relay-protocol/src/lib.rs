pub mod events;
pub mod frames;
pub mod params;

pub use frames::{ChatMessageBody, InboundFrame, OutboundEvent};
