use relay_core::{channel::Channel, types::UserId};
use serde_json::Value;

/// Per-connection authenticated state.
///
/// `descriptor` is the channel descriptor exactly as the client last sent it
/// (echoed back in chat envelopes); `channel` is its resolved form, and
/// `channel.key()` is always the group the connection sits in.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    /// Absent when the client authenticated without one.
    pub user_id: Option<UserId>,
    pub descriptor: Option<Value>,
    pub channel: Channel,
}

impl Session {
    /// Fresh session parked in the world channel.
    pub fn new(user_id: Option<UserId>) -> Self {
        Self {
            user_id,
            descriptor: Some(Channel::world_descriptor()),
            channel: Channel::World,
        }
    }

    /// Group key of the current channel.
    pub fn key(&self) -> String {
        self.channel.key()
    }

    /// Overwrite the channel; malformed descriptors resolve to world.
    pub fn set_descriptor(&mut self, descriptor: Option<Value>) {
        self.channel = Channel::resolve(descriptor.as_ref());
        self.descriptor = descriptor;
    }
}

/// Old and new group keys produced by a channel change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelChange {
    pub from: String,
    pub to: String,
}
