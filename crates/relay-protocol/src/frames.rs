use relay_core::types::UserId;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

/// Raw inbound envelope: read the `type` discriminator first, extract the body later.
/// Wire: `{ "type": "chat_message", "message": "hi", ... }`
#[derive(Debug, Clone, Deserialize)]
pub struct InboundFrame {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(flatten)]
    pub rest: serde_json::Map<String, Value>,
}

impl InboundFrame {
    /// Parse one text frame. Fails on invalid JSON, non-objects and a missing or non-string `type`.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Deserialize the type-specific fields into a typed body.
    pub fn into_body<T: DeserializeOwned>(self) -> Result<T, serde_json::Error> {
        serde_json::from_value(Value::Object(self.rest))
    }
}

/// Server → Client envelope, either sent to one connection or fanned out.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundEvent {
    /// Reply to the authenticating connection only.
    AuthOk,
    ChatMessage {
        #[serde(skip_serializing_if = "Option::is_none")]
        channel: Option<Value>,
        message: ChatMessageBody,
    },
    ProfileUpdate {
        #[serde(skip_serializing_if = "Option::is_none")]
        user_id: Option<UserId>,
        #[serde(skip_serializing_if = "Option::is_none")]
        username: Option<Value>,
        #[serde(skip_serializing_if = "Option::is_none")]
        nickname: Option<Value>,
        #[serde(skip_serializing_if = "Option::is_none")]
        avatar: Option<Value>,
    },
    RoomCreated {
        #[serde(skip_serializing_if = "Option::is_none")]
        room: Option<Value>,
    },
    RoomDeleted {
        #[serde(skip_serializing_if = "Option::is_none")]
        room_id: Option<Value>,
    },
    RoomUpdate {
        #[serde(skip_serializing_if = "Option::is_none")]
        room: Option<Value>,
    },
    RoomMembersUpdate {
        #[serde(skip_serializing_if = "Option::is_none")]
        members: Option<Value>,
    },
}

impl OutboundEvent {
    /// Wire name of this event, as found in its `type` field.
    pub fn event_type(&self) -> &'static str {
        use crate::events::*;
        match self {
            Self::AuthOk => AUTH_OK,
            Self::ChatMessage { .. } => CHAT_MESSAGE,
            Self::ProfileUpdate { .. } => PROFILE_UPDATE,
            Self::RoomCreated { .. } => ROOM_CREATED,
            Self::RoomDeleted { .. } => ROOM_DELETED,
            Self::RoomUpdate { .. } => ROOM_UPDATE,
            Self::RoomMembersUpdate { .. } => ROOM_MEMBERS_UPDATE,
        }
    }

    /// Serialize once; the same text is handed to every recipient.
    pub fn to_text(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Chat body: the sender's session user id plus display fields as the client sent them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessageBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nickname: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Value>,
}
