//! Typed bodies of inbound events, extracted after the `type` gate.
//!
//! Display and payload fields stay as raw JSON: the relay forwards them
//! verbatim and never interprets them. A field the client omitted stays
//! `None` and is left out of the outbound envelope; an explicit `null` is
//! `Some(Value::Null)` and goes back out as `null`.

use relay_core::types::UserId;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// `deserialize_with` for optional fields: present (even as `null`) is `Some`.
/// Pair with `#[serde(default)]` so an absent field stays `None`.
pub fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// `{ "type": "auth", "user_id": ..., "csrf": ... }`
///
/// Neither field is required: an `auth` without `user_id` still authenticates,
/// with no id to echo.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthParams {
    #[serde(default, deserialize_with = "present")]
    pub user_id: Option<UserId>,
    /// Proof token; only forwarded to the credential validator.
    #[serde(default)]
    pub csrf: Option<Value>,
}

impl AuthParams {
    /// Proof as form text: strings as-is, other JSON as its text, nothing as empty.
    pub fn proof(&self) -> String {
        match &self.csrf {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }
}

/// `{ "type": "subscribe", "channel": { "type": "room", ... } }`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubscribeParams {
    #[serde(default, deserialize_with = "present")]
    pub channel: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatMessageParams {
    #[serde(default, deserialize_with = "present")]
    pub username: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub nickname: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub avatar: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub message: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub created_at: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdateParams {
    #[serde(default, deserialize_with = "present")]
    pub username: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub nickname: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub avatar: Option<Value>,
}

/// Body of `room_created` and `room_update`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoomParams {
    #[serde(default, deserialize_with = "present")]
    pub room: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoomDeletedParams {
    #[serde(default, deserialize_with = "present")]
    pub room_id: Option<Value>,
}

/// Targets the room group named by `leagueId`/`roomId`, not the sender's channel.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoomMembersParams {
    #[serde(default, rename = "leagueId")]
    pub league_id: Option<Value>,
    #[serde(default, rename = "roomId")]
    pub room_id: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub members: Option<Value>,
}

impl RoomMembersParams {
    /// Room group key, if both ids are usable.
    pub fn target_key(&self) -> Option<String> {
        let league = self.league_id.as_ref().and_then(relay_core::channel::id_text)?;
        let room = self.room_id.as_ref().and_then(relay_core::channel::id_text)?;
        Some(relay_core::room_key(&league, &room))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn auth_fields_are_optional_and_raw() {
        let p: AuthParams = serde_json::from_value(json!({"csrf": 123})).unwrap();
        assert!(p.user_id.is_none());
        assert_eq!(p.proof(), "123");

        let p: AuthParams = serde_json::from_value(json!({"user_id": 9})).unwrap();
        assert_eq!(p.user_id, Some(UserId(json!(9))));
        assert_eq!(p.proof(), "");
    }

    #[test]
    fn explicit_null_differs_from_absent() {
        let p: RoomParams = serde_json::from_value(json!({"room": null})).unwrap();
        assert_eq!(p.room, Some(Value::Null));

        let p: RoomParams = serde_json::from_value(json!({})).unwrap();
        assert!(p.room.is_none());

        let p: AuthParams = serde_json::from_value(json!({"user_id": null})).unwrap();
        assert_eq!(p.user_id, Some(UserId(Value::Null)));
    }

    #[test]
    fn members_target_key() {
        let p: RoomMembersParams =
            serde_json::from_value(json!({"leagueId": "L9", "roomId": 4, "members": []})).unwrap();
        assert_eq!(p.target_key().as_deref(), Some("room:L9:4"));

        let p: RoomMembersParams = serde_json::from_value(json!({"leagueId": "L9"})).unwrap();
        assert!(p.target_key().is_none());
    }
}
