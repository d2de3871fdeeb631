//! Channel descriptors and their canonical group keys.
//!
//! A descriptor arrives from the client as loose JSON:
//! `{"type":"room","leagueId":"L1","roomId":"R3"}`. Resolution never fails;
//! anything absent, unknown or incomplete falls back to [`Channel::World`], so
//! the key computed at auth time is the same string later broadcasts use.

use serde_json::Value;
use std::fmt;

/// Key of the global default group.
pub const WORLD_KEY: &str = "world";

/// A broadcast scope a connection can be subscribed to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Channel {
    #[default]
    World,
    League { league_id: String },
    Club { league_id: String, club_id: String },
    Room { league_id: String, room_id: String },
}

impl Channel {
    /// Resolve a raw client descriptor into a channel.
    ///
    /// Ids may be JSON strings or numbers. A known `type` that lacks one of
    /// its ids is treated like an unknown type.
    pub fn resolve(descriptor: Option<&Value>) -> Self {
        let Some(obj) = descriptor.and_then(Value::as_object) else {
            return Self::World;
        };
        let id = |field: &str| obj.get(field).and_then(id_text);

        let resolved = match obj.get("type").and_then(Value::as_str) {
            Some("league") => id("leagueId").map(|league_id| Self::League { league_id }),
            Some("club") => id("leagueId")
                .zip(id("clubId"))
                .map(|(league_id, club_id)| Self::Club { league_id, club_id }),
            Some("room") => id("leagueId")
                .zip(id("roomId"))
                .map(|(league_id, room_id)| Self::Room { league_id, room_id }),
            _ => None,
        };
        resolved.unwrap_or(Self::World)
    }

    /// Canonical group key for this channel.
    pub fn key(&self) -> String {
        match self {
            Self::World => WORLD_KEY.to_string(),
            Self::League { league_id } => format!("league:{league_id}"),
            Self::Club { league_id, club_id } => format!("club:{league_id}:{club_id}"),
            Self::Room { league_id, room_id } => room_key(league_id, room_id),
        }
    }

    /// The descriptor a fresh session starts with.
    pub fn world_descriptor() -> Value {
        serde_json::json!({ "type": "world" })
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

/// Group key straight from a raw descriptor.
pub fn channel_key(descriptor: Option<&Value>) -> String {
    Channel::resolve(descriptor).key()
}

/// Room group key, shared by subscriptions and `room_members_update` targeting.
pub fn room_key(league_id: &str, room_id: &str) -> String {
    format!("room:{league_id}:{room_id}")
}

/// Render a JSON id as text; only strings and numbers qualify.
pub fn id_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn absent_world_and_unknown_all_map_to_world() {
        assert_eq!(channel_key(None), "world");
        assert_eq!(channel_key(Some(&json!({"type": "world"}))), "world");
        assert_eq!(channel_key(Some(&json!({"type": "unknown_type"}))), "world");
        assert_eq!(channel_key(Some(&Value::Null)), "world");
        assert_eq!(channel_key(Some(&json!("room"))), "world");
        assert_eq!(channel_key(Some(&json!({}))), "world");
    }

    #[test]
    fn league_club_and_room_keys() {
        assert_eq!(
            channel_key(Some(&json!({"type": "league", "leagueId": "L1"}))),
            "league:L1"
        );
        assert_eq!(
            channel_key(Some(&json!({"type": "club", "leagueId": "L1", "clubId": "C2"}))),
            "club:L1:C2"
        );
        assert_eq!(
            channel_key(Some(&json!({"type": "room", "leagueId": "L1", "roomId": "R3"}))),
            "room:L1:R3"
        );
    }

    #[test]
    fn numeric_ids_render_as_text() {
        let d = json!({"type": "room", "leagueId": 7, "roomId": 12});
        assert_eq!(channel_key(Some(&d)), "room:7:12");
        assert_eq!(
            Channel::resolve(Some(&d)),
            Channel::Room { league_id: "7".into(), room_id: "12".into() }
        );
    }

    #[test]
    fn incomplete_descriptor_falls_back_to_world() {
        assert_eq!(channel_key(Some(&json!({"type": "club", "leagueId": "L1"}))), "world");
        assert_eq!(channel_key(Some(&json!({"type": "room", "roomId": "R3"}))), "world");
        assert_eq!(channel_key(Some(&json!({"type": "league", "leagueId": true}))), "world");
    }

    #[test]
    fn resolution_is_deterministic() {
        let d = json!({"type": "club", "leagueId": "L1", "clubId": "C2", "extra": [1, 2]});
        let first = channel_key(Some(&d));
        for _ in 0..10 {
            assert_eq!(channel_key(Some(&d.clone())), first);
        }
    }

    #[test]
    fn room_key_matches_room_channel_key() {
        let ch = Channel::Room { league_id: "L9".into(), room_id: "R9".into() };
        assert_eq!(ch.key(), room_key("L9", "R9"));
    }

    #[test]
    fn world_descriptor_resolves_to_world() {
        assert_eq!(Channel::resolve(Some(&Channel::world_descriptor())), Channel::World);
    }
}
