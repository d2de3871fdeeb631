use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// Identity of one live WebSocket connection (UUIDv4, assigned on accept).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnId(pub String);

impl ConnId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Default for ConnId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for ConnId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Opaque user identifier exactly as the client sent it in its `auth` frame.
///
/// Kept as raw JSON so it is echoed back unchanged (`42` stays a number,
/// `"42"` stays a string). Rendered to text only for logs and the
/// credential validator form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub Value);

impl UserId {
    /// Text form: strings as-is, anything else as its JSON text.
    pub fn to_text(&self) -> String {
        match &self.0 {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    /// Log label for an optional id; `-` when the client sent none.
    pub fn label(user_id: Option<&UserId>) -> String {
        user_id.map_or_else(|| "-".to_string(), UserId::to_text)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(Value::String(s))
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(Value::String(s.to_string()))
    }
}

impl From<i64> for UserId {
    fn from(n: i64) -> Self {
        Self(Value::from(n))
    }
}
