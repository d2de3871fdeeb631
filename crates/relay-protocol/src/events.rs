// Event `type` discriminators carried in every envelope, both directions.

// session
pub const AUTH: &str = "auth";
pub const AUTH_OK: &str = "auth_ok";
pub const SUBSCRIBE: &str = "subscribe";

// channel-scoped
pub const CHAT_MESSAGE: &str = "chat_message";
pub const ROOM_MEMBERS_UPDATE: &str = "room_members_update";

// global
pub const PROFILE_UPDATE: &str = "profile_update";
pub const ROOM_CREATED: &str = "room_created";
pub const ROOM_DELETED: &str = "room_deleted";
pub const ROOM_UPDATE: &str = "room_update";
