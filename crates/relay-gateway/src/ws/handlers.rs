//! Concrete handlers for authenticated events.
//!
//! Each function takes its already-parsed body, reads the sender's session
//! where it needs one, and hands an outbound envelope to the hub.
//! `dispatch::route` is the only caller.

use relay_core::{error::RelayError, types::ConnId};
use relay_protocol::{
    params::{
        ChatMessageParams, ProfileUpdateParams, RoomDeletedParams, RoomMembersParams, RoomParams,
        SubscribeParams,
    },
    ChatMessageBody, OutboundEvent,
};
use tracing::debug;

use crate::app::AppState;

type Result = std::result::Result<(), RelayError>;

// ---------------------------------------------------------------------------
// subscribe
// ---------------------------------------------------------------------------

/// Move the connection to the channel in the event. Malformed descriptors land in world.
///
/// The group switch happens while the session entry is locked, so no
/// broadcast sees the membership and the session disagree.
pub fn subscribe(conn: &ConnId, params: SubscribeParams, app: &AppState) -> Result {
    let change = app.registry.set_channel_with(conn, params.channel, |change| {
        app.hub.switch(conn, &change.from, &change.to);
    });
    match change {
        Some(change) => debug!(conn_id = %conn, from = %change.from, to = %change.to, "subscribed"),
        None => debug!(conn_id = %conn, "subscribe without session"),
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// chat_message
// ---------------------------------------------------------------------------

/// Broadcast to the sender's current channel group.
///
/// Display fields are forwarded exactly as the client sent them; only
/// `user_id` comes from the session.
pub fn chat_message(conn: &ConnId, params: ChatMessageParams, app: &AppState) -> Result {
    let Some(session) = app.registry.get(conn) else {
        debug!(conn_id = %conn, "chat_message without session");
        return Ok(());
    };
    let key = session.key();
    let event = OutboundEvent::ChatMessage {
        channel: session.descriptor,
        message: ChatMessageBody {
            user_id: session.user_id,
            username: params.username,
            nickname: params.nickname,
            avatar: params.avatar,
            message: params.message,
            created_at: params.created_at,
        },
    };
    to_group(app, &key, &event)
}

// ---------------------------------------------------------------------------
// room_members_update
// ---------------------------------------------------------------------------

/// Broadcast to the room named in the event, regardless of the sender's channel.
pub fn room_members_update(params: RoomMembersParams, app: &AppState) -> Result {
    let key = params.target_key().ok_or_else(|| {
        RelayError::MalformedInput("room_members_update: missing leagueId/roomId".into())
    })?;
    let event = OutboundEvent::RoomMembersUpdate { members: params.members };
    to_group(app, &key, &event)
}

// ---------------------------------------------------------------------------
// global events
// ---------------------------------------------------------------------------

pub fn profile_update(conn: &ConnId, params: ProfileUpdateParams, app: &AppState) -> Result {
    let Some(session) = app.registry.get(conn) else {
        debug!(conn_id = %conn, "profile_update without session");
        return Ok(());
    };
    to_all(
        app,
        &OutboundEvent::ProfileUpdate {
            user_id: session.user_id,
            username: params.username,
            nickname: params.nickname,
            avatar: params.avatar,
        },
    )
}

pub fn room_created(params: RoomParams, app: &AppState) -> Result {
    to_all(app, &OutboundEvent::RoomCreated { room: params.room })
}

pub fn room_deleted(params: RoomDeletedParams, app: &AppState) -> Result {
    to_all(app, &OutboundEvent::RoomDeleted { room_id: params.room_id })
}

pub fn room_update(params: RoomParams, app: &AppState) -> Result {
    to_all(app, &OutboundEvent::RoomUpdate { room: params.room })
}

// ---------------------------------------------------------------------------
// fan-out helpers
// ---------------------------------------------------------------------------

fn to_group(app: &AppState, key: &str, event: &OutboundEvent) -> Result {
    let text = event.to_text()?;
    let delivered = app.hub.broadcast_to_group(key, &text);
    debug!(key, event = event.event_type(), delivered, "group fan-out");
    Ok(())
}

fn to_all(app: &AppState, event: &OutboundEvent) -> Result {
    let text = event.to_text()?;
    let delivered = app.hub.broadcast_to_all(&text);
    debug!(event = event.event_type(), delivered, "global fan-out");
    Ok(())
}
