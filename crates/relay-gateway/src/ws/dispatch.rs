use relay_core::{error::RelayError, types::ConnId};
use relay_protocol::{events::*, frames::InboundFrame};
use serde::de::DeserializeOwned;

use crate::app::AppState;
use crate::ws::handlers;

/// Route an authenticated event to its handler.
///
/// A body that does not fit its type is `MalformedInput`, an unlisted type is
/// `UnknownEventType`. Both are dropped by the caller without touching the
/// connection.
pub fn route(conn: &ConnId, frame: InboundFrame, app: &AppState) -> Result<(), RelayError> {
    let event_type = frame.event_type.clone();

    match event_type.as_str() {
        // ------------------------------------------------------------------
        // Membership
        // ------------------------------------------------------------------
        SUBSCRIBE => handlers::subscribe(conn, body(frame, &event_type)?, app),

        // ------------------------------------------------------------------
        // Channel-scoped fan-out
        // ------------------------------------------------------------------
        CHAT_MESSAGE => handlers::chat_message(conn, body(frame, &event_type)?, app),
        ROOM_MEMBERS_UPDATE => handlers::room_members_update(body(frame, &event_type)?, app),

        // ------------------------------------------------------------------
        // Global fan-out
        // ------------------------------------------------------------------
        PROFILE_UPDATE => handlers::profile_update(conn, body(frame, &event_type)?, app),
        ROOM_CREATED => handlers::room_created(body(frame, &event_type)?, app),
        ROOM_DELETED => handlers::room_deleted(body(frame, &event_type)?, app),
        ROOM_UPDATE => handlers::room_update(body(frame, &event_type)?, app),

        other => Err(RelayError::UnknownEventType { event_type: other.to_string() }),
    }
}

fn body<T: DeserializeOwned>(frame: InboundFrame, event_type: &str) -> Result<T, RelayError> {
    frame
        .into_body()
        .map_err(|e| RelayError::MalformedInput(format!("{event_type}: {e}")))
}
