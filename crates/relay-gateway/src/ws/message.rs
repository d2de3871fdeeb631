use relay_core::{
    error::{RelayError, Result},
    types::ConnId,
};
use relay_protocol::{events::AUTH, frames::InboundFrame};
use tracing::{debug, warn};

use crate::app::AppState;
use crate::ws::connection::ConnState;
use crate::ws::{dispatch, handshake};

/// Process one inbound WS text frame. Returns the new connection state.
///
/// Nothing is ever sent back as an error: a protocol violation or rejected
/// credentials close the connection, everything else is dropped silently.
pub async fn handle(conn: &ConnId, text: &str, state: ConnState, app: &AppState) -> ConnState {
    match process(conn, text, state, app).await {
        Ok(next) => next,
        Err(e @ (RelayError::ProtocolViolation(_) | RelayError::AuthFailed(_))) => {
            warn!(conn_id = %conn, code = e.code(), error = %e, "closing connection");
            ConnState::Closing
        }
        Err(e) => {
            debug!(conn_id = %conn, code = e.code(), error = %e, "frame dropped");
            state
        }
    }
}

async fn process(conn: &ConnId, text: &str, state: ConnState, app: &AppState) -> Result<ConnState> {
    let frame = InboundFrame::parse(text).map_err(|e| RelayError::MalformedInput(e.to_string()))?;

    match state {
        // the gate looks at the type alone, before any body parsing
        ConnState::Unauthenticated if frame.event_type != AUTH => Err(RelayError::ProtocolViolation(
            format!("`{}` before auth", frame.event_type),
        )),
        ConnState::Unauthenticated => handshake::authenticate(conn, frame, app).await,
        ConnState::Authenticated if frame.event_type == AUTH => {
            handshake::authenticate(conn, frame, app).await
        }
        ConnState::Authenticated => {
            dispatch::route(conn, frame, app)?;
            Ok(ConnState::Authenticated)
        }
        ConnState::Closing => Ok(ConnState::Closing),
    }
}
