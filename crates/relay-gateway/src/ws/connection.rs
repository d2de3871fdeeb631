use axum::{
    extract::{ws::Message, ws::WebSocket, State, WebSocketUpgrade},
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use relay_core::types::ConnId;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::app::AppState;
use crate::ws::message;

/// WS connection states. Only ever move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnState {
    /// Only `auth` is accepted here.
    Unauthenticated,
    /// Terminal until the socket closes.
    Authenticated,
    Closing,
}

/// Axum handler: upgrades HTTP to WebSocket at GET /ws.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.max_message_size(state.config.gateway.max_payload_bytes)
        .on_upgrade(|socket| run_connection(socket, state))
}

/// Per-connection event loop. Lives for the entire WS session.
///
/// Inbound frames run through the protocol state machine; everything the hub
/// queues for this connection is written out by this same loop, so there is
/// exactly one writer per socket.
async fn run_connection(socket: WebSocket, state: Arc<AppState>) {
    let conn_id = ConnId::new();
    let gw = &state.config.gateway;
    info!(conn_id = %conn_id, "new WS connection");

    let (mut sink, mut stream) = socket.split();
    let (tx, mut outbound) = mpsc::channel::<String>(gw.send_queue_capacity);
    state.hub.attach(conn_id.clone(), tx);

    let mut conn_state = ConnState::Unauthenticated;

    let idle_timeout = Duration::from_secs(gw.idle_timeout_secs);
    let mut idle = Box::pin(tokio::time::sleep(idle_timeout));

    let mut ping = tokio::time::interval(Duration::from_secs(gw.ping_interval_secs));
    ping.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    ping.tick().await; // first tick fires immediately

    loop {
        tokio::select! {
            msg = stream.next() => {
                idle.as_mut().reset(tokio::time::Instant::now() + idle_timeout);
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        conn_state =
                            message::handle(&conn_id, text.as_str(), conn_state, &state).await;
                        if conn_state == ConnState::Closing {
                            let _ = sink.send(Message::Close(None)).await;
                            break;
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sink.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    // includes messages over max_payload_bytes, rejected by the upgrade config
                    Some(Err(e)) => {
                        debug!(conn_id = %conn_id, error = %e, "WS read error");
                        break;
                    }
                    // pongs only refresh the idle timer; binary frames are not part of the protocol
                    Some(Ok(_)) => {}
                }
            }

            out = outbound.recv() => {
                let Some(payload) = out else { break };
                if sink.send(Message::Text(payload.into())).await.is_err() {
                    break;
                }
            }

            _ = ping.tick() => {
                if sink.send(Message::Ping(Default::default())).await.is_err() {
                    break;
                }
            }

            _ = &mut idle => {
                warn!(conn_id = %conn_id, "idle timeout");
                break;
            }
        }
    }

    state.release(&conn_id);
    info!(conn_id = %conn_id, "WS connection closed");
}
