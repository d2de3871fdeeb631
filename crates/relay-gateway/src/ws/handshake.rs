use relay_core::{
    channel::WORLD_KEY,
    config::AuthMode,
    error::{RelayError, Result},
    types::{ConnId, UserId},
};
use relay_protocol::{frames::InboundFrame, params::AuthParams, OutboundEvent};
use tracing::{info, warn};

use crate::app::AppState;
use crate::ws::connection::ConnState;

/// Accept an `auth` frame: verify (if configured), register the session in
/// world, and reply `auth_ok` to this connection only.
///
/// Also handles a repeated `auth` from an authenticated connection: the
/// session is overwritten and moved back to world.
pub async fn authenticate(conn: &ConnId, frame: InboundFrame, app: &AppState) -> Result<ConnState> {
    let params: AuthParams = frame
        .into_body()
        .map_err(|e| RelayError::MalformedInput(format!("auth: {e}")))?;

    verify(&params, app).await?;

    let user_id = params.user_id;
    info!(conn_id = %conn, user_id = %UserId::label(user_id.as_ref()), "client authenticated");

    app.registry
        .register_with(conn, user_id, |previous| match previous {
            Some(from) => app.hub.switch(conn, &from, WORLD_KEY),
            None => app.hub.join(conn, WORLD_KEY),
        });

    let ack = OutboundEvent::AuthOk.to_text()?;
    app.hub.send_to(conn, ack);
    Ok(ConnState::Authenticated)
}

/// Consult the credential validator in `validate` mode. No shared lock is held across the await.
async fn verify(params: &AuthParams, app: &AppState) -> Result<()> {
    if app.config.auth.mode == AuthMode::Trust {
        return Ok(());
    }
    let Some(validator) = app.validator.as_ref() else {
        warn!("validate mode without a validator; rejecting auth");
        return Err(RelayError::AuthFailed("no validator configured".to_string()));
    };

    let Some(user_id) = params.user_id.as_ref() else {
        return Err(RelayError::AuthFailed("no user_id to validate".to_string()));
    };
    if validator.validate(user_id, &params.proof()).await {
        Ok(())
    } else {
        Err(RelayError::AuthFailed(format!("credentials rejected for user {user_id}")))
    }
}
