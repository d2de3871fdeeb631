use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use relay_core::config::{AuthMode, RelayConfig};
use tracing::info;

mod app;
mod auth;
mod http;
mod ws;

/// Real-time fan-out relay for chat and room events.
#[derive(Debug, Parser)]
#[command(name = "relay-gateway", version)]
struct Args {
    /// Path to relay.toml (falls back to RELAY_CONFIG, then ~/.relay/relay.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// Listen port; overrides config and PORT
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "relay_gateway=info,tower_http=debug".into()),
        )
        .init();

    let args = Args::parse();

    // explicit path > RELAY_CONFIG env > ~/.relay/relay.toml
    let config_path = args.config.or_else(|| std::env::var("RELAY_CONFIG").ok());
    let mut config = RelayConfig::load(config_path.as_deref())?;
    if let Some(port) = args.port {
        config.gateway.port = port;
    }

    let validator = build_validator(&config)?;
    info!(mode = ?config.auth.mode, "auth configured");

    let addr: SocketAddr = format!("{}:{}", config.gateway.bind, config.gateway.port).parse()?;
    let state = Arc::new(app::AppState::new(config, validator));
    let router = app::build_router(state);

    info!("relay gateway listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("relay gateway stopped");
    Ok(())
}

/// The HTTP validator exists only in `validate` mode; `load` has already
/// rejected that mode without a URL.
fn build_validator(
    config: &RelayConfig,
) -> anyhow::Result<Option<Arc<dyn auth::CredentialValidator>>> {
    if config.auth.mode != AuthMode::Validate {
        return Ok(None);
    }
    let Some(url) = config.auth.validator_url.as_deref() else {
        anyhow::bail!("auth.mode = \"validate\" requires auth.validator_url");
    };
    let timeout = Duration::from_millis(config.auth.validator_timeout_ms);
    let validator = auth::HttpValidator::new(url, timeout)?;
    info!(url = %url, "credential validator enabled");
    Ok(Some(Arc::new(validator)))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
