use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PORT: u16 = 9609;
pub const DEFAULT_BIND: &str = "0.0.0.0";
pub const MAX_PAYLOAD_BYTES: usize = 64 * 1024; // 64 KB hard cap per text frame
pub const PING_INTERVAL_SECS: u64 = 25;
pub const IDLE_TIMEOUT_SECS: u64 = 60; // close if nothing arrives for this long
pub const SEND_QUEUE_CAPACITY: usize = 256; // per-connection outbound queue
pub const VALIDATOR_TIMEOUT_MS: u64 = 5_000;

/// Top-level config (relay.toml + RELAY_* env overrides + PORT).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelayConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_max_payload")]
    pub max_payload_bytes: usize,
    #[serde(default = "default_ping_interval")]
    pub ping_interval_secs: u64,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_send_queue")]
    pub send_queue_capacity: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind: DEFAULT_BIND.to_string(),
            max_payload_bytes: MAX_PAYLOAD_BYTES,
            ping_interval_secs: PING_INTERVAL_SECS,
            idle_timeout_secs: IDLE_TIMEOUT_SECS,
            send_queue_capacity: SEND_QUEUE_CAPACITY,
        }
    }
}

/// How the `auth` frame is checked before a session is granted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum AuthMode {
    /// Accept the client-supplied user id as-is; the validator is not consulted.
    #[default]
    Trust,
    /// Await the credential validator and close the connection on a negative verdict.
    Validate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub mode: AuthMode,
    /// Endpoint receiving the form-encoded `user_id` + `csrf` POST.
    pub validator_url: Option<String>,
    #[serde(default = "default_validator_timeout")]
    pub validator_timeout_ms: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            mode: AuthMode::Trust,
            validator_url: None,
            validator_timeout_ms: VALIDATOR_TIMEOUT_MS,
        }
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}
fn default_max_payload() -> usize {
    MAX_PAYLOAD_BYTES
}
fn default_ping_interval() -> u64 {
    PING_INTERVAL_SECS
}
fn default_idle_timeout() -> u64 {
    IDLE_TIMEOUT_SECS
}
fn default_send_queue() -> usize {
    SEND_QUEUE_CAPACITY
}
fn default_validator_timeout() -> u64 {
    VALIDATOR_TIMEOUT_MS
}

impl RelayConfig {
    /// Load config from a TOML file, then env overrides.
    ///
    /// Precedence (last wins):
    ///   1. TOML file (explicit path, else ~/.relay/relay.toml)
    ///   2. RELAY_* variables, nested with `__` (RELAY_AUTH__MODE=validate)
    ///   3. PORT
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);
        tracing::debug!(path = %path, "loading relay config");

        let config: RelayConfig = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("RELAY_").split("__"))
            .merge(Env::raw().only(&["PORT"]).map(|_| "gateway.port".into()))
            .extract()
            .map_err(|e| crate::error::RelayError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Reject combinations that cannot work at runtime.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.auth.mode == AuthMode::Validate && self.auth.validator_url.is_none() {
            return Err(crate::error::RelayError::Config(
                "auth.mode = \"validate\" requires auth.validator_url".to_string(),
            ));
        }
        if self.gateway.send_queue_capacity == 0 {
            return Err(crate::error::RelayError::Config(
                "gateway.send_queue_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.relay/relay.toml", home)
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn defaults_without_file() {
        Jail::expect_with(|_jail| {
            let config = RelayConfig::load(Some("missing.toml")).map_err(|e| e.to_string())?;
            assert_eq!(config.gateway.port, DEFAULT_PORT);
            assert_eq!(config.auth.mode, AuthMode::Trust);
            assert_eq!(config.gateway.ping_interval_secs, PING_INTERVAL_SECS);
            Ok(())
        });
    }

    #[test]
    fn file_then_env_then_port() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "relay.toml",
                r#"
                [gateway]
                port = 7000
                bind = "127.0.0.1"

                [auth]
                mode = "validate"
                validator_url = "http://localhost:8080/validate"
                "#,
            )?;
            jail.set_env("RELAY_GATEWAY__IDLE_TIMEOUT_SECS", "90");
            jail.set_env("PORT", "7100");

            let config = RelayConfig::load(Some("relay.toml")).map_err(|e| e.to_string())?;
            assert_eq!(config.gateway.port, 7100);
            assert_eq!(config.gateway.bind, "127.0.0.1");
            assert_eq!(config.gateway.idle_timeout_secs, 90);
            assert_eq!(config.auth.mode, AuthMode::Validate);
            Ok(())
        });
    }

    #[test]
    fn validate_mode_requires_url() {
        let mut config = RelayConfig::default();
        config.auth.mode = AuthMode::Validate;
        assert!(config.validate().is_err());

        config.auth.validator_url = Some("http://localhost/validate".into());
        assert!(config.validate().is_ok());
    }
}
