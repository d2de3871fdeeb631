//! Credential validation against the external account service.
//!
//! Only consulted when `auth.mode = "validate"`; in `trust` mode the
//! client-supplied user id is accepted as-is.

use std::time::Duration;

use async_trait::async_trait;
use relay_core::{error::RelayError, types::UserId};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

const USER_AGENT: &str = "relay-gateway";

/// Confirms that `proof` belongs to `user_id`.
///
/// Implementations must never error: anything other than a positive verdict is `false`.
#[async_trait]
pub trait CredentialValidator: Send + Sync {
    async fn validate(&self, user_id: &UserId, proof: &str) -> bool;
}

/// `POST <url>` with form body `user_id=..&csrf=..`, expecting `{"valid": true}`.
pub struct HttpValidator {
    client: reqwest::Client,
    url: String,
}

#[derive(Deserialize)]
struct ValidateResponse {
    #[serde(default)]
    valid: Value,
}

impl HttpValidator {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, RelayError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| RelayError::Config(format!("validator client: {e}")))?;
        Ok(Self { client, url: url.into() })
    }

    async fn check(&self, user_id: &UserId, proof: &str) -> Result<bool, RelayError> {
        let resp = self
            .client
            .post(&self.url)
            .form(&[("user_id", user_id.to_text().as_str()), ("csrf", proof)])
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| RelayError::ValidatorUnreachable(e.to_string()))?;

        let body: ValidateResponse = resp
            .json()
            .await
            .map_err(|e| RelayError::ValidatorUnreachable(format!("bad response body: {e}")))?;

        // only a literal `true` counts
        Ok(body.valid == Value::Bool(true))
    }
}

#[async_trait]
impl CredentialValidator for HttpValidator {
    async fn validate(&self, user_id: &UserId, proof: &str) -> bool {
        match self.check(user_id, proof).await {
            Ok(valid) => {
                debug!(user_id = %user_id, valid, "validator verdict");
                valid
            }
            Err(e) => {
                warn!(user_id = %user_id, code = e.code(), error = %e, "validator call failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::post, Form, Json, Router};
    use std::collections::HashMap;

    /// Serve `handler` on an ephemeral port and return its URL.
    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/validate")
    }

    fn validator(url: String) -> HttpValidator {
        HttpValidator::new(url, Duration::from_secs(2)).unwrap()
    }

    #[tokio::test]
    async fn accepts_only_matching_form() {
        let router = Router::new().route(
            "/validate",
            post(|Form(form): Form<HashMap<String, String>>| async move {
                let ok = form.get("user_id").map(String::as_str) == Some("u-1")
                    && form.get("csrf").map(String::as_str) == Some("good");
                Json(serde_json::json!({ "valid": ok }))
            }),
        );
        let v = validator(serve(router).await);

        assert!(v.validate(&"u-1".into(), "good").await);
        assert!(!v.validate(&"u-1".into(), "bad").await);
        assert!(!v.validate(&"u-2".into(), "good").await);
    }

    #[tokio::test]
    async fn numeric_user_id_is_posted_as_text() {
        let router = Router::new().route(
            "/validate",
            post(|Form(form): Form<HashMap<String, String>>| async move {
                let ok = form.get("user_id").map(String::as_str) == Some("42");
                Json(serde_json::json!({ "valid": ok }))
            }),
        );
        let v = validator(serve(router).await);
        assert!(v.validate(&UserId::from(42_i64), "").await);
    }

    #[tokio::test]
    async fn truthy_but_not_true_is_invalid() {
        let router = Router::new().route(
            "/validate",
            post(|| async { Json(serde_json::json!({ "valid": "true" })) }),
        );
        let v = validator(serve(router).await);
        assert!(!v.validate(&"u-1".into(), "x").await);
    }

    #[tokio::test]
    async fn non_json_body_is_invalid() {
        let router = Router::new().route("/validate", post(|| async { "<html>oops</html>" }));
        let v = validator(serve(router).await);
        assert!(!v.validate(&"u-1".into(), "x").await);
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_invalid() {
        // bind then drop to get a port nobody listens on
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let v = validator(format!("http://{addr}/validate"));
        assert!(!v.validate(&"u-1".into(), "x").await);
    }
}
