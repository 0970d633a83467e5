//! Managed-backend function invocation.
//!
//! The backend exposes serverless functions addressed by an action name;
//! every call is an opaque request/response: POST a JSON payload, get a JSON
//! object or an error back. Failures are mapped to one generic user-facing
//! message with the detail kept in the logs — no retry, no backoff, and no
//! timeout beyond the transport's own.

use crate::config::AppConfig;
use anyhow::{Context, Result};
use serde_json::Value;
use std::time::Duration;

const API_TIMEOUT: Duration = Duration::from_secs(15);

/// Generic message shown to the user when a backend call fails.
pub const SERVICE_UNAVAILABLE: &str =
    "Le service est momentanément indisponible. Veuillez réessayer plus tard.";

/// Outcome of a backend call: the response object, or a user-facing error.
pub struct CallOutcome {
    pub data: Option<Value>,
    pub error: Option<String>,
}

pub struct BackendClient {
    agent: ureq::Agent,
    base_url: String,
}

impl BackendClient {
    pub fn new(config: &AppConfig) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(API_TIMEOUT))
            .build()
            .into();
        Self {
            agent,
            base_url: config.backend_url.trim_end_matches('/').to_string(),
        }
    }

    /// Invokes the serverless function `action` with `payload`.
    pub fn invoke(&self, action: &str, payload: &Value) -> CallOutcome {
        match self.invoke_inner(action, payload) {
            Ok(data) => CallOutcome {
                data: Some(data),
                error: None,
            },
            Err(e) => {
                tracing::warn!(action, error = %e, "backend call failed");
                CallOutcome {
                    data: None,
                    error: Some(SERVICE_UNAVAILABLE.to_string()),
                }
            }
        }
    }

    fn invoke_inner(&self, action: &str, payload: &Value) -> Result<Value> {
        let url = self.function_url(action);
        let body = payload.to_string();
        let response: String = self
            .agent
            .post(&url)
            .header("Content-Type", "application/json")
            .send(&body)
            .with_context(|| format!("Failed to invoke backend function '{}'", action))?
            .body_mut()
            .read_to_string()
            .context("Failed to read backend response")?;

        serde_json::from_str(&response).context("Backend returned invalid JSON")
    }

    fn function_url(&self, action: &str) -> String {
        format!("{}/functions/v1/{}", self.base_url, action)
    }

    /// Looks up the member's subscription record.
    pub fn subscription_status(&self, member_id: &str) -> CallOutcome {
        self.invoke(
            "subscription-status",
            &serde_json::json!({ "member_id": member_id }),
        )
    }
}

/// Extracts a displayable plan name from a subscription response.
pub fn plan_label(data: &Value) -> String {
    data.get("plan")
        .and_then(Value::as_str)
        .unwrap_or("inconnu")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_for(url: &str) -> BackendClient {
        let config = AppConfig {
            backend_url: url.to_string(),
            ..AppConfig::default()
        };
        BackendClient::new(&config)
    }

    #[test]
    fn test_function_url_joining() {
        let client = client_for("https://api.mrcenpoche.app/");
        assert_eq!(
            client.function_url("subscription-status"),
            "https://api.mrcenpoche.app/functions/v1/subscription-status"
        );
    }

    #[test]
    fn test_unreachable_backend_maps_to_generic_error() {
        // Nothing listens on this port; the connection is refused locally.
        let client = client_for("http://127.0.0.1:9");
        let outcome = client.invoke("subscription-status", &serde_json::json!({}));

        assert!(outcome.data.is_none());
        assert_eq!(outcome.error.as_deref(), Some(SERVICE_UNAVAILABLE));
    }

    #[test]
    fn test_plan_label() {
        assert_eq!(plan_label(&serde_json::json!({ "plan": "premium" })), "premium");
        assert_eq!(plan_label(&serde_json::json!({})), "inconnu");
    }
}
