//! reqwest-backed `ProgressService`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;

use super::{Envelope, OnboardingStatus, ProgressService, ProgressUpdate};
use crate::config::OnboardingConfig;
use crate::error::ApiError;
use crate::identity::IdentityProvider;
use crate::onboarding::payload::StepPayload;

/// HTTP client for the onboarding endpoints.
///
/// Every request carries the identity's current token as a bearer header
/// (when one is available) and is bounded by the configured timeout.
pub struct HttpProgressClient {
    base_url: String,
    timeout: Duration,
    identity: Arc<dyn IdentityProvider>,
    client: reqwest::Client,
}

impl HttpProgressClient {
    pub fn new(
        config: &OnboardingConfig,
        identity: Arc<dyn IdentityProvider>,
    ) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ApiError::Client(e.to_string()))?;
        Ok(Self {
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            timeout: config.request_timeout,
            identity,
            client,
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{endpoint}", self.base_url)
    }

    /// Send a request and return the raw JSON body of a 2xx response.
    ///
    /// A 2xx body shaped like `{"success": false, ...}` is still a failure.
    async fn send(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<serde_json::Value, ApiError> {
        let mut req = self.client.request(method.clone(), self.url(endpoint));
        if let Some(token) = self.identity.get_token().await {
            req = req.bearer_auth(token.expose_secret());
        }
        if let Some(body) = body {
            req = req.json(body);
        }

        tracing::debug!(%method, endpoint, "Onboarding API request");

        let resp = req.send().await.map_err(|e| self.transport_error(endpoint, e))?;
        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| self.transport_error(endpoint, e))?;

        let json: serde_json::Value = if text.trim().is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(serde_json::Value::Null)
        };

        if !status.is_success() {
            return Err(ApiError::Http {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                message: error_message(&json, status),
            });
        }

        if json.get("success").and_then(|v| v.as_bool()) == Some(false) {
            return Err(ApiError::Rejected {
                endpoint: endpoint.to_string(),
                message: error_message(&json, status),
            });
        }

        Ok(json)
    }

    fn transport_error(&self, endpoint: &str, e: reqwest::Error) -> ApiError {
        if e.is_timeout() {
            ApiError::Timeout {
                endpoint: endpoint.to_string(),
                timeout: self.timeout,
            }
        } else {
            ApiError::Transport {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            }
        }
    }
}

/// Decode a body that may or may not be wrapped in the standard envelope.
fn decode<T: DeserializeOwned>(endpoint: &str, json: serde_json::Value) -> Result<T, ApiError> {
    let inner = if json.get("success").is_some() {
        let envelope: Envelope<serde_json::Value> =
            serde_json::from_value(json).map_err(|e| ApiError::Decode {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            })?;
        envelope.data.unwrap_or(serde_json::Value::Null)
    } else {
        json
    };
    serde_json::from_value(inner).map_err(|e| ApiError::Decode {
        endpoint: endpoint.to_string(),
        reason: e.to_string(),
    })
}

fn error_message(json: &serde_json::Value, status: StatusCode) -> String {
    ["error", "detail", "message"]
        .iter()
        .find_map(|k| json.get(*k).and_then(|v| v.as_str()))
        .map(String::from)
        .unwrap_or_else(|| status.to_string())
}

#[async_trait]
impl ProgressService for HttpProgressClient {
    async fn fetch_status(&self) -> Result<OnboardingStatus, ApiError> {
        let endpoint = "/onboarding/status";
        let json = self.send(Method::GET, endpoint, None).await?;
        decode(endpoint, json)
    }

    async fn update_progress(&self, update: &ProgressUpdate) -> Result<(), ApiError> {
        let body = serde_json::to_value(update).map_err(|e| ApiError::Decode {
            endpoint: "/onboarding/progress".to_string(),
            reason: e.to_string(),
        })?;
        self.send(Method::PUT, "/onboarding/progress", Some(&body))
            .await
            .map(|_| ())
    }

    async fn save_step_data(&self, payload: &StepPayload) -> Result<(), ApiError> {
        let method = if payload.is_update() {
            Method::PUT
        } else {
            Method::POST
        };
        self.send(method, payload.endpoint(), Some(&payload.body()))
            .await
            .map(|_| ())
    }

    async fn complete_onboarding(&self) -> Result<(), ApiError> {
        self.send(
            Method::POST,
            "/onboarding/complete",
            Some(&serde_json::json!({})),
        )
        .await
        .map(|_| ())
    }
}
