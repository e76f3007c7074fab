//! Provider gateway over HTTP
//!
//! The real provider SDK lives behind a small JSON gateway. Every operation
//! is a `POST {endpoint}/v1/{client_ref}/{operation}` with body
//! `{"region": ..., "params": {...}}`. Success returns the operation result
//! as JSON; failure returns the provider status with `{"code", "message"}`.

use crate::config::ProviderConfig;
use backon::{ExponentialBuilder, Retryable};
use oci_sweep_common::{Provider, ProviderError, ServiceClient};
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, warn};

/// Error body returned by the gateway
#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: Option<String>,
    message: Option<String>,
}

/// Build a typed error from a non-success response
pub fn error_from_response(status: u16, body: &str) -> ProviderError {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody { code, message }) => {
            let message = message
                .or_else(|| code.clone())
                .unwrap_or_else(|| format!("HTTP {status}"));
            ProviderError::from_status(status, code, message)
        }
        Err(_) if body.trim().is_empty() => {
            ProviderError::from_status(status, None, format!("HTTP {status}"))
        }
        Err(_) => ProviderError::from_status(status, None, body.trim().to_string()),
    }
}

/// Provider backed by the JSON gateway
#[derive(Debug, Clone)]
pub struct HttpProvider {
    http: reqwest::Client,
    endpoint: String,
    home_region: String,
}

impl HttpProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            home_region: config.region.clone(),
        })
    }
}

impl Provider for HttpProvider {
    type Client = HttpClient;

    fn connect(&self, client_ref: &str, region: &str) -> Result<HttpClient, ProviderError> {
        if client_ref.is_empty() || client_ref.contains('/') {
            return Err(ProviderError::Transport(format!(
                "invalid client reference `{client_ref}`"
            )));
        }
        Ok(HttpClient {
            http: self.http.clone(),
            base_url: format!("{}/v1/{client_ref}", self.endpoint),
            region: region.to_string(),
        })
    }

    fn home_region(&self) -> &str {
        &self.home_region
    }
}

/// One client reference in one region, reached through the gateway
#[derive(Debug, Clone)]
pub struct HttpClient {
    http: reqwest::Client,
    base_url: String,
    region: String,
}

impl HttpClient {
    async fn send(&self, operation: &str, body: &Value) -> Result<Value, ProviderError> {
        let url = format!("{}/{operation}", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            response.json::<Value>().await.map_err(|e| ProviderError::Decode {
                operation: operation.to_string(),
                message: e.to_string(),
            })
        } else {
            let text = response.text().await.unwrap_or_default();
            Err(error_from_response(status.as_u16(), &text))
        }
    }
}

impl ServiceClient for HttpClient {
    async fn invoke(&self, operation: &str, params: Value) -> Result<Value, ProviderError> {
        let body = json!({ "region": self.region, "params": params });
        debug!(url = %self.base_url, operation, region = %self.region, "Invoking");

        // Only connection-level failures are retried here; provider statuses
        // are classified by the caller.
        (|| async { self.send(operation, &body).await })
            .retry(
                ExponentialBuilder::default()
                    .with_min_delay(Duration::from_millis(500))
                    .with_max_delay(Duration::from_secs(5))
                    .with_max_times(3),
            )
            .when(|e| matches!(e, ProviderError::Transport(_)))
            .notify(|e, dur| {
                warn!(operation, delay = ?dur, error = %e, "Gateway unreachable, retrying");
            })
            .await
    }
}
