use async_trait::async_trait;
use log::{debug, error};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use url::Url;

use super::{is_unsupported_pair_message, Provider, ProviderRequest, ProviderResponse};
use crate::app_config::ProviderConfig;
use crate::errors::ProviderError;

/// HTTP client for a LibreTranslate-compatible translation endpoint
#[derive(Debug, Clone)]
pub struct HttpProvider {
    /// Full URL requests are POSTed to
    endpoint: Url,
    /// Key added to every request that does not carry one
    api_key: Option<String>,
    /// Per-request timeout
    timeout: Duration,
    /// HTTP client for making requests
    client: Client,
}

impl HttpProvider {
    /// Create a client for `endpoint`, which must be an absolute http(s) URL
    pub fn new(endpoint: &str, api_key: Option<String>, timeout: Duration) -> Result<Self, ProviderError> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| ProviderError::RequestFailed(format!("Invalid provider endpoint {}: {}", endpoint, e)))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(ProviderError::RequestFailed(format!(
                "Provider endpoint must use http or https: {}",
                endpoint
            )));
        }

        let client = Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(20)
            .tcp_keepalive(Duration::from_secs(60))
            .build()
            .map_err(|e| ProviderError::ConnectionError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            endpoint,
            api_key,
            timeout,
            client,
        })
    }

    /// Create a client from the provider section of the configuration
    pub fn from_config(config: &ProviderConfig) -> Result<Self, ProviderError> {
        Self::new(&config.endpoint, config.api_key(), config.timeout())
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn classify_send_error(&self, e: reqwest::Error) -> ProviderError {
        if e.is_timeout() {
            ProviderError::Timeout(self.timeout.as_secs())
        } else {
            ProviderError::ConnectionError(format!("Failed to send request to {}: {}", self.endpoint, e))
        }
    }
}

/// Pull a human-readable message out of an error body
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("error")
                .or_else(|| value.get("message"))
                .and_then(|v| v.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}

fn classify_status(status: StatusCode, body: &str) -> ProviderError {
    let message = error_message(body);

    if status == StatusCode::TOO_MANY_REQUESTS {
        return ProviderError::RateLimitExceeded(message);
    }
    if status.is_client_error() && is_unsupported_pair_message(&message) {
        return ProviderError::UnsupportedLanguagePair(message);
    }

    ProviderError::ApiError {
        status_code: status.as_u16(),
        message,
    }
}

#[async_trait]
impl Provider for HttpProvider {
    async fn complete(&self, request: &ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let payload = request
            .clone()
            .with_api_key(request.api_key.clone().or_else(|| self.api_key.clone()));

        debug!(
            "POST {} ({} -> {}, {} chars)",
            self.endpoint,
            payload.source,
            payload.target,
            payload.q.chars().count()
        );

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&payload)
            .send()
            .await
            .map_err(|e| self.classify_send_error(e))?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .map_err(|e| self.classify_send_error(e))?;

        if !status.is_success() {
            let err = classify_status(status, &response_text);
            error!("Translation provider error ({}): {}", status, err);
            return Err(err);
        }

        let body: Value = serde_json::from_str(&response_text).map_err(|e| {
            let preview: String = response_text.chars().take(500).collect();
            error!("Failed to parse provider response: {}. Raw response: {}", e, preview);
            ProviderError::ParseError(e.to_string())
        })?;

        // Some deployments answer 200 with an error object
        if let Some(message) = body.get("error").and_then(|v| v.as_str()) {
            if is_unsupported_pair_message(message) {
                return Err(ProviderError::UnsupportedLanguagePair(message.to_string()));
            }
            return Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message: message.to_string(),
            });
        }

        Ok(ProviderResponse::new(body))
    }

    fn name(&self) -> &str {
        "http"
    }
}
