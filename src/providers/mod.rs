/*!
 * Translation provider implementations.
 *
 * This module contains clients for the external translation service:
 * - `HttpProvider`: JSON-over-HTTP client for a LibreTranslate-style endpoint
 * - `MockProvider`: in-process provider with scriptable failures, for tests
 *
 * A provider performs exactly one attempt per call. Retrying, caching and
 * language pivoting live in `translation::client::ProviderClient`.
 */

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::fmt::Debug;

use crate::errors::ProviderError;
use crate::language_utils::normalize_provider_code;

/// Source language sent when the provider should detect it
pub const AUTO_SOURCE: &str = "auto";

/// Request payload for the provider endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderRequest {
    /// Text to translate
    pub q: String,
    /// Source language code, or `auto`
    pub source: String,
    /// Target language code
    pub target: String,
    /// Always `html`, so the provider leaves placeholder tags alone
    pub format: String,
    /// Deployment API key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl ProviderRequest {
    /// Create an HTML-format request.
    ///
    /// Language codes go through the provider mapping, so an alias such as
    /// `jp` is always sent as `ja`.
    pub fn new(q: impl Into<String>, source: &str, target: &str) -> Self {
        Self {
            q: q.into(),
            source: normalize_provider_code(source),
            target: normalize_provider_code(target),
            format: "html".to_string(),
            api_key: None,
        }
    }

    /// Attach an API key
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }
}

/// Raw JSON body returned by the provider
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderResponse {
    pub body: Value,
}

impl ProviderResponse {
    pub fn new(body: Value) -> Self {
        Self { body }
    }

    /// Extract the translated string.
    ///
    /// Checks `translatedText`, `translation` and `translated` in that order.
    /// When none is present the whole body is stringified.
    pub fn translated_text(&self) -> String {
        ["translatedText", "translation", "translated"]
            .iter()
            .find_map(|field| self.body.get(field))
            .map(|value| match value {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            })
            .unwrap_or_else(|| match &self.body {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            })
    }
}

/// Common trait for all translation providers
///
/// Implementations make a single attempt and classify the failure, so the
/// caller can decide whether to retry or pivot.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// Send one translation request
    async fn complete(&self, request: &ProviderRequest) -> Result<ProviderResponse, ProviderError>;

    /// Short name used in logs
    fn name(&self) -> &str;
}

/// Whether a provider error message reports an unsupported language pair
pub fn is_unsupported_pair_message(message: &str) -> bool {
    let message = message.to_lowercase();
    message.contains("not available as a source language")
        || message.contains("not available as a target language")
        || message.contains("not supported")
        || message.contains("unsupported language")
}

pub mod http;
pub mod mock;

pub use http::HttpProvider;
pub use mock::MockProvider;
