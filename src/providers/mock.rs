/*!
 * Mock provider for testing.
 *
 * This module provides a provider that simulates different behaviors:
 * - `MockProvider::working()` - Always succeeds with `[<target>] <text>`
 * - `MockProvider::intermittent(n)` - Every nth request fails with a 503
 * - `MockProvider::failing()` - Always fails with a 500
 * - `MockProvider::flaky(n)` - The first n requests fail with a 503
 *
 * Unsupported language pairs, per-text failures and random latency can be
 * layered on top of any behavior.
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::Rng;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::{Provider, ProviderRequest, ProviderResponse};
use crate::errors::ProviderError;

/// Behavior mode for the mock provider
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds
    Working,
    /// Fails with a 503 on every nth request
    Intermittent { fail_every: usize },
    /// Fails with a 503 for the first `failures` requests, then succeeds
    Flaky { failures: usize },
    /// Always fails with a 500
    Failing,
    /// Succeeds after a fixed delay
    Slow { delay_ms: u64 },
}

/// Mock provider for testing translation behavior
#[derive(Debug, Clone)]
pub struct MockProvider {
    /// Behavior mode
    behavior: MockBehavior,
    /// Request counter shared between clones
    request_count: Arc<AtomicUsize>,
    /// Every request received, in arrival order
    requests: Arc<Mutex<Vec<ProviderRequest>>>,
    /// (source, target) pairs rejected as unsupported
    unsupported_pairs: Vec<(String, String)>,
    /// Requests whose text contains this are rejected with a 400
    fail_on: Option<String>,
    /// Upper bound of a random delay added to every request
    max_latency_ms: Option<u64>,
    /// Custom response generator (optional)
    custom_response: Option<fn(&ProviderRequest) -> String>,
}

impl MockProvider {
    /// Create a new mock provider with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
            unsupported_pairs: Vec::new(),
            fail_on: None,
            max_latency_ms: None,
            custom_response: None,
        }
    }

    /// Create a working mock provider that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create an intermittently failing mock provider
    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent { fail_every })
    }

    /// Create a provider whose first `failures` requests fail transiently
    pub fn flaky(failures: usize) -> Self {
        Self::new(MockBehavior::Flaky { failures })
    }

    /// Create a failing mock provider that always errors
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Create a provider that answers after `delay_ms`
    pub fn slow(delay_ms: u64) -> Self {
        Self::new(MockBehavior::Slow { delay_ms })
    }

    /// Reject `source -> target` as an unsupported pair
    pub fn with_unsupported_pair(mut self, source: &str, target: &str) -> Self {
        self.unsupported_pairs.push((source.to_string(), target.to_string()));
        self
    }

    /// Reject any request whose text contains `needle`
    pub fn with_failure_on(mut self, needle: &str) -> Self {
        self.fail_on = Some(needle.to_string());
        self
    }

    /// Sleep a random 0..=`max_ms` milliseconds before answering
    pub fn with_random_latency(mut self, max_ms: u64) -> Self {
        self.max_latency_ms = Some(max_ms);
        self
    }

    /// Set a custom response generator
    pub fn with_custom_response(mut self, generator: fn(&ProviderRequest) -> String) -> Self {
        self.custom_response = Some(generator);
        self
    }

    /// Number of requests received so far
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Snapshot of every request received
    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().clone()
    }

    /// Texts of every request received
    pub fn requested_texts(&self) -> Vec<String> {
        self.requests.lock().iter().map(|r| r.q.clone()).collect()
    }

    /// The translation this provider produces for a request
    pub fn render(&self, request: &ProviderRequest) -> String {
        match self.custom_response {
            Some(generator) => generator(request),
            None => format!("[{}] {}", request.target, request.q),
        }
    }

    fn is_unsupported(&self, request: &ProviderRequest) -> bool {
        self.unsupported_pairs
            .iter()
            .any(|(source, target)| *source == request.source && *target == request.target)
    }

    fn respond(&self, request: &ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        Ok(ProviderResponse::new(json!({ "translatedText": self.render(request) })))
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn complete(&self, request: &ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(request.clone());

        if let Some(max_ms) = self.max_latency_ms {
            let delay = rand::rng().random_range(0..=max_ms);
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        if self.is_unsupported(request) {
            return Err(ProviderError::UnsupportedLanguagePair(format!(
                "{} is not available as a target language from {}",
                request.target, request.source
            )));
        }

        if let Some(needle) = &self.fail_on {
            if request.q.contains(needle.as_str()) {
                return Err(ProviderError::ApiError {
                    status_code: 400,
                    message: format!("Simulated rejection for {:?}", request.q),
                });
            }
        }

        match self.behavior {
            MockBehavior::Working => self.respond(request),

            MockBehavior::Intermittent { fail_every } => {
                if fail_every > 0 && count % fail_every == fail_every - 1 {
                    Err(ProviderError::ApiError {
                        message: format!("Simulated intermittent failure (request #{})", count + 1),
                        status_code: 503,
                    })
                } else {
                    self.respond(request)
                }
            }

            MockBehavior::Flaky { failures } => {
                if count < failures {
                    Err(ProviderError::ApiError {
                        message: format!("Simulated transient failure (request #{})", count + 1),
                        status_code: 503,
                    })
                } else {
                    self.respond(request)
                }
            }

            MockBehavior::Failing => Err(ProviderError::ApiError {
                message: "Simulated provider failure".to_string(),
                status_code: 500,
            }),

            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                self.respond(request)
            }
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
