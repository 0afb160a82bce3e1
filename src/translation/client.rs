/*!
 * Retrying, caching provider client.
 *
 * `ProviderClient::translate` is the single entry point every translated
 * string goes through:
 *
 * 1. cache lookup under `translation:<sha256>:<source>:<target>`;
 * 2. one provider call per attempt, each bounded by the call timeout, with
 *    exponential backoff between attempts on transient failures;
 * 3. when the provider rejects a native-source pair as unsupported, a
 *    two-hop pivot through English;
 * 4. the result is cached before it is returned.
 */

use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;

use crate::app_config::Config;
use crate::cache::{self, CacheService};
use crate::errors::{ProviderError, TranslationError};
use crate::language_utils::Language;
use crate::providers::{Provider, ProviderRequest, AUTO_SOURCE};

/// Retry, timeout and caching settings for the client
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Retries after the first attempt for transient failures
    pub max_retries: u32,
    /// Backoff before the first retry; doubled for each further retry
    pub backoff_base_ms: u64,
    /// Upper bound for a single provider call
    pub timeout: Duration,
    /// Lifetime of cached translations
    pub cache_ttl: Duration,
    /// Language eligible for pivoting
    pub native_language: Language,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_base_ms: 1000,
            timeout: Duration::from_secs(60),
            cache_ttl: Duration::from_secs(24 * 60 * 60),
            native_language: Language::Indonesian,
        }
    }
}

impl ClientOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_retries: config.provider.retry_count,
            backoff_base_ms: config.provider.retry_backoff_ms,
            timeout: config.provider.timeout(),
            cache_ttl: config.cache.translation_ttl(),
            native_language: config.native_language,
        }
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u64 << attempt.saturating_sub(1).min(16);
        Duration::from_millis(self.backoff_base_ms.saturating_mul(factor))
    }
}

/// Provider wrapper adding caching, retries and language pivoting
#[derive(Clone)]
pub struct ProviderClient {
    provider: Arc<dyn Provider>,
    cache: Arc<dyn CacheService>,
    options: ClientOptions,
}

impl ProviderClient {
    pub fn new(provider: Arc<dyn Provider>, cache: Arc<dyn CacheService>, options: ClientOptions) -> Self {
        Self {
            provider,
            cache,
            options,
        }
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Translate `text` from `source` (`None` lets the provider detect it) into `target`.
    ///
    /// Fails with `ProviderUnavailable` once transient retries are exhausted
    /// or a call times out, and with `ProviderRejected` when the provider
    /// refuses the request and no pivot applies.
    pub async fn translate(
        &self,
        text: &str,
        source: Option<Language>,
        target: Language,
    ) -> Result<String, TranslationError> {
        if text.trim().is_empty() || source == Some(target) {
            return Ok(text.to_string());
        }

        match self.translate_direct(text, source, target).await {
            Err(e) if e.is_unsupported_pair() && self.can_pivot(source) => {
                info!(
                    "{} -> {} is unsupported, pivoting through {}",
                    self.options.native_language,
                    target,
                    Language::PIVOT
                );
                let translated = self.pivot(text, target).await?;
                let key = cache::translation_key(text, source_code(source), target.code());
                cache::set_or_ignore(self.cache.as_ref(), &key, &translated, self.options.cache_ttl).await;
                Ok(translated)
            }
            result => result,
        }
    }

    fn can_pivot(&self, source: Option<Language>) -> bool {
        source == Some(self.options.native_language) && self.options.native_language != Language::PIVOT
    }

    /// Native-to-target through English, as two explicit hops.
    ///
    /// For an English target the single fallback is a retry with `auto`.
    async fn pivot(&self, text: &str, target: Language) -> Result<String, TranslationError> {
        if target == Language::PIVOT {
            return self.translate_direct(text, None, target).await;
        }

        let native = self.options.native_language;
        let english = match self.translate_direct(text, Some(native), Language::PIVOT).await {
            Err(e) if e.is_unsupported_pair() => self.translate_direct(text, None, Language::PIVOT).await?,
            result => result?,
        };

        self.translate_direct(&english, Some(Language::PIVOT), target).await
    }

    /// Cache lookup, then a retried provider call, then cache store
    async fn translate_direct(
        &self,
        text: &str,
        source: Option<Language>,
        target: Language,
    ) -> Result<String, TranslationError> {
        let source = source_code(source);
        let key = cache::translation_key(text, source, target.code());

        if let Some(cached) = cache::get_or_miss(self.cache.as_ref(), &key).await {
            debug!("Translation cache hit ({} -> {})", source, target);
            return Ok(cached);
        }

        let translated = self.request_with_retry(text, source, target.code()).await?;
        cache::set_or_ignore(self.cache.as_ref(), &key, &translated, self.options.cache_ttl).await;

        Ok(translated)
    }

    async fn request_with_retry(&self, text: &str, source: &str, target: &str) -> Result<String, TranslationError> {
        let request = ProviderRequest::new(text, source, target);
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;

            let err = match tokio::time::timeout(self.options.timeout, self.provider.complete(&request)).await {
                Ok(Ok(response)) => return Ok(response.translated_text()),
                Ok(Err(e)) => e,
                Err(_) => ProviderError::Timeout(self.options.timeout.as_secs()),
            };

            if err.is_transient() && attempt <= self.options.max_retries {
                let backoff = self.options.backoff(attempt);
                warn!(
                    "{} provider error: {} - attempt {}/{}, retrying in {:?}",
                    self.provider.name(),
                    err,
                    attempt,
                    self.options.max_retries + 1,
                    backoff
                );
                tokio::time::sleep(backoff).await;
                continue;
            }

            return Err(into_translation_error(err, attempt));
        }
    }
}

fn source_code(source: Option<Language>) -> &'static str {
    source.map(|language| language.code()).unwrap_or(AUTO_SOURCE)
}

fn into_translation_error(err: ProviderError, attempts: u32) -> TranslationError {
    match err {
        ProviderError::UnsupportedLanguagePair(reason) => TranslationError::ProviderRejected {
            reason,
            unsupported_pair: true,
        },
        err if err.is_transient() || matches!(err, ProviderError::Timeout(_)) => {
            TranslationError::ProviderUnavailable {
                attempts,
                last_error: err.to_string(),
            }
        }
        err => TranslationError::ProviderRejected {
            reason: err.to_string(),
            unsupported_pair: false,
        },
    }
}
