/*!
 * Common test utilities for the cleansound-translate test suite
 */

use std::sync::Arc;

use cleansound_translate::app_config::Config;
use cleansound_translate::cache::MemoryCache;
use cleansound_translate::documents::{Document, DocumentStatus, MemoryStore};
use cleansound_translate::providers::Provider;
use cleansound_translate::translation::TranslationOrchestrator;


/// Route library logs through the test harness; safe to call repeatedly
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Default configuration with retries that do not slow the suite down
pub fn fast_config() -> Config {
    let mut config = Config::default();
    config.provider.retry_backoff_ms = 1;
    config.provider.timeout_secs = 5;
    config
}

/// A published Indonesian document
pub fn published_document(id: &str, title: &str, body: &str) -> Document {
    Document::new(id, title, body).with_status(DocumentStatus::Published)
}

/// In-memory store, cache and orchestrator sharing one provider
pub struct TestPipeline {
    pub store: MemoryStore,
    pub cache: MemoryCache,
    pub orchestrator: Arc<TranslationOrchestrator>,
}

pub fn test_pipeline(provider: Arc<dyn Provider>) -> TestPipeline {
    test_pipeline_with_config(provider, &fast_config())
}

pub fn test_pipeline_with_config(provider: Arc<dyn Provider>, config: &Config) -> TestPipeline {
    init_logging();

    let store = MemoryStore::new();
    let cache = MemoryCache::new();
    let shared_store = Arc::new(store.clone());
    let orchestrator = TranslationOrchestrator::from_config(
        config,
        provider,
        Arc::new(cache.clone()),
        shared_store.clone(),
        shared_store,
    );

    TestPipeline {
        store,
        cache,
        orchestrator: Arc::new(orchestrator),
    }
}
