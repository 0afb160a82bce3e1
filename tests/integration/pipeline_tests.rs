/*!
 * Integration tests for document translation through the orchestrator
 */

use async_trait::async_trait;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use cleansound_translate::documents::{Document, TranslationStore};
use cleansound_translate::errors::{ProviderError, TranslationError};
use cleansound_translate::language_utils::Language;
use cleansound_translate::providers::{MockProvider, Provider, ProviderRequest, ProviderResponse};
use cleansound_translate::translation::LanguageOutcome;

use crate::common::{fast_config, published_document, test_pipeline, test_pipeline_with_config};

#[tokio::test]
async fn test_translateDocument_withPublishedDocument_shouldPersistEveryLanguage() {
    let provider = MockProvider::working();
    let pipeline = test_pipeline(Arc::new(provider.clone()));
    pipeline
        .store
        .save_document(published_document("news-1", "Judul", "<p>Halo <b>dunia</b></p>"));

    let report = pipeline.orchestrator.translate_document("news-1").await.unwrap();

    assert_eq!(report.outcome(Language::Indonesian), Some(&LanguageOutcome::Unneeded));
    assert!(matches!(
        report.outcome(Language::English),
        Some(LanguageOutcome::Persisted { failed_segments: 0, .. })
    ));
    assert!(!report.has_failures());

    let english = pipeline
        .store
        .get_translation("news-1", Language::English)
        .await
        .unwrap()
        .expect("English translation should exist");
    assert_eq!(english.title, "[en] Judul");
    assert_eq!(english.body, "<p>[en] Halo <b>[en] dunia</b></p>");
    assert_eq!(english.short_description, "[en] Halo dunia");

    let japanese = pipeline
        .store
        .get_translation("news-1", Language::Japanese)
        .await
        .unwrap()
        .expect("Japanese translation should exist");
    assert_eq!(japanese.title, "[ja] Judul");

    // Native copy-through never reaches the provider
    let native = pipeline
        .store
        .get_translation("news-1", Language::Indonesian)
        .await
        .unwrap()
        .expect("Native copy should exist");
    assert_eq!(native.body, "<p>Halo <b>dunia</b></p>");
    assert_eq!(native.short_description, "Halo dunia");
    assert!(provider.requests().iter().all(|r| r.target != "id"));
}

#[tokio::test]
async fn test_translateDocument_onSpawnedTask_shouldPersistTranslation() {
    let pipeline = test_pipeline(Arc::new(MockProvider::working()));
    pipeline
        .store
        .save_document(published_document("news-9", "Judul", "<p>Halo <b>dunia</b></p>"));

    // The future must be `Send + 'static` to run on the multi-threaded runtime
    let orchestrator = pipeline.orchestrator.clone();
    let handle = tokio::spawn(async move { orchestrator.translate_document("news-9").await });
    let report = handle.await.unwrap().unwrap();

    assert!(!report.has_failures());
    let english = pipeline
        .store
        .get_translation("news-9", Language::English)
        .await
        .unwrap()
        .expect("English translation should exist");
    assert_eq!(english.body, "<p>[en] Halo <b>[en] dunia</b></p>");
}

#[tokio::test]
async fn test_translateDocument_withUnchangedContent_shouldSkipProviderAndWrites() {
    let provider = MockProvider::working();
    let pipeline = test_pipeline(Arc::new(provider.clone()));
    pipeline
        .store
        .save_document(published_document("news-1", "Judul", "<p>Halo dunia</p>"));

    pipeline.orchestrator.translate_document("news-1").await.unwrap();
    let requests_after_first = provider.request_count();
    let writes_after_first = pipeline.store.write_count();

    let report = pipeline.orchestrator.translate_document("news-1").await.unwrap();

    assert_eq!(report.outcome(Language::English), Some(&LanguageOutcome::UpToDate));
    assert_eq!(report.outcome(Language::Japanese), Some(&LanguageOutcome::UpToDate));
    assert_eq!(report.outcome(Language::Indonesian), Some(&LanguageOutcome::Unneeded));
    assert_eq!(provider.request_count(), requests_after_first);
    assert_eq!(pipeline.store.write_count(), writes_after_first);
}

#[tokio::test]
async fn test_translateDocument_withPlainTextSiteSetting_shouldKeepLinksAndSkipWhenUnchanged() {
    let provider = MockProvider::working();
    let pipeline = test_pipeline(Arc::new(provider.clone()));
    let description = "Tonton video terbaru kami\nhttps://youtu.be/abc123XYZ\nSubscribe ya!";
    pipeline
        .store
        .save_document(published_document("site/youtube-description", "", description));

    let report = pipeline
        .orchestrator
        .translate_document("site/youtube-description")
        .await
        .unwrap();
    assert!(!report.has_failures());

    let english = pipeline
        .store
        .get_translation("site/youtube-description", Language::English)
        .await
        .unwrap()
        .expect("English description should exist");
    assert_eq!(
        english.body,
        "[en] Tonton video terbaru kami\nhttps://youtu.be/abc123XYZ\n[en] Subscribe ya!"
    );
    assert_eq!(english.title, "");
    assert!(provider.requested_texts().iter().all(|q| !q.contains("youtu.be")));

    let requests_after_first = provider.request_count();
    let again = pipeline
        .orchestrator
        .translate_document("site/youtube-description")
        .await
        .unwrap();
    assert_eq!(again.outcome(Language::Japanese), Some(&LanguageOutcome::UpToDate));
    assert_eq!(provider.request_count(), requests_after_first);
}

#[tokio::test]
async fn test_translateDocument_withEditedBody_shouldRetranslate() {
    let provider = MockProvider::working();
    let pipeline = test_pipeline(Arc::new(provider.clone()));
    pipeline
        .store
        .save_document(published_document("news-1", "Judul", "<p>Lama</p>"));
    pipeline.orchestrator.translate_document("news-1").await.unwrap();

    pipeline
        .store
        .save_document(published_document("news-1", "Judul", "<p>Baru</p>"));
    let report = pipeline.orchestrator.translate_document("news-1").await.unwrap();

    assert!(matches!(report.outcome(Language::English), Some(LanguageOutcome::Persisted { .. })));
    let english = pipeline
        .store
        .get_translation("news-1", Language::English)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(english.body, "<p>[en] Baru</p>");
    assert_eq!(english.source_hash, report.content_hash);
}

#[tokio::test]
async fn test_translateDocument_withDraft_shouldSkipEverything() {
    let provider = MockProvider::working();
    let pipeline = test_pipeline(Arc::new(provider.clone()));
    pipeline
        .store
        .save_document(Document::new("draft-1", "Judul", "<p>Halo</p>"));

    let report = pipeline.orchestrator.translate_document("draft-1").await.unwrap();

    assert!(report.outcomes.iter().all(|(_, o)| *o == LanguageOutcome::Skipped));
    assert_eq!(provider.request_count(), 0);
    assert_eq!(pipeline.store.write_count(), 0);
}

#[tokio::test]
async fn test_translateDocument_withDraftAndGateDisabled_shouldTranslate() {
    let mut config = fast_config();
    config.pipeline.translate_only_published = false;
    let pipeline = test_pipeline_with_config(Arc::new(MockProvider::working()), &config);
    pipeline
        .store
        .save_document(Document::new("draft-1", "Judul", "<p>Halo</p>"));

    let report = pipeline.orchestrator.translate_document("draft-1").await.unwrap();

    assert!(matches!(report.outcome(Language::English), Some(LanguageOutcome::Persisted { .. })));
}

#[tokio::test]
async fn test_translateDocument_withUnknownId_shouldReturnNotFound() {
    let pipeline = test_pipeline(Arc::new(MockProvider::working()));

    let err = pipeline.orchestrator.translate_document("missing").await.unwrap_err();

    assert!(matches!(err, TranslationError::DocumentNotFound(id) if id == "missing"));
}

#[tokio::test]
async fn test_translateDocument_withOneRejectedSegment_shouldKeepItsOriginalText() {
    let provider = MockProvider::working().with_failure_on("Kedua");
    let pipeline = test_pipeline(Arc::new(provider));
    pipeline.store.save_document(published_document(
        "news-1",
        "Judul",
        "<p>Pertama</p><p>Kedua</p><p>Ketiga</p>",
    ));

    let report = pipeline.orchestrator.translate_document("news-1").await.unwrap();

    // The body paragraph and the description mentioning it both fail
    assert_eq!(
        report.outcome(Language::English),
        Some(&LanguageOutcome::Persisted {
            failed_segments: 2,
            total_segments: 5
        })
    );

    let english = pipeline
        .store
        .get_translation("news-1", Language::English)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(english.body, "<p>[en] Pertama</p><p>Kedua</p><p>[en] Ketiga</p>");
    assert_eq!(english.title, "[en] Judul");
}

#[tokio::test]
async fn test_translateDocument_withProviderDown_shouldPersistOriginalAndFlagIt() {
    let provider = MockProvider::failing();
    let pipeline = test_pipeline(Arc::new(provider));
    pipeline
        .store
        .save_document(published_document("news-1", "Judul", "<p>Halo dunia</p>"));

    let report = pipeline.orchestrator.translate_document("news-1").await.unwrap();

    let outcome = report.outcome(Language::English).unwrap();
    assert!(outcome.is_untranslated(), "Expected untranslated outcome, got {:?}", outcome);
    assert!(report.has_failures());

    let english = pipeline
        .store
        .get_translation("news-1", Language::English)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(english.body, "<p>Halo dunia</p>");
}

#[tokio::test]
async fn test_translateDocument_withRejectedWrite_shouldLeavePreviousRowIntact() {
    let pipeline = test_pipeline(Arc::new(MockProvider::working()));
    pipeline
        .store
        .save_document(published_document("news-1", "Judul", "<p>Lama</p>"));
    pipeline.orchestrator.translate_document("news-1").await.unwrap();

    pipeline
        .store
        .save_document(published_document("news-1", "Judul", "<p>Baru</p>"));
    pipeline.store.set_reject_writes(true);
    let report = pipeline.orchestrator.translate_document("news-1").await.unwrap();

    assert!(matches!(report.outcome(Language::English), Some(LanguageOutcome::Failed { .. })));
    let english = pipeline
        .store
        .get_translation("news-1", Language::English)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(english.body, "<p>[en] Lama</p>");
}

#[tokio::test]
async fn test_translateDocument_withRandomLatency_shouldPreserveSegmentOrder() {
    let provider = MockProvider::working().with_random_latency(15);
    let pipeline = test_pipeline(Arc::new(provider));

    let body: String = (0..25).map(|i| format!("<p>Kalimat nomor {}</p>", i)).collect();
    let expected: String = (0..25).map(|i| format!("<p>[en] Kalimat nomor {}</p>", i)).collect();
    pipeline
        .store
        .save_document(published_document("long-1", "Judul", &body));

    pipeline.orchestrator.translate_document("long-1").await.unwrap();

    let english = pipeline
        .store
        .get_translation("long-1", Language::English)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(english.body, expected);
}

#[tokio::test]
async fn test_translateDocument_withUnsupportedJapanese_shouldMatchEnglishPivot() {
    let provider = MockProvider::working().with_unsupported_pair("id", "ja");
    let pipeline = test_pipeline(Arc::new(provider.clone()));
    pipeline
        .store
        .save_document(published_document("news-1", "Judul", "<p>Halo dunia</p>"));

    pipeline.orchestrator.translate_document("news-1").await.unwrap();

    let english = pipeline
        .store
        .get_translation("news-1", Language::English)
        .await
        .unwrap()
        .unwrap();
    let japanese = pipeline
        .store
        .get_translation("news-1", Language::Japanese)
        .await
        .unwrap()
        .unwrap();

    // Japanese is the English result sent through en -> ja
    let direct = provider.render(&ProviderRequest::new("[en] Judul", "en", "ja"));
    assert_eq!(english.title, "[en] Judul");
    assert_eq!(japanese.title, direct);
    assert_eq!(japanese.body, "<p>[ja] [en] Halo dunia</p>");
}

#[tokio::test]
async fn test_translateDocument_withVideoLinkAndEmbed_shouldKeepThemVerbatim() {
    let provider = MockProvider::working();
    let pipeline = test_pipeline(Arc::new(provider.clone()));
    let body = concat!(
        r#"<p>Tonton https://youtu.be/abc123XYZ sekarang</p>"#,
        r#"<div class="video"><iframe src="https://www.youtube.com/embed/xyz" allowfullscreen></iframe></div>"#,
        r#"<p>Hubungi info@cleansound.id atau +62 812-3456-7890</p>"#,
    );
    pipeline
        .store
        .save_document(published_document("video-1", "Video", body));

    pipeline.orchestrator.translate_document("video-1").await.unwrap();

    let english = pipeline
        .store
        .get_translation("video-1", Language::English)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        english.body,
        concat!(
            r#"<p>[en] Tonton https://youtu.be/abc123XYZ [en] sekarang</p>"#,
            r#"<div class="video"><iframe src="https://www.youtube.com/embed/xyz" allowfullscreen></iframe></div>"#,
            r#"<p>[en] Hubungi info@cleansound.id [en] atau +62 812-3456-7890</p>"#,
        )
    );

    // No request ever carried a link, an address or a shield placeholder
    for text in provider.requested_texts() {
        assert!(!text.contains("youtu"), "Leaked video link: {}", text);
        assert!(!text.contains('@'), "Leaked email address: {}", text);
        assert!(!text.contains("cs-shield"), "Leaked placeholder: {}", text);
    }
}

#[tokio::test]
async fn test_resolveForDisplay_shouldFallBackToNativeContent() {
    let pipeline = test_pipeline(Arc::new(MockProvider::working()));
    pipeline
        .store
        .save_document(published_document("news-1", "Judul", "<p>Halo dunia</p>"));

    let before = pipeline
        .orchestrator
        .resolve_for_display("news-1", Some("en"))
        .await
        .unwrap();
    assert!(before.is_fallback);
    assert_eq!(before.language, Language::Indonesian);
    assert_eq!(before.title, "Judul");

    pipeline.orchestrator.translate_document("news-1").await.unwrap();

    let after = pipeline
        .orchestrator
        .resolve_for_display("news-1", Some("EN"))
        .await
        .unwrap();
    assert!(!after.is_fallback);
    assert_eq!(after.language, Language::English);
    assert_eq!(after.title, "[en] Judul");

    let unknown = pipeline
        .orchestrator
        .resolve_for_display("news-1", Some("fr"))
        .await
        .unwrap();
    assert!(!unknown.is_fallback);
    assert_eq!(unknown.language, Language::Indonesian);
    assert_eq!(unknown.body, "<p>Halo dunia</p>");
}

/// Provider that records how many calls are in flight at once
#[derive(Debug, Default)]
struct ConcurrencyTracker {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

#[async_trait]
impl Provider for ConcurrencyTracker {
    async fn complete(&self, request: &ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(10)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        Ok(ProviderResponse::new(json!({
            "translatedText": format!("[{}] {}", request.target, request.q)
        })))
    }

    fn name(&self) -> &str {
        "concurrency-tracker"
    }
}

#[tokio::test]
async fn test_translateDocument_shouldRespectConcurrencyLimit() {
    let mut config = fast_config();
    config.pipeline.max_concurrent_requests = 3;
    let tracker = Arc::new(ConcurrencyTracker::default());
    let pipeline = test_pipeline_with_config(tracker.clone(), &config);

    let body: String = (0..20).map(|i| format!("<p>Paragraf {}</p>", i)).collect();
    pipeline
        .store
        .save_document(published_document("long-1", "Judul", &body));

    pipeline.orchestrator.translate_document("long-1").await.unwrap();

    let peak = tracker.peak.load(Ordering::SeqCst);
    assert!(peak >= 2, "Segments should run concurrently, peak was {}", peak);
    assert!(peak <= 3, "Concurrency limit exceeded, peak was {}", peak);
}
