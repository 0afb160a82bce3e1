/*!
 * Integration tests for commit-triggered background translation
 */

use std::sync::Arc;

use cleansound_translate::documents::{CommitListener, Document, DocumentCommitted, TranslationStore};
use cleansound_translate::errors::TranslationError;
use cleansound_translate::language_utils::Language;
use cleansound_translate::providers::MockProvider;
use cleansound_translate::translation::{LanguageOutcome, QueueOptions, TranslationQueue};

use crate::common::{published_document, test_pipeline};

#[tokio::test]
async fn test_commit_withRegisteredQueue_shouldTranslateInBackground() {
    let pipeline = test_pipeline(Arc::new(MockProvider::working()));
    let queue = Arc::new(TranslationQueue::start(pipeline.orchestrator.clone()));
    pipeline.store.hooks().register(queue.clone());

    pipeline
        .store
        .save_document(published_document("news-1", "Judul", "<p>Halo</p>"));
    queue.shutdown().await;

    let results = queue.take_results();
    assert_eq!(results.len(), 1);
    let report = results[0].as_ref().expect("Job should succeed");
    assert_eq!(report.document_id, "news-1");

    let english = pipeline
        .store
        .get_translation("news-1", Language::English)
        .await
        .unwrap()
        .expect("Translation should be persisted by the worker");
    assert_eq!(english.body, "<p>[en] Halo</p>");
}

#[tokio::test]
async fn test_requestTranslation_withJobAlreadyWaiting_shouldCoalesce() {
    let pipeline = test_pipeline(Arc::new(MockProvider::slow(100)));
    pipeline
        .store
        .save_document(published_document("slow-1", "Lambat", "<p>Satu</p>"));
    pipeline
        .store
        .save_document(published_document("news-1", "Judul", "<p>Halo</p>"));
    let single_worker = QueueOptions {
        workers: 1,
        ..QueueOptions::default()
    };
    let queue = TranslationQueue::start_with(pipeline.orchestrator.clone(), single_worker);

    // The worker is busy with slow-1 while news-1 waits
    assert!(queue.request_translation("slow-1"));
    assert!(queue.request_translation("news-1"));
    assert!(!queue.request_translation("news-1"));
    assert!(!queue.request_translation("news-1"));

    queue.shutdown().await;

    let ids: Vec<String> = queue
        .take_results()
        .into_iter()
        .map(|result| result.unwrap().document_id)
        .collect();
    assert_eq!(ids, vec!["slow-1".to_string(), "news-1".to_string()]);
    assert_eq!(queue.pending_count(), 0);
}

#[tokio::test]
async fn test_shutdown_shouldFinishQueuedJobsAndRejectNewOnes() {
    let pipeline = test_pipeline(Arc::new(MockProvider::working()));
    for i in 0..5 {
        pipeline.store.save_document(published_document(
            &format!("news-{}", i),
            "Judul",
            &format!("<p>Berita {}</p>", i),
        ));
    }
    let queue = TranslationQueue::start(pipeline.orchestrator.clone());

    for i in 0..5 {
        queue.request_translation(&format!("news-{}", i));
    }
    queue.shutdown().await;

    assert_eq!(queue.take_results().len(), 5);
    assert!(!queue.request_translation("news-0"));

    // A second shutdown is harmless
    queue.shutdown().await;
}

#[tokio::test]
async fn test_worker_withMissingDocument_shouldReportNotFoundAndContinue() {
    let pipeline = test_pipeline(Arc::new(MockProvider::working()));
    pipeline
        .store
        .save_document(published_document("news-1", "Judul", "<p>Halo</p>"));
    let queue = TranslationQueue::start(pipeline.orchestrator.clone());

    queue.on_commit(&DocumentCommitted::new("ghost"));
    queue.on_commit(&DocumentCommitted::new("news-1"));
    queue.shutdown().await;

    let results = queue.take_results();
    assert_eq!(results.len(), 2);
    assert!(results
        .iter()
        .any(|r| matches!(r, Err(TranslationError::DocumentNotFound(id)) if id == "ghost")));
    assert!(results
        .iter()
        .any(|r| matches!(r, Ok(report) if report.document_id == "news-1")));
}

#[tokio::test]
async fn test_worker_withUndrainedResults_shouldKeepOnlyTheNewest() {
    let pipeline = test_pipeline(Arc::new(MockProvider::working()));
    for i in 0..6 {
        pipeline.store.save_document(published_document(
            &format!("news-{}", i),
            "Judul",
            &format!("<p>Berita {}</p>", i),
        ));
    }
    let options = QueueOptions {
        workers: 1,
        result_capacity: 2,
    };
    let queue = TranslationQueue::start_with(pipeline.orchestrator.clone(), options);

    for i in 0..6 {
        assert!(queue.request_translation(&format!("news-{}", i)));
    }
    queue.shutdown().await;

    let ids: Vec<String> = queue
        .take_results()
        .into_iter()
        .map(|result| result.unwrap().document_id)
        .collect();
    assert_eq!(ids, vec!["news-4".to_string(), "news-5".to_string()]);
    assert!(queue.take_results().is_empty());

    // Every job still ran even though its result was dropped
    for i in 0..6 {
        let stored = pipeline
            .store
            .get_translation(&format!("news-{}", i), Language::English)
            .await
            .unwrap();
        assert!(stored.is_some(), "news-{} was not translated", i);
    }
}

#[tokio::test]
async fn test_workerPool_withManyDocuments_shouldTranslateEachOnce() {
    let provider = MockProvider::working();
    let pipeline = test_pipeline(Arc::new(provider.clone()));
    for i in 0..12 {
        pipeline.store.save_document(published_document(
            &format!("news-{}", i),
            "Judul",
            &format!("<p>Berita nomor {}</p>", i),
        ));
    }
    let options = QueueOptions {
        workers: 3,
        ..QueueOptions::default()
    };
    let queue = TranslationQueue::start_with(pipeline.orchestrator.clone(), options);

    for i in 0..12 {
        queue.request_translation(&format!("news-{}", i));
    }
    queue.shutdown().await;

    let mut ids: Vec<String> = queue
        .take_results()
        .into_iter()
        .map(|result| result.unwrap().document_id)
        .collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 12);

    for i in 0..12 {
        let english = pipeline
            .store
            .get_translation(&format!("news-{}", i), Language::English)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(english.body, format!("<p>[en] Berita nomor {}</p>", i));
    }
}

#[tokio::test]
async fn test_commit_withEditWhileQueued_shouldTranslateLatestContent() {
    let pipeline = test_pipeline(Arc::new(MockProvider::slow(50)));
    pipeline
        .store
        .save_document(published_document("slow-1", "Lambat", "<p>Satu</p>"));
    let queue = Arc::new(TranslationQueue::start(pipeline.orchestrator.clone()));
    pipeline.store.hooks().register(queue.clone());

    // Both saves land while the worker is still on slow-1
    queue.request_translation("slow-1");
    pipeline
        .store
        .save_document(published_document("news-1", "Judul", "<p>Versi satu</p>"));
    pipeline
        .store
        .save_document(published_document("news-1", "Judul", "<p>Versi dua</p>"));
    queue.shutdown().await;

    let english = pipeline
        .store
        .get_translation("news-1", Language::English)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(english.body, "<p>[en] Versi dua</p>");
}

#[tokio::test]
async fn test_commit_withDraftDocument_shouldReportSkipped() {
    let pipeline = test_pipeline(Arc::new(MockProvider::working()));
    let queue = Arc::new(TranslationQueue::start(pipeline.orchestrator.clone()));
    pipeline.store.hooks().register(queue.clone());

    pipeline
        .store
        .save_document(Document::new("draft-1", "Judul", "<p>Halo</p>"));
    queue.shutdown().await;

    let results = queue.take_results();
    let report = results[0].as_ref().unwrap();
    assert_eq!(report.outcome(Language::English), Some(&LanguageOutcome::Skipped));
    assert_eq!(pipeline.store.write_count(), 0);
}
