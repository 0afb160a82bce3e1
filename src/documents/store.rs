/*!
 * In-memory document and translation store.
 *
 * Used by tests and by embedders that keep documents elsewhere and only
 * need the pipeline. Writes of a `TranslatedDocument` replace the whole
 * row, so readers never see a half-written translation.
 */

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use super::hooks::{CommitHooks, DocumentCommitted};
use super::models::{Document, TranslatedDocument};
use super::{DocumentStore, TranslationStore};
use crate::errors::TranslationError;
use crate::language_utils::Language;

#[derive(Clone, Default)]
pub struct MemoryStore {
    documents: Arc<RwLock<HashMap<String, Document>>>,
    translations: Arc<RwLock<HashMap<(String, Language), TranslatedDocument>>>,
    hooks: CommitHooks,
    /// Number of successful translation writes
    writes: Arc<AtomicUsize>,
    /// When set, translation writes fail with `PersistenceConflict`
    reject_writes: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hooks fired after every `save_document`
    pub fn hooks(&self) -> &CommitHooks {
        &self.hooks
    }

    /// Insert or replace a document, then notify commit listeners
    pub fn save_document(&self, document: Document) {
        let event = DocumentCommitted::new(&document.id);
        self.documents.write().insert(document.id.clone(), document);
        self.hooks.notify(&event);
    }

    /// Number of translation writes that succeeded
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn set_reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::SeqCst);
    }

    /// All stored translations of one document
    pub fn translations_for(&self, document_id: &str) -> Vec<TranslatedDocument> {
        let mut found: Vec<_> = self
            .translations
            .read()
            .values()
            .filter(|t| t.document_id == document_id)
            .cloned()
            .collect();
        found.sort_by_key(|t| t.language.code());
        found
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get_document(&self, id: &str) -> Result<Option<Document>, TranslationError> {
        Ok(self.documents.read().get(id).cloned())
    }
}

#[async_trait]
impl TranslationStore for MemoryStore {
    async fn get_translation(
        &self,
        document_id: &str,
        language: Language,
    ) -> Result<Option<TranslatedDocument>, TranslationError> {
        Ok(self
            .translations
            .read()
            .get(&(document_id.to_string(), language))
            .cloned())
    }

    async fn upsert_translation(&self, translation: &TranslatedDocument) -> Result<(), TranslationError> {
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(TranslationError::PersistenceConflict(format!(
                "write rejected for {} ({})",
                translation.document_id, translation.language
            )));
        }

        self.translations.write().insert(
            (translation.document_id.clone(), translation.language),
            translation.clone(),
        );
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
