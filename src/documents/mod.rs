/*!
 * Collaborator interfaces for documents and their translations.
 *
 * The pipeline reads source documents through `DocumentStore` and reads and
 * writes translations through `TranslationStore`. `MemoryStore` implements
 * both in process; `database::Repository` implements both over SQLite.
 */

use async_trait::async_trait;

use crate::errors::TranslationError;
use crate::language_utils::Language;

pub mod hooks;
pub mod models;
pub mod store;

pub use hooks::{CommitHooks, CommitListener, DocumentCommitted};
pub use models::{Document, DocumentStatus, TranslatedDocument};
pub use store::MemoryStore;

/// Read access to source documents
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get_document(&self, id: &str) -> Result<Option<Document>, TranslationError>;
}

/// Translated documents keyed by (document id, language)
#[async_trait]
pub trait TranslationStore: Send + Sync {
    async fn get_translation(
        &self,
        document_id: &str,
        language: Language,
    ) -> Result<Option<TranslatedDocument>, TranslationError>;

    /// Insert or replace the row for (document id, language) atomically
    async fn upsert_translation(&self, translation: &TranslatedDocument) -> Result<(), TranslationError>;
}
