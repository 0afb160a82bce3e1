/*!
 * Repository layer for database operations.
 *
 * This module provides a high-level API for document and translation
 * storage, abstracting away the SQL details, and implements the
 * `DocumentStore` and `TranslationStore` seams over SQLite.
 */

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use rusqlite::{params, Connection, OptionalExtension};

use super::connection::DatabaseConnection;
use crate::documents::{
    CommitHooks, Document, DocumentCommitted, DocumentStatus, DocumentStore, TranslatedDocument,
    TranslationStore,
};
use crate::errors::TranslationError;
use crate::language_utils::Language;

/// Repository for database operations
#[derive(Clone)]
pub struct Repository {
    /// Database connection
    db: DatabaseConnection,
    /// Listeners notified after each document write commits
    hooks: CommitHooks,
}

impl Repository {
    /// Create a new repository with the given database connection
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            hooks: CommitHooks::new(),
        }
    }

    /// Create a repository with the default database location
    pub fn new_default() -> Result<Self> {
        let db = DatabaseConnection::new_default()?;
        Ok(Self::new(db))
    }

    /// Create a repository with an in-memory database (for testing)
    pub fn new_in_memory() -> Result<Self> {
        let db = DatabaseConnection::new_in_memory()?;
        Ok(Self::new(db))
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    pub fn hooks(&self) -> &CommitHooks {
        &self.hooks
    }

    // =========================================================================
    // Document Operations
    // =========================================================================

    /// Insert or update a document, then notify commit listeners
    pub async fn save_document(&self, document: &Document) -> Result<()> {
        let document = document.clone();
        let event = DocumentCommitted::new(&document.id);

        self.db
            .execute_async(move |conn| {
                conn.execute(
                    r#"
                    INSERT INTO documents (id, title, body, status, native_language, content_hash, updated_at)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                    ON CONFLICT(id) DO UPDATE SET
                        title = excluded.title,
                        body = excluded.body,
                        status = excluded.status,
                        native_language = excluded.native_language,
                        content_hash = excluded.content_hash,
                        updated_at = excluded.updated_at
                    "#,
                    params![
                        document.id,
                        document.title,
                        document.body,
                        document.status.to_string(),
                        document.native_language.code(),
                        document.content_hash(),
                        Utc::now().to_rfc3339(),
                    ],
                )?;
                Ok(())
            })
            .await?;

        debug!("Saved document {}", event.document_id);
        self.hooks.notify(&event);
        Ok(())
    }

    /// Get a document by ID
    pub async fn find_document(&self, document_id: &str) -> Result<Option<Document>> {
        let document_id = document_id.to_string();

        self.db
            .execute_async(move |conn| Self::find_document_sync(conn, &document_id))
            .await
    }

    fn find_document_sync(conn: &Connection, document_id: &str) -> Result<Option<Document>> {
        let row = conn
            .query_row(
                "SELECT id, title, body, status, native_language FROM documents WHERE id = ?1",
                [document_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                },
            )
            .optional()?;

        let Some((id, title, body, status, native_language)) = row else {
            return Ok(None);
        };

        Ok(Some(Document {
            id,
            title,
            body,
            status: status.parse().unwrap_or(DocumentStatus::Draft),
            native_language: Language::parse(&native_language)?,
        }))
    }

    /// IDs of all stored documents
    pub async fn list_document_ids(&self) -> Result<Vec<String>> {
        self.db
            .execute_async(|conn| {
                let mut stmt = conn.prepare("SELECT id FROM documents ORDER BY id")?;
                let ids = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<rusqlite::Result<Vec<String>>>()?;
                Ok(ids)
            })
            .await
    }

    /// Delete a document and, by cascade, its translations
    pub async fn delete_document(&self, document_id: &str) -> Result<()> {
        let document_id = document_id.to_string();

        self.db
            .execute_async(move |conn| {
                conn.execute("DELETE FROM documents WHERE id = ?1", [&document_id])?;
                Ok(())
            })
            .await
    }

    // =========================================================================
    // Translation Operations
    // =========================================================================

    /// Insert or replace the translation row for (document, language)
    pub async fn save_translation(&self, translation: &TranslatedDocument) -> Result<()> {
        let translation = translation.clone();

        self.db
            .execute_async(move |conn| {
                conn.execute(
                    r#"
                    INSERT INTO translated_documents (
                        document_id, language, title, body, short_description, source_hash, updated_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                    ON CONFLICT(document_id, language) DO UPDATE SET
                        title = excluded.title,
                        body = excluded.body,
                        short_description = excluded.short_description,
                        source_hash = excluded.source_hash,
                        updated_at = excluded.updated_at
                    "#,
                    params![
                        translation.document_id,
                        translation.language.code(),
                        translation.title,
                        translation.body,
                        translation.short_description,
                        translation.source_hash,
                        translation.updated_at,
                    ],
                )?;
                Ok(())
            })
            .await
    }

    /// Get the translation of a document into one language
    pub async fn find_translation(&self, document_id: &str, language: Language) -> Result<Option<TranslatedDocument>> {
        let document_id = document_id.to_string();

        self.db
            .execute_async(move |conn| {
                let translation = conn
                    .query_row(
                        r#"
                        SELECT document_id, title, body, short_description, source_hash, updated_at
                        FROM translated_documents WHERE document_id = ?1 AND language = ?2
                        "#,
                        params![document_id, language.code()],
                        |row| {
                            Ok(TranslatedDocument {
                                document_id: row.get(0)?,
                                language,
                                title: row.get(1)?,
                                body: row.get(2)?,
                                short_description: row.get(3)?,
                                source_hash: row.get(4)?,
                                updated_at: row.get(5)?,
                            })
                        },
                    )
                    .optional()?;
                Ok(translation)
            })
            .await
    }

    /// Languages a document has stored translations for
    pub async fn translated_languages(&self, document_id: &str) -> Result<Vec<Language>> {
        let document_id = document_id.to_string();

        self.db
            .execute_async(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT language FROM translated_documents WHERE document_id = ?1 ORDER BY language",
                )?;
                let codes = stmt
                    .query_map([&document_id], |row| row.get::<_, String>(0))?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                codes.iter().map(|code| Language::parse(code)).collect()
            })
            .await
    }
}

#[async_trait]
impl DocumentStore for Repository {
    async fn get_document(&self, id: &str) -> Result<Option<Document>, TranslationError> {
        self.find_document(id)
            .await
            .map_err(|e| TranslationError::PersistenceConflict(format!("{:#}", e)))
    }
}

#[async_trait]
impl TranslationStore for Repository {
    async fn get_translation(
        &self,
        document_id: &str,
        language: Language,
    ) -> Result<Option<TranslatedDocument>, TranslationError> {
        self.find_translation(document_id, language)
            .await
            .map_err(|e| TranslationError::PersistenceConflict(format!("{:#}", e)))
    }

    async fn upsert_translation(&self, translation: &TranslatedDocument) -> Result<(), TranslationError> {
        self.save_translation(translation)
            .await
            .map_err(|e| TranslationError::PersistenceConflict(format!("{:#}", e)))
    }
}
