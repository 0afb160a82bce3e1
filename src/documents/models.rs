/*!
 * Document and translated-document models.
 */

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::language_utils::Language;

/// Publication status of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentStatus::Draft => write!(f, "draft"),
            DocumentStatus::Published => write!(f, "published"),
            DocumentStatus::Archived => write!(f, "archived"),
        }
    }
}

impl std::str::FromStr for DocumentStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "draft" => Ok(DocumentStatus::Draft),
            "published" => Ok(DocumentStatus::Published),
            "archived" => Ok(DocumentStatus::Archived),
            _ => Err(anyhow::anyhow!("Invalid document status: {}", s)),
        }
    }
}

/// A source document as authored in its native language
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub title: String,
    /// Markup body
    pub body: String,
    pub status: DocumentStatus,
    pub native_language: Language,
}

impl Document {
    /// Create a draft document in Indonesian
    pub fn new(id: impl Into<String>, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            body: body.into(),
            status: DocumentStatus::Draft,
            native_language: Language::Indonesian,
        }
    }

    pub fn with_status(mut self, status: DocumentStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_native_language(mut self, language: Language) -> Self {
        self.native_language = language;
        self
    }

    pub fn is_published(&self) -> bool {
        self.status == DocumentStatus::Published
    }

    /// Hex SHA-256 over the title and body.
    ///
    /// The title is length-prefixed so moving text between title and body
    /// changes the hash.
    pub fn content_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update((self.title.len() as u64).to_le_bytes());
        hasher.update(self.title.as_bytes());
        hasher.update(self.body.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

/// A stored translation of a document into one language
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslatedDocument {
    pub document_id: String,
    pub language: Language,
    pub title: String,
    pub body: String,
    pub short_description: String,
    /// `Document::content_hash` of the source this was translated from
    pub source_hash: String,
    /// RFC 3339 timestamp of the last write
    pub updated_at: String,
}

impl TranslatedDocument {
    pub fn new(
        document_id: impl Into<String>,
        language: Language,
        title: impl Into<String>,
        body: impl Into<String>,
        short_description: impl Into<String>,
        source_hash: impl Into<String>,
    ) -> Self {
        Self {
            document_id: document_id.into(),
            language,
            title: title.into(),
            body: body.into(),
            short_description: short_description.into(),
            source_hash: source_hash.into(),
            updated_at: Utc::now().to_rfc3339(),
        }
    }

    /// Whether this translation was made from a different version of `document`
    pub fn is_stale(&self, document: &Document) -> bool {
        self.source_hash != document.content_hash()
    }
}
