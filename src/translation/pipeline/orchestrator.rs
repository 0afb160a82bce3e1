/*!
 * Document translation orchestrator.
 *
 * For every (document, language) pair the orchestrator decides between:
 * - **Unneeded**: the language is the document's own; a copy-through record
 *   is kept so readers have a uniform lookup, with no provider calls.
 * - **UpToDate**: the stored translation was made from the current content hash.
 * - **Skipped**: the document is not published.
 * - **Translating**, ending in **Persisted** or **Failed**. A failed unit
 *   leaves the stored translation exactly as it was.
 *
 * Languages run concurrently, and within one language the title, body and
 * short description are translated concurrently. All provider calls share
 * the segment translator's worker budget.
 */

use futures::future::join_all;
use log::{error, info, warn};
use std::fmt;
use std::sync::Arc;

use crate::app_config::Config;
use crate::cache::CacheService;
use crate::documents::{Document, DocumentStore, TranslatedDocument, TranslationStore};
use crate::errors::TranslationError;
use crate::language_utils::Language;
use crate::markup::shield::EmbedShielder;
use crate::markup::text::short_description;
use crate::providers::Provider;
use crate::translation::client::{ClientOptions, ProviderClient};
use crate::translation::html::HtmlTranslator;
use crate::translation::segments::SegmentTranslator;

/// Orchestrator settings
#[derive(Debug, Clone)]
pub struct OrchestratorOptions {
    /// Languages translations are maintained for, besides the native one
    pub target_languages: Vec<Language>,
    /// Maximum characters of a short description
    pub description_max_chars: usize,
    /// Skip documents that are not published
    pub translate_only_published: bool,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            target_languages: vec![Language::English, Language::Japanese],
            description_max_chars: 150,
            translate_only_published: true,
        }
    }
}

impl OrchestratorOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            target_languages: config.target_languages.clone(),
            description_max_chars: config.pipeline.description_max_chars,
            translate_only_published: config.pipeline.translate_only_published,
        }
    }
}

/// What happened to one language of a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LanguageOutcome {
    /// Native language; copy-through record only
    Unneeded,
    /// Stored translation already matches the content hash
    UpToDate,
    /// Document is not published
    Skipped,
    /// Translation written; `failed_segments` of `total_segments` kept their original text
    Persisted { failed_segments: usize, total_segments: usize },
    /// Nothing written
    Failed { reason: String },
}

impl LanguageOutcome {
    /// Persisted, but no segment was actually translated
    pub fn is_untranslated(&self) -> bool {
        matches!(
            self,
            Self::Persisted { failed_segments, total_segments }
                if *total_segments > 0 && failed_segments == total_segments
        )
    }
}

impl fmt::Display for LanguageOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unneeded => write!(f, "unneeded"),
            Self::UpToDate => write!(f, "up to date"),
            Self::Skipped => write!(f, "skipped"),
            Self::Persisted { failed_segments: 0, .. } => write!(f, "persisted"),
            Self::Persisted { failed_segments, total_segments } => write!(
                f,
                "persisted ({} of {} segments untranslated)",
                failed_segments, total_segments
            ),
            Self::Failed { reason } => write!(f, "failed: {}", reason),
        }
    }
}

/// Result of one orchestrator run
#[derive(Debug, Clone)]
pub struct DocumentReport {
    pub document_id: String,
    pub content_hash: String,
    /// One entry per language, native first
    pub outcomes: Vec<(Language, LanguageOutcome)>,
}

impl DocumentReport {
    pub fn outcome(&self, language: Language) -> Option<&LanguageOutcome> {
        self.outcomes
            .iter()
            .find(|(candidate, _)| *candidate == language)
            .map(|(_, outcome)| outcome)
    }

    pub fn has_failures(&self) -> bool {
        self.outcomes
            .iter()
            .any(|(_, outcome)| matches!(outcome, LanguageOutcome::Failed { .. }) || outcome.is_untranslated())
    }
}

/// A document ready to render in one language
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayDocument {
    pub document_id: String,
    pub language: Language,
    pub title: String,
    pub body: String,
    pub short_description: String,
    /// Native content shown because no translation exists
    pub is_fallback: bool,
}

/// Coordinates shielding, segment translation and persistence for documents
#[derive(Clone)]
pub struct TranslationOrchestrator {
    documents: Arc<dyn DocumentStore>,
    translations: Arc<dyn TranslationStore>,
    translator: HtmlTranslator,
    options: OrchestratorOptions,
}

impl TranslationOrchestrator {
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        translations: Arc<dyn TranslationStore>,
        translator: HtmlTranslator,
        options: OrchestratorOptions,
    ) -> Self {
        Self {
            documents,
            translations,
            translator,
            options,
        }
    }

    /// Wire a provider, cache and stores together using the configured limits
    pub fn from_config(
        config: &Config,
        provider: Arc<dyn Provider>,
        cache: Arc<dyn CacheService>,
        documents: Arc<dyn DocumentStore>,
        translations: Arc<dyn TranslationStore>,
    ) -> Self {
        let client = Arc::new(ProviderClient::new(
            provider,
            cache.clone(),
            ClientOptions::from_config(config),
        ));
        let translator = HtmlTranslator::new(
            EmbedShielder::new(cache, config.cache.shield_ttl()),
            SegmentTranslator::new(client, config.pipeline.max_concurrent_requests),
        );

        Self::new(documents, translations, translator, OrchestratorOptions::from_config(config))
    }

    pub fn translator(&self) -> &HtmlTranslator {
        &self.translator
    }

    pub fn options(&self) -> &OrchestratorOptions {
        &self.options
    }

    /// Bring every language of a document up to date with its current content
    pub async fn translate_document(&self, document_id: &str) -> Result<DocumentReport, TranslationError> {
        let document = self
            .documents
            .get_document(document_id)
            .await?
            .ok_or_else(|| TranslationError::DocumentNotFound(document_id.to_string()))?;

        let content_hash = document.content_hash();
        let languages = self.languages_for(&document);

        if self.options.translate_only_published && !document.is_published() {
            info!("Document {} is {}, skipping translation", document.id, document.status);
            return Ok(DocumentReport {
                document_id: document.id,
                content_hash,
                outcomes: languages.into_iter().map(|l| (l, LanguageOutcome::Skipped)).collect(),
            });
        }

        let outcomes = join_all(
            languages
                .iter()
                .map(|&language| self.process_language(&document, &content_hash, language)),
        )
        .await;

        Ok(DocumentReport {
            document_id: document.id.clone(),
            content_hash,
            outcomes: languages.into_iter().zip(outcomes).collect(),
        })
    }

    /// Stored translation, if any
    pub async fn get_translated_document(
        &self,
        document_id: &str,
        language: Language,
    ) -> Result<Option<TranslatedDocument>, TranslationError> {
        self.translations.get_translation(document_id, language).await
    }

    /// Content to render for `language`, falling back to the native content.
    ///
    /// Unknown or missing language codes resolve to the document's native
    /// language. The result is never blank because of a missing translation.
    pub async fn resolve_for_display(
        &self,
        document_id: &str,
        language: Option<&str>,
    ) -> Result<DisplayDocument, TranslationError> {
        let document = self
            .documents
            .get_document(document_id)
            .await?
            .ok_or_else(|| TranslationError::DocumentNotFound(document_id.to_string()))?;

        let language = Language::normalize_or(language, document.native_language);

        if language != document.native_language {
            match self.translations.get_translation(document_id, language).await {
                Ok(Some(translated)) => {
                    return Ok(DisplayDocument {
                        document_id: translated.document_id,
                        language,
                        title: translated.title,
                        body: translated.body,
                        short_description: translated.short_description,
                        is_fallback: false,
                    });
                }
                Ok(None) => {}
                Err(e) => warn!("Could not read {} translation of {}: {}", language, document_id, e),
            }
        }

        let is_fallback = language != document.native_language;
        Ok(DisplayDocument {
            short_description: short_description(&document.body, self.options.description_max_chars),
            document_id: document.id,
            language: if is_fallback { document.native_language } else { language },
            title: document.title,
            body: document.body,
            is_fallback,
        })
    }

    fn languages_for(&self, document: &Document) -> Vec<Language> {
        let mut languages = vec![document.native_language];
        for &language in &self.options.target_languages {
            if !languages.contains(&language) {
                languages.push(language);
            }
        }
        languages
    }

    async fn process_language(&self, document: &Document, content_hash: &str, language: Language) -> LanguageOutcome {
        match self.translations.get_translation(&document.id, language).await {
            Ok(Some(existing)) if existing.source_hash == content_hash => {
                info!("{} ({}) is up to date", document.id, language);
                return if language == document.native_language {
                    LanguageOutcome::Unneeded
                } else {
                    LanguageOutcome::UpToDate
                };
            }
            Ok(_) => {}
            Err(e) => warn!("Could not read {} translation of {}, translating anyway: {}", language, document.id, e),
        }

        if language == document.native_language {
            return self.copy_through(document, content_hash).await;
        }

        info!("Translating {} into {}", document.id, language);
        match self.translate_unit(document, content_hash, language).await {
            Ok(outcome) => {
                info!("{} ({}): {}", document.id, language, outcome);
                outcome
            }
            Err(e) => {
                error!("Translation of {} into {} failed: {}", document.id, language, e);
                LanguageOutcome::Failed { reason: e.to_string() }
            }
        }
    }

    async fn copy_through(&self, document: &Document, content_hash: &str) -> LanguageOutcome {
        let record = TranslatedDocument::new(
            &document.id,
            document.native_language,
            &document.title,
            &document.body,
            short_description(&document.body, self.options.description_max_chars),
            content_hash,
        );

        match self.translations.upsert_translation(&record).await {
            Ok(()) => LanguageOutcome::Unneeded,
            Err(e) => {
                error!("Could not store native copy of {}: {}", document.id, e);
                LanguageOutcome::Failed { reason: e.to_string() }
            }
        }
    }

    async fn translate_unit(
        &self,
        document: &Document,
        content_hash: &str,
        language: Language,
    ) -> Result<LanguageOutcome, TranslationError> {
        let source = Some(document.native_language);
        let description = short_description(&document.body, self.options.description_max_chars);

        let (title, body, description) = tokio::join!(
            self.translator.translate_plain(&document.title, source, language),
            self.translator.translate_html(&document.body, source, language),
            self.translator.translate_plain(&description, source, language),
        );
        let (title, body, description) = (title?, body?, description?);

        let failed_segments = title.failures.len() + body.failures.len() + description.failures.len();
        let total_segments = title.translatable + body.translatable + description.translatable;

        let record = TranslatedDocument::new(
            &document.id,
            language,
            title.text,
            body.text,
            description.text,
            content_hash,
        );
        self.translations.upsert_translation(&record).await?;

        Ok(LanguageOutcome::Persisted {
            failed_segments,
            total_segments,
        })
    }
}
