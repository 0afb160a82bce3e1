/*!
 * # cleansound-translate
 *
 * Markup-preserving, cache-backed translation of documents into a fixed set
 * of languages through an external machine-translation provider.
 *
 * ## Features
 *
 * - Translate rich-text bodies without touching tags, attributes or embeds
 * - Shield video links and embedded players so they survive untouched
 * - Leave URLs, email addresses and phone numbers exactly as written
 * - Retry transient provider failures with exponential backoff
 * - Pivot through English when the provider rejects a language pair
 * - Skip languages whose stored translation already matches the content
 * - Run translations off the writer's path after each document commit
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `cache`: Key/value cache seam and the in-memory implementation
 * - `markup`: Tokenizing, embed shielding and plain-text helpers
 * - `providers`: Provider seam, the HTTP client and a mock for tests
 * - `translation`: Translation layers:
 *   - `translation::client`: Cached, retried single provider calls
 *   - `translation::segments`: Concurrent segment translation
 *   - `translation::html`: Whole-body shield, translate and restore
 *   - `translation::pipeline`: Per-document orchestration and the commit queue
 * - `documents`: Document models, storage seams and commit hooks
 * - `database`: SQLite persistence for documents, translations and the cache
 * - `language_utils`: Supported languages and code helpers
 * - `errors`: Custom error types for the application
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod cache;
pub mod database;
pub mod documents;
pub mod errors;
pub mod language_utils;
pub mod markup;
pub mod providers;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use cache::{CacheService, MemoryCache};
pub use database::{Repository, SqliteCache};
pub use documents::{Document, DocumentStatus, MemoryStore, TranslatedDocument};
pub use errors::{AppError, ProviderError, TranslationError};
pub use language_utils::Language;
pub use providers::{HttpProvider, MockProvider, Provider};
pub use translation::{
    DocumentReport, HtmlTranslator, LanguageOutcome, TranslationOrchestrator, TranslationQueue,
};
