/*!
 * Translation of markup and plain text through a provider.
 *
 * The module is split into layers, each building on the one before:
 *
 * - `client`: one provider call with caching, retries and pivot fallback
 * - `segments`: concurrent translation of tokenized segments
 * - `html`: shielding, segmenting and restoring a whole markup body
 * - `pipeline`: per-document orchestration, persistence and the commit queue
 */

pub mod client;
pub mod html;
pub mod pipeline;
pub mod segments;

// Re-export main types for easier usage
pub use self::client::{ClientOptions, ProviderClient};
pub use self::html::{HtmlTranslator, TranslationOutput};
pub use self::pipeline::{
    DisplayDocument, DocumentReport, LanguageOutcome, OrchestratorOptions, QueueOptions,
    TranslationOrchestrator, TranslationQueue,
};
pub use self::segments::{Segment, SegmentKind, SegmentTranslator, TranslatedSegments};
