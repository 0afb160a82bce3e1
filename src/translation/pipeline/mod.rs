/*!
 * Document translation pipeline.
 *
 * - `orchestrator`: decides per language whether to copy, skip or translate,
 *   and persists the results
 * - `queue`: runs the orchestrator off the writer's path after each commit,
 *   on a small worker pool keyed by document id
 */

pub mod orchestrator;
pub mod queue;

pub use orchestrator::{
    DisplayDocument, DocumentReport, LanguageOutcome, OrchestratorOptions, TranslationOrchestrator,
};
pub use queue::{JobResult, QueueOptions, TranslationQueue};
