/*!
 * Segment translation.
 *
 * A document is cut into ordered segments (tags, preserved runs and
 * translatable runs). Translatable segments are dispatched to the provider
 * client concurrently, bounded by a shared semaphore, and stitched back by
 * position so completion order never leaks into the output.
 */

use futures::stream::{self, StreamExt};
use log::{debug, warn};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;

use super::client::ProviderClient;
use crate::errors::TranslationError;
use crate::language_utils::Language;
use crate::markup::tokenizer::{split_markup, split_text, verify_coverage, FragmentKind, RunKind, TextRun};

/// Classification of a segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    /// A markup tag, passed through verbatim
    Tag,
    /// URL, email address, phone number or line break, passed through verbatim
    Preserve,
    /// Prose sent to the provider
    Translatable,
}

/// A unit of text with its position in the original sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub index: usize,
    pub kind: SegmentKind,
    pub text: String,
}

impl Segment {
    /// Whether the provider needs to see this segment
    pub fn needs_translation(&self) -> bool {
        self.kind == SegmentKind::Translatable && !self.text.trim().is_empty()
    }
}

/// A segment the provider could not translate; its original text was kept
#[derive(Debug, Clone)]
pub struct SegmentFailure {
    pub index: usize,
    pub error: TranslationError,
}

/// Segments after translation, in input order
#[derive(Debug, Clone, Default)]
pub struct TranslatedSegments {
    pub segments: Vec<Segment>,
    pub failures: Vec<SegmentFailure>,
    /// Number of segments that were sent to the provider
    pub translatable: usize,
}

impl TranslatedSegments {
    /// Concatenated output text
    pub fn text(&self) -> String {
        join_segments(&self.segments)
    }

    /// Whether every segment sent to the provider failed
    pub fn all_failed(&self) -> bool {
        self.translatable > 0 && self.failures.len() == self.translatable
    }
}

fn push_runs(segments: &mut Vec<Segment>, runs: Vec<TextRun<'_>>) {
    for run in runs {
        let kind = match run.kind {
            RunKind::Preserve => SegmentKind::Preserve,
            RunKind::Translatable => SegmentKind::Translatable,
        };
        segments.push(Segment {
            index: segments.len(),
            kind,
            text: run.text.to_string(),
        });
    }
}

/// Cut markup into tag, preserved and translatable segments.
///
/// Fails with `TokenizationInvariantViolation` if the segments do not
/// reproduce the input exactly.
pub fn segment_markup(markup: &str) -> Result<Vec<Segment>, TranslationError> {
    let mut segments = Vec::new();

    for fragment in split_markup(markup) {
        match fragment.kind {
            FragmentKind::Tag => segments.push(Segment {
                index: segments.len(),
                kind: SegmentKind::Tag,
                text: fragment.text.to_string(),
            }),
            FragmentKind::Text => push_runs(&mut segments, split_text(fragment.text)),
        }
    }

    verify_coverage(markup, segments.iter().map(|s| s.text.as_str()))?;
    Ok(segments)
}

/// Cut plain text into preserved and translatable segments
pub fn segment_text(text: &str) -> Result<Vec<Segment>, TranslationError> {
    let mut segments = Vec::new();
    push_runs(&mut segments, split_text(text));
    verify_coverage(text, segments.iter().map(|s| s.text.as_str()))?;
    Ok(segments)
}

pub fn join_segments(segments: &[Segment]) -> String {
    segments.iter().map(|s| s.text.as_str()).collect()
}

/// Split `text` into (leading whitespace, core, trailing whitespace)
fn split_padding(text: &str) -> (&str, &str, &str) {
    let start = text.len() - text.trim_start().len();
    let end = text.trim_end().len();
    if start >= end {
        return (text, "", "");
    }
    (&text[..start], &text[start..end], &text[end..])
}

/// Progress callback receiving (finished, total) translatable segments
pub type ProgressCallback = Arc<dyn Fn(usize, usize) + Send + Sync>;

/// Runs the provider client over many segments with bounded concurrency
#[derive(Clone)]
pub struct SegmentTranslator {
    client: Arc<ProviderClient>,
    /// Shared by every call on this translator (and its clones)
    semaphore: Arc<Semaphore>,
    max_concurrent_requests: usize,
    progress: Option<ProgressCallback>,
}

impl SegmentTranslator {
    pub fn new(client: Arc<ProviderClient>, max_concurrent_requests: usize) -> Self {
        let max_concurrent_requests = max_concurrent_requests.max(1);
        Self {
            client,
            semaphore: Arc::new(Semaphore::new(max_concurrent_requests)),
            max_concurrent_requests,
            progress: None,
        }
    }

    /// Report progress after each translatable segment finishes
    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn max_concurrent_requests(&self) -> usize {
        self.max_concurrent_requests
    }

    /// Translate every translatable segment, keeping order and length.
    ///
    /// A segment whose provider call fails keeps its original text and is
    /// recorded in `failures`; sibling segments are unaffected.
    pub async fn translate_segments(
        &self,
        segments: &[Segment],
        source: Option<Language>,
        target: Language,
    ) -> TranslatedSegments {
        let total = segments.iter().filter(|s| s.needs_translation()).count();
        let finished = Arc::new(AtomicUsize::new(0));

        // Built eagerly so the stream owns plain futures and stays `Send`
        let jobs: Vec<_> = segments
            .iter()
            .enumerate()
            .map(|(position, segment)| {
                let client = self.client.clone();
                let semaphore = self.semaphore.clone();
                let finished = finished.clone();
                let progress = self.progress.clone();

                async move {
                    if !segment.needs_translation() {
                        return (position, segment.text.clone(), None);
                    }

                    let result = match semaphore.acquire().await {
                        Ok(_permit) => translate_one(&client, &segment.text, source, target).await,
                        Err(_) => Err(TranslationError::ProviderUnavailable {
                            attempts: 0,
                            last_error: "segment worker pool is closed".to_string(),
                        }),
                    };

                    let current = finished.fetch_add(1, Ordering::SeqCst) + 1;
                    if let Some(progress) = &progress {
                        progress(current, total);
                    }

                    match result {
                        Ok(translated) => (position, translated, None),
                        Err(e) => {
                            warn!("Segment {} left untranslated ({}): {}", segment.index, target, e);
                            (position, segment.text.clone(), Some(e))
                        }
                    }
                }
            })
            .collect();

        let mut results = stream::iter(jobs)
            .buffer_unordered(self.max_concurrent_requests)
            .collect::<Vec<_>>()
            .await;

        // Sort results by position to maintain original order
        results.sort_by_key(|(position, _, _)| *position);

        let mut output = TranslatedSegments {
            segments: Vec::with_capacity(segments.len()),
            failures: Vec::new(),
            translatable: total,
        };

        for ((_, text, error), segment) in results.into_iter().zip(segments) {
            if let Some(error) = error {
                output.failures.push(SegmentFailure {
                    index: segment.index,
                    error,
                });
            }
            output.segments.push(Segment {
                index: segment.index,
                kind: segment.kind,
                text,
            });
        }

        debug!(
            "Translated {} segment(s) into {}, {} failed",
            total,
            target,
            output.failures.len()
        );

        output
    }
}

/// Send the core of a segment, re-attaching its surrounding whitespace
async fn translate_one(
    client: &ProviderClient,
    text: &str,
    source: Option<Language>,
    target: Language,
) -> Result<String, TranslationError> {
    let (leading, core, trailing) = split_padding(text);
    let translated = client.translate(core, source, target).await?;
    Ok(format!("{}{}{}", leading, translated.trim(), trailing))
}
