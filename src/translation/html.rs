use log::error;

use super::segments::{segment_markup, segment_text, SegmentFailure, SegmentTranslator, TranslatedSegments};
use crate::errors::TranslationError;
use crate::language_utils::Language;
use crate::markup::shield::EmbedShielder;

/// Translated text plus the segments that could not be translated
#[derive(Debug, Clone, Default)]
pub struct TranslationOutput {
    pub text: String,
    pub failures: Vec<SegmentFailure>,
    /// Number of segments sent to the provider
    pub translatable: usize,
}

impl TranslationOutput {
    fn from_segments(text: String, translated: TranslatedSegments) -> Self {
        Self {
            text,
            failures: translated.failures,
            translatable: translated.translatable,
        }
    }

    /// Whether every segment sent to the provider failed
    pub fn all_failed(&self) -> bool {
        self.translatable > 0 && self.failures.len() == self.translatable
    }
}

/// Shield, segment, translate and restore a markup or plain-text string
#[derive(Clone)]
pub struct HtmlTranslator {
    shielder: EmbedShielder,
    segments: SegmentTranslator,
}

impl HtmlTranslator {
    pub fn new(shielder: EmbedShielder, segments: SegmentTranslator) -> Self {
        Self { shielder, segments }
    }

    pub fn segment_translator(&self) -> &SegmentTranslator {
        &self.segments
    }

    /// Translate a markup body.
    ///
    /// Embeds and video links are shielded first and restored after the
    /// text segments are translated. A tokenization failure aborts with no
    /// output and evicts the shielded fragments.
    pub async fn translate_html(
        &self,
        markup: &str,
        source: Option<Language>,
        target: Language,
    ) -> Result<TranslationOutput, TranslationError> {
        let shielded = self.shielder.shield(markup).await;

        let segments = match segment_markup(&shielded.masked) {
            Ok(segments) => segments,
            Err(e) => {
                error!("Refusing to translate markup into {}: {}", target, e);
                self.shielder.discard(&shielded.tokens).await;
                return Err(e);
            }
        };

        let translated = self.segments.translate_segments(&segments, source, target).await;
        let restored = self.shielder.restore(&translated.text(), &shielded.tokens).await;

        Ok(TranslationOutput::from_segments(restored, translated))
    }

    /// Translate plain text, preserving URLs, email addresses, phone numbers and line breaks
    pub async fn translate_plain(
        &self,
        text: &str,
        source: Option<Language>,
        target: Language,
    ) -> Result<TranslationOutput, TranslationError> {
        let segments = segment_text(text)?;
        let translated = self.segments.translate_segments(&segments, source, target).await;
        Ok(TranslationOutput::from_segments(translated.text(), translated))
    }
}
