/*!
 * Markup and text tokenization.
 *
 * Two scanners live here:
 * - `split_markup` cuts markup into `Tag` fragments (`<...>`) and the `Text`
 *   between them.
 * - `split_text` cuts plain text into `Preserve` runs (URLs, email addresses,
 *   phone numbers, line breaks) and `Translatable` prose.
 *
 * Both return borrowed slices of the input whose concatenation is the input,
 * byte for byte. `verify_coverage` checks that invariant for any sequence of
 * pieces built from these.
 */

use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::TranslationError;

/// Kind of a markup fragment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentKind {
    /// A `<...>` tag, including comments and doctype declarations
    Tag,
    /// Everything between tags
    Text,
}

/// A contiguous slice of a markup string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fragment<'a> {
    pub kind: FragmentKind,
    pub text: &'a str,
}

impl<'a> Fragment<'a> {
    fn tag(text: &'a str) -> Self {
        Self { kind: FragmentKind::Tag, text }
    }

    fn text(text: &'a str) -> Self {
        Self { kind: FragmentKind::Text, text }
    }

    pub fn is_tag(&self) -> bool {
        self.kind == FragmentKind::Tag
    }

    /// Whether this is a text fragment containing only whitespace
    pub fn is_blank_text(&self) -> bool {
        self.kind == FragmentKind::Text && self.text.trim().is_empty()
    }
}

/// Kind of a plain-text run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunKind {
    /// Must reach the output verbatim
    Preserve,
    /// Prose to send to the provider
    Translatable,
}

/// A contiguous slice of a plain-text string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextRun<'a> {
    pub kind: RunKind,
    pub text: &'a str,
}

/// Split markup into tag and text fragments.
///
/// A tag is `<` followed by a letter, `/`, `!` or `?`, then anything up to
/// the next `>`. Any other `<` stays in the surrounding text.
pub fn split_markup(input: &str) -> Vec<Fragment<'_>> {
    let bytes = input.as_bytes();
    let mut fragments = Vec::new();
    let mut text_start = 0;
    let mut pos = 0;

    while pos < bytes.len() {
        if bytes[pos] == b'<' && bytes.get(pos + 1).is_some_and(|&b| opens_tag(b)) {
            match input[pos + 1..].find('>') {
                Some(offset) => {
                    let end = pos + 1 + offset + 1;
                    if text_start < pos {
                        fragments.push(Fragment::text(&input[text_start..pos]));
                    }
                    fragments.push(Fragment::tag(&input[pos..end]));
                    pos = end;
                    text_start = end;
                    continue;
                }
                // No `>` left anywhere, so nothing after this point is a tag
                None => break,
            }
        }
        pos += 1;
    }

    if text_start < input.len() {
        fragments.push(Fragment::text(&input[text_start..]));
    }

    fragments
}

fn opens_tag(byte: u8) -> bool {
    byte.is_ascii_alphabetic() || matches!(byte, b'/' | b'!' | b'?')
}

static PRESERVE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // Absolute URLs
        r#"(?i)https?://[^\s<>"]+"#,
        // Email addresses
        r"[a-zA-Z0-9][a-zA-Z0-9._%+-]*@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}",
        // Phone-number-like digit runs
        r"\+?\d[\d \-()]{6,}\d",
        // Blank lines and single line breaks
        r"\r?\n\s*\n|\r?\n",
    ]
    .iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
});

/// Split plain text into preserved and translatable runs.
///
/// At every position the candidate that starts earliest wins, and among
/// candidates starting at the same byte the longest wins, so an email
/// address is never split into a URL and prose or the other way around.
pub fn split_text(input: &str) -> Vec<TextRun<'_>> {
    let mut runs = Vec::new();
    let mut pos = 0;

    while pos < input.len() {
        let best = PRESERVE_PATTERNS
            .iter()
            .filter_map(|re| re.find_at(input, pos))
            .filter(|m| !m.is_empty())
            .min_by(|a, b| a.start().cmp(&b.start()).then_with(|| b.end().cmp(&a.end())));

        let Some(found) = best else {
            break;
        };

        if found.start() > pos {
            runs.push(TextRun {
                kind: RunKind::Translatable,
                text: &input[pos..found.start()],
            });
        }
        runs.push(TextRun {
            kind: RunKind::Preserve,
            text: found.as_str(),
        });
        pos = found.end();
    }

    if pos < input.len() {
        runs.push(TextRun {
            kind: RunKind::Translatable,
            text: &input[pos..],
        });
    }

    runs
}

/// Check that `pieces` concatenate to exactly `input`
pub fn verify_coverage<'a, I>(input: &str, pieces: I) -> Result<(), TranslationError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut offset = 0;
    let mut intact = true;

    for piece in pieces {
        if intact && input[offset..].starts_with(piece) {
            offset += piece.len();
        } else {
            intact = false;
            offset += piece.len();
        }
    }

    if intact && offset == input.len() {
        Ok(())
    } else {
        Err(TranslationError::TokenizationInvariantViolation {
            expected_len: input.len(),
            actual_len: offset,
        })
    }
}

/// Name and shape of a tag fragment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagInfo {
    /// Lowercased element name
    pub name: String,
    /// `</name>`
    pub closing: bool,
    /// `<name ... />`
    pub self_closing: bool,
}

/// Parse the element name out of a tag fragment.
///
/// Returns `None` for comments, doctypes and anything else without a name.
pub fn parse_tag(fragment: &str) -> Option<TagInfo> {
    let inner = fragment.strip_prefix('<')?.strip_suffix('>')?;
    let (closing, rest) = match inner.strip_prefix('/') {
        Some(rest) => (true, rest),
        None => (false, inner),
    };

    let name: String = rest
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == ':')
        .collect();

    if name.is_empty() || !name.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return None;
    }

    Some(TagInfo {
        name: name.to_ascii_lowercase(),
        closing,
        self_closing: inner.trim_end().ends_with('/'),
    })
}
