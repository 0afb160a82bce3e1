/*!
 * Embed shielding.
 *
 * Before translation, embed frames and bare video links are swapped for
 * inert placeholder tags, with the original fragment parked in the cache:
 *
 * ```text
 * <cs-shield data-shield-token="9f86d081884c7d659a2feaa0c55ad015"></cs-shield>
 * ```
 *
 * The provider never sees tag fragments, so placeholders pass through
 * translation untouched and `restore` can splice the originals back in.
 */

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use super::tokenizer::{parse_tag, split_markup, Fragment, FragmentKind};
use crate::cache::{self, CacheService};

/// Element name of the placeholder tag
pub const PLACEHOLDER_TAG: &str = "cs-shield";

/// Attribute carrying the shield token
pub const TOKEN_ATTRIBUTE: &str = "data-shield-token";

/// Block elements that may wrap a single embed frame
const WRAPPER_TAGS: [&str; 3] = ["div", "figure", "p"];

/// A placeholder tag with its optional closing tag, wherever it sits in the text
static PLACEHOLDER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r#"(?i)<cs-shield\s+data-shield-token\s*=\s*["']?([A-Za-z0-9]+)["']?\s*/?>"#,
        r#"(?:\s*</cs-shield\s*>)?"#,
    ))
    .unwrap_or_else(|e| panic!("invalid placeholder pattern: {}", e))
});

static VIDEO_URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r#"(?i)https?://(?:"#,
        r#"(?:www\.|m\.)?youtube\.com/(?:watch\?v=|embed/|shorts/)[A-Za-z0-9_-]{6,}"#,
        r#"|youtu\.be/[A-Za-z0-9_-]{6,}"#,
        r#"|(?:www\.)?youtube-nocookie\.com/embed/[A-Za-z0-9_-]{6,}"#,
        r#"|(?:www\.|player\.)?vimeo\.com/(?:video/)?\d+"#,
        r#")[^\s<>"]*"#,
    ))
    .unwrap_or_else(|e| panic!("invalid video url pattern: {}", e))
});

/// Opaque reference to a fragment parked in the cache
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShieldToken(String);

impl ShieldToken {
    fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Cache key holding the original fragment
    pub fn cache_key(&self) -> String {
        cache::shield_key(&self.0)
    }

    /// Placeholder tag standing in for the fragment
    pub fn placeholder(&self) -> String {
        format!(
            r#"<{tag} {attr}="{token}"></{tag}>"#,
            tag = PLACEHOLDER_TAG,
            attr = TOKEN_ATTRIBUTE,
            token = self.0
        )
    }
}

impl fmt::Display for ShieldToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Result of shielding a markup string
#[derive(Debug, Clone, Default)]
pub struct ShieldedMarkup {
    /// Markup with embeds replaced by placeholder tags
    pub masked: String,
    /// Tokens created, in document order
    pub tokens: Vec<ShieldToken>,
}

/// Replaces embeds and video links with placeholders and restores them afterwards
#[derive(Clone)]
pub struct EmbedShielder {
    cache: Arc<dyn CacheService>,
    ttl: Duration,
}

impl EmbedShielder {
    /// Create a shielder storing fragments in `cache` for `ttl`
    pub fn new(cache: Arc<dyn CacheService>, ttl: Duration) -> Self {
        Self { cache, ttl }
    }

    /// Mask embed blocks, standalone frames and bare video URLs.
    ///
    /// Priority: a wrapper block whose only content is a frame is replaced as
    /// a whole, then remaining `<iframe>`/`<embed>` elements, then video URLs
    /// in text fragments. URLs inside tag attributes are never touched, and
    /// placeholder tags from an earlier pass are copied as-is, so shielding
    /// shielded markup changes nothing.
    pub async fn shield(&self, markup: &str) -> ShieldedMarkup {
        let fragments = split_markup(markup);
        let mut result = ShieldedMarkup {
            masked: String::with_capacity(markup.len()),
            tokens: Vec::new(),
        };

        let mut i = 0;
        while i < fragments.len() {
            let fragment = fragments[i];

            if fragment.kind == FragmentKind::Text {
                let masked = self.mask_video_urls(fragment.text, &mut result.tokens).await;
                result.masked.push_str(&masked);
                i += 1;
                continue;
            }

            if let Some(end) = match_wrapper_block(&fragments, i).or_else(|| match_embed(&fragments, i)) {
                let original: String = fragments[i..end].iter().map(|f| f.text).collect();
                let masked = self.mask(&original, &mut result.tokens).await;
                result.masked.push_str(&masked);
                i = end;
                continue;
            }

            result.masked.push_str(fragment.text);
            i += 1;
        }

        if !result.tokens.is_empty() {
            debug!("Shielded {} fragment(s)", result.tokens.len());
        }

        result
    }

    /// Splice cached originals back in place of placeholder tags.
    ///
    /// Placeholders are found by their exact shape rather than by tag
    /// boundaries, so a stray `<` next to one cannot hide it. Each restored
    /// entry is evicted. A placeholder whose token is no longer cached is
    /// left in the output rather than dropped.
    pub async fn restore(&self, text: &str, tokens: &[ShieldToken]) -> String {
        let mut output = String::with_capacity(text.len());
        let mut restored: HashSet<String> = HashSet::new();
        let mut last = 0;

        for caps in PLACEHOLDER_RE.captures_iter(text) {
            let (Some(whole), Some(token)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            output.push_str(&text[last..whole.start()]);
            last = whole.end();

            let key = cache::shield_key(token.as_str());
            match cache::get_or_miss(self.cache.as_ref(), &key).await {
                Some(original) => {
                    output.push_str(&original);
                    cache::delete_or_ignore(self.cache.as_ref(), &key).await;
                    restored.insert(token.as_str().to_string());
                }
                None => {
                    warn!("Shield token {} is missing from the cache, leaving placeholder", token.as_str());
                    output.push_str(whole.as_str());
                }
            }
        }
        output.push_str(&text[last..]);

        for token in tokens.iter().filter(|t| !restored.contains(t.as_str())) {
            warn!("Shield token {} was not found in the text being restored", token);
        }

        output
    }

    /// Evict the cached fragments for tokens that will never be restored
    pub async fn discard(&self, tokens: &[ShieldToken]) {
        for token in tokens {
            cache::delete_or_ignore(self.cache.as_ref(), &token.cache_key()).await;
        }
    }

    /// Park `original` in the cache and return its placeholder.
    ///
    /// If the cache write fails the original is returned unchanged.
    async fn mask(&self, original: &str, tokens: &mut Vec<ShieldToken>) -> String {
        let token = ShieldToken::generate();
        match self.cache.set(&token.cache_key(), original, self.ttl).await {
            Ok(()) => {
                let placeholder = token.placeholder();
                tokens.push(token);
                placeholder
            }
            Err(e) => {
                warn!("Could not shield fragment, leaving it in place: {}", e);
                original.to_string()
            }
        }
    }

    async fn mask_video_urls(&self, text: &str, tokens: &mut Vec<ShieldToken>) -> String {
        let mut output = String::with_capacity(text.len());
        let mut last = 0;

        for found in VIDEO_URL_RE.find_iter(text) {
            output.push_str(&text[last..found.start()]);
            output.push_str(&self.mask(found.as_str(), tokens).await);
            last = found.end();
        }

        output.push_str(&text[last..]);
        output
    }
}

fn tag_named(fragment: &Fragment<'_>, names: &[&str], closing: bool) -> Option<String> {
    if !fragment.is_tag() {
        return None;
    }
    let info = parse_tag(fragment.text)?;
    (info.closing == closing && names.contains(&info.name.as_str())).then_some(info.name)
}

/// Match an `<iframe>...</iframe>` element or an `<embed>` tag starting at `start`
fn match_embed(fragments: &[Fragment<'_>], start: usize) -> Option<usize> {
    let fragment = fragments.get(start)?;
    match tag_named(fragment, &["iframe", "embed"], false)?.as_str() {
        "embed" => Some(start + 1),
        _ => fragments[start + 1..]
            .iter()
            .position(|f| tag_named(f, &["iframe"], true).is_some())
            .map(|offset| start + 1 + offset + 1),
    }
}

/// Match a wrapper block holding nothing but one embed, e.g. `<div> <iframe ...></iframe> </div>`
fn match_wrapper_block(fragments: &[Fragment<'_>], start: usize) -> Option<usize> {
    let opening = fragments.get(start)?;
    let name = tag_named(opening, &WRAPPER_TAGS, false)?;
    if parse_tag(opening.text).is_some_and(|info| info.self_closing) {
        return None;
    }

    let mut k = start + 1;
    if fragments.get(k).is_some_and(|f| f.is_blank_text()) {
        k += 1;
    }
    k = match_embed(fragments, k)?;
    if fragments.get(k).is_some_and(|f| f.is_blank_text()) {
        k += 1;
    }

    let closing = fragments.get(k)?;
    tag_named(closing, &[name.as_str()], true).map(|_| k + 1)
}
