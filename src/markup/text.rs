//! Plain-text helpers for markup bodies.

use super::tokenizer::{parse_tag, split_markup};

/// Elements whose boundaries separate words
const BLOCK_TAGS: [&str; 17] = [
    "address", "article", "blockquote", "br", "div", "figcaption", "h1", "h2", "h3", "h4", "h5", "h6",
    "hr", "li", "p", "section", "td",
];

/// Drop all tags, keeping the text between them.
///
/// Block-level tags become a single space so words from adjacent
/// paragraphs stay apart; inline tags vanish.
pub fn strip_tags(markup: &str) -> String {
    let mut plain = String::with_capacity(markup.len());
    for fragment in split_markup(markup) {
        if !fragment.is_tag() {
            plain.push_str(fragment.text);
        } else if parse_tag(fragment.text).is_some_and(|tag| BLOCK_TAGS.contains(&tag.name.as_str())) {
            plain.push(' ');
        }
    }
    plain
}

/// Collapse runs of whitespace (including `&nbsp;`) into single spaces and trim
pub fn collapse_whitespace(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .split(|c: char| c.is_whitespace() || c == '\u{a0}')
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Build a short description from a markup body.
///
/// Tags are stripped and whitespace collapsed. Text longer than `max_chars`
/// characters is cut so that, with the trailing `…`, it is exactly
/// `max_chars` characters or fewer.
pub fn short_description(body: &str, max_chars: usize) -> String {
    let plain = collapse_whitespace(&strip_tags(body));
    if plain.chars().count() <= max_chars {
        return plain;
    }

    let cut: String = plain.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{}…", cut.trim_end())
}
