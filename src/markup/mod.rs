/*!
 * Markup handling: tokenization, embed shielding and plain-text helpers.
 */

pub mod shield;
pub mod text;
pub mod tokenizer;

pub use shield::{EmbedShielder, ShieldToken, ShieldedMarkup};
pub use text::{collapse_whitespace, short_description, strip_tags};
pub use tokenizer::{
    parse_tag, split_markup, split_text, verify_coverage, Fragment, FragmentKind, RunKind, TagInfo,
    TextRun,
};
