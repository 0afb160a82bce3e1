/*!
 * Tests for markup tokenization and segmentation
 */

use cleansound_translate::markup::{short_description, split_markup, split_text, FragmentKind, RunKind};
use cleansound_translate::translation::segments::{join_segments, segment_markup, segment_text};
use cleansound_translate::translation::SegmentKind;

const TRICKY_MARKUP: &str = concat!(
    "<!DOCTYPE html><!-- header -->",
    r#"<p class="lead" data-x='1'>Harga 3 &lt; 5 &amp; naik</p>"#,
    "<br/><img src=\"x.png\" alt=\"gambar\">",
    "<p>Tautan https://cleansound.id/berita?id=1 dan surel redaksi@cleansound.id</p>",
    "Teks tanpa tag\n\nBaris baru<",
);

#[test]
fn test_segmentMarkup_withTrickyInput_shouldReproduceInputExactly() {
    let segments = segment_markup(TRICKY_MARKUP).unwrap();
    assert_eq!(join_segments(&segments), TRICKY_MARKUP);

    for (position, segment) in segments.iter().enumerate() {
        assert_eq!(segment.index, position);
    }
}

#[test]
fn test_segmentMarkup_shouldNeverMarkTagsTranslatable() {
    let segments = segment_markup(TRICKY_MARKUP).unwrap();

    for segment in segments.iter().filter(|s| s.kind == SegmentKind::Translatable) {
        assert!(!segment.text.starts_with("<p"), "Tag leaked: {:?}", segment.text);
        assert!(!segment.text.contains("https://"), "URL leaked: {:?}", segment.text);
        assert!(!segment.text.contains('@'), "Email leaked: {:?}", segment.text);
    }
}

#[test]
fn test_segmentMarkup_withPlainText_shouldTreatWholeInputAsText() {
    let segments = segment_markup("Halo dunia").unwrap();

    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0].kind, SegmentKind::Translatable);
}

#[test]
fn test_segmentMarkup_withEmptyInput_shouldReturnNoSegments() {
    assert!(segment_markup("").unwrap().is_empty());
}

#[test]
fn test_splitMarkup_withUnclosedBracket_shouldKeepItAsText() {
    let fragments = split_markup("a < b");

    assert_eq!(fragments.len(), 1);
    assert_eq!(fragments[0].kind, FragmentKind::Text);
}

#[test]
fn test_splitText_withPhoneNumbers_shouldPreserveThem() {
    let runs = split_text("Telepon 021-555-1234 atau +62 812 3456 7890 sekarang");
    let preserved: Vec<_> = runs
        .iter()
        .filter(|r| r.kind == RunKind::Preserve)
        .map(|r| r.text)
        .collect();

    assert_eq!(preserved, vec!["021-555-1234", "+62 812 3456 7890"]);
}

#[test]
fn test_segmentText_withLineBreaks_shouldPreserveThem() {
    let segments = segment_text("Baris satu\nBaris dua\n\nParagraf").unwrap();
    let translatable: Vec<_> = segments
        .iter()
        .filter(|s| s.needs_translation())
        .map(|s| s.text.as_str())
        .collect();

    assert_eq!(translatable, vec!["Baris satu", "Baris dua", "Paragraf"]);
}

#[test]
fn test_shortDescription_withMarkupBody_shouldStripTagsAndTruncate() {
    let body = format!("<h1>Judul</h1><p>{}</p>", "panjang ".repeat(40));
    let description = short_description(&body, 40);

    assert!(description.starts_with("Judul panjang"));
    assert!(description.ends_with('…'));
    assert!(description.chars().count() <= 40);
}
