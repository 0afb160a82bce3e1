/*!
 * Tests for language utility functions
 */

use cleansound_translate::language_utils::{get_language_name, normalize_provider_code, Language};

#[test]
fn test_parse_withCanonicalCodesAndAliases_shouldReturnLanguage() {
    assert_eq!(Language::parse("id").unwrap(), Language::Indonesian);
    assert_eq!(Language::parse(" EN ").unwrap(), Language::English);
    assert_eq!(Language::parse("jp").unwrap(), Language::Japanese);
    assert_eq!(Language::parse("jpn").unwrap(), Language::Japanese);
    assert!(Language::parse("fr").is_err());
    assert!(Language::parse("").is_err());
}

#[test]
fn test_normalizeOr_withMissingOrUnknownCode_shouldUseFallback() {
    assert_eq!(Language::normalize_or(None, Language::Indonesian), Language::Indonesian);
    assert_eq!(Language::normalize_or(Some("xx"), Language::Indonesian), Language::Indonesian);
    assert_eq!(Language::normalize_or(Some("ja"), Language::Indonesian), Language::Japanese);
}

#[test]
fn test_code_withEveryLanguage_shouldRoundTripThroughParse() {
    for language in Language::ALL {
        assert_eq!(Language::parse(language.code()).unwrap(), language);
        assert_eq!(language.to_string(), language.code());
    }
}

#[test]
fn test_serde_withAlias_shouldStoreCanonicalCode() {
    let language: Language = serde_json::from_str(r#""jp""#).unwrap();
    assert_eq!(serde_json::to_string(&language).unwrap(), r#""ja""#);
}

#[test]
fn test_normalizeProviderCode_shouldCanonicalizeKnownCodesOnly() {
    assert_eq!(normalize_provider_code("JP"), "ja");
    assert_eq!(normalize_provider_code(" DE "), "de");
}

#[test]
fn test_getLanguageName_shouldUseIsoNames() {
    assert_eq!(get_language_name("id").unwrap(), "Indonesian");
    assert_eq!(get_language_name("jpn").unwrap(), "Japanese");
    assert!(get_language_name("zz").is_err());
    assert_eq!(Language::English.display_name(), "English");
}
