use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Language utilities for the supported publishing languages
///
/// The site publishes in a fixed set of languages. Every boundary (config,
/// provider payloads, lookups from the presentation layer) goes through
/// `Language::parse` or `Language::normalize_or`, so aliases such as `jp`
/// never reach storage or the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Language {
    /// Indonesian, the native language of authored content
    Indonesian,
    /// English, also the pivot language
    English,
    /// Japanese
    Japanese,
}

impl Language {
    /// All supported languages, native first
    pub const ALL: [Language; 3] = [Language::Indonesian, Language::English, Language::Japanese];

    /// Language used as the intermediate hop for pivot translation
    pub const PIVOT: Language = Language::English;

    /// ISO 639-1 code sent to the provider and stored with translations
    pub fn code(&self) -> &'static str {
        match self {
            Self::Indonesian => "id",
            Self::English => "en",
            Self::Japanese => "ja",
        }
    }

    /// Parse a language code, accepting the `jp` and `in` aliases
    pub fn parse(code: &str) -> Result<Self> {
        match code.trim().to_lowercase().as_str() {
            "id" | "in" | "ind" => Ok(Self::Indonesian),
            "en" | "eng" => Ok(Self::English),
            "ja" | "jp" | "jpn" => Ok(Self::Japanese),
            _ => Err(anyhow!("Unsupported language code: {}", code)),
        }
    }

    /// Parse a language code, falling back to `fallback` when it is missing or unsupported
    pub fn normalize_or(code: Option<&str>, fallback: Language) -> Self {
        code.and_then(|c| Self::parse(c).ok()).unwrap_or(fallback)
    }

    /// English name of the language
    pub fn display_name(&self) -> String {
        get_language_name(self.code()).unwrap_or_else(|_| self.code().to_string())
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Language {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Language {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Language> for String {
    fn from(language: Language) -> Self {
        language.code().to_string()
    }
}

/// Normalize a raw language code for the provider payload.
///
/// Supported codes and their aliases are mapped to their canonical form;
/// anything else is passed through lowercased so the provider can decide.
pub fn normalize_provider_code(code: &str) -> String {
    match Language::parse(code) {
        Ok(language) => language.code().to_string(),
        Err(_) => code.trim().to_lowercase(),
    }
}

/// Get the English language name for an ISO 639-1 or 639-3 code
pub fn get_language_name(code: &str) -> Result<String> {
    let normalized_code = code.trim().to_lowercase();

    let language = match normalized_code.len() {
        2 => isolang::Language::from_639_1(&normalized_code),
        3 => isolang::Language::from_639_3(&normalized_code),
        _ => None,
    };

    language
        .map(|lang| lang.to_name().to_string())
        .ok_or_else(|| anyhow!("Invalid language code: {}", code))
}
