// src/models/translation.rs
use serde::{Deserialize, Serialize};

use super::language::Language;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateRequest {
    pub text: String,
    pub target_language: Language,
    #[serde(default)]
    pub source_language: Option<Language>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchTranslateRequest {
    pub texts: Vec<String>,
    pub target_language: Language,
    #[serde(default)]
    pub source_language: Option<Language>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TranslateResponse {
    pub original_text: String,
    pub translated_text: String,
    pub target_language: Language,
    pub source_language: Language,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchTranslateResponse {
    pub results: Vec<TranslateResponse>,
}

/// Where a resolved translation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TranslationSource {
    Dictionary,
    Provider,
    /// The original text was returned unchanged.
    Passthrough,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Translation {
    pub original_text: String,
    pub translated_text: String,
    pub target_language: Language,
    pub source_language: Language,
    pub source: TranslationSource,
}

impl Translation {
    pub fn passthrough(text: &str, source_language: Language, target_language: Language) -> Self {
        Self {
            original_text: text.to_string(),
            translated_text: text.to_string(),
            target_language,
            source_language,
            source: TranslationSource::Passthrough,
        }
    }
}

impl From<Translation> for TranslateResponse {
    fn from(t: Translation) -> Self {
        Self {
            original_text: t.original_text,
            translated_text: t.translated_text,
            target_language: t.target_language,
            source_language: t.source_language,
        }
    }
}
