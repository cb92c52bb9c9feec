// src/services/translation_service.rs
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing;

use crate::{
    errors::{PortalError, PortalResult},
    models::{
        language::Language,
        translation::{Translation, TranslationSource},
    },
    services::dictionary::PhraseDictionary,
};

/// Texts the provider returns in place of a translation when it refuses a request.
const PROVIDER_ERROR_MARKERS: &[&str] = &[
    "MYMEMORY WARNING",
    "QUERY LENGTH LIMIT",
    "INVALID LANGUAGE PAIR",
    "PLEASE SELECT TWO DISTINCT LANGUAGES",
    "NO QUERY SPECIFIED",
    "INVALID SOURCE LANGUAGE",
    "INVALID TARGET LANGUAGE",
];

const MAX_LENGTH_RATIO: usize = 3;

#[derive(Debug, Error)]
pub enum TranslationError {
    #[error("translation provider returned status {0}")]
    Status(u16),

    #[error("translation request failed: {0}")]
    Transport(String),

    #[error("malformed provider response: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone)]
pub struct TranslationProviderConfig {
    pub api_url: String,
    pub contact_email: Option<String>,
    pub timeout: Duration,
}

impl Default for TranslationProviderConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.mymemory.translated.net/get".to_string(),
            contact_email: None,
            timeout: Duration::from_secs(10),
        }
    }
}

#[async_trait]
pub trait TranslationProvider: Send + Sync {
    /// One translation attempt. No retries.
    async fn translate(&self, text: &str, source: Language, target: Language) -> Result<String, TranslationError>;
}

/// MyMemory-compatible HTTP provider: `GET ?q=..&langpair=src|tgt`.
pub struct MyMemoryProvider {
    config: TranslationProviderConfig,
    client: reqwest::Client,
}

impl MyMemoryProvider {
    pub fn new(config: TranslationProviderConfig) -> PortalResult<Self> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }
}

#[async_trait]
impl TranslationProvider for MyMemoryProvider {
    async fn translate(&self, text: &str, source: Language, target: Language) -> Result<String, TranslationError> {
        let langpair = format!("{}|{}", source, target);
        let mut query = vec![("q", text), ("langpair", langpair.as_str())];
        if let Some(email) = &self.config.contact_email {
            query.push(("de", email.as_str()));
        }

        let response = self
            .client
            .get(&self.config.api_url)
            .query(&query)
            .send()
            .await
            .map_err(|e| TranslationError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(TranslationError::Status(response.status().as_u16()));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| TranslationError::Malformed(e.to_string()))?;

        parse_provider_body(&body)
    }
}

/// Pulls the translated text out of a provider body, checking `responseStatus`
/// (which the provider sends either as a number or a numeric string).
pub fn parse_provider_body(body: &Value) -> Result<String, TranslationError> {
    let status = match &body["responseStatus"] {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };

    match status {
        Some(200) => {}
        Some(code) => return Err(TranslationError::Status(code.min(u16::MAX as u64) as u16)),
        None => return Err(TranslationError::Malformed("missing responseStatus".to_string())),
    }

    body["responseData"]["translatedText"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| TranslationError::Malformed("missing responseData.translatedText".to_string()))
}

/// Why a provider result was thrown away, if it was.
fn reject_reason(input: &str, candidate: &str) -> Option<&'static str> {
    let candidate = candidate.trim();
    if candidate.is_empty() {
        return Some("empty");
    }
    if candidate == input.trim() {
        return Some("unchanged");
    }
    let upper = candidate.to_uppercase();
    if PROVIDER_ERROR_MARKERS.iter().any(|marker| upper.contains(marker)) {
        return Some("provider error marker");
    }
    if candidate.chars().count() > input.chars().count() * MAX_LENGTH_RATIO {
        return Some("too long");
    }
    None
}

/// Dictionary-first translator that degrades to the original text.
pub struct TranslationService {
    dictionary: Arc<PhraseDictionary>,
    provider: Arc<dyn TranslationProvider>,
}

impl TranslationService {
    pub fn new(dictionary: Arc<PhraseDictionary>, provider: Arc<dyn TranslationProvider>) -> Self {
        Self { dictionary, provider }
    }

    pub fn dictionary(&self) -> &PhraseDictionary {
        &self.dictionary
    }

    /// Resolves a translation. Only blank input is an error; every provider
    /// problem falls back to returning `text` unchanged.
    pub async fn resolve(&self, text: &str, target: Language, source: Option<Language>) -> PortalResult<Translation> {
        if text.trim().is_empty() {
            return Err(PortalError::invalid_input("text must not be empty"));
        }

        let source_language = source.unwrap_or_else(|| Language::detect(text));

        if let Some(translated) = self.dictionary.lookup(text, target) {
            tracing::debug!("Dictionary hit for {} -> {}", text, target);
            return Ok(Translation {
                original_text: text.to_string(),
                translated_text: translated,
                target_language: target,
                source_language,
                source: TranslationSource::Dictionary,
            });
        }

        if source_language == target {
            tracing::debug!("Source and target are both {}, returning text unchanged", target);
            return Ok(Translation::passthrough(text, source_language, target));
        }

        let candidate = match self.provider.translate(text, source_language, target).await {
            Ok(candidate) => candidate,
            Err(e) => {
                tracing::warn!("Translation provider failed ({} -> {}): {}", source_language, target, e);
                return Ok(Translation::passthrough(text, source_language, target));
            }
        };

        if let Some(reason) = reject_reason(text, &candidate) {
            tracing::warn!("Discarding provider translation ({}): {:?}", reason, candidate);
            return Ok(Translation::passthrough(text, source_language, target));
        }

        tracing::info!("Translated {} chars {} -> {} via provider", text.chars().count(), source_language, target);
        Ok(Translation {
            original_text: text.to_string(),
            translated_text: candidate.trim().to_string(),
            target_language: target,
            source_language,
            source: TranslationSource::Provider,
        })
    }
}

// Mock provider for development and testing
#[derive(Debug, Default)]
pub struct MockTranslationProvider;

#[async_trait]
impl TranslationProvider for MockTranslationProvider {
    async fn translate(&self, text: &str, source: Language, target: Language) -> Result<String, TranslationError> {
        tracing::info!("[MOCK] Would translate {} -> {}: {}", source, target, text);
        Err(TranslationError::Transport("mock provider does not translate".to_string()))
    }
}
