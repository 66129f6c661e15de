//! Translation boundary (optional pipeline step).
//!
//! The translation service consumes transcript text plus a bounded list of
//! target language codes and returns translated text per code.  Targets
//! equal to the detected source language are skipped before the request is
//! made, and targets the service fails on are simply absent from the result
//! — a partial translation list is acceptable, unlike the core
//! transcription/emotion pair.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::ServiceConfig;
use crate::services::{languages, ServiceError};

/// Upper bound on target languages per request.
pub const MAX_TARGET_LANGUAGES: usize = 5;

// ---------------------------------------------------------------------------
// TranslationEntry
// ---------------------------------------------------------------------------

/// One translated rendering of the transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationEntry {
    /// Target language code (ISO-639-1).
    pub language_code: String,
    /// Display name when the code is known.
    pub language_name: Option<String>,
    /// Translated text.
    pub text: String,
}

/// Wire request sent to the translation service.
#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    text: &'a str,
    source_language: &'a str,
    target_languages: Vec<&'a str>,
}

/// Wire response from the translation service.
#[derive(Debug, Deserialize)]
struct TranslateResponse {
    translations: Vec<TranslateResponseItem>,
}

#[derive(Debug, Deserialize)]
struct TranslateResponseItem {
    language_code: String,
    text: String,
}

// ---------------------------------------------------------------------------
// Translator trait
// ---------------------------------------------------------------------------

/// Object-safe, thread-safe interface to the translation service.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `text` from `source_language` into each of `targets`.
    ///
    /// Targets equal to the source are skipped; per-target failures on the
    /// service side are omitted from the result.
    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        targets: &[String],
    ) -> Result<Vec<TranslationEntry>, ServiceError>;
}

// ---------------------------------------------------------------------------
// HttpTranslator
// ---------------------------------------------------------------------------

/// Production client that POSTs JSON to `{base_url}/translate`.
pub struct HttpTranslator {
    client: reqwest::Client,
    config: ServiceConfig,
}

impl HttpTranslator {
    /// Build a client from service config, with the configured per-request
    /// timeout.
    pub fn from_config(config: &ServiceConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
        }
    }
}

#[async_trait]
impl Translator for HttpTranslator {
    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        targets: &[String],
    ) -> Result<Vec<TranslationEntry>, ServiceError> {
        let effective: Vec<&str> = targets
            .iter()
            .map(String::as_str)
            .filter(|&t| t != source_language)
            .collect();

        if text.trim().is_empty() || effective.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/translate", self.config.base_url);
        let body = TranslateRequest {
            text,
            source_language,
            target_languages: effective,
        };

        let mut req = self.client.post(&url).json(&body);

        let key = self.config.api_key.as_deref().unwrap_or("");
        if !key.is_empty() {
            req = req.bearer_auth(key);
        }

        let response = req.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::Status(status.as_u16()));
        }

        let wire: TranslateResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::Parse(e.to_string()))?;

        Ok(wire
            .translations
            .into_iter()
            .map(|item| TranslationEntry {
                language_name: languages::language_name(&item.language_code).map(String::from),
                language_code: item.language_code,
                text: item.text,
            })
            .collect())
    }
}

// ---------------------------------------------------------------------------
// MockTranslator  (test-only)
// ---------------------------------------------------------------------------

/// Test double that "translates" by tagging the text with the target code.
#[cfg(test)]
pub struct MockTranslator {
    fail: bool,
}

#[cfg(test)]
impl MockTranslator {
    pub fn ok() -> Self {
        Self { fail: false }
    }

    pub fn failing() -> Self {
        Self { fail: true }
    }
}

#[cfg(test)]
#[async_trait]
impl Translator for MockTranslator {
    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        targets: &[String],
    ) -> Result<Vec<TranslationEntry>, ServiceError> {
        if self.fail {
            return Err(ServiceError::Timeout);
        }
        Ok(targets
            .iter()
            .filter(|&t| t != source_language)
            .map(|t| TranslationEntry {
                language_code: t.clone(),
                language_name: languages::language_name(t).map(String::from),
                text: format!("[{t}] {text}"),
            })
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
