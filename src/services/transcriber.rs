//! Speech-to-text boundary.
//!
//! The transcription service consumes the WAV container and returns the
//! transcript together with the detected source language.  An empty
//! transcript is a legitimate answer (silence), not an error — the pipeline
//! simply skips translation for it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::ServiceConfig;
use crate::services::{languages, ServiceError};

// ---------------------------------------------------------------------------
// Transcription
// ---------------------------------------------------------------------------

/// A successful transcription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transcription {
    /// Transcript text, trimmed of surrounding whitespace.
    pub text: String,
    /// Detected source language as an ISO-639-1 code.
    pub language: String,
    /// Display name for `language` when the code is known.
    pub language_name: Option<String>,
}

/// Raw wire shape returned by the transcription service.
#[derive(Debug, Clone, Deserialize)]
struct TranscriptionResponse {
    text: String,
    language: String,
}

impl Transcription {
    fn from_response(response: TranscriptionResponse) -> Self {
        let language_name = languages::language_name(&response.language).map(String::from);
        Self {
            text: response.text.trim().to_string(),
            language: response.language,
            language_name,
        }
    }
}

// ---------------------------------------------------------------------------
// Transcriber trait
// ---------------------------------------------------------------------------

/// Object-safe, thread-safe interface to the speech-to-text service.
///
/// `wav` is the canonical mono 16 kHz container produced by
/// [`transcode`](crate::audio::transcode).
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, wav: &[u8]) -> Result<Transcription, ServiceError>;
}

// ---------------------------------------------------------------------------
// HttpTranscriber
// ---------------------------------------------------------------------------

/// Production client that POSTs the container to `{base_url}/transcribe`.
pub struct HttpTranscriber {
    client: reqwest::Client,
    config: ServiceConfig,
}

impl HttpTranscriber {
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
impl Transcriber for HttpTranscriber {
    async fn transcribe(&self, wav: &[u8]) -> Result<Transcription, ServiceError> {
        let url = format!("{}/transcribe", self.config.base_url);

        let mut req = self
            .client
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "audio/wav")
            .body(wav.to_vec());

        let key = self.config.api_key.as_deref().unwrap_or("");
        if !key.is_empty() {
            req = req.bearer_auth(key);
        }

        let response = req.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::Status(status.as_u16()));
        }

        let wire: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::Parse(e.to_string()))?;

        Ok(Transcription::from_response(wire))
    }
}

// ---------------------------------------------------------------------------
// MockTranscriber  (test-only)
// ---------------------------------------------------------------------------

/// Test double returning a fixed transcription (or error) without any HTTP.
#[cfg(test)]
pub struct MockTranscriber {
    response: Result<Transcription, String>,
}

#[cfg(test)]
impl MockTranscriber {
    pub fn ok(text: impl Into<String>, language: impl Into<String>) -> Self {
        let language = language.into();
        let language_name = languages::language_name(&language).map(String::from);
        Self {
            response: Ok(Transcription {
                text: text.into(),
                language,
                language_name,
            }),
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            response: Err(message.into()),
        }
    }
}

#[cfg(test)]
#[async_trait]
impl Transcriber for MockTranscriber {
    async fn transcribe(&self, _wav: &[u8]) -> Result<Transcription, ServiceError> {
        match &self.response {
            Ok(t) => Ok(t.clone()),
            Err(msg) => Err(ServiceError::Request(msg.clone())),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_text_is_trimmed() {
        let t = Transcription::from_response(TranscriptionResponse {
            text: "  hello there \n".into(),
            language: "en".into(),
        });
        assert_eq!(t.text, "hello there");
    }

    #[test]
    fn known_language_code_gets_a_display_name() {
        let t = Transcription::from_response(TranscriptionResponse {
            text: "bonjour".into(),
            language: "fr".into(),
        });
        assert_eq!(t.language_name.as_deref(), Some("French"));
    }

    #[test]
    fn unknown_language_code_passes_through_without_name() {
        let t = Transcription::from_response(TranscriptionResponse {
            text: "…".into(),
            language: "xx".into(),
        });
        assert_eq!(t.language, "xx");
        assert!(t.language_name.is_none());
    }

    #[test]
    fn empty_transcript_is_not_an_error() {
        let t = Transcription::from_response(TranscriptionResponse {
            text: "   ".into(),
            language: "en".into(),
        });
        assert!(t.text.is_empty());
    }

    #[test]
    fn transcriber_is_object_safe() {
        let config = ServiceConfig::default();
        let _: Box<dyn Transcriber> = Box::new(HttpTranscriber::from_config(&config));
    }

    #[tokio::test]
    async fn mock_returns_configured_transcription() {
        let mock = MockTranscriber::ok("hello", "en");
        let t = mock.transcribe(&[]).await.unwrap();
        assert_eq!(t.text, "hello");
        assert_eq!(t.language, "en");
        assert_eq!(t.language_name.as_deref(), Some("English"));
    }
}
