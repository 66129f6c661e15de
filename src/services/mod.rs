//! Inference service boundaries.
//!
//! The speech models run behind external HTTP services; this module owns the
//! client side of those boundaries:
//!
//! * [`Transcriber`] — speech-to-text: WAV container in, transcript +
//!   detected language out.
//! * [`EmotionClassifier`] — the same WAV container in, an [`EmotionScore`]
//!   (primary label + full probability distribution) out.
//! * [`Translator`] — transcript text + target language codes in, translated
//!   text per code out.
//!
//! Each boundary is an object-safe async trait held behind `Arc<dyn …>`,
//! with a `reqwest`-backed production client built from config and mock
//! implementations for tests.

pub mod emotion;
pub mod languages;
pub mod transcriber;
pub mod translator;

pub use emotion::{Emotion, EmotionClassifier, EmotionScore, HttpEmotionClassifier};
pub use languages::{language_name, supported_languages};
pub use transcriber::{HttpTranscriber, Transcriber, Transcription};
pub use translator::{
    HttpTranslator, TranslationEntry, Translator, MAX_TARGET_LANGUAGES,
};

use thiserror::Error;

// ---------------------------------------------------------------------------
// ServiceError
// ---------------------------------------------------------------------------

/// Errors that can occur while calling an inference service.
///
/// Downstream failures are terminal for the analysis request that triggered
/// them — nothing in this subsystem retries; the user re-records instead.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("service request timed out")]
    Timeout,

    /// The service answered with a non-success HTTP status.
    #[error("service returned HTTP {0}")]
    Status(u16),

    /// The HTTP response could not be parsed as the expected JSON shape.
    #[error("failed to parse service response: {0}")]
    Parse(String),

    /// The service returned a response with no usable content.
    #[error("service returned an empty response")]
    EmptyResponse,
}

impl From<reqwest::Error> for ServiceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ServiceError::Timeout
        } else {
            ServiceError::Request(e.to_string())
        }
    }
}
