//! The aggregated result of one completed voice analysis.

use serde::Serialize;

use crate::services::{EmotionScore, TranslationEntry, Transcription};

/// Everything the pipeline produced for one recording: the transcript, the
/// emotion classification and any translations that were requested.
///
/// Serialises to the JSON shape the terminal frontend renders.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    /// The recognised speech, trimmed.  Empty when the recording contained
    /// no recognisable speech.
    pub transcript: String,
    /// ISO-639-1 code of the detected spoken language.
    pub language: String,
    /// Human-readable name for `language`, when it is a known code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language_name: Option<String>,
    /// Classified emotion with per-class probabilities.
    pub emotion: EmotionScore,
    /// Translations of the transcript, present only when translation was
    /// enabled and succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translations: Option<Vec<TranslationEntry>>,
    /// Length of the analysed recording in seconds.
    pub duration_secs: f32,
}

impl AnalysisResult {
    /// Assemble a result from the individual service outputs.
    pub fn new(
        transcription: Transcription,
        emotion: EmotionScore,
        translations: Option<Vec<TranslationEntry>>,
        duration_secs: f32,
    ) -> Self {
        Self {
            transcript: transcription.text,
            language: transcription.language,
            language_name: transcription.language_name,
            emotion,
            translations,
            duration_secs,
        }
    }

    /// True when speech recognition produced no text at all.
    pub fn is_silent(&self) -> bool {
        self.transcript.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::emotion::uniform_score;
    use crate::services::Emotion;

    fn transcription(text: &str) -> Transcription {
        Transcription {
            text: text.to_string(),
            language: "en".to_string(),
            language_name: Some("English".to_string()),
        }
    }

    #[test]
    fn assembles_fields() {
        let result = AnalysisResult::new(
            transcription("hello there"),
            uniform_score(Emotion::Happy, 0.9),
            None,
            1.5,
        );

        assert_eq!(result.transcript, "hello there");
        assert_eq!(result.language, "en");
        assert_eq!(result.language_name.as_deref(), Some("English"));
        assert_eq!(result.emotion.label, Emotion::Happy);
        assert!(result.translations.is_none());
        assert!(!result.is_silent());
    }

    #[test]
    fn empty_transcript_is_silent() {
        let result = AnalysisResult::new(
            transcription(""),
            uniform_score(Emotion::Neutral, 0.5),
            None,
            0.3,
        );
        assert!(result.is_silent());
    }

    #[test]
    fn serialises_without_null_translations() {
        let result = AnalysisResult::new(
            transcription("hola"),
            uniform_score(Emotion::Surprised, 0.7),
            None,
            2.0,
        );
        let json = serde_json::to_string(&result).expect("serialise");
        assert!(!json.contains("translations"));
        assert!(json.contains("\"transcript\":\"hola\""));
    }
}
