//! Emotion classification boundary.
//!
//! The emotion service consumes the WAV container and returns a probability
//! distribution over a fixed set of seven labels.  [`HttpEmotionClassifier`]
//! is the production client; the response-shaping logic lives in
//! [`EmotionScore::from_response`] so it can be tested without a server.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::ServiceConfig;
use crate::services::ServiceError;

/// Tolerance for checking that a probability distribution sums to 1.0.
const PROBABILITY_SUM_TOLERANCE: f32 = 1e-3;

// ---------------------------------------------------------------------------
// Emotion
// ---------------------------------------------------------------------------

/// The fixed seven-label set the classifier distinguishes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Angry,
    Disgust,
    Fearful,
    Happy,
    Neutral,
    Sad,
    Surprised,
}

impl Emotion {
    /// All seven labels, in a stable order.
    pub const ALL: [Emotion; 7] = [
        Emotion::Angry,
        Emotion::Disgust,
        Emotion::Fearful,
        Emotion::Happy,
        Emotion::Neutral,
        Emotion::Sad,
        Emotion::Surprised,
    ];

    /// Lowercase wire label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Angry => "angry",
            Emotion::Disgust => "disgust",
            Emotion::Fearful => "fearful",
            Emotion::Happy => "happy",
            Emotion::Neutral => "neutral",
            Emotion::Sad => "sad",
            Emotion::Surprised => "surprised",
        }
    }

    /// Parse a wire label, case-insensitively.
    pub fn from_label(label: &str) -> Option<Emotion> {
        match label.to_ascii_lowercase().as_str() {
            "angry" => Some(Emotion::Angry),
            "disgust" => Some(Emotion::Disgust),
            "fearful" => Some(Emotion::Fearful),
            "happy" => Some(Emotion::Happy),
            "neutral" => Some(Emotion::Neutral),
            "sad" => Some(Emotion::Sad),
            "surprised" => Some(Emotion::Surprised),
            _ => None,
        }
    }

    /// Capitalized label for display.
    pub fn display_label(&self) -> &'static str {
        match self {
            Emotion::Angry => "Angry",
            Emotion::Disgust => "Disgust",
            Emotion::Fearful => "Fearful",
            Emotion::Happy => "Happy",
            Emotion::Neutral => "Neutral",
            Emotion::Sad => "Sad",
            Emotion::Surprised => "Surprised",
        }
    }

    /// Emoji shown next to the label.
    pub fn emoji(&self) -> &'static str {
        match self {
            Emotion::Angry => "😠",
            Emotion::Disgust => "🤢",
            Emotion::Fearful => "😨",
            Emotion::Happy => "😊",
            Emotion::Neutral => "😐",
            Emotion::Sad => "😢",
            Emotion::Surprised => "😲",
        }
    }

    /// Accent color (hex) used by the presentation layer.
    pub fn color(&self) -> &'static str {
        match self {
            Emotion::Angry => "#ff6b6b",
            Emotion::Disgust => "#a9e34b",
            Emotion::Fearful => "#9775fa",
            Emotion::Happy => "#51cf66",
            Emotion::Neutral => "#868e96",
            Emotion::Sad => "#748ffc",
            Emotion::Surprised => "#ffd43b",
        }
    }
}

// ---------------------------------------------------------------------------
// EmotionScore
// ---------------------------------------------------------------------------

/// The classifier's verdict: primary label, its confidence, and the full
/// distribution (entries sum to 1.0 within tolerance).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmotionScore {
    /// Primary emotion label.
    pub label: Emotion,
    /// Display metadata for the primary label.
    pub display_label: &'static str,
    pub emoji: &'static str,
    pub color: &'static str,
    /// Probability of the primary label.
    pub confidence: f32,
    /// Full label → probability mapping.
    pub probabilities: BTreeMap<Emotion, f32>,
}

/// Raw wire shape returned by the emotion service.
#[derive(Debug, Clone, Deserialize)]
pub struct EmotionResponse {
    pub label: String,
    pub confidence: f32,
    pub probabilities: BTreeMap<String, f32>,
}

impl EmotionScore {
    /// Validate and shape a wire response into an [`EmotionScore`].
    ///
    /// Rejects (as [`ServiceError::Parse`]) responses with unknown or
    /// missing labels, a distribution that does not sum to 1.0 within
    /// tolerance, or a reported label/confidence that disagrees with the
    /// distribution's argmax.
    pub fn from_response(response: EmotionResponse) -> Result<Self, ServiceError> {
        let label = Emotion::from_label(&response.label)
            .ok_or_else(|| ServiceError::Parse(format!("unknown emotion label {:?}", response.label)))?;

        let mut probabilities = BTreeMap::new();
        for (key, p) in &response.probabilities {
            let emotion = Emotion::from_label(key).ok_or_else(|| {
                ServiceError::Parse(format!("unknown emotion label {key:?} in distribution"))
            })?;
            probabilities.insert(emotion, *p);
        }

        if probabilities.len() != Emotion::ALL.len() {
            return Err(ServiceError::Parse(format!(
                "distribution has {} labels, expected {}",
                probabilities.len(),
                Emotion::ALL.len()
            )));
        }

        let sum: f32 = probabilities.values().sum();
        if (sum - 1.0).abs() > PROBABILITY_SUM_TOLERANCE {
            return Err(ServiceError::Parse(format!(
                "probabilities sum to {sum}, expected 1.0"
            )));
        }

        let (&argmax, &top) = probabilities
            .iter()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .ok_or(ServiceError::EmptyResponse)?;

        if argmax != label || (response.confidence - top).abs() > PROBABILITY_SUM_TOLERANCE {
            return Err(ServiceError::Parse(format!(
                "label {:?} (confidence {}) disagrees with distribution argmax {:?} ({top})",
                response.label, response.confidence, argmax
            )));
        }

        Ok(Self {
            label,
            display_label: label.display_label(),
            emoji: label.emoji(),
            color: label.color(),
            confidence: response.confidence,
            probabilities,
        })
    }
}

// ---------------------------------------------------------------------------
// EmotionClassifier trait
// ---------------------------------------------------------------------------

/// Object-safe, thread-safe interface to the emotion service.
///
/// `wav` is the canonical mono 16 kHz container produced by
/// [`transcode`](crate::audio::transcode).
#[async_trait]
pub trait EmotionClassifier: Send + Sync {
    async fn classify(&self, wav: &[u8]) -> Result<EmotionScore, ServiceError>;
}

// ---------------------------------------------------------------------------
// HttpEmotionClassifier
// ---------------------------------------------------------------------------

/// Production client that POSTs the container to `{base_url}/classify`.
pub struct HttpEmotionClassifier {
    client: reqwest::Client,
    config: ServiceConfig,
}

impl HttpEmotionClassifier {
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
impl EmotionClassifier for HttpEmotionClassifier {
    async fn classify(&self, wav: &[u8]) -> Result<EmotionScore, ServiceError> {
        let url = format!("{}/classify", self.config.base_url);

        let mut req = self
            .client
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "audio/wav")
            .body(wav.to_vec());

        // Attach Authorization header only when api_key is a non-empty string.
        let key = self.config.api_key.as_deref().unwrap_or("");
        if !key.is_empty() {
            req = req.bearer_auth(key);
        }

        let response = req.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::Status(status.as_u16()));
        }

        let wire: EmotionResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::Parse(e.to_string()))?;

        EmotionScore::from_response(wire)
    }
}

// ---------------------------------------------------------------------------
// MockEmotionClassifier  (test-only)
// ---------------------------------------------------------------------------

/// Test double returning a fixed score (or error) without any HTTP.
#[cfg(test)]
pub struct MockEmotionClassifier {
    response: Result<EmotionScore, String>,
}

#[cfg(test)]
impl MockEmotionClassifier {
    /// A mock that reports `label` with 90% confidence and spreads the rest
    /// of the probability mass evenly.
    pub fn ok(label: Emotion) -> Self {
        Self {
            response: Ok(uniform_score(label, 0.9)),
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            response: Err(message.into()),
        }
    }
}

#[cfg(test)]
impl Default for MockEmotionClassifier {
    fn default() -> Self {
        Self::ok(Emotion::Neutral)
    }
}

#[cfg(test)]
#[async_trait]
impl EmotionClassifier for MockEmotionClassifier {
    async fn classify(&self, _wav: &[u8]) -> Result<EmotionScore, ServiceError> {
        match &self.response {
            Ok(score) => Ok(score.clone()),
            Err(msg) => Err(ServiceError::Request(msg.clone())),
        }
    }
}

/// Build a valid score with `confidence` on `label` and the remainder split
/// evenly over the other six labels.
#[cfg(test)]
pub fn uniform_score(label: Emotion, confidence: f32) -> EmotionScore {
    let rest = (1.0 - confidence) / 6.0;
    let probabilities: BTreeMap<Emotion, f32> = Emotion::ALL
        .iter()
        .map(|&e| (e, if e == label { confidence } else { rest }))
        .collect();

    EmotionScore {
        label,
        display_label: label.display_label(),
        emoji: label.emoji(),
        color: label.color(),
        confidence,
        probabilities,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
