//! Pipeline orchestrator — drives the capture → transcode → inference →
//! aggregate loop.
//!
//! [`Orchestrator`] owns the [`SharedState`] and responds to
//! [`ControlEvent`]s received over a `tokio::sync::mpsc` channel, emitting
//! [`AnalysisEvent`]s the frontend renders.
//!
//! # Pipeline flow
//!
//! ```text
//! ControlEvent::Start
//!   └─▶ arm recorder, Idle → Recording
//!
//! ControlEvent::Stop
//!   └─▶ Recording → Processing, drain recorder
//!         └─▶ transcode to 16 kHz mono WAV
//!               └─▶ join!(transcriber, emotion classifier)
//!                     ├─ both Ok → optional translation → Completed
//!                     └─ either Err → Failed (no partial results)
//!       Processing → Idle either way
//!
//! ControlEvent::Cancel
//!   └─▶ discard recorder, Recording → Idle
//! ```
//!
//! Invalid control events for the current state (e.g. `Start` while already
//! recording) are answered with [`AnalysisEvent::Rejected`], never ignored.
//!
//! The transcoder is pure CPU work on small buffers and runs inline; the
//! inference calls are async HTTP and run concurrently via `tokio::join!`.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::analysis::AnalysisResult;
use crate::audio::{transcode, RawAudioBuffer, Recorder};
use crate::services::{
    EmotionClassifier, Transcriber, TranslationEntry, Translator, MAX_TARGET_LANGUAGES,
};

use super::state::{SessionState, SharedState};

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Commands sent by the frontend to the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    /// Begin a new recording.
    Start,
    /// End the recording and analyse it.
    Stop,
    /// Abandon the current recording without analysing it.
    Cancel,
}

/// Notifications the orchestrator emits for the frontend.
#[derive(Debug, Clone)]
pub enum AnalysisEvent {
    /// The recorder is armed and capturing.
    RecordingStarted,
    /// The recording ended; analysis is under way.
    RecordingStopped { duration_secs: f32 },
    /// The recording was abandoned at the user's request.
    Cancelled,
    /// Analysis completed with a full result.
    Completed(AnalysisResult),
    /// Analysis failed; no partial result is available.
    Failed { message: String },
    /// A control event was not valid in the current state.
    Rejected { reason: String },
}

// ---------------------------------------------------------------------------
// AnalysisError
// ---------------------------------------------------------------------------

/// Errors that can surface while analysing one recording.
///
/// All variants carry a human-readable description so the frontend can
/// display them without knowing the internal cause.
#[derive(Debug)]
pub enum AnalysisError {
    /// The recorder held no audio when analysis was attempted.
    EmptyAudio,
    /// The captured audio could not be transcoded.
    Transcode(String),
    /// The speech-to-text service failed.
    Transcription(String),
    /// The emotion classification service failed.
    Emotion(String),
}

impl std::fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalysisError::EmptyAudio => write!(f, "No audio captured; record for longer"),
            AnalysisError::Transcode(msg) => write!(f, "Audio transcoding failed: {msg}"),
            AnalysisError::Transcription(msg) => write!(f, "Transcription failed: {msg}"),
            AnalysisError::Emotion(msg) => write!(f, "Emotion classification failed: {msg}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Drives the complete voice analysis pipeline.
///
/// Create with [`Orchestrator::new`], then call [`run`](Self::run) inside a
/// tokio task.  Each analysis is an independent transaction: nothing carries
/// over from one recording to the next except the stored last result.
pub struct Orchestrator {
    state: SharedState,
    recorder: Recorder,
    transcriber: Arc<dyn Transcriber>,
    emotion: Arc<dyn EmotionClassifier>,
    translator: Option<Arc<dyn Translator>>,
    events_tx: mpsc::Sender<AnalysisEvent>,
    session: SessionState,
}

impl Orchestrator {
    /// Create a new orchestrator.
    ///
    /// # Arguments
    ///
    /// * `state`       — shared application state (also read by the frontend).
    /// * `recorder`    — accumulator fed by the capture callback.
    /// * `transcriber` — speech-to-text client.
    /// * `emotion`     — emotion classification client.
    /// * `translator`  — translation client, `None` when translation is
    ///   disabled in config.
    /// * `events_tx`   — channel the frontend listens on.
    pub fn new(
        state: SharedState,
        recorder: Recorder,
        transcriber: Arc<dyn Transcriber>,
        emotion: Arc<dyn EmotionClassifier>,
        translator: Option<Arc<dyn Translator>>,
        events_tx: mpsc::Sender<AnalysisEvent>,
    ) -> Self {
        Self {
            state,
            recorder,
            transcriber,
            emotion,
            translator,
            events_tx,
            session: SessionState::Idle,
        }
    }

    // -----------------------------------------------------------------------
    // Main async loop
    // -----------------------------------------------------------------------

    /// Run the orchestrator until `control_rx` is closed.
    ///
    /// This is an `async fn` and should be spawned as a tokio task from
    /// `main()`.  It never returns while the channel is open.
    pub async fn run(mut self, mut control_rx: mpsc::Receiver<ControlEvent>) {
        while let Some(event) = control_rx.recv().await {
            match event {
                ControlEvent::Start => self.handle_start().await,
                ControlEvent::Stop => self.handle_stop().await,
                ControlEvent::Cancel => self.handle_cancel().await,
            }
        }

        log::info!("pipeline: control channel closed, orchestrator shutting down");
    }

    // -----------------------------------------------------------------------
    // Event handlers
    // -----------------------------------------------------------------------

    /// Handle `Start`: arm the recorder and enter Recording.
    async fn handle_start(&mut self) {
        match self.session.start() {
            Ok(next) => {
                log::debug!("pipeline: Start → Recording");
                self.session = next;
                self.recorder.arm();

                // Block-scope the guard: it must not be live across emit().
                {
                    let mut st = self.state.lock().unwrap();
                    st.session = next;
                    st.recording_secs = 0.0;
                    st.error_message = None;
                }

                self.emit(AnalysisEvent::RecordingStarted).await;
            }
            Err(e) => self.reject(e.to_string()).await,
        }
    }

    /// Handle `Stop`: drain the recorder, analyse, return to Idle.
    async fn handle_stop(&mut self) {
        let next = match self.session.stop() {
            Ok(next) => next,
            Err(e) => {
                self.reject(e.to_string()).await;
                return;
            }
        };
        self.session = next;
        self.set_session(next);

        let buffer = self.recorder.stop();
        let duration_secs = buffer.as_ref().map_or(0.0, RawAudioBuffer::duration_secs);
        {
            let mut st = self.state.lock().unwrap();
            st.recording_secs = duration_secs;
        }
        log::debug!("pipeline: Stop → Processing ({duration_secs:.2}s captured)");
        self.emit(AnalysisEvent::RecordingStopped { duration_secs })
            .await;

        let outcome = match buffer {
            Some(buffer) => self.analyse(buffer).await,
            None => Err(AnalysisError::EmptyAudio),
        };

        match outcome {
            Ok(result) => {
                {
                    let mut st = self.state.lock().unwrap();
                    st.last_result = Some(result.clone());
                }
                self.emit(AnalysisEvent::Completed(result)).await;
            }
            Err(e) => {
                let message = e.to_string();
                log::error!("pipeline error: {message}");
                {
                    let mut st = self.state.lock().unwrap();
                    st.error_message = Some(message.clone());
                }
                self.emit(AnalysisEvent::Failed { message }).await;
            }
        }

        // Result or error received: Processing always returns to Idle.
        self.session = match self.session.finish() {
            Ok(next) => next,
            Err(e) => {
                log::error!("pipeline: {e}");
                SessionState::Idle
            }
        };
        self.set_session(self.session);
    }

    /// Handle `Cancel`: discard the recording, return straight to Idle.
    ///
    /// Modelled as stop-then-finish so the state machine sees only valid
    /// transitions.
    async fn handle_cancel(&mut self) {
        let processing = match self.session.stop() {
            Ok(next) => next,
            Err(e) => {
                self.reject(e.to_string()).await;
                return;
            }
        };
        log::debug!("pipeline: Cancel → discarding recording");
        self.recorder.discard();

        self.session = match processing.finish() {
            Ok(next) => next,
            Err(e) => {
                log::error!("pipeline: {e}");
                SessionState::Idle
            }
        };
        self.set_session(self.session);
        self.emit(AnalysisEvent::Cancelled).await;
    }

    // -----------------------------------------------------------------------
    // Analysis
    // -----------------------------------------------------------------------

    /// Analyse one recording: transcode, run both inference services, then
    /// optionally translate.
    ///
    /// Transcription and classification run concurrently and fail as a unit:
    /// a result is produced only when both succeed.  Translation failures are
    /// tolerated; the result simply omits translations.
    async fn analyse(&self, buffer: RawAudioBuffer) -> Result<AnalysisResult, AnalysisError> {
        let duration_secs = buffer.duration_secs();
        let (target_rate, translation) = {
            let st = self.state.lock().unwrap();
            (
                st.config.audio.target_sample_rate,
                st.config.translation.clone(),
            )
        };

        let waveform = transcode(&buffer, target_rate)
            .map_err(|e| AnalysisError::Transcode(e.to_string()))?;
        let wav = waveform.to_wav_bytes();
        log::debug!(
            "pipeline: transcoded {:.2}s to {} bytes of WAV",
            duration_secs,
            wav.len()
        );

        let (transcription, emotion) = tokio::join!(
            self.transcriber.transcribe(&wav),
            self.emotion.classify(&wav),
        );
        let transcription =
            transcription.map_err(|e| AnalysisError::Transcription(e.to_string()))?;
        let emotion = emotion.map_err(|e| AnalysisError::Emotion(e.to_string()))?;

        log::debug!(
            "pipeline: transcript = {:?} ({}), emotion = {}",
            transcription.text,
            transcription.language,
            emotion.label.as_str()
        );

        let translations = if translation.enabled {
            self.translate(&transcription.text, &transcription.language, translation.target_languages)
                .await
        } else {
            None
        };

        Ok(AnalysisResult::new(
            transcription,
            emotion,
            translations,
            duration_secs,
        ))
    }

    /// Run the optional translation step.  Never fails the analysis: any
    /// error is logged and translations are omitted.
    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        mut targets: Vec<String>,
    ) -> Option<Vec<TranslationEntry>> {
        let translator = self.translator.as_ref()?;

        if targets.len() > MAX_TARGET_LANGUAGES {
            log::warn!(
                "pipeline: {} target languages configured, using the first {}",
                targets.len(),
                MAX_TARGET_LANGUAGES
            );
            targets.truncate(MAX_TARGET_LANGUAGES);
        }

        match translator.translate(text, source_language, &targets).await {
            Ok(entries) if entries.is_empty() => None,
            Ok(entries) => Some(entries),
            Err(e) => {
                log::warn!("pipeline: translation failed ({e}), omitting translations");
                None
            }
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn set_session(&self, session: SessionState) {
        let mut st = self.state.lock().unwrap();
        st.session = session;
    }

    async fn emit(&self, event: AnalysisEvent) {
        // A closed event channel means the frontend is gone; keep draining
        // control events regardless.
        let _ = self.events_tx.send(event).await;
    }

    async fn reject(&self, reason: String) {
        log::warn!("pipeline: rejected control event: {reason}");
        self.emit(AnalysisEvent::Rejected { reason }).await;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::CaptureChunk;
    use crate::config::AppConfig;
    use crate::pipeline::state::new_shared_state;
    use crate::services::emotion::MockEmotionClassifier;
    use crate::services::transcriber::MockTranscriber;
    use crate::services::translator::MockTranslator;
    use crate::services::Emotion;

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    /// One second of quiet mono audio at 16 kHz.
    fn one_second_chunk() -> CaptureChunk {
        CaptureChunk {
            samples: vec![0.01f32; 16_000],
            sample_rate: 16_000,
            channels: 1,
        }
    }

    struct Harness {
        control_tx: mpsc::Sender<ControlEvent>,
        events_rx: mpsc::Receiver<AnalysisEvent>,
        recorder: Recorder,
        state: SharedState,
    }

    fn spawn_orchestrator(
        config: AppConfig,
        transcriber: Arc<dyn Transcriber>,
        emotion: Arc<dyn EmotionClassifier>,
        translator: Option<Arc<dyn Translator>>,
    ) -> Harness {
        let (control_tx, control_rx) = mpsc::channel(8);
        let (events_tx, events_rx) = mpsc::channel(8);
        let state = new_shared_state(config);
        let recorder = Recorder::new(60.0);

        let orc = Orchestrator::new(
            Arc::clone(&state),
            recorder.clone(),
            transcriber,
            emotion,
            translator,
            events_tx,
        );
        tokio::spawn(orc.run(control_rx));

        Harness {
            control_tx,
            events_rx,
            recorder,
            state,
        }
    }

    fn default_harness() -> Harness {
        spawn_orchestrator(
            AppConfig::default(),
            Arc::new(MockTranscriber::ok("hello there", "en")),
            Arc::new(MockEmotionClassifier::ok(Emotion::Happy)),
            None,
        )
    }

    /// Drive a full start → capture → stop cycle and return the terminal
    /// event (Completed or Failed).
    async fn run_cycle(h: &mut Harness) -> AnalysisEvent {
        h.control_tx.send(ControlEvent::Start).await.unwrap();
        assert!(matches!(
            h.events_rx.recv().await.unwrap(),
            AnalysisEvent::RecordingStarted
        ));

        h.recorder.push(&one_second_chunk());

        h.control_tx.send(ControlEvent::Stop).await.unwrap();
        assert!(matches!(
            h.events_rx.recv().await.unwrap(),
            AnalysisEvent::RecordingStopped { .. }
        ));

        h.events_rx.recv().await.unwrap()
    }

    // -----------------------------------------------------------------------
    // Tests
    // -----------------------------------------------------------------------

    /// The orchestrator future must be `Send` so it can be spawned onto a
    /// multi-thread runtime; a `MutexGuard` held across an await would
    /// break this.
    #[test]
    fn orchestrator_future_is_send() {
        fn assert_send<T: Send>(_: &T) {}

        let (_control_tx, control_rx) = mpsc::channel(1);
        let (events_tx, _events_rx) = mpsc::channel(1);
        let orc = Orchestrator::new(
            new_shared_state(AppConfig::default()),
            Recorder::new(60.0),
            Arc::new(MockTranscriber::ok("hello", "en")),
            Arc::new(MockEmotionClassifier::ok(Emotion::Neutral)),
            None,
            events_tx,
        );

        assert_send(&orc.run(control_rx));
    }

    #[tokio::test]
    async fn start_enters_recording_state() {
        let mut h = default_harness();

        h.control_tx.send(ControlEvent::Start).await.unwrap();
        assert!(matches!(
            h.events_rx.recv().await.unwrap(),
            AnalysisEvent::RecordingStarted
        ));

        let st = h.state.lock().unwrap();
        assert_eq!(st.session, SessionState::Recording);
        assert!(h.recorder.is_armed());
    }

    #[tokio::test]
    async fn full_cycle_produces_result() {
        let mut h = default_harness();
        let event = run_cycle(&mut h).await;

        let result = match event {
            AnalysisEvent::Completed(result) => result,
            other => panic!("expected Completed, got {other:?}"),
        };
        assert_eq!(result.transcript, "hello there");
        assert_eq!(result.language, "en");
        assert_eq!(result.emotion.label, Emotion::Happy);
        assert!(result.translations.is_none());
        assert!(result.duration_secs > 0.9);

        let st = h.state.lock().unwrap();
        assert_eq!(st.session, SessionState::Idle);
        assert!(st.last_result.is_some());
        assert!(st.error_message.is_none());
    }

    /// Starting while already recording must be rejected, not ignored, and
    /// must not disturb the recording in progress.
    #[tokio::test]
    async fn start_while_recording_is_rejected() {
        let mut h = default_harness();

        h.control_tx.send(ControlEvent::Start).await.unwrap();
        assert!(matches!(
            h.events_rx.recv().await.unwrap(),
            AnalysisEvent::RecordingStarted
        ));

        h.control_tx.send(ControlEvent::Start).await.unwrap();
        match h.events_rx.recv().await.unwrap() {
            AnalysisEvent::Rejected { reason } => assert!(reason.contains("Recording")),
            other => panic!("expected Rejected, got {other:?}"),
        }

        let st = h.state.lock().unwrap();
        assert_eq!(st.session, SessionState::Recording);
    }

    #[tokio::test]
    async fn stop_while_idle_is_rejected() {
        let mut h = default_harness();

        h.control_tx.send(ControlEvent::Stop).await.unwrap();
        assert!(matches!(
            h.events_rx.recv().await.unwrap(),
            AnalysisEvent::Rejected { .. }
        ));

        let st = h.state.lock().unwrap();
        assert_eq!(st.session, SessionState::Idle);
    }

    #[tokio::test]
    async fn cancel_discards_recording() {
        let mut h = default_harness();

        h.control_tx.send(ControlEvent::Start).await.unwrap();
        assert!(matches!(
            h.events_rx.recv().await.unwrap(),
            AnalysisEvent::RecordingStarted
        ));
        h.recorder.push(&one_second_chunk());

        h.control_tx.send(ControlEvent::Cancel).await.unwrap();
        assert!(matches!(
            h.events_rx.recv().await.unwrap(),
            AnalysisEvent::Cancelled
        ));

        let st = h.state.lock().unwrap();
        assert_eq!(st.session, SessionState::Idle);
        assert!(st.last_result.is_none());
        assert!(!h.recorder.is_armed());
    }

    #[tokio::test]
    async fn cancel_while_idle_is_rejected() {
        let mut h = default_harness();

        h.control_tx.send(ControlEvent::Cancel).await.unwrap();
        assert!(matches!(
            h.events_rx.recv().await.unwrap(),
            AnalysisEvent::Rejected { .. }
        ));
    }

    /// Stopping with no captured audio must fail before any service call.
    #[tokio::test]
    async fn empty_recording_fails() {
        let mut h = default_harness();

        h.control_tx.send(ControlEvent::Start).await.unwrap();
        assert!(matches!(
            h.events_rx.recv().await.unwrap(),
            AnalysisEvent::RecordingStarted
        ));
        // No chunks pushed.
        h.control_tx.send(ControlEvent::Stop).await.unwrap();
        assert!(matches!(
            h.events_rx.recv().await.unwrap(),
            AnalysisEvent::RecordingStopped { .. }
        ));

        match h.events_rx.recv().await.unwrap() {
            AnalysisEvent::Failed { message } => assert!(message.contains("No audio")),
            other => panic!("expected Failed, got {other:?}"),
        }

        let st = h.state.lock().unwrap();
        assert_eq!(st.session, SessionState::Idle);
        assert!(st.error_message.is_some());
    }

    /// When transcription fails, no partial result may appear even though
    /// classification succeeded.
    #[tokio::test]
    async fn transcription_failure_yields_no_partial_result() {
        let mut h = spawn_orchestrator(
            AppConfig::default(),
            Arc::new(MockTranscriber::err("connection refused")),
            Arc::new(MockEmotionClassifier::ok(Emotion::Sad)),
            None,
        );

        let event = run_cycle(&mut h).await;
        assert!(matches!(event, AnalysisEvent::Failed { .. }));

        let st = h.state.lock().unwrap();
        assert!(st.last_result.is_none());
        assert!(st.error_message.is_some());
    }

    /// When classification fails, the transcript alone is not a result.
    #[tokio::test]
    async fn classification_failure_yields_no_partial_result() {
        let mut h = spawn_orchestrator(
            AppConfig::default(),
            Arc::new(MockTranscriber::ok("hello", "en")),
            Arc::new(MockEmotionClassifier::err("model not loaded")),
            None,
        );

        let event = run_cycle(&mut h).await;
        match event {
            AnalysisEvent::Failed { message } => {
                assert!(message.contains("Emotion classification"))
            }
            other => panic!("expected Failed, got {other:?}"),
        }

        let st = h.state.lock().unwrap();
        assert!(st.last_result.is_none());
    }

    #[tokio::test]
    async fn translation_attaches_entries() {
        let mut config = AppConfig::default();
        config.translation.enabled = true;
        config.translation.target_languages = vec!["es".into(), "fr".into()];

        let mut h = spawn_orchestrator(
            config,
            Arc::new(MockTranscriber::ok("hello", "en")),
            Arc::new(MockEmotionClassifier::ok(Emotion::Neutral)),
            Some(Arc::new(MockTranslator::ok())),
        );

        let event = run_cycle(&mut h).await;
        let result = match event {
            AnalysisEvent::Completed(result) => result,
            other => panic!("expected Completed, got {other:?}"),
        };

        let translations = result.translations.expect("translations present");
        assert_eq!(translations.len(), 2);
        assert_eq!(translations[0].language_code, "es");
        assert_eq!(translations[0].text, "[es] hello");
    }

    /// A translation failure must not fail the analysis; the result merely
    /// omits translations.
    #[tokio::test]
    async fn translation_failure_is_tolerated() {
        let mut config = AppConfig::default();
        config.translation.enabled = true;
        config.translation.target_languages = vec!["es".into()];

        let mut h = spawn_orchestrator(
            config,
            Arc::new(MockTranscriber::ok("hello", "en")),
            Arc::new(MockEmotionClassifier::ok(Emotion::Angry)),
            Some(Arc::new(MockTranslator::failing())),
        );

        let event = run_cycle(&mut h).await;
        let result = match event {
            AnalysisEvent::Completed(result) => result,
            other => panic!("expected Completed, got {other:?}"),
        };
        assert!(result.translations.is_none());
    }

    /// More targets than the cap: only the first five are translated.
    #[tokio::test]
    async fn excess_translation_targets_are_truncated() {
        let mut config = AppConfig::default();
        config.translation.enabled = true;
        config.translation.target_languages = vec![
            "es".into(),
            "fr".into(),
            "de".into(),
            "it".into(),
            "pt".into(),
            "ja".into(),
            "ko".into(),
        ];

        let mut h = spawn_orchestrator(
            config,
            Arc::new(MockTranscriber::ok("hello", "en")),
            Arc::new(MockEmotionClassifier::ok(Emotion::Neutral)),
            Some(Arc::new(MockTranslator::ok())),
        );

        let event = run_cycle(&mut h).await;
        let result = match event {
            AnalysisEvent::Completed(result) => result,
            other => panic!("expected Completed, got {other:?}"),
        };

        let translations = result.translations.expect("translations present");
        assert_eq!(translations.len(), MAX_TARGET_LANGUAGES);
        assert_eq!(translations.last().unwrap().language_code, "pt");
    }

    /// A silent recording (empty transcript) still completes with an empty
    /// transcript rather than failing.
    #[tokio::test]
    async fn silent_recording_completes_with_empty_transcript() {
        let mut h = spawn_orchestrator(
            AppConfig::default(),
            Arc::new(MockTranscriber::ok("", "en")),
            Arc::new(MockEmotionClassifier::ok(Emotion::Neutral)),
            None,
        );

        let event = run_cycle(&mut h).await;
        let result = match event {
            AnalysisEvent::Completed(result) => result,
            other => panic!("expected Completed, got {other:?}"),
        };
        assert!(result.is_silent());
    }

    /// Back-to-back cycles are independent transactions.
    #[tokio::test]
    async fn consecutive_cycles_are_independent() {
        let mut h = default_harness();

        let first = run_cycle(&mut h).await;
        assert!(matches!(first, AnalysisEvent::Completed(_)));

        let second = run_cycle(&mut h).await;
        let result = match second {
            AnalysisEvent::Completed(result) => result,
            other => panic!("expected Completed, got {other:?}"),
        };
        // Duration reflects only the second recording.
        assert!(result.duration_secs < 1.1);
    }
}
