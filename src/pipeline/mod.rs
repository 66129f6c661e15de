//! Pipeline orchestration for voice emotion analysis.
//!
//! This module wires the full capture → transcode → inference → aggregate
//! pipeline and exposes the shared state that the frontend reads.
//!
//! # Architecture
//!
//! ```text
//! ControlEvent (mpsc)
//!        │
//!        ▼
//! Orchestrator::run()  ← async tokio task
//!        │
//!        ├─ Start  → arm Recorder, Idle → Recording
//!        │
//!        ├─ Stop   → Recording → Processing
//!        │             ├─ drain Recorder, transcode to 16 kHz mono WAV
//!        │             ├─ join!(Transcriber, EmotionClassifier)
//!        │             ├─ [enabled] Translator::translate
//!        │             └─ Completed / Failed, Processing → Idle
//!        │
//!        └─ Cancel → discard Recorder, Recording → Idle
//!        │
//!        ▼
//! AnalysisEvent (mpsc) ──▶ frontend
//!
//! SharedState (Arc<Mutex<AppState>>) ←─── read by the frontend
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tokio::sync::mpsc;
//! use voice_emotion::audio::Recorder;
//! use voice_emotion::config::AppConfig;
//! use voice_emotion::pipeline::{new_shared_state, ControlEvent, Orchestrator};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::default();
//!     let shared_state = new_shared_state(config.clone());
//!     let recorder = Recorder::new(config.audio.max_recording_secs);
//!
//!     // (service clients constructed from config)
//!     # use voice_emotion::services::{EmotionClassifier, Transcriber};
//!     # fn make_transcriber() -> Arc<dyn Transcriber> { unimplemented!() }
//!     # fn make_classifier() -> Arc<dyn EmotionClassifier> { unimplemented!() }
//!
//!     let (control_tx, control_rx) = mpsc::channel(16);
//!     let (events_tx, events_rx) = mpsc::channel(16);
//!     let orchestrator = Orchestrator::new(
//!         shared_state.clone(),
//!         recorder.clone(),
//!         make_transcriber(),
//!         make_classifier(),
//!         None,
//!         events_tx,
//!     );
//!
//!     tokio::spawn(async move { orchestrator.run(control_rx).await });
//!
//!     // control_tx is driven by the frontend; events_rx is rendered by it.
//! }
//! ```

pub mod runner;
pub mod state;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use runner::{AnalysisError, AnalysisEvent, ControlEvent, Orchestrator};
pub use state::{new_shared_state, AppState, SessionState, SharedState, StateError};
