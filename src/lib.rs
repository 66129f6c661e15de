//! Voice emotion analysis pipeline.
//!
//! Records speech from the microphone, transcodes it to the mono 16 kHz
//! 16-bit PCM WAV container the speech models require, then runs two
//! inference services concurrently: speech-to-text and emotion
//! classification.  Results are aggregated into an [`AnalysisResult`]
//! together with optional translations of the transcript.
//!
//! # Subsystems
//!
//! * [`audio`]    — microphone capture (cpal), recording accumulation, and
//!   the WAV transcoder.
//! * [`services`] — HTTP clients for the transcription, emotion and
//!   translation services.
//! * [`pipeline`] — session state machine and the orchestrator driving one
//!   analysis per recording.
//! * [`config`]   — TOML settings and platform paths.
//!
//! [`AnalysisResult`]: analysis::AnalysisResult

pub mod analysis;
pub mod audio;
pub mod config;
pub mod pipeline;
pub mod services;
