//! Session state machine and shared application state.
//!
//! [`SessionState`] is an explicit finite-state-machine value: every
//! transition is a method that either returns the next state or a
//! [`StateError`].  Nothing mutates state ambiently — the orchestrator owns
//! the current value and threads it through the event loop.
//!
//! [`AppState`] holds what the frontend renders: current session phase, the
//! last analysis result, config snapshot, and any error message.
//!
//! [`SharedState`] is a type alias for `Arc<Mutex<AppState>>` — cheap to
//! clone and safe to share across threads.

use std::sync::{Arc, Mutex};

use thiserror::Error;

use crate::analysis::AnalysisResult;
use crate::config::AppConfig;

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// States of one analysis session.
///
/// The only valid transitions are:
///
/// ```text
/// Idle ──start──▶ Recording ──stop──▶ Processing ──finish──▶ Idle
/// ```
///
/// `finish` fires whether the analysis produced a result or an error.
/// Anything else — in particular starting while already recording or
/// processing — is rejected with a [`StateError`], never silently ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for the user to start a recording.
    Idle,

    /// Microphone is active; audio is accumulating in the recorder.
    Recording,

    /// Recording has ended; transcoding and the inference services are
    /// running.
    Processing,
}

impl SessionState {
    /// Begin a recording.  Valid only from `Idle`.
    pub fn start(self) -> Result<Self, StateError> {
        match self {
            SessionState::Idle => Ok(SessionState::Recording),
            other => Err(StateError::InvalidTransition {
                action: "start recording",
                state: other,
            }),
        }
    }

    /// End the recording and begin processing.  Valid only from `Recording`.
    pub fn stop(self) -> Result<Self, StateError> {
        match self {
            SessionState::Recording => Ok(SessionState::Processing),
            other => Err(StateError::InvalidTransition {
                action: "stop recording",
                state: other,
            }),
        }
    }

    /// Processing delivered a result or an error; return to `Idle`.  Valid
    /// only from `Processing`.
    pub fn finish(self) -> Result<Self, StateError> {
        match self {
            SessionState::Processing => Ok(SessionState::Idle),
            other => Err(StateError::InvalidTransition {
                action: "finish processing",
                state: other,
            }),
        }
    }

    /// Returns `true` while a recording or analysis is in flight.
    ///
    /// ```
    /// use voice_emotion::pipeline::SessionState;
    ///
    /// assert!(!SessionState::Idle.is_busy());
    /// assert!(SessionState::Recording.is_busy());
    /// assert!(SessionState::Processing.is_busy());
    /// ```
    pub fn is_busy(&self) -> bool {
        matches!(self, SessionState::Recording | SessionState::Processing)
    }

    /// A short human-readable label suitable for a status line.
    pub fn label(&self) -> &'static str {
        match self {
            SessionState::Idle => "Idle",
            SessionState::Recording => "Recording",
            SessionState::Processing => "Processing",
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        SessionState::Idle
    }
}

// ---------------------------------------------------------------------------
// StateError
// ---------------------------------------------------------------------------

/// A transition was requested that the state machine does not allow.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StateError {
    /// The requested action is not valid in the current state.
    #[error("cannot {action} while {state:?}")]
    InvalidTransition {
        action: &'static str,
        state: SessionState,
    },
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

/// Shared application state — the single source of truth for the frontend.
///
/// Held behind [`SharedState`] (`Arc<Mutex<AppState>>`).  The pipeline
/// orchestrator mutates it; the frontend reads it to render.
pub struct AppState {
    /// Current phase of the analysis session.
    pub session: SessionState,

    /// The most recent completed analysis.
    ///
    /// `None` until at least one analysis has completed.
    pub last_result: Option<AnalysisResult>,

    /// Current application configuration.
    pub config: AppConfig,

    /// Error message from the most recent failed analysis, cleared when a
    /// new recording starts.
    pub error_message: Option<String>,

    /// Duration of the current recording in seconds.
    ///
    /// Reset to `0.0` when a new recording starts; updated by the audio
    /// accumulation loop.
    pub recording_secs: f32,
}

impl AppState {
    /// Create a new `AppState` with sensible defaults.
    pub fn new(config: AppConfig) -> Self {
        Self {
            session: SessionState::Idle,
            last_result: None,
            config,
            error_message: None,
            recording_secs: 0.0,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

// ---------------------------------------------------------------------------
// SharedState
// ---------------------------------------------------------------------------

/// Thread-safe handle to [`AppState`].
///
/// Cheap to clone (`Arc` clone).  Lock with `.lock().unwrap()` for a short
/// critical section; do **not** hold the lock across `.await` points.
pub type SharedState = Arc<Mutex<AppState>>;

/// Construct a new [`SharedState`] wrapping a default [`AppState`].
pub fn new_shared_state(config: AppConfig) -> SharedState {
    Arc::new(Mutex::new(AppState::new(config)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
