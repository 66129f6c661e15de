//! Application entry point — voice emotion analysis from the terminal.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run).
//! 3. Create [`tokio`] runtime (multi-thread, 2 workers).
//! 4. Build the inference service clients from config.
//! 5. Create pipeline channels (`control`, `events`).
//! 6. Spawn the pipeline orchestrator and the event printer on the runtime.
//! 7. Start cpal audio capture feeding the [`Recorder`].
//! 8. Run the stdin command loop — blocks the main thread until quit.
//!
//! # Commands
//!
//! * Enter — start the recording, or stop it and analyse.
//! * `c`   — cancel the current recording.
//! * `q`   — quit.

use std::io::BufRead;
use std::sync::Arc;

use anyhow::Context;
use tokio::sync::mpsc;
use voice_emotion::{
    audio::{AudioCapture, CaptureChunk, Recorder, StreamHandle},
    config::AppConfig,
    pipeline::{new_shared_state, AnalysisEvent, ControlEvent, Orchestrator, SessionState},
    services::{
        EmotionClassifier, HttpEmotionClassifier, HttpTranscriber, HttpTranslator, Transcriber,
        Translator,
    },
};

// ---------------------------------------------------------------------------
// Event printer
// ---------------------------------------------------------------------------

/// Renders pipeline events to stdout until the channel closes.
async fn print_events(mut events_rx: mpsc::Receiver<AnalysisEvent>) {
    while let Some(event) = events_rx.recv().await {
        match event {
            AnalysisEvent::RecordingStarted => {
                println!("● recording… press <Enter> to stop, 'c' to cancel");
            }
            AnalysisEvent::RecordingStopped { duration_secs } => {
                println!("■ captured {duration_secs:.1}s, analysing…");
            }
            AnalysisEvent::Cancelled => {
                println!("✗ recording cancelled");
            }
            AnalysisEvent::Completed(result) => {
                println!(
                    "{} {} ({:.0}% confident)",
                    result.emotion.emoji,
                    result.emotion.display_label,
                    result.emotion.confidence * 100.0
                );
                match serde_json::to_string_pretty(&result) {
                    Ok(json) => println!("{json}"),
                    Err(e) => log::error!("failed to render result: {e}"),
                }
            }
            AnalysisEvent::Failed { message } => {
                println!("! {message}");
            }
            AnalysisEvent::Rejected { reason } => {
                println!("! {reason}");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Audio wiring
// ---------------------------------------------------------------------------

/// Start cpal capture and a pump thread that feeds chunks into the recorder.
///
/// Returns `None` (with a warning) when no input device is usable, so the
/// application still launches on machines without a microphone.
fn start_capture(config: &AppConfig, recorder: Recorder) -> Option<StreamHandle> {
    let capture = match AudioCapture::open(config.audio.input_device.as_deref()) {
        Ok(capture) => capture,
        Err(e) => {
            log::warn!("audio capture unavailable: {e}");
            return None;
        }
    };

    let (chunk_tx, chunk_rx) = std::sync::mpsc::channel::<CaptureChunk>();

    let pump = std::thread::Builder::new()
        .name("audio-pump".into())
        .spawn(move || {
            // The recorder ignores chunks while disarmed, so the pump can
            // run unconditionally for the lifetime of the stream.
            while let Ok(chunk) = chunk_rx.recv() {
                recorder.push(&chunk);
            }
        });
    if let Err(e) = pump {
        log::warn!("failed to spawn audio-pump thread: {e}");
        return None;
    }

    match capture.start(chunk_tx) {
        Ok(handle) => {
            log::info!(
                "audio capture started ({} Hz, {} ch)",
                capture.sample_rate(),
                capture.channels()
            );
            Some(handle)
        }
        Err(e) => {
            log::warn!("failed to start audio stream: {e}");
            None
        }
    }
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> anyhow::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("voice-emotion starting up");

    // 2. Configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("failed to load config ({e}); using defaults");
        AppConfig::default()
    });

    // 3. Tokio runtime (2 workers — the two inference calls run concurrently)
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    // 4. Service clients
    let transcriber: Arc<dyn Transcriber> =
        Arc::new(HttpTranscriber::from_config(&config.transcriber));
    let emotion: Arc<dyn EmotionClassifier> =
        Arc::new(HttpEmotionClassifier::from_config(&config.emotion));
    let translator: Option<Arc<dyn Translator>> = if config.translation.enabled {
        Some(Arc::new(HttpTranslator::from_config(
            &config.translation.service,
        )))
    } else {
        None
    };

    // 5. Channels and shared state
    let (control_tx, control_rx) = mpsc::channel::<ControlEvent>(16);
    let (events_tx, events_rx) = mpsc::channel::<AnalysisEvent>(32);
    let state = new_shared_state(config.clone());
    let recorder = Recorder::new(config.audio.max_recording_secs);

    // 6. Orchestrator and event printer
    let orchestrator = Orchestrator::new(
        Arc::clone(&state),
        recorder.clone(),
        transcriber,
        emotion,
        translator,
        events_tx,
    );
    rt.spawn(orchestrator.run(control_rx));
    rt.spawn(print_events(events_rx));

    // 7. Audio capture — keep the handle alive for the whole session.
    let _stream_handle = start_capture(&config, recorder);

    // 8. stdin command loop
    println!("press <Enter> to record, 'c' to cancel, 'q' to quit");
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = line.context("failed to read stdin")?;
        let command = match line.trim() {
            "q" | "quit" => break,
            "c" | "cancel" => ControlEvent::Cancel,
            _ => {
                // Enter toggles: start when idle, stop when recording.
                let session = state.lock().unwrap().session;
                match session {
                    SessionState::Idle => ControlEvent::Start,
                    SessionState::Recording => ControlEvent::Stop,
                    SessionState::Processing => {
                        println!("… still analysing, one moment");
                        continue;
                    }
                }
            }
        };

        if control_tx.blocking_send(command).is_err() {
            log::error!("pipeline stopped unexpectedly");
            break;
        }
    }

    log::info!("voice-emotion shutting down");
    Ok(())
}
