//! Audio subsystem — microphone capture → recording accumulation → transcode.
//!
//! # Pipeline
//!
//! ```text
//! Microphone → cpal callback → CaptureChunk (mpsc) → Recorder (while armed)
//!           → RawAudioBuffer → transcode → PcmWaveform → WAV container
//! ```
//!
//! Capture runs continuously once the stream is open; the [`Recorder`]
//! decides which audio belongs to a session.  All format conversion (channel
//! reduction, resampling, quantization) happens in [`transcode`] after
//! recording stops.

pub mod capture;
pub mod recorder;
pub mod transcode;

pub use capture::{AudioCapture, CaptureChunk, CaptureError, StreamHandle};
pub use recorder::Recorder;
pub use transcode::{
    transcode, PcmWaveform, RawAudioBuffer, TranscodeError, TARGET_SAMPLE_RATE, WAV_HEADER_BYTES,
};
