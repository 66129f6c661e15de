//! Recording accumulator between capture start and stop.
//!
//! The cpal callback delivers [`CaptureChunk`]s continuously while the
//! stream is open; [`Recorder`] collects them only while armed and turns the
//! accumulated audio into a single [`RawAudioBuffer`] when recording stops.
//! This replaces callback-driven completion with three explicit calls:
//!
//! * [`arm`](Recorder::arm) — clear leftovers and begin accumulating.
//! * [`stop`](Recorder::stop) — finish and hand back the captured buffer.
//! * [`discard`](Recorder::discard) — cancel, dropping the in-progress audio.
//!
//! The recorder is cheap to clone (`Arc` clone) and safe to share between
//! the capture thread and the pipeline orchestrator.

use std::sync::{Arc, Mutex};

use crate::audio::capture::CaptureChunk;
use crate::audio::transcode::RawAudioBuffer;

// ---------------------------------------------------------------------------
// Recorder
// ---------------------------------------------------------------------------

/// Thread-safe accumulator for in-progress recordings.
///
/// Chunks pushed while the recorder is not armed are ignored.  Accumulation
/// is capped at `max_recording_secs`; once the cap is reached further chunks
/// are dropped (with a single warning) so a stuck session cannot grow
/// without bound.
#[derive(Clone)]
pub struct Recorder {
    inner: Arc<Mutex<Inner>>,
}

struct Inner {
    samples: Vec<f32>,
    sample_rate: u32,
    channels: u16,
    armed: bool,
    max_recording_secs: f32,
    overflow_warned: bool,
}

impl Recorder {
    /// Create a recorder that keeps at most `max_recording_secs` of audio.
    pub fn new(max_recording_secs: f32) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                samples: Vec::new(),
                sample_rate: 0,
                channels: 0,
                armed: false,
                max_recording_secs,
                overflow_warned: false,
            })),
        }
    }

    /// Begin a new recording: discard any leftover audio and start
    /// accumulating incoming chunks.
    pub fn arm(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.samples.clear();
        inner.sample_rate = 0;
        inner.channels = 0;
        inner.armed = true;
        inner.overflow_warned = false;
    }

    /// Append a capture chunk if the recorder is armed.
    ///
    /// The first chunk of a recording fixes the sample rate and channel
    /// count; later chunks with a different format (device change mid
    /// recording) are dropped with a warning rather than corrupting the
    /// buffer.
    pub fn push(&self, chunk: &CaptureChunk) {
        let mut inner = self.inner.lock().unwrap();
        if !inner.armed {
            return;
        }

        if inner.samples.is_empty() {
            inner.sample_rate = chunk.sample_rate;
            inner.channels = chunk.channels;
        } else if inner.sample_rate != chunk.sample_rate || inner.channels != chunk.channels {
            log::warn!(
                "dropping capture chunk with mismatched format ({} Hz / {} ch, recording at {} Hz / {} ch)",
                chunk.sample_rate,
                chunk.channels,
                inner.sample_rate,
                inner.channels
            );
            return;
        }

        let max_samples = (inner.max_recording_secs
            * chunk.sample_rate as f32
            * chunk.channels as f32) as usize;
        let room = max_samples.saturating_sub(inner.samples.len());

        // Truncate to whole frames only; a mid-frame cut would break the
        // interleave invariant and lose the whole recording at stop().
        let mut take = room.min(chunk.samples.len());
        take -= take % chunk.channels as usize;

        if take == 0 {
            if !inner.overflow_warned {
                log::warn!(
                    "recording reached the {} s cap; further audio is dropped",
                    inner.max_recording_secs
                );
                inner.overflow_warned = true;
            }
            return;
        }

        inner.samples.extend_from_slice(&chunk.samples[..take]);
    }

    /// Stop recording and take the accumulated audio.
    ///
    /// Returns `None` when nothing was captured.  After this call the
    /// recorder is disarmed and empty.
    pub fn stop(&self) -> Option<RawAudioBuffer> {
        let mut inner = self.inner.lock().unwrap();
        inner.armed = false;

        if inner.samples.is_empty() {
            return None;
        }

        let samples = std::mem::take(&mut inner.samples);
        match RawAudioBuffer::new(samples, inner.sample_rate, inner.channels) {
            Ok(buffer) => Some(buffer),
            Err(e) => {
                // Chunks are whole frames, so this indicates a capture bug.
                log::error!("discarding corrupt recording: {e}");
                None
            }
        }
    }

    /// Cancel an in-progress recording, dropping everything captured so far.
    pub fn discard(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.armed = false;
        inner.samples.clear();
    }

    /// Returns `true` while the recorder is accepting chunks.
    pub fn is_armed(&self) -> bool {
        self.inner.lock().unwrap().armed
    }

    /// Duration of the audio accumulated so far, in seconds.
    pub fn duration_secs(&self) -> f32 {
        let inner = self.inner.lock().unwrap();
        if inner.sample_rate == 0 || inner.channels == 0 {
            return 0.0;
        }
        let frames = inner.samples.len() / inner.channels as usize;
        frames as f32 / inner.sample_rate as f32
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(samples: Vec<f32>, sample_rate: u32, channels: u16) -> CaptureChunk {
        CaptureChunk {
            samples,
            sample_rate,
            channels,
        }
    }

    #[test]
    fn push_while_disarmed_is_ignored() {
        let rec = Recorder::new(60.0);
        rec.push(&chunk(vec![0.1; 256], 48_000, 1));
        assert!(rec.stop().is_none());
    }

    #[test]
    fn arm_push_stop_returns_buffer() {
        let rec = Recorder::new(60.0);
        rec.arm();
        rec.push(&chunk(vec![0.1; 512], 48_000, 2));
        rec.push(&chunk(vec![0.2; 512], 48_000, 2));

        let buf = rec.stop().expect("buffer");
        assert_eq!(buf.samples().len(), 1024);
        assert_eq!(buf.sample_rate(), 48_000);
        assert_eq!(buf.channels(), 2);
        assert!(!rec.is_armed());
    }

    #[test]
    fn stop_with_no_audio_returns_none() {
        let rec = Recorder::new(60.0);
        rec.arm();
        assert!(rec.stop().is_none());
    }

    #[test]
    fn discard_drops_accumulated_audio() {
        let rec = Recorder::new(60.0);
        rec.arm();
        rec.push(&chunk(vec![0.5; 1_000], 16_000, 1));
        rec.discard();

        assert!(!rec.is_armed());
        rec.arm();
        assert!(rec.stop().is_none());
    }

    #[test]
    fn arm_clears_previous_recording() {
        let rec = Recorder::new(60.0);
        rec.arm();
        rec.push(&chunk(vec![0.5; 100], 16_000, 1));
        let _ = rec.stop();

        rec.arm();
        rec.push(&chunk(vec![0.25; 50], 16_000, 1));
        let buf = rec.stop().expect("buffer");
        assert_eq!(buf.samples().len(), 50);
    }

    #[test]
    fn mismatched_chunk_format_is_dropped() {
        let rec = Recorder::new(60.0);
        rec.arm();
        rec.push(&chunk(vec![0.1; 100], 48_000, 1));
        rec.push(&chunk(vec![0.1; 100], 44_100, 1)); // different rate

        let buf = rec.stop().expect("buffer");
        assert_eq!(buf.samples().len(), 100);
        assert_eq!(buf.sample_rate(), 48_000);
    }

    #[test]
    fn accumulation_is_capped_at_max_duration() {
        // 1 s cap at 1 000 Hz mono = 1 000 samples
        let rec = Recorder::new(1.0);
        rec.arm();
        rec.push(&chunk(vec![0.1; 800], 1_000, 1));
        rec.push(&chunk(vec![0.2; 800], 1_000, 1)); // only 200 fit

        let buf = rec.stop().expect("buffer");
        assert_eq!(buf.samples().len(), 1_000);
    }

    /// An odd sample budget (0.5 s at 44 101 Hz stereo = 44 101 samples)
    /// must be rounded down to a whole frame so the truncated recording
    /// still satisfies the interleave invariant at stop().
    #[test]
    fn cap_truncation_keeps_whole_frames() {
        let rec = Recorder::new(0.5);
        rec.arm();
        rec.push(&chunk(vec![0.1; 44_102], 44_101, 2));

        let buf = rec.stop().expect("truncated recording survives");
        assert_eq!(buf.samples().len() % 2, 0);
        assert_eq!(buf.samples().len(), 44_100);
        assert_eq!(buf.channels(), 2);
    }

    /// When rounding leaves no room for even one frame, the chunk is
    /// dropped without corrupting what is already accumulated.
    #[test]
    fn full_recorder_drops_chunks_without_corruption() {
        // 1 s cap at 1 000 Hz stereo = 2 000 samples, filled exactly.
        let rec = Recorder::new(1.0);
        rec.arm();
        rec.push(&chunk(vec![0.1; 2_000], 1_000, 2));
        rec.push(&chunk(vec![0.2; 200], 1_000, 2));

        let buf = rec.stop().expect("buffer");
        assert_eq!(buf.samples().len(), 2_000);
    }

    #[test]
    fn duration_tracks_frames_per_channel() {
        let rec = Recorder::new(60.0);
        rec.arm();
        rec.push(&chunk(vec![0.0; 32_000], 16_000, 2)); // 16 000 frames = 1 s
        assert!((rec.duration_secs() - 1.0).abs() < 1e-6);
    }
}
