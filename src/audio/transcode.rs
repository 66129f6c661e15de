//! Raw-audio-to-WAV transcoder.
//!
//! The inference services require **mono, 16 kHz, 16-bit signed PCM** audio
//! packaged in a canonical RIFF/WAVE container.  [`transcode`] performs the
//! three conversion steps on a captured [`RawAudioBuffer`]:
//!
//! 1. **Channel reduction** — keep the first channel of the interleaved
//!    buffer.  (Averaging would be the higher-fidelity alternative; the
//!    first-channel policy is kept for byte compatibility with existing
//!    recordings.)
//! 2. **Resampling** — nearest-neighbor index mapping from the source rate
//!    to the target rate.  Not bandlimited; quality loss at large ratio
//!    changes is accepted.
//! 3. **Quantization** — clamp to `[-1.0, 1.0]`, then scale asymmetrically:
//!    negative samples by 32768, non-negative by 32767.  This keeps every
//!    value inside the signed 16-bit range without wraparound.
//!
//! The whole operation is pure and deterministic: identical input buffers
//! produce byte-identical containers, and nothing here performs I/O, logs,
//! or touches shared state — it is safe to call concurrently from any number
//! of recording sessions.
//!
//! # Example
//!
//! ```rust
//! use voice_emotion::audio::{transcode, RawAudioBuffer, TARGET_SAMPLE_RATE};
//!
//! // 2-channel capture at 44.1 kHz, 100 ms of a constant 0.5 signal
//! let samples = vec![0.5_f32; 4410 * 2];
//! let buffer = RawAudioBuffer::new(samples, 44_100, 2).unwrap();
//!
//! let wave = transcode(&buffer, TARGET_SAMPLE_RATE).unwrap();
//! assert_eq!(wave.sample_rate(), 16_000);
//! assert_eq!(wave.len(), 1600);
//!
//! let bytes = wave.to_wav_bytes();
//! assert_eq!(bytes.len(), 44 + 2 * wave.len());
//! assert_eq!(&bytes[0..4], b"RIFF");
//! ```

use thiserror::Error;

/// Sample rate required by the speech models, in Hz.
pub const TARGET_SAMPLE_RATE: u32 = 16_000;

/// Size of the RIFF/WAVE header emitted by [`PcmWaveform::to_wav_bytes`].
pub const WAV_HEADER_BYTES: usize = 44;

// ---------------------------------------------------------------------------
// TranscodeError
// ---------------------------------------------------------------------------

/// Errors raised for malformed or degenerate transcoder input.
///
/// An *empty* buffer is not an error: it transcodes to a valid zero-sample
/// container (44-byte header, no data).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranscodeError {
    /// Non-positive rates, zero channels, or an interleaved buffer whose
    /// length is not a multiple of the channel count.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

// ---------------------------------------------------------------------------
// RawAudioBuffer
// ---------------------------------------------------------------------------

/// A captured audio buffer as delivered by the microphone boundary.
///
/// Samples are interleaved `f32`, conceptually in `[-1.0, 1.0]` (out-of-range
/// values are clamped during quantization).  Created once when recording
/// stops and consumed exactly once by [`transcode`].
#[derive(Debug, Clone, PartialEq)]
pub struct RawAudioBuffer {
    samples: Vec<f32>,
    sample_rate: u32,
    channels: u16,
}

impl RawAudioBuffer {
    /// Construct a buffer, validating its invariants.
    ///
    /// # Errors
    ///
    /// Returns [`TranscodeError::InvalidInput`] when `sample_rate == 0`,
    /// `channels == 0`, or `samples.len()` is not a multiple of `channels`.
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Result<Self, TranscodeError> {
        if sample_rate == 0 {
            return Err(TranscodeError::InvalidInput(
                "sample rate must be positive".into(),
            ));
        }
        if channels == 0 {
            return Err(TranscodeError::InvalidInput(
                "channel count must be at least 1".into(),
            ));
        }
        if samples.len() % channels as usize != 0 {
            return Err(TranscodeError::InvalidInput(format!(
                "interleaved buffer length {} is not a multiple of {} channels",
                samples.len(),
                channels
            )));
        }
        Ok(Self {
            samples,
            sample_rate,
            channels,
        })
    }

    /// Interleaved samples.
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Originating sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of interleaved channels.
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Number of frames (samples per channel).
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    /// Returns `true` when no audio was captured.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Recording duration in seconds.
    pub fn duration_secs(&self) -> f32 {
        self.frames() as f32 / self.sample_rate as f32
    }
}

// ---------------------------------------------------------------------------
// PcmWaveform
// ---------------------------------------------------------------------------

/// The transcoder's output: a mono 16-bit signed PCM waveform.
///
/// Every sample is within `[-32768, 32767]` by construction.  Produced once
/// per recording, serialized with [`to_wav_bytes`](Self::to_wav_bytes) for
/// transmission to the inference services, then discarded — nothing in this
/// subsystem persists it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PcmWaveform {
    samples: Vec<i16>,
    sample_rate: u32,
}

impl PcmWaveform {
    /// Mono samples.
    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    /// Declared sample rate in Hz (always the target rate passed to
    /// [`transcode`]).
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns `true` for a zero-sample waveform.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Implicit duration: sample count / sample rate.
    pub fn duration_secs(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate as f32
    }

    /// Serialize into the canonical uncompressed RIFF/WAVE container.
    ///
    /// Layout: a fixed 44-byte header (PCM format code 1, 1 channel, the
    /// declared sample rate, byte rate `rate * 2`, block align 2, 16 bits
    /// per sample) followed by the little-endian `i16` samples.  The output
    /// length is always exactly `44 + 2 * len()`; an empty waveform yields
    /// just the header with a zero-size data chunk.
    pub fn to_wav_bytes(&self) -> Vec<u8> {
        let data_bytes = self.samples.len() * 2;
        let mut out = Vec::with_capacity(WAV_HEADER_BYTES + data_bytes);

        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(36 + data_bytes as u32).to_le_bytes());
        out.extend_from_slice(b"WAVE");

        out.extend_from_slice(b"fmt ");
        out.extend_from_slice(&16u32.to_le_bytes()); // fmt chunk size
        out.extend_from_slice(&1u16.to_le_bytes()); // PCM format code
        out.extend_from_slice(&1u16.to_le_bytes()); // mono
        out.extend_from_slice(&self.sample_rate.to_le_bytes());
        out.extend_from_slice(&(self.sample_rate * 2).to_le_bytes()); // byte rate
        out.extend_from_slice(&2u16.to_le_bytes()); // block align
        out.extend_from_slice(&16u16.to_le_bytes()); // bits per sample

        out.extend_from_slice(b"data");
        out.extend_from_slice(&(data_bytes as u32).to_le_bytes());
        for s in &self.samples {
            out.extend_from_slice(&s.to_le_bytes());
        }

        out
    }
}

// ---------------------------------------------------------------------------
// transcode
// ---------------------------------------------------------------------------

/// Convert a captured buffer into a mono `target_rate` 16-bit waveform.
///
/// See the module docs for the three conversion steps.  An empty buffer
/// yields an empty (but valid) waveform rather than an error.
///
/// # Errors
///
/// Returns [`TranscodeError::InvalidInput`] when `target_rate == 0`.  Buffer
/// invariants (positive source rate, channel alignment) are enforced by
/// [`RawAudioBuffer::new`].
pub fn transcode(buffer: &RawAudioBuffer, target_rate: u32) -> Result<PcmWaveform, TranscodeError> {
    if target_rate == 0 {
        return Err(TranscodeError::InvalidInput(
            "target rate must be positive".into(),
        ));
    }

    let mono = first_channel(buffer.samples(), buffer.channels());
    let resampled = resample_nearest(&mono, buffer.sample_rate(), target_rate);
    let samples = resampled.iter().map(|&s| quantize_i16(s)).collect();

    Ok(PcmWaveform {
        samples,
        sample_rate: target_rate,
    })
}

/// Extract the first channel from interleaved multi-channel audio.
///
/// For mono input this is a plain copy.  First-channel-only is the documented
/// channel-reduction policy; see the module docs.
fn first_channel(samples: &[f32], channels: u16) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }
    samples.iter().step_by(channels as usize).copied().collect()
}

/// Nearest-neighbor resampling from `source_rate` to `target_rate` Hz.
///
/// Output length is `round(len / ratio)` with `ratio = source / target`, so
/// the duration matches expectation within one sample.  Each output index
/// picks the input sample at `round(i * ratio)`, clamped to valid bounds.
/// When the rates are equal the input is returned unchanged.
fn resample_nearest(samples: &[f32], source_rate: u32, target_rate: u32) -> Vec<f32> {
    if source_rate == target_rate || samples.is_empty() {
        return samples.to_vec();
    }

    let ratio = source_rate as f64 / target_rate as f64;
    let out_len = (samples.len() as f64 / ratio).round() as usize;
    let last = samples.len() - 1;

    (0..out_len)
        .map(|i| {
            let idx = ((i as f64 * ratio).round() as usize).min(last);
            samples[idx]
        })
        .collect()
}

/// Quantize one floating-point sample to signed 16-bit.
///
/// Clamps to `[-1.0, 1.0]` first, then scales negatives by 32768 and
/// non-negatives by 32767.  The asymmetry is contractual: `-1.0` maps to
/// exactly `-32768` and `+1.0` to exactly `32767`.
fn quantize_i16(s: f32) -> i16 {
    let s = s.clamp(-1.0, 1.0);
    if s < 0.0 {
        (s * 32768.0).round() as i16
    } else {
        (s * 32767.0).round() as i16
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
