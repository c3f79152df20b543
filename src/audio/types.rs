//! Audio-related type definitions
//!
//! Common types used throughout the audio loading pipeline.

use thiserror::Error;

/// Fixed sample rate the whole engine operates at. `AudioSource` implementations
/// are responsible for resampling/demuxing before handing samples to `AudioStore`.
pub const SAMPLE_RATE: u32 = 16_000;

/// Immutable decoded audio, loaded once into memory.
///
/// Always mono f32 at [`SAMPLE_RATE`]. Constructing one validates the input;
/// after that the buffer never changes for the lifetime of a call.
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    samples: Vec<f32>,
    duration_s: f32,
}

impl AudioBuffer {
    pub fn new(samples: Vec<f32>) -> Result<Self, AudioError> {
        if samples.is_empty() {
            return Err(AudioError::EmptyAudio);
        }
        let duration_s = samples.len() as f32 / SAMPLE_RATE as f32;
        Ok(Self { samples, duration_s })
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn duration_s(&self) -> f32 {
        self.duration_s
    }

    pub fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    /// Slice the buffer by a `[start_s, end_s]` view, clamped to the buffer's extent.
    pub fn slice(&self, chunk: &ChunkRef) -> &[f32] {
        let start_idx = (chunk.start_s * SAMPLE_RATE as f32) as usize;
        let end_idx = ((chunk.end_s * SAMPLE_RATE as f32) as usize).min(self.samples.len());
        if start_idx >= end_idx {
            return &[];
        }
        &self.samples[start_idx..end_idx]
    }
}

/// A `(start_s, end_s)` view descriptor. Carries no ownership over the underlying samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChunkRef {
    pub start_s: f32,
    pub end_s: f32,
}

impl ChunkRef {
    pub fn new(start_s: f32, end_s: f32, duration_s: f32) -> Result<Self, AudioError> {
        if !(start_s < end_s) {
            return Err(AudioError::InvalidChunkRange { start_s, end_s });
        }
        if end_s > duration_s + 1e-3 {
            return Err(AudioError::InvalidChunkRange { start_s, end_s });
        }
        Ok(Self { start_s, end_s })
    }

    pub fn duration_s(&self) -> f32 {
        self.end_s - self.start_s
    }
}

/// External capability: a decoder that has already demuxed/resampled a source
/// down to mono 16 kHz f32. The engine never performs resampling or demuxing itself.
pub trait AudioSource {
    /// Read the entire source to completion. Called exactly once per `AudioStore::open`.
    fn read_all(&mut self) -> Result<Vec<f32>, AudioError>;
}

/// Errors from decoding/loading audio.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("audio source produced no samples")]
    EmptyAudio,

    #[error("audio source failed: {message}")]
    DecodeFailed { message: String },

    #[error("invalid chunk range: [{start_s}, {end_s}]")]
    InvalidChunkRange { start_s: f32, end_s: f32 },

    #[error("chunk too short for reliable language identification: {duration_s}s")]
    ChunkTooShort { duration_s: f32 },
}
