//! AudioStore: load decoded audio into memory once, hand out chunk references.

use crate::audio::types::{AudioBuffer, AudioError, AudioSource, ChunkRef};
use tracing::{debug, info};

/// Owns the full in-memory audio buffer for one transcription call.
///
/// Chunk extraction reads from this buffer by sample index; nothing re-decodes
/// the source after `open` returns.
pub struct AudioStore {
    buffer: AudioBuffer,
}

impl AudioStore {
    /// Read `source` to completion and hold the result in memory.
    pub fn open(source: &mut dyn AudioSource) -> Result<Self, AudioError> {
        let samples = source.read_all()?;
        let buffer = AudioBuffer::new(samples)?;
        info!(
            duration_s = buffer.duration_s(),
            samples = buffer.samples().len(),
            "loaded audio into memory"
        );
        Ok(Self { buffer })
    }

    pub fn buffer(&self) -> &AudioBuffer {
        &self.buffer
    }

    pub fn into_buffer(self) -> AudioBuffer {
        self.buffer
    }

    pub fn duration_s(&self) -> f32 {
        self.buffer.duration_s()
    }

    /// Build a validated chunk reference against this buffer's extent.
    pub fn chunk_ref(&self, start_s: f32, end_s: f32) -> Result<ChunkRef, AudioError> {
        let chunk = ChunkRef::new(start_s, end_s, self.buffer.duration_s())?;
        debug!(start_s, end_s, "produced chunk reference");
        Ok(chunk)
    }
}
