//! ChunkExtractor (C4): materialize an in-memory audio slice as a temp WAV
//! file consumable by `Transcribe`.

use crate::audio::{AudioBuffer, AudioError};
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

/// Minimum chunk duration; shorter spans are unreliable for language-ID (§4.4).
pub const MIN_CHUNK_DURATION_S: f32 = 0.1;

/// A materialized chunk. The backing temp file is deleted on drop, on every
/// exit path including panics — never rely on external cleanup.
pub struct ChunkHandle {
    path: PathBuf,
    duration_s: f32,
}

impl ChunkHandle {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn duration_s(&self) -> f32 {
        self.duration_s
    }
}

impl Drop for ChunkHandle {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                debug!(path = ?self.path, error = %e, "failed to remove chunk temp file");
            }
        }
    }
}

pub struct ChunkExtractor;

impl ChunkExtractor {
    /// Slice `buffer` at `[start_s, end_s]` and write it to a temp WAV file.
    /// In-memory only: the re-decode fallback for inputs too large to hold in
    /// memory is future work (§4.4), not implemented here.
    pub fn extract(
        buffer: &AudioBuffer,
        start_s: f32,
        end_s: f32,
    ) -> Result<ChunkHandle, AudioError> {
        Self::extract_in(buffer, start_s, end_s, &std::env::temp_dir())
    }

    /// Same as [`extract`](Self::extract), writing into `dir` instead of the
    /// real OS temp directory. Exposed so tests can isolate chunk files under
    /// a throwaway directory instead of touching the real one.
    pub fn extract_in(
        buffer: &AudioBuffer,
        start_s: f32,
        end_s: f32,
        dir: &Path,
    ) -> Result<ChunkHandle, AudioError> {
        let duration_s = end_s - start_s;
        if duration_s < MIN_CHUNK_DURATION_S {
            return Err(AudioError::ChunkTooShort { duration_s });
        }

        let start_idx = (start_s * buffer.sample_rate() as f32) as usize;
        let end_idx =
            ((end_s * buffer.sample_rate() as f32) as usize).min(buffer.samples().len());
        let samples = if start_idx < end_idx { &buffer.samples()[start_idx..end_idx] } else { &[] };

        let path = dir.join(format!("polyglot-chunk-{}.wav", Uuid::new_v4()));
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: buffer.sample_rate(),
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer =
            hound::WavWriter::create(&path, spec).map_err(|e| AudioError::DecodeFailed {
                message: format!("failed to create chunk wav {:?}: {}", path, e),
            })?;
        for &sample in samples {
            writer.write_sample(sample).map_err(|e| AudioError::DecodeFailed {
                message: format!("failed to write chunk sample: {}", e),
            })?;
        }
        writer.finalize().map_err(|e| AudioError::DecodeFailed {
            message: format!("failed to finalize chunk wav {:?}: {}", path, e),
        })?;

        Ok(ChunkHandle { path, duration_s })
    }
}
