//! Automatic Speech Recognition (ASR) module
//!
//! Provides the `Transcribe` capability (§6.1) plus the whisper.cpp backend
//! that implements it and the cache that keeps loaded models alive.

pub mod model_cache;
pub mod types;
pub mod whisper;

pub use model_cache::ModelCache;
pub use types::*;
pub use whisper::WhisperEngine;

use std::path::Path;

/// External capability: something that can turn an audio chunk on disk into
/// text, optionally honoring a pinned language. Implementations may wrap
/// whisper.cpp, a mock for tests, or a future alternative acoustic model —
/// the pipeline is model-agnostic.
///
/// Synchronous by design: acoustic-model inference is blocking, CPU-bound
/// work run from a dedicated OS thread (§5), not from an async task.
#[cfg_attr(test, mockall::automock)]
pub trait Transcribe: Send + Sync {
    fn transcribe(
        &self,
        chunk_path: &Path,
        language: Option<&str>,
        word_timestamps: bool,
    ) -> Result<TranscribeOutput, ASRError> {
        self.transcribe_with_prompt(chunk_path, language, word_timestamps, None)
    }

    fn transcribe_with_prompt(
        &self,
        chunk_path: &Path,
        language: Option<&str>,
        word_timestamps: bool,
        initial_prompt: Option<&str>,
    ) -> Result<TranscribeOutput, ASRError>;
}
