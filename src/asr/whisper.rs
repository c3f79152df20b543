//! Whisper ASR Engine implementation
//!
//! Wraps whisper.cpp (via `whisper-rs`) behind the `Transcribe` capability.
//! One `WhisperEngine` owns one loaded `WhisperContext`; per-call state
//! (`WhisperState`) is created fresh for each `transcribe` invocation since
//! whisper.cpp state is not reentrant.

use crate::asr::types::{ASRError, TranscribeOutput, TranscribeSegment};
use crate::asr::Transcribe;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info, warn};
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

/// A loaded whisper.cpp model, ready to transcribe chunks.
///
/// `WhisperState` is created per call rather than held on the struct: the
/// engine instance is shared (via `Arc`) with its owning pass's thread only,
/// never called concurrently from two threads, but a `Mutex` still guards
/// state creation since `WhisperContext::create_state` itself is not `Sync`
/// in the upstream binding.
pub struct WhisperEngine {
    ctx: Mutex<WhisperContext>,
    model_path: PathBuf,
}

impl WhisperEngine {
    /// Load a model from a ggml weights file on disk.
    pub fn load(model_path: &Path) -> Result<Self, ASRError> {
        if !model_path.exists() {
            return Err(ASRError::ModelNotFound { path: model_path.display().to_string() });
        }

        let path_str = model_path.to_str().ok_or_else(|| ASRError::ModelLoadError {
            message: format!("model path is not valid UTF-8: {:?}", model_path),
        })?;

        let params = WhisperContextParameters::default();
        let ctx = WhisperContext::new_with_params(path_str, params).map_err(|e| {
            ASRError::ModelLoadError { message: format!("failed to load whisper model: {}", e) }
        })?;

        info!(path = %model_path.display(), "whisper model loaded");
        Ok(Self { ctx: Mutex::new(ctx), model_path: model_path.to_path_buf() })
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    fn run_full(
        &self,
        samples: &[f32],
        language: Option<&str>,
        word_timestamps: bool,
        initial_prompt: Option<&str>,
    ) -> Result<(String, String, Vec<TranscribeSegment>), ASRError> {
        let ctx = self.ctx.lock().unwrap();
        match self.run_full_locked(&ctx, samples, language, word_timestamps, initial_prompt) {
            Err(ASRError::ModelInferenceError { message })
                if word_timestamps && message.to_lowercase().contains("kv_cache") =>
            {
                // Observed on some acoustic-model versions: token timestamps trip a
                // kv_cache incompatibility. Retry once without them (spec §6.1).
                warn!("kv_cache error with word_timestamps, retrying without them");
                self.run_full_locked(&ctx, samples, language, false, initial_prompt)
            }
            other => other,
        }
    }

    fn run_full_locked(
        &self,
        ctx: &WhisperContext,
        samples: &[f32],
        language: Option<&str>,
        word_timestamps: bool,
        initial_prompt: Option<&str>,
    ) -> Result<(String, String, Vec<TranscribeSegment>), ASRError> {
        let mut state = ctx.create_state().map_err(|e| ASRError::ModelInferenceError {
            message: format!("failed to create inference state: {}", e),
        })?;

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        params.set_language(language);
        params.set_translate(false);
        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);
        params.set_token_timestamps(word_timestamps);
        if let Some(prompt) = initial_prompt {
            params.set_initial_prompt(prompt);
        }

        state.full(params, samples).map_err(|e| ASRError::ModelInferenceError {
            message: format!("whisper inference failed: {}", e),
        })?;

        let n_segments = state.full_n_segments().map_err(|e| ASRError::ModelInferenceError {
            message: format!("failed to read segment count: {}", e),
        })?;

        let mut segments = Vec::with_capacity(n_segments.max(0) as usize);
        let mut text_parts = Vec::new();
        for i in 0..n_segments {
            let seg_text = state.full_get_segment_text(i).map_err(|e| ASRError::ModelInferenceError {
                message: format!("failed to read segment {} text: {}", i, e),
            })?;
            let t0 = state.full_get_segment_t0(i).unwrap_or(0);
            let t1 = state.full_get_segment_t1(i).unwrap_or(0);
            let no_speech_prob = state.full_get_segment_no_speech_prob(i).unwrap_or(0.0);

            text_parts.push(seg_text.trim().to_string());
            segments.push(TranscribeSegment {
                start_s: t0 as f32 / 100.0,
                end_s: t1 as f32 / 100.0,
                text: seg_text.trim().to_string(),
                no_speech_prob,
            });
        }

        let detected_language = language.map(|l| l.to_string()).unwrap_or_else(|| {
            let lang_id = state.full_lang_id();
            whisper_rs::get_lang_str(lang_id).unwrap_or("unknown").to_string()
        });

        let text = text_parts.join(" ").trim().to_string();
        debug!(text_len = text.len(), segments = segments.len(), "whisper inference complete");
        Ok((text, detected_language, segments))
    }
}

impl Transcribe for WhisperEngine {
    fn transcribe_with_prompt(
        &self,
        chunk_path: &Path,
        language: Option<&str>,
        word_timestamps: bool,
        initial_prompt: Option<&str>,
    ) -> Result<TranscribeOutput, ASRError> {
        let samples = read_wav_mono_f32(chunk_path)?;
        let (text, detected_language, segments) =
            self.run_full(&samples, language, word_timestamps, initial_prompt)?;
        Ok(TranscribeOutput { text, language: detected_language, segments })
    }
}

/// Read a mono 16-bit or float WAV file into f32 samples in [-1, 1].
/// Chunks are always materialized at 16 kHz mono by `ChunkExtractor`.
fn read_wav_mono_f32(path: &Path) -> Result<Vec<f32>, ASRError> {
    let mut reader = hound::WavReader::open(path).map_err(|e| ASRError::ModelInferenceError {
        message: format!("failed to open chunk wav {:?}: {}", path, e),
    })?;
    let spec = reader.spec();

    let samples: Result<Vec<f32>, hound::Error> = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect(),
        hound::SampleFormat::Int => reader
            .samples::<i16>()
            .map(|s| s.map(|v| v as f32 / i16::MAX as f32))
            .collect(),
    };

    samples.map_err(|e| ASRError::ModelInferenceError {
        message: format!("failed to decode chunk wav {:?}: {}", path, e),
    })
}
