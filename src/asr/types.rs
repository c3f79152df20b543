//! ASR-related type definitions
//!
//! Common types used throughout the speech-recognition pipeline.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One segment of a model's transcription output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscribeSegment {
    pub start_s: f32,
    pub end_s: f32,
    pub text: String,
    pub no_speech_prob: f32,
}

/// Output of one `Transcribe::transcribe` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscribeOutput {
    pub text: String,
    pub language: String,
    pub segments: Vec<TranscribeSegment>,
}

/// Model size selection; the closed set named in the glossary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelSize {
    Tiny,
    Base,
    Small,
    SmallEn,
    Medium,
    LargeV3,
}

impl ModelSize {
    pub fn ggml_file_name(&self) -> &'static str {
        match self {
            ModelSize::Tiny => "ggml-tiny.bin",
            ModelSize::Base => "ggml-base.bin",
            ModelSize::Small => "ggml-small.bin",
            ModelSize::SmallEn => "ggml-small.en.bin",
            ModelSize::Medium => "ggml-medium.bin",
            ModelSize::LargeV3 => "ggml-large-v3.bin",
        }
    }

    pub fn approx_size_mb(&self) -> u64 {
        match self {
            ModelSize::Tiny => 75,
            ModelSize::Base => 142,
            ModelSize::Small => 466,
            ModelSize::SmallEn => 466,
            ModelSize::Medium => 1462,
            ModelSize::LargeV3 => 2960,
        }
    }
}

/// ASR processing errors.
#[derive(Debug, Error)]
pub enum ASRError {
    #[error("insufficient memory: required {required}GB, available {available}GB")]
    InsufficientMemory { required: f32, available: f32 },

    #[error("model not found at path: {path}")]
    ModelNotFound { path: String },

    #[error("model load failed: {message}")]
    ModelLoadError { message: String },

    #[error("model inference failed: {message}")]
    ModelInferenceError { message: String },

    #[error("model verification failed: {message}")]
    ModelVerificationFailed { message: String },
}
