//! polyglot-transcribe - code-switch-aware speech transcription
//!
//! Loads an audio source fully into memory, optionally samples it to decide
//! whether it's monolingual, then either transcribes it in one pass or runs
//! a two-pass pipeline that detects language boundaries at a coarse
//! resolution before re-transcribing each segment with a pinned language.

pub mod asr;
pub mod audio;
pub mod lang;
pub mod pipeline;

pub use asr::{ModelCache, Transcribe, WhisperEngine};
pub use audio::{AudioBuffer, AudioSource, AudioStore};
#[allow(non_snake_case)]
pub use lang::heuristics as LangHeuristics;
pub use pipeline::{MultilangRequest, Pipeline, PipelineConfig, TranscriptionResult};
