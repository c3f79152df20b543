//! Shared data model for the pipeline (§3).

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Output of one model inference on a chunk (Pass 1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawChunkResult {
    pub start_s: f32,
    pub end_s: f32,
    pub language_code: String,
    pub text: String,
}

/// Merge of consecutive `RawChunkResult`s sharing a language.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectedSegment {
    pub start_s: f32,
    pub end_s: f32,
    pub language_code: String,
    pub text: String,
}

/// Result of Pass 2 on a `DetectedSegment`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalSegment {
    pub start_s: f32,
    pub end_s: f32,
    pub language_code: String,
    pub text: String,
}

/// Sampling outcome: which path the pipeline should take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    Single,
    Mixed,
    Hybrid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classification {
    pub mode: Mode,
    pub primary_language: String,
    pub secondary_languages: HashSet<String>,
    pub transition_s: Option<f32>,
}
