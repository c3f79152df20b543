//! The value returned to callers of `MultilangTranscribe`.

use crate::pipeline::types::{Classification, FinalSegment};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionResult {
    pub text: String,
    pub segments: Vec<FinalSegment>,
    pub primary_language: String,
    pub language_timeline: String,
    pub allowed_languages: Option<Vec<String>>,
    pub classification: Classification,
    pub diagnostics: Option<serde_json::Value>,
    /// Set when cancellation cut the call short; segments are whatever
    /// accumulated before the cancel flag was observed.
    pub partial: bool,
}
