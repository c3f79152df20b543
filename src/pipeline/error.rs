//! Error handling design (§7).

use crate::asr::ASRError;
use crate::audio::AudioError;
use crate::pipeline::result::TranscriptionResult;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("audio decode failed: {0}")]
    Decode(#[from] AudioError),

    #[error("model load failed: {0}")]
    ModelLoad(ASRError),

    #[error("chunk extraction exceeded its timeout")]
    ExtractionTimeout,

    #[error("pipeline worker failed: {0}")]
    Worker(String),

    #[error("canceled")]
    Canceled { partial: Box<TranscriptionResult> },
}
