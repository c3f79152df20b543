//! Two-pass pipelined scheduling (§4.8, §5): Pass 1 and Pass 2 run on their
//! own OS threads, connected by a bounded channel with sentinel-based
//! termination. Neither pass shares its model instance with the other.

use crate::asr::Transcribe;
use crate::audio::AudioBuffer;
use crate::pipeline::detection::DetectionPass;
use crate::pipeline::error::PipelineError;
use crate::pipeline::transcription::TranscriptionPass;
use crate::pipeline::types::{DetectedSegment, FinalSegment, RawChunkResult};
use std::sync::atomic::AtomicBool;
use std::sync::{mpsc, Arc};
use std::thread;

/// Queue capacity between Pass 1 and Pass 2 (§5).
pub const QUEUE_CAPACITY: usize = 10;

pub struct TwoPassOutcome {
    pub final_segments: Vec<FinalSegment>,
    pub raw_chunks: Vec<RawChunkResult>,
    pub merged_segments: Vec<DetectedSegment>,
}

type ProgressCb = Arc<dyn Fn(&str) + Send + Sync>;

/// Run the two-pass scheduler to completion and join both worker threads.
pub fn run_two_pass(
    buffer: Arc<AudioBuffer>,
    detect_model: Arc<dyn Transcribe>,
    accurate_model: Arc<dyn Transcribe>,
    allowed_languages: Option<Vec<String>>,
    chunk_size_s: f32,
    cancel: Arc<AtomicBool>,
    progress_cb: Option<ProgressCb>,
) -> Result<TwoPassOutcome, PipelineError> {
    let (tx, rx) = mpsc::sync_channel::<Option<DetectedSegment>>(QUEUE_CAPACITY);

    let pass1_buffer = buffer.clone();
    let pass1_cancel = cancel.clone();
    let pass1_allowed = allowed_languages.clone();
    let pass1_handle = thread::Builder::new()
        .name("detection-pass".to_string())
        .spawn(move || {
            let pass = DetectionPass { model: detect_model.as_ref(), chunk_size_s };
            pass.run(
                &pass1_buffer,
                pass1_allowed.as_deref(),
                &tx,
                &pass1_cancel,
                progress_cb.as_deref(),
            )
        })
        .map_err(|e| PipelineError::Worker(format!("failed to spawn detection thread: {}", e)))?;

    let pass2_buffer = buffer.clone();
    let pass2_cancel = cancel.clone();
    let pass2_allowed = allowed_languages.clone();
    let pass2_handle = thread::Builder::new()
        .name("transcription-pass".to_string())
        .spawn(move || {
            let pass = TranscriptionPass { model: accurate_model.as_ref() };
            pass.run(&pass2_buffer, &rx, pass2_allowed.as_deref(), &pass2_cancel)
        })
        .map_err(|e| PipelineError::Worker(format!("failed to spawn transcription thread: {}", e)))?;

    let raw_chunks = pass1_handle
        .join()
        .map_err(|_| PipelineError::Worker("detection pass panicked".to_string()))?;
    let mut final_segments = pass2_handle
        .join()
        .map_err(|_| PipelineError::Worker("transcription pass panicked".to_string()))?;

    final_segments.sort_by(|a, b| a.start_s.partial_cmp(&b.start_s).unwrap());

    let merged_segments = crate::pipeline::detection::merge_raw_chunks(&raw_chunks);

    Ok(TwoPassOutcome { final_segments, raw_chunks, merged_segments })
}
