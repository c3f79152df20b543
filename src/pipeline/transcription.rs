//! TranscriptionPass (C7, Pass 2): consume DetectedSegments, materialize
//! each as a chunk, run the accurate model with the language pinned, and
//! correct the label once more against the accurate text.

use crate::asr::Transcribe;
use crate::audio::AudioBuffer;
use crate::lang;
use crate::pipeline::chunk::ChunkExtractor;
use crate::pipeline::types::{DetectedSegment, FinalSegment};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Receiver;
use tracing::warn;

pub struct TranscriptionPass<'a> {
    pub model: &'a dyn Transcribe,
}

impl<'a> TranscriptionPass<'a> {
    /// Drain `rx` until the sentinel, producing FinalSegments in arrival
    /// order. Per-chunk inference failures are logged and skipped; they
    /// never abort the pass (§7).
    pub fn run(
        &self,
        buffer: &AudioBuffer,
        rx: &Receiver<Option<DetectedSegment>>,
        allowed_languages: Option<&[String]>,
        cancel: &AtomicBool,
    ) -> Vec<FinalSegment> {
        let mut final_segments = Vec::new();

        loop {
            let segment = match rx.recv() {
                Ok(Some(segment)) => segment,
                Ok(None) => break,
                Err(_) => break,
            };

            if cancel.load(Ordering::SeqCst) {
                // Drain without processing once canceled; keep consuming so
                // Pass 1 never blocks on a full queue after cancellation.
                continue;
            }

            if let Some(final_segment) =
                self.process_segment(buffer, &segment, allowed_languages)
            {
                final_segments.push(final_segment);
            }
        }

        final_segments
    }

    fn process_segment(
        &self,
        buffer: &AudioBuffer,
        segment: &DetectedSegment,
        allowed_languages: Option<&[String]>,
    ) -> Option<FinalSegment> {
        let handle = match ChunkExtractor::extract(buffer, segment.start_s, segment.end_s) {
            Ok(h) => h,
            Err(e) => {
                warn!(error = %e, start_s = segment.start_s, end_s = segment.end_s,
                      "skipping segment: extraction failed");
                return None;
            }
        };

        let output =
            match self.model.transcribe(handle.path(), Some(&segment.language_code), true) {
                Ok(o) => o,
                Err(e) => {
                    warn!(error = %e, start_s = segment.start_s, end_s = segment.end_s,
                          "skipping segment: transcription inference failed");
                    return None;
                }
            };

        if output.text.trim().is_empty() {
            return None;
        }

        let corrected_lang =
            lang::correct(&output.text, &segment.language_code, allowed_languages);

        if let Some(allowed) = allowed_languages {
            if !allowed.iter().any(|l| l == &corrected_lang) {
                return None;
            }
        }

        Some(FinalSegment {
            start_s: segment.start_s,
            end_s: segment.end_s,
            language_code: corrected_lang,
            text: output.text.trim().to_string(),
        })
    }
}
