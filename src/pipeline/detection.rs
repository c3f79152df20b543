//! DetectionPass (C6, Pass 1): walk the audio in fixed windows, label each
//! with the fast model, correct via LangHeuristics, and merge consecutive
//! same-language chunks into DetectedSegments on the fly.

use crate::asr::Transcribe;
use crate::audio::AudioBuffer;
use crate::lang;
use crate::pipeline::chunk::ChunkExtractor;
use crate::pipeline::types::{DetectedSegment, RawChunkResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::SyncSender;
use tracing::{debug, warn};

pub const DEFAULT_CHUNK_SIZE_S: f32 = 3.0;

pub struct DetectionPass<'a> {
    pub model: &'a dyn Transcribe,
    pub chunk_size_s: f32,
}

impl<'a> DetectionPass<'a> {
    /// Produce DetectedSegments covering `[0, duration_s]` in order, sending
    /// each to `tx` as soon as a language boundary closes it, finishing with
    /// a sentinel `None`. Returns the raw per-chunk results for diagnostics.
    pub fn run(
        &self,
        buffer: &AudioBuffer,
        allowed_languages: Option<&[String]>,
        tx: &SyncSender<Option<DetectedSegment>>,
        cancel: &AtomicBool,
        progress_cb: Option<&(dyn Fn(&str) + Send + Sync)>,
    ) -> Vec<RawChunkResult> {
        let duration_s = buffer.duration_s();
        let mut raw_results = Vec::new();
        let mut running: Option<DetectedSegment> = None;

        let mut t = 0.0_f32;
        while t < duration_s {
            if cancel.load(Ordering::SeqCst) {
                debug!("detection pass observed cancellation");
                break;
            }

            let window_end = (t + self.chunk_size_s).min(duration_s);
            if window_end - t < 0.1 {
                break;
            }

            if let Some(cb) = progress_cb {
                cb(&format!("PROGRESS:{:.0}:detecting", 100.0 * t / duration_s));
            }

            match self.process_window(buffer, t, window_end, allowed_languages) {
                Some(raw) => {
                    running = Self::fold_into_running(running, &raw, tx);
                    raw_results.push(raw);
                }
                None => {}
            }

            t = window_end;
        }

        if let Some(segment) = running.take() {
            let _ = tx.send(Some(segment));
        }
        let _ = tx.send(None);

        raw_results
    }

    fn process_window(
        &self,
        buffer: &AudioBuffer,
        start_s: f32,
        end_s: f32,
        allowed_languages: Option<&[String]>,
    ) -> Option<RawChunkResult> {
        let handle = match ChunkExtractor::extract(buffer, start_s, end_s) {
            Ok(h) => h,
            Err(e) => {
                warn!(error = %e, start_s, end_s, "skipping chunk: extraction failed");
                return None;
            }
        };

        let output = match self.model.transcribe(handle.path(), None, false) {
            Ok(o) => o,
            Err(e) => {
                warn!(error = %e, start_s, end_s, "skipping chunk: detection inference failed");
                return None;
            }
        };

        let corrected_lang = lang::correct(&output.text, &output.language, allowed_languages);

        // Drop only when allowed is set, the label is outside it, AND there's
        // no text at all — Pass 2 may still recover a usable label (§4.6).
        if let Some(allowed) = allowed_languages {
            if !allowed.iter().any(|l| l == &corrected_lang) && output.text.trim().is_empty() {
                return None;
            }
        }

        Some(RawChunkResult {
            start_s,
            end_s,
            language_code: corrected_lang,
            text: output.text.trim().to_string(),
        })
    }

    fn fold_into_running(
        running: Option<DetectedSegment>,
        raw: &RawChunkResult,
        tx: &SyncSender<Option<DetectedSegment>>,
    ) -> Option<DetectedSegment> {
        match running {
            Some(mut segment) if segment.language_code == raw.language_code => {
                segment.end_s = raw.end_s;
                if !raw.text.is_empty() {
                    if segment.text.is_empty() {
                        segment.text = raw.text.clone();
                    } else {
                        segment.text = format!("{} {}", segment.text, raw.text);
                    }
                }
                Some(segment)
            }
            Some(finished) => {
                let _ = tx.send(Some(finished));
                Some(DetectedSegment {
                    start_s: raw.start_s,
                    end_s: raw.end_s,
                    language_code: raw.language_code.clone(),
                    text: raw.text.clone(),
                })
            }
            None => Some(DetectedSegment {
                start_s: raw.start_s,
                end_s: raw.end_s,
                language_code: raw.language_code.clone(),
                text: raw.text.clone(),
            }),
        }
    }
}

/// Merge consecutive same-language `RawChunkResult`s. Exposed standalone so
/// tests (and callers wanting to re-merge already-merged output) don't need
/// a live model or channel. Idempotent: feeding its own output back in
/// produces the same sequence (P6).
pub fn merge_raw_chunks(raw: &[RawChunkResult]) -> Vec<DetectedSegment> {
    let mut merged: Vec<DetectedSegment> = Vec::new();
    for chunk in raw {
        match merged.last_mut() {
            Some(last) if last.language_code == chunk.language_code => {
                last.end_s = chunk.end_s;
                if !chunk.text.is_empty() {
                    if last.text.is_empty() {
                        last.text = chunk.text.clone();
                    } else {
                        last.text = format!("{} {}", last.text, chunk.text);
                    }
                }
            }
            _ => merged.push(DetectedSegment {
                start_s: chunk.start_s,
                end_s: chunk.end_s,
                language_code: chunk.language_code.clone(),
                text: chunk.text.clone(),
            }),
        }
    }
    merged
}
