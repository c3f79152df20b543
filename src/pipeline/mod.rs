//! Pipeline orchestration (C8): the engine's single entry point,
//! `transcribe_multilang`, mode routing, cancellation, and the safety
//! fallback to the fast path when two-pass yields nothing.

pub mod chunk;
pub mod detection;
pub mod error;
pub mod reporter;
pub mod result;
pub mod sampler;
pub mod scheduler;
pub mod transcription;
pub mod types;

pub use error::PipelineError;
pub use result::TranscriptionResult;
pub use types::{Classification, DetectedSegment, FinalSegment, Mode, RawChunkResult};

use crate::asr::{ModelCache, ModelSize, Transcribe};
use crate::audio::{AudioSource, AudioStore};
use crate::pipeline::chunk::ChunkExtractor;
use crate::pipeline::reporter::Reporter;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// Engine-wide tunables. Per-call knobs (allowed languages, skip flags) live
/// on `MultilangRequest` instead, since they vary per call (§6.5).
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub chunk_size_s: f32,
    pub sample_window_s: f32,
    pub late_ratio: f32,
    pub extraction_timeout_s: u64,
    pub diagnostics_dir: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chunk_size_s: detection::DEFAULT_CHUNK_SIZE_S,
            sample_window_s: 4.0,
            late_ratio: 0.85,
            extraction_timeout_s: 30,
            diagnostics_dir: None,
        }
    }
}

pub type ProgressCb = Arc<dyn Fn(&str) + Send + Sync>;

/// Inputs to `Pipeline::transcribe_multilang` (§6.3).
pub struct MultilangRequest {
    pub accurate_model_size: ModelSize,
    pub detection_model_size: Option<ModelSize>,
    pub allowed_languages: Option<Vec<String>>,
    pub skip_sampling: bool,
    pub skip_fast_single: bool,
    pub initial_prompt: Option<String>,
    pub progress_cb: Option<ProgressCb>,
    pub cancel_flag: Arc<AtomicBool>,
    /// Stem used to key the diagnostics file, e.g. the source's file name
    /// without extension. Ignored when `PipelineConfig::diagnostics_dir` is `None`.
    pub diagnostics_stem: Option<String>,
}

impl Default for MultilangRequest {
    fn default() -> Self {
        Self {
            accurate_model_size: ModelSize::Medium,
            detection_model_size: None,
            allowed_languages: None,
            skip_sampling: false,
            skip_fast_single: false,
            initial_prompt: None,
            progress_cb: None,
            cancel_flag: Arc::new(AtomicBool::new(false)),
            diagnostics_stem: None,
        }
    }
}

pub struct Pipeline {
    model_cache: ModelCache,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Result<Self, PipelineError> {
        let model_cache = ModelCache::new().map_err(PipelineError::ModelLoad)?;
        Ok(Self { model_cache, config })
    }

    /// The engine's single entry point (§6.3).
    pub async fn transcribe_multilang(
        &self,
        mut source: impl AudioSource + Send + 'static,
        request: MultilangRequest,
    ) -> Result<TranscriptionResult, PipelineError> {
        let store =
            tokio::task::spawn_blocking(move || AudioStore::open(&mut source))
                .await
                .map_err(|e| PipelineError::Worker(e.to_string()))?
                .map_err(PipelineError::Decode)?;
        let buffer = Arc::new(store.into_buffer());

        let accurate_size = request.accurate_model_size;
        let detect_size = request.detection_model_size.unwrap_or(ModelSize::Base);

        let allowed_len = request.allowed_languages.as_ref().map(|v| v.len()).unwrap_or(0);
        let needs_two_pass_upfront = request.skip_sampling && allowed_len >= 2;
        let needs_sampling = !request.skip_sampling;

        info!(
            duration_s = buffer.duration_s(),
            skip_sampling = request.skip_sampling,
            allowed_len,
            "preloading models"
        );

        // Preload before opening the pipeline so the first segment never stalls (§4.3).
        let accurate_model =
            self.model_cache.get_or_load(accurate_size).await.map_err(PipelineError::ModelLoad)?;
        let detect_model = if needs_two_pass_upfront || needs_sampling {
            Some(self.model_cache.get_or_load(detect_size).await.map_err(PipelineError::ModelLoad)?)
        } else {
            None
        };

        let config = self.config.clone();
        let accurate_model = accurate_model as Arc<dyn Transcribe>;
        let detect_model = detect_model.map(|m| m as Arc<dyn Transcribe>);
        let result = tokio::task::spawn_blocking(move || {
            route(buffer, accurate_model, detect_model, config, request)
        })
        .await
        .map_err(|e| PipelineError::Worker(e.to_string()))??;

        Ok(result)
    }
}

/// The mode-routing logic of §4.8, independent of `ModelCache`. Exposed so
/// tests can drive it with a mock `Transcribe` instead of real model weights.
pub fn route(
    buffer: Arc<crate::audio::AudioBuffer>,
    accurate_model: Arc<dyn Transcribe>,
    detect_model: Option<Arc<dyn Transcribe>>,
    config: PipelineConfig,
    request: MultilangRequest,
) -> Result<TranscriptionResult, PipelineError> {
    let allowed = request.allowed_languages.clone();
    let allowed_len = allowed.as_ref().map(|v| v.len()).unwrap_or(0);

    // Sampling only ever decides which *path* to take (§4.5); the final
    // Classification returned to the caller is always derived from the
    // actual final segments below, since a 3-sample guess can miss a short
    // secondary-language segment that the dense two-pass scan finds.
    if !request.skip_sampling {
        let detect = detect_model.as_ref().expect("detect model preloaded when sampling");
        let classification = sampler::sample_and_classify(
            &buffer,
            detect.as_ref(),
            allowed.as_deref(),
            config.late_ratio,
        )
        .map_err(|e| PipelineError::Worker(e.to_string()))?;

        if classification.mode == Mode::Single && !request.skip_fast_single {
            return run_fast_path(&buffer, &accurate_model, allowed.as_deref(), classification, &request);
        }
    }

    let take_two_pass = if request.skip_sampling { allowed_len >= 2 } else { true };

    if !take_two_pass {
        let classification = Classification {
            mode: Mode::Single,
            primary_language: "unknown".to_string(),
            secondary_languages: HashSet::new(),
            transition_s: None,
        };
        return run_fast_path(&buffer, &accurate_model, allowed.as_deref(), classification, &request);
    }

    let detect = detect_model.expect("detect model preloaded for two-pass path");
    let outcome = scheduler::run_two_pass(
        buffer.clone(),
        detect.clone(),
        accurate_model.clone(),
        allowed.clone(),
        config.chunk_size_s,
        request.cancel_flag.clone(),
        request.progress_cb.clone(),
    )?;

    let partial = request.cancel_flag.load(Ordering::SeqCst);

    // The empty-result safety fallback (§4.8) exists for ubiquitous silence
    // or overly strict filtering, not for cancellation: P8 requires
    // cancellation to strictly dominate completion, so a canceled run must
    // surface as `Canceled` even with zero segments rather than transparently
    // re-running the whole (uncancelable) fast path.
    if outcome.final_segments.is_empty() && !partial {
        warn!("two-pass produced zero segments, falling back to fast path");
        let classification = Classification {
            mode: Mode::Single,
            primary_language: "unknown".to_string(),
            secondary_languages: HashSet::new(),
            transition_s: None,
        };
        return run_fast_path(&buffer, &accurate_model, allowed.as_deref(), classification, &request);
    }

    let classification = classify_from_segments(&outcome.final_segments, buffer.duration_s(), config.late_ratio);
    let result = build_result(
        &outcome.final_segments,
        classification,
        allowed,
        &outcome.raw_chunks,
        &outcome.merged_segments,
        &config,
        &request,
        partial,
    );

    if partial {
        return Err(PipelineError::Canceled { partial: Box::new(result) });
    }
    Ok(result)
}

fn run_fast_path(
    buffer: &crate::audio::AudioBuffer,
    accurate_model: &Arc<dyn Transcribe>,
    allowed: Option<&[String]>,
    mut classification: Classification,
    request: &MultilangRequest,
) -> Result<TranscriptionResult, PipelineError> {
    let handle = ChunkExtractor::extract(buffer, 0.0, buffer.duration_s())
        .map_err(PipelineError::Decode)?;
    let output = accurate_model
        .transcribe_with_prompt(handle.path(), None, true, request.initial_prompt.as_deref())
        .map_err(|e| PipelineError::Worker(e.to_string()))?;

    let corrected_lang = crate::lang::correct(&output.text, &output.language, allowed);
    classification.primary_language = corrected_lang.clone();

    let final_segments = vec![FinalSegment {
        start_s: 0.0,
        end_s: buffer.duration_s(),
        language_code: corrected_lang,
        text: output.text.trim().to_string(),
    }];

    let result = TranscriptionResult {
        text: Reporter::join_text(&final_segments),
        language_timeline: Reporter::language_timeline(&final_segments),
        primary_language: classification.primary_language.clone(),
        allowed_languages: allowed.map(|v| v.to_vec()),
        classification,
        diagnostics: None,
        partial: false,
        segments: final_segments,
    };
    Ok(result)
}

fn majority_language(segments: &[FinalSegment]) -> String {
    let mut tally: std::collections::HashMap<&str, f32> = std::collections::HashMap::new();
    for s in segments {
        *tally.entry(s.language_code.as_str()).or_insert(0.0) += s.end_s - s.start_s;
    }
    tally
        .into_iter()
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap())
        .map(|(lang, _)| lang.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Derive the final classification directly from the two-pass output (§4.8).
/// Never reuses the sampler's guess here: a 3-point sample can land nowhere
/// near a short secondary-language segment that the dense two-pass scan finds,
/// so the reported classification must reflect what was actually transcribed.
///
/// Unlike the sampler's 3-point classify (§4.5), "hybrid" here is decided by
/// how much of the *total* duration the primary language covers, not by the
/// raw timestamp of the first secondary segment: a brief secondary excursion
/// near the start of a long recording is still a rare aberration, not an
/// ongoing code-switch, and should read as hybrid rather than mixed.
fn classify_from_segments(segments: &[FinalSegment], duration_s: f32, late_ratio: f32) -> Classification {
    let primary = majority_language(segments);

    let secondary_languages: HashSet<String> = segments
        .iter()
        .map(|s| s.language_code.clone())
        .filter(|lang| lang != &primary)
        .collect();

    let earliest_secondary_s = segments
        .iter()
        .filter(|s| s.language_code != primary)
        .map(|s| s.start_s)
        .fold(f32::INFINITY, f32::min);

    if secondary_languages.is_empty() {
        return Classification {
            mode: Mode::Single,
            primary_language: primary,
            secondary_languages,
            transition_s: None,
        };
    }

    let primary_duration_s: f32 = segments
        .iter()
        .filter(|s| s.language_code == primary)
        .map(|s| s.end_s - s.start_s)
        .sum();

    let mode = if duration_s > 0.0 && primary_duration_s / duration_s >= late_ratio {
        Mode::Hybrid
    } else {
        Mode::Mixed
    };

    Classification {
        mode,
        primary_language: primary,
        secondary_languages,
        transition_s: Some(earliest_secondary_s),
    }
}

#[allow(clippy::too_many_arguments)]
fn build_result(
    final_segments: &[FinalSegment],
    classification: Classification,
    allowed: Option<Vec<String>>,
    raw_chunks: &[RawChunkResult],
    merged_segments: &[DetectedSegment],
    config: &PipelineConfig,
    request: &MultilangRequest,
    partial: bool,
) -> TranscriptionResult {
    let diagnostics = config.diagnostics_dir.as_ref().map(|dir| {
        let stem = request.diagnostics_stem.as_deref().unwrap_or("audio");
        let json = Reporter::diagnostics_json(
            stem,
            &classification,
            raw_chunks,
            merged_segments,
            final_segments,
            &chrono::Utc::now().to_rfc3339(),
        );
        if let Err(e) = Reporter::save_diagnostics(dir, stem, &json) {
            warn!(error = %e, "failed to write diagnostics file");
        }
        json
    });

    TranscriptionResult {
        text: Reporter::join_text(final_segments),
        language_timeline: Reporter::language_timeline(final_segments),
        primary_language: classification.primary_language.clone(),
        allowed_languages: allowed,
        classification,
        diagnostics,
        partial,
        segments: final_segments.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asr::{ASRError, MockTranscribe};
    use crate::audio::{AudioBuffer, SAMPLE_RATE};

    #[test]
    fn route_propagates_model_failure_from_fast_path() {
        let buffer = Arc::new(AudioBuffer::new(vec![0.0_f32; SAMPLE_RATE as usize]).unwrap());

        let mut mock = MockTranscribe::new();
        mock.expect_transcribe_with_prompt()
            .times(1)
            .returning(|_, _, _, _| {
                Err(ASRError::ModelInferenceError { message: "scripted failure".to_string() })
            });

        let request = MultilangRequest { skip_sampling: true, ..Default::default() };
        let result = route(buffer, Arc::new(mock), None, PipelineConfig::default(), request);

        assert!(matches!(result, Err(PipelineError::Worker(_))));
    }

    #[test]
    fn majority_language_picks_longest_total_duration() {
        let segments = vec![
            FinalSegment { start_s: 0.0, end_s: 1.0, language_code: "en".to_string(), text: "a".to_string() },
            FinalSegment { start_s: 1.0, end_s: 10.0, language_code: "cs".to_string(), text: "b".to_string() },
        ];
        assert_eq!(majority_language(&segments), "cs");
    }

    #[test]
    fn classify_from_segments_single_when_no_secondary() {
        let segments = vec![FinalSegment {
            start_s: 0.0,
            end_s: 10.0,
            language_code: "en".to_string(),
            text: "a".to_string(),
        }];
        let classification = classify_from_segments(&segments, 10.0, 0.85);
        assert_eq!(classification.mode, Mode::Single);
        assert!(classification.secondary_languages.is_empty());
        assert_eq!(classification.transition_s, None);
    }

    #[test]
    fn classify_from_segments_hybrid_for_brief_excursion_in_long_primary() {
        let segments = vec![
            FinalSegment { start_s: 0.0, end_s: 25.0, language_code: "cs".to_string(), text: "a".to_string() },
            FinalSegment { start_s: 25.0, end_s: 28.0, language_code: "en".to_string(), text: "b".to_string() },
            FinalSegment { start_s: 28.0, end_s: 1980.0, language_code: "cs".to_string(), text: "c".to_string() },
        ];
        let classification = classify_from_segments(&segments, 1980.0, 0.85);
        assert_eq!(classification.mode, Mode::Hybrid);
        assert_eq!(classification.primary_language, "cs");
        assert!(classification.secondary_languages.contains("en"));
        assert_eq!(classification.transition_s, Some(25.0));
    }

    #[test]
    fn classify_from_segments_mixed_when_secondary_is_substantial() {
        let segments = vec![
            FinalSegment { start_s: 0.0, end_s: 10.0, language_code: "en".to_string(), text: "a".to_string() },
            FinalSegment { start_s: 10.0, end_s: 20.0, language_code: "cs".to_string(), text: "b".to_string() },
            FinalSegment { start_s: 20.0, end_s: 30.0, language_code: "en".to_string(), text: "c".to_string() },
        ];
        let classification = classify_from_segments(&segments, 30.0, 0.85);
        assert_eq!(classification.mode, Mode::Mixed);
    }
}
