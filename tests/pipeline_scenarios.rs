//! End-to-end scenarios from spec §8, driven through `pipeline::route` with
//! scripted fixtures so no real model weights or network access are needed.

mod common;

use common::{entry, init_tracing, region, ScriptedSource, ScriptedTranscribe};
use polyglot_transcribe::asr::{ASRError, ModelSize, Transcribe, TranscribeOutput};
use polyglot_transcribe::audio::{AudioBuffer, AudioStore};
use polyglot_transcribe::pipeline::{route, Mode, MultilangRequest, PipelineConfig, PipelineError};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

fn buffer_of(source: ScriptedSource) -> Arc<AudioBuffer> {
    let mut source = source;
    let store = AudioStore::open(&mut source).unwrap();
    Arc::new(store.into_buffer())
}

fn base_request(allowed: Option<Vec<String>>, skip_sampling: bool) -> MultilangRequest {
    MultilangRequest {
        accurate_model_size: ModelSize::Tiny,
        allowed_languages: allowed,
        skip_sampling,
        ..Default::default()
    }
}

const EN_TEXT: &str = "the quick brown fox and the lazy dog is in our house";
const CS_TEXT: &str = "dobrý den, jak se máš, to je dobře";

#[test]
fn scenario_1_monolingual_english_fast_path() {
    init_tracing();
    let buffer = buffer_of(ScriptedSource::new(vec![region(10.0, 0.2)]));
    let detect = Arc::new(ScriptedTranscribe::new(vec![entry(0.2, "en", EN_TEXT)]));
    let accurate = Arc::new(ScriptedTranscribe::new(vec![entry(0.2, "en", EN_TEXT)]));
    let request = base_request(Some(vec!["en".to_string()]), false);

    let result = route(buffer, accurate, Some(detect), PipelineConfig::default(), request).unwrap();

    assert_eq!(result.classification.mode, Mode::Single);
    assert_eq!(result.segments.len(), 1);
    assert_eq!(result.segments[0].language_code, "en");
    assert!((result.segments[0].start_s - 0.0).abs() < 1e-3);
    assert!((result.segments[0].end_s - 10.0).abs() < 1e-3);
    assert!(!result.segments[0].text.is_empty());
}

#[test]
fn scenario_2_code_switched_en_cs_en() {
    init_tracing();
    let buffer = buffer_of(ScriptedSource::new(vec![
        region(10.0, 0.2),
        region(10.0, 0.8),
        region(10.0, 0.2),
    ]));
    let entries = vec![entry(0.2, "en", EN_TEXT), entry(0.8, "cs", CS_TEXT)];
    let detect = Arc::new(ScriptedTranscribe::new(entries.clone()));
    let accurate = Arc::new(ScriptedTranscribe::new(entries));
    let allowed = Some(vec!["en".to_string(), "cs".to_string()]);
    let request = base_request(allowed, true);

    let result = route(buffer, accurate, Some(detect), PipelineConfig::default(), request).unwrap();

    assert_eq!(result.segments.len(), 3);
    for s in &result.segments {
        assert!(s.language_code == "en" || s.language_code == "cs");
    }
    assert_eq!(result.segments[0].language_code, "en");
    assert_eq!(result.segments[1].language_code, "cs");
    assert_eq!(result.segments[2].language_code, "en");

    // ±1 chunk (3s) boundary tolerance around the 10s/20s transitions.
    assert!((result.segments[0].end_s - 10.0).abs() <= 3.0);
    assert!((result.segments[1].start_s - 10.0).abs() <= 3.0);
    assert!((result.segments[1].end_s - 20.0).abs() <= 3.0);
    assert!((result.segments[2].start_s - 20.0).abs() <= 3.0);
}

#[test]
fn scenario_3_brief_excursion_in_long_clip_classifies_hybrid() {
    init_tracing();
    let buffer = buffer_of(ScriptedSource::new(vec![
        region(25.0, 0.8),
        region(3.0, 0.2),
        region(1980.0 - 28.0, 0.8),
    ]));
    let entries = vec![entry(0.2, "en", EN_TEXT), entry(0.8, "cs", CS_TEXT)];
    let detect = Arc::new(ScriptedTranscribe::new(entries.clone()));
    let accurate = Arc::new(ScriptedTranscribe::new(entries));
    // skip_sampling forces the dense two-pass scan; a 3-point sample over a
    // 33-minute clip would miss the 3s English blip entirely.
    let request = base_request(None, true);

    let result = route(buffer, accurate, Some(detect), PipelineConfig::default(), request).unwrap();

    assert_eq!(result.classification.mode, Mode::Hybrid);
    assert_eq!(result.classification.primary_language, "cs");
    assert!(result.classification.secondary_languages.contains("en"));
    assert!(result.segments.len() >= 2);

    let en_segment = result.segments.iter().find(|s| s.language_code == "en");
    assert!(en_segment.is_some());
    let en_segment = en_segment.unwrap();
    assert!(en_segment.start_s >= 22.0 && en_segment.start_s <= 28.0);
}

#[test]
fn scenario_4_silence_only_falls_back_to_fast_path() {
    init_tracing();
    let buffer = buffer_of(ScriptedSource::silence(5.0));
    // Silence maps to empty text; allowed-restricted + empty text is dropped
    // by both passes, so the two-pass run yields zero final segments.
    let entries = vec![entry(0.0, "unknown", ""), entry(0.5, "en", EN_TEXT)];
    let detect = Arc::new(ScriptedTranscribe::new(entries.clone()));
    let accurate = Arc::new(ScriptedTranscribe::new(entries));
    let allowed = Some(vec!["en".to_string(), "cs".to_string()]);
    let request = base_request(allowed, true);

    let result = route(buffer, accurate, Some(detect), PipelineConfig::default(), request).unwrap();

    assert_eq!(result.segments.len(), 1);
    assert!(result.segments[0].text.trim().is_empty() || result.segments[0].text.len() < 5);
    assert!(!result.partial);
}

/// Wraps a `ScriptedTranscribe` and flips a shared cancel flag once enough
/// calls have gone through it, simulating cancellation mid-run.
struct CancelingTranscribe {
    inner: ScriptedTranscribe,
    cancel_after: usize,
    calls: AtomicUsize,
    cancel_flag: Arc<AtomicBool>,
}

impl Transcribe for CancelingTranscribe {
    fn transcribe_with_prompt(
        &self,
        chunk_path: &Path,
        language: Option<&str>,
        word_timestamps: bool,
        initial_prompt: Option<&str>,
    ) -> Result<TranscribeOutput, ASRError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if n >= self.cancel_after {
            self.cancel_flag.store(true, Ordering::SeqCst);
        }
        self.inner.transcribe_with_prompt(chunk_path, language, word_timestamps, initial_prompt)
    }
}

#[test]
fn scenario_5_cancellation_midway_returns_partial() {
    init_tracing();
    // 60s clip, 3s chunks => 20 detection windows; cancel partway through.
    let buffer = buffer_of(ScriptedSource::new(vec![region(60.0, 0.5)]));
    let entries = vec![entry(0.5, "en", EN_TEXT)];
    let cancel_flag = Arc::new(AtomicBool::new(false));
    let detect = Arc::new(CancelingTranscribe {
        inner: ScriptedTranscribe::new(entries.clone()),
        cancel_after: 10,
        calls: AtomicUsize::new(0),
        cancel_flag: cancel_flag.clone(),
    });
    let accurate = Arc::new(ScriptedTranscribe::new(entries));

    let mut request = base_request(Some(vec!["en".to_string()]), true);
    request.cancel_flag = cancel_flag;

    let err = route(buffer, accurate, Some(detect), PipelineConfig::default(), request).unwrap_err();

    match err {
        PipelineError::Canceled { partial } => {
            assert!(partial.partial);
            if let Some(last) = partial.segments.last() {
                assert!(last.end_s <= 0.6 * 60.0 + 3.0);
            }
        }
        other => panic!("expected Canceled, got {other:?}"),
    }
}

#[test]
fn scenario_6_single_inference_failure_among_many_is_tolerated() {
    init_tracing();
    // 200 alternating-language 3s chunks (600s) so DetectionPass never folds
    // consecutive chunks together, producing exactly 200 DetectedSegments.
    let mut regions = Vec::new();
    for i in 0..200 {
        let amp = if i % 2 == 0 { 0.2 } else { 0.8 };
        regions.push(region(3.0, amp));
    }
    let buffer = buffer_of(ScriptedSource::new(regions));
    let entries = vec![entry(0.2, "en", EN_TEXT), entry(0.8, "cs", CS_TEXT)];
    let detect = Arc::new(ScriptedTranscribe::new(entries.clone()));
    // Fail exactly the 200th transcription-pass call.
    let accurate = Arc::new(ScriptedTranscribe::failing_every_nth(entries, 200));

    let allowed = Some(vec!["en".to_string(), "cs".to_string()]);
    let request = base_request(allowed, true);

    let result = route(buffer, accurate, Some(detect), PipelineConfig::default(), request).unwrap();

    assert_eq!(result.segments.len(), 199);
}
