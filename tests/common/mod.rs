//! Shared test fixtures: a scripted audio source and a scripted model that
//! "recognizes" language from a chunk's mean amplitude instead of running a
//! real acoustic model, so these tests never touch model weights.
#![allow(dead_code)]

use polyglot_transcribe::asr::{ASRError, TranscribeOutput, TranscribeSegment};
use polyglot_transcribe::audio::{AudioError, AudioSource};
use polyglot_transcribe::Transcribe;
use std::path::Path;
use std::sync::Mutex;

pub const SAMPLE_RATE: usize = 16_000;

/// Installs a test-scoped `tracing` subscriber so `cargo test -- --nocapture`
/// shows pipeline logs. The library itself never calls this (§1.1) — only
/// an embedding application or, here, a test harness does.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().with_env_filter(
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
    ).try_init();
}

/// One region of scripted audio: `amplitude` encodes which language the
/// `ScriptedTranscribe` below should "recognize" for samples at this level.
pub struct Region {
    pub duration_s: f32,
    pub amplitude: f32,
}

pub fn region(duration_s: f32, amplitude: f32) -> Region {
    Region { duration_s, amplitude }
}

/// An `AudioSource` that synthesizes a constant-amplitude tone per region,
/// concatenated in order.
pub struct ScriptedSource {
    regions: Vec<Region>,
}

impl ScriptedSource {
    pub fn new(regions: Vec<Region>) -> Self {
        Self { regions }
    }

    pub fn silence(duration_s: f32) -> Self {
        Self::new(vec![region(duration_s, 0.0)])
    }
}

impl AudioSource for ScriptedSource {
    fn read_all(&mut self) -> Result<Vec<f32>, AudioError> {
        let mut samples = Vec::new();
        for r in &self.regions {
            let n = (r.duration_s * SAMPLE_RATE as f32) as usize;
            samples.extend(std::iter::repeat(r.amplitude).take(n));
        }
        Ok(samples)
    }
}

/// Maps an amplitude band to a (language, text) pair a real model would have
/// produced for that audio.
pub struct AmplitudeEntry {
    pub amplitude: f32,
    pub language: &'static str,
    pub text: &'static str,
}

pub fn entry(amplitude: f32, language: &'static str, text: &'static str) -> AmplitudeEntry {
    AmplitudeEntry { amplitude, language, text }
}

/// A `Transcribe` double that reads the chunk's mean amplitude back out of
/// the materialized WAV file and looks up the closest scripted entry. Call
/// counts are tracked so cancellation/partial-failure tests can assert on
/// how much work actually happened.
pub struct ScriptedTranscribe {
    entries: Vec<AmplitudeEntry>,
    pub calls: Mutex<usize>,
    pub fail_every_nth: Option<usize>,
}

impl ScriptedTranscribe {
    pub fn new(entries: Vec<AmplitudeEntry>) -> Self {
        Self { entries, calls: Mutex::new(0), fail_every_nth: None }
    }

    pub fn failing_every_nth(entries: Vec<AmplitudeEntry>, n: usize) -> Self {
        Self { entries, calls: Mutex::new(0), fail_every_nth: Some(n) }
    }

    fn closest(&self, amplitude: f32) -> &AmplitudeEntry {
        self.entries
            .iter()
            .min_by(|a, b| {
                (a.amplitude - amplitude).abs().partial_cmp(&(b.amplitude - amplitude).abs()).unwrap()
            })
            .expect("at least one scripted entry")
    }
}

impl Transcribe for ScriptedTranscribe {
    fn transcribe_with_prompt(
        &self,
        chunk_path: &Path,
        language: Option<&str>,
        _word_timestamps: bool,
        _initial_prompt: Option<&str>,
    ) -> Result<TranscribeOutput, ASRError> {
        let mut calls = self.calls.lock().unwrap();
        *calls += 1;
        if let Some(n) = self.fail_every_nth {
            if n > 0 && *calls % n == 0 {
                return Err(ASRError::ModelInferenceError {
                    message: "scripted inference failure".to_string(),
                });
            }
        }
        drop(calls);

        let mut reader = hound::WavReader::open(chunk_path).map_err(|e| {
            ASRError::ModelInferenceError { message: format!("failed to read chunk: {}", e) }
        })?;
        let samples: Vec<f32> = reader.samples::<f32>().filter_map(Result::ok).collect();
        let mean_abs = if samples.is_empty() {
            0.0
        } else {
            samples.iter().map(|s| s.abs()).sum::<f32>() / samples.len() as f32
        };

        let found = self.closest(mean_abs);
        let lang = language.unwrap_or(found.language).to_string();
        Ok(TranscribeOutput {
            text: found.text.to_string(),
            language: lang,
            segments: vec![TranscribeSegment {
                start_s: 0.0,
                end_s: samples.len() as f32 / SAMPLE_RATE as f32,
                text: found.text.to_string(),
                no_speech_prob: 0.0,
            }],
        })
    }
}
