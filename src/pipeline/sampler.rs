//! Sampler & Classification (C5): a handful of strategic windows decide
//! whether the fast single-language path or the full two-pass applies.

use crate::asr::Transcribe;
use crate::audio::AudioBuffer;
use crate::lang;
use crate::pipeline::chunk::ChunkExtractor;
use crate::pipeline::error::PipelineError;
use crate::pipeline::types::{Classification, Mode};
use std::collections::HashSet;
use tracing::debug;

const SAMPLE_WINDOW_S: f32 = 4.0;
const SHORT_INPUT_THRESHOLD_S: f32 = 10.0;

/// The `(start_s, end_s)` sample windows for a given duration (spec §4.5).
fn sample_points(duration_s: f32) -> Vec<f32> {
    if duration_s < SHORT_INPUT_THRESHOLD_S {
        return vec![0.0];
    }
    vec![
        (0.05 * duration_s).max(2.0),
        duration_s / 2.0,
        (duration_s - 6.0).min(0.95 * duration_s),
    ]
}

/// Run the fast model over a handful of strategic windows and classify the
/// input as single/mixed/hybrid.
pub fn sample_and_classify(
    buffer: &AudioBuffer,
    fast_model: &dyn Transcribe,
    allowed_languages: Option<&[String]>,
    late_ratio: f32,
) -> Result<Classification, PipelineError> {
    let duration_s = buffer.duration_s();
    let points = sample_points(duration_s);

    let mut hits: Vec<(f32, String)> = Vec::new();
    for point in points {
        let window_end = (point + SAMPLE_WINDOW_S).min(duration_s);
        let handle = match ChunkExtractor::extract(buffer, point, window_end) {
            Ok(h) => h,
            Err(_) => continue,
        };
        let output = match fast_model.transcribe(handle.path(), None, false) {
            Ok(o) => o,
            Err(e) => {
                debug!(error = %e, "sample window transcription failed, skipping");
                continue;
            }
        };
        let allowed_vec = allowed_languages.map(|v| v.to_vec());
        let corrected =
            lang::correct(&output.text, &output.language, allowed_vec.as_deref());
        hits.push((point, corrected));
    }

    if hits.is_empty() {
        return Ok(Classification {
            mode: Mode::Single,
            primary_language: "unknown".to_string(),
            secondary_languages: HashSet::new(),
            transition_s: None,
        });
    }

    let mut tally: std::collections::HashMap<&str, usize> = std::collections::HashMap::new();
    for (_, lang_code) in &hits {
        *tally.entry(lang_code.as_str()).or_insert(0) += 1;
    }
    let primary = tally
        .iter()
        .max_by_key(|(_, count)| **count)
        .map(|(lang, _)| lang.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let secondary: HashSet<String> = hits
        .iter()
        .map(|(_, lang_code)| lang_code.clone())
        .filter(|lang_code| lang_code != &primary)
        .collect();

    if secondary.is_empty() {
        return Ok(Classification {
            mode: Mode::Single,
            primary_language: primary,
            secondary_languages: HashSet::new(),
            transition_s: None,
        });
    }

    let earliest_secondary = hits
        .iter()
        .filter(|(_, lang_code)| lang_code != &primary)
        .map(|(t, _)| *t)
        .fold(f32::INFINITY, f32::min);

    let mode = if duration_s > 0.0 && earliest_secondary / duration_s >= late_ratio {
        Mode::Hybrid
    } else {
        Mode::Mixed
    };

    Ok(Classification {
        mode,
        primary_language: primary,
        secondary_languages: secondary,
        transition_s: Some(earliest_secondary),
    })
}
