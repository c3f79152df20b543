//! Reporter (C9): build the aggregate text, the human-readable language
//! timeline, and the diagnostics JSON.

use crate::lang;
use crate::pipeline::types::{Classification, DetectedSegment, FinalSegment, RawChunkResult};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::Path;

pub struct Reporter;

impl Reporter {
    /// `[MM:SS - MM:SS] Language: <Name> (<CODE>)`, one line per FinalSegment.
    pub fn language_timeline(segments: &[FinalSegment]) -> String {
        segments
            .iter()
            .map(|s| {
                format!(
                    "[{} - {}] Language: {} ({})",
                    format_timestamp(s.start_s),
                    format_timestamp(s.end_s),
                    lang::table().language_name(&s.language_code),
                    s.language_code.to_uppercase()
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Space-joined concatenation of FinalSegment texts (spec invariant 4 / P5).
    pub fn join_text(segments: &[FinalSegment]) -> String {
        segments
            .iter()
            .map(|s| s.text.as_str())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Diagnostics JSON matching §6.4's field layout, keyed by the audio
    /// file's stem.
    pub fn diagnostics_json(
        audio_file: &str,
        classification: &Classification,
        raw_segments: &[RawChunkResult],
        merged_segments: &[DetectedSegment],
        final_segments: &[FinalSegment],
        timestamp_rfc3339: &str,
    ) -> Value {
        let mut merged_stats =
            language_stats_obj(merged_segments.iter().map(|s| (s.language_code.as_str(), s.end_s - s.start_s)));
        merged_stats.insert(
            "segments_merged".to_string(),
            json!(raw_segments.len().saturating_sub(merged_segments.len())),
        );

        json!({
            "audio_file": audio_file,
            "timestamp": timestamp_rfc3339,
            "classification": {
                "mode": format!("{:?}", classification.mode).to_lowercase(),
                "primary_language": classification.primary_language,
                "secondary_languages": classification.secondary_languages.iter().collect::<Vec<_>>(),
                "transition_s": classification.transition_s,
            },
            "statistics": {
                "raw_segments": language_stats(raw_segments.iter().map(|r| (r.language_code.as_str(), r.end_s - r.start_s))),
                "merged_segments": merged_stats,
            },
            "raw_segments": raw_segments,
            "merged_segments": merged_segments,
            "final_segments": final_segments,
        })
    }

    pub fn save_diagnostics(dir: &Path, stem: &str, diagnostics: &Value) -> std::io::Result<()> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(format!("{}_diagnostics.json", stem));
        let content = serde_json::to_string_pretty(diagnostics)?;
        std::fs::write(path, content)
    }
}

fn format_timestamp(seconds: f32) -> String {
    let total = seconds.max(0.0) as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}

fn language_stats<'a>(items: impl Iterator<Item = (&'a str, f32)>) -> Value {
    Value::Object(language_stats_obj(items))
}

fn language_stats_obj<'a>(
    items: impl Iterator<Item = (&'a str, f32)>,
) -> serde_json::Map<String, Value> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut durations: HashMap<&str, f32> = HashMap::new();
    let mut total_count = 0usize;
    let mut total_duration = 0.0_f32;

    for (lang_code, duration) in items {
        *counts.entry(lang_code).or_insert(0) += 1;
        *durations.entry(lang_code).or_insert(0.0) += duration;
        total_count += 1;
        total_duration += duration;
    }

    let mut breakdown = serde_json::Map::new();
    for (lang_code, count) in &counts {
        let duration = durations.get(lang_code).copied().unwrap_or(0.0);
        breakdown.insert(
            lang_code.to_string(),
            json!({
                "language_name": lang::table().language_name(lang_code),
                "segment_count": count,
                "total_duration_seconds": duration,
                "percentage_by_count": if total_count > 0 { 100.0 * *count as f32 / total_count as f32 } else { 0.0 },
                "percentage_by_duration": if total_duration > 0.0 { 100.0 * duration / total_duration } else { 0.0 },
            }),
        );
    }

    let mut result = serde_json::Map::new();
    result.insert("total_count".to_string(), json!(total_count));
    result.insert("languages_detected".to_string(), json!(counts.len()));
    result.insert("language_breakdown".to_string(), Value::Object(breakdown));
    result
}
