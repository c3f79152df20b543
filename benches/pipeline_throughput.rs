//! Throughput benchmarks for the parts of the pipeline that don't require a
//! loaded acoustic model: chunk merging (Pass 1's fold-into-running logic,
//! replayed standalone) and lexical heuristic scoring/correction. These run
//! on every chunk of every call, so their per-chunk cost sets a floor under
//! the whole pipeline's throughput.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use polyglot_transcribe::lang;
use polyglot_transcribe::pipeline::detection::merge_raw_chunks;
use polyglot_transcribe::pipeline::types::RawChunkResult;

fn alternating_chunks(n: usize) -> Vec<RawChunkResult> {
    let langs = ["en", "cs"];
    (0..n)
        .map(|i| RawChunkResult {
            start_s: i as f32 * 3.0,
            end_s: (i as f32 + 1.0) * 3.0,
            language_code: langs[i % langs.len()].to_string(),
            text: "dobry den hello there".to_string(),
        })
        .collect()
}

fn long_runs_chunks(n: usize) -> Vec<RawChunkResult> {
    (0..n)
        .map(|i| RawChunkResult {
            start_s: i as f32 * 3.0,
            end_s: (i as f32 + 1.0) * 3.0,
            language_code: "en".to_string(),
            text: "the quick brown fox".to_string(),
        })
        .collect()
}

fn benchmark_merge_raw_chunks(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge_raw_chunks");

    for chunk_count in [10usize, 100, 990] {
        let alternating = alternating_chunks(chunk_count);
        group.bench_with_input(
            BenchmarkId::new("alternating_language", chunk_count),
            &alternating,
            |b, chunks| b.iter(|| black_box(merge_raw_chunks(chunks))),
        );

        let long_runs = long_runs_chunks(chunk_count);
        group.bench_with_input(
            BenchmarkId::new("single_language_run", chunk_count),
            &long_runs,
            |b, chunks| b.iter(|| black_box(merge_raw_chunks(chunks))),
        );
    }

    group.finish();
}

fn benchmark_lang_correct(c: &mut Criterion) {
    let mut group = c.benchmark_group("lang_correct");
    let allowed = vec!["en".to_string(), "cs".to_string(), "de".to_string()];

    let samples = [
        ("short_en", "hello there"),
        ("short_cs", "dobry den"),
        ("long_mixed", "the quick brown fox jumped over the lazy dog and then dobry den jak se mas"),
    ];

    for (name, text) in samples {
        group.bench_with_input(BenchmarkId::new("correct", name), &text, |b, text| {
            b.iter(|| black_box(lang::correct(text, "en", Some(&allowed))))
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_merge_raw_chunks, benchmark_lang_correct);
criterion_main!(benches);
