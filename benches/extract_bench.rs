//! Benchmarks for score extraction at varying response lengths.
//!
//! Run with: `cargo bench --bench extract_bench`

use std::fmt::Write;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use vidcoach::extract_series;

/// Feedback prose followed by a fenced JSON block with `seconds` points per series.
fn well_formed(seconds: u64) -> String {
    let mut text = String::from(
        "Your opening was confident and your pace was steady. \
         Work on eye contact during the middle section.\n\n```json\n{\"confidenceData\": [",
    );
    for t in 0..seconds {
        let sep = if t == 0 { "" } else { ", " };
        let _ = write!(text, "{sep}{{\"timestamp\": {t}, \"confidence\": {}}}", 50 + t % 40);
    }
    text.push_str("],\n\"engagementData\": [");
    for t in 0..seconds {
        let sep = if t == 0 { "" } else { ", " };
        let _ = write!(text, "{sep}{{\"timestamp\": {t}, \"engagement\": {}}}", 60 + t % 30);
    }
    text.push_str("]}\n```\n");
    text
}

/// Same payload cut off mid-way through the engagement array.
fn truncated(seconds: u64) -> String {
    let full = well_formed(seconds);
    let cut = full.len() - full.len() / 8;
    full[..cut].to_string()
}

fn bench_extract(c: &mut Criterion) {
    let mut group = c.benchmark_group("extract_series");

    for seconds in [30u64, 300, 1800] {
        let clean = well_formed(seconds);
        group.throughput(Throughput::Bytes(clean.len() as u64));
        group.bench_with_input(BenchmarkId::new("well_formed", seconds), &clean, |b, text| {
            b.iter(|| extract_series(black_box(text)));
        });

        let broken = truncated(seconds);
        group.throughput(Throughput::Bytes(broken.len() as u64));
        group.bench_with_input(BenchmarkId::new("truncated", seconds), &broken, |b, text| {
            b.iter(|| extract_series(black_box(text)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_extract);
criterion_main!(benches);
