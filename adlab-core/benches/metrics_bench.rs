//! Criterion benchmarks for the metric kernel and ranking hot loops.
//!
//! Run with: `cargo bench -p adlab-core`

use adlab_core::metrics::{auroc, top_precision, TOP_QUANTILE};
use adlab_core::rank::rank_values;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

/// Deterministic scores with plenty of ties and roughly 10% positives.
fn generate_scored_labels(count: usize) -> (Vec<f64>, Vec<f64>) {
    let scores = (0..count).map(|i| ((i * 7919) % 1000) as f64 / 1000.0).collect();
    let labels = (0..count)
        .map(|i| if (i * 31) % 10 == 0 { 1.0 } else { 0.0 })
        .collect();
    (scores, labels)
}

fn bench_auroc(c: &mut Criterion) {
    let mut group = c.benchmark_group("auroc");

    for size in [100, 1_000, 10_000, 100_000].iter() {
        let (scores, labels) = generate_scored_labels(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| auroc(black_box(&scores), black_box(&labels)));
        });
    }

    group.finish();
}

fn bench_top_precision(c: &mut Criterion) {
    let mut group = c.benchmark_group("top_precision");

    for size in [1_000, 100_000].iter() {
        let (scores, labels) = generate_scored_labels(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| top_precision(black_box(&scores), black_box(&labels), TOP_QUANTILE));
        });
    }

    group.finish();
}

fn bench_rank_row(c: &mut Criterion) {
    let row: Vec<Option<f64>> = (0..40)
        .map(|i| if i % 9 == 0 { None } else { Some((i % 7) as f64) })
        .collect();
    c.bench_function("rank_row_40", |b| {
        b.iter(|| rank_values(black_box(&row), true));
    });
}

criterion_group!(benches, bench_auroc, bench_top_precision, bench_rank_row);
criterion_main!(benches);
