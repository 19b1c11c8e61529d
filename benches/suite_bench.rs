//! Benchmarks for suite ingestion and fusion queries.
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use signal_fusion::{Sample, ScalpingSuite, SignalSuite, StandardSuite};

fn generate_samples(n: usize) -> Vec<Sample> {
    (0..n)
        .map(|i| {
            let t = i as f64;
            let close = 100.0 + (t * 0.1).sin() * 10.0;
            Sample::new(close + 2.0, close - 2.0, close, 1000.0 + (t * 0.2).sin() * 500.0)
        })
        .collect()
}

fn run<S: SignalSuite>(suite: &mut S, samples: &[Sample]) {
    for sample in samples {
        let _ = suite.add(black_box(sample));
        let _ = black_box(suite.combined_signal());
    }
    suite.reset();
}

fn benchmark_ingest_and_fuse(c: &mut Criterion) {
    let mut group = c.benchmark_group("ingest_and_fuse");

    for size in [100usize, 1000, 5000].iter() {
        let samples = generate_samples(*size);

        group.bench_with_input(BenchmarkId::new("standard", size), &samples, |b, samples| {
            let mut suite = StandardSuite::new().unwrap();
            b.iter(|| run(&mut suite, samples));
        });

        group.bench_with_input(BenchmarkId::new("scalping", size), &samples, |b, samples| {
            let mut suite = ScalpingSuite::new().unwrap();
            b.iter(|| run(&mut suite, samples));
        });
    }

    group.finish();
}

fn benchmark_queries(c: &mut Criterion) {
    let samples = generate_samples(500);
    let mut standard = StandardSuite::new().unwrap();
    let mut scalping = ScalpingSuite::new().unwrap();
    for sample in &samples {
        standard.add(sample).unwrap();
        scalping.add(sample).unwrap();
    }

    let mut group = c.benchmark_group("queries");
    group.bench_function("standard_signal", |b| {
        b.iter(|| black_box(standard.combined_signal()))
    });
    group.bench_function("scalping_signal", |b| {
        b.iter(|| black_box(scalping.combined_signal()))
    });
    group.bench_function("scalping_divergence", |b| {
        b.iter(|| black_box(scalping.divergence_signals()))
    });
    group.finish();
}

criterion_group!(benches, benchmark_ingest_and_fuse, benchmark_queries);
criterion_main!(benches);
