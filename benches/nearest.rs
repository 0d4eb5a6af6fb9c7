//! Benchmarks for the exact top-k selectors.
//!
//! These measure the scan that dominates exact query time: popcount
//! distances fed through the bounded-heap selector, narrow and wide, plus
//! the chunked batch variant.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::prelude::*;

use bitnear::{nearest, nearest_wide, nearest_wide_batch};

fn random_narrow(n: usize) -> Vec<u64> {
    let mut rng = StdRng::seed_from_u64(42);
    (0..n).map(|_| rng.gen()).collect()
}

fn random_wide(n: usize, width: usize) -> Vec<Vec<u64>> {
    let mut rng = StdRng::seed_from_u64(42);
    (0..n)
        .map(|_| (0..width).map(|_| rng.gen()).collect())
        .collect()
}

fn bench_nearest_narrow(c: &mut Criterion) {
    let mut group = c.benchmark_group("nearest_narrow");
    let k = 10;

    for n in [1_000usize, 10_000, 100_000] {
        group.throughput(Throughput::Elements(n as u64));
        let data = random_narrow(n);
        let x = 0xABCD_EF01_2345_6789u64;
        let mut distances = vec![0u32; k + 1];
        let mut indices = vec![0usize; k + 1];

        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |bench, _| {
            bench.iter(|| {
                nearest(
                    black_box(&data),
                    k,
                    black_box(x),
                    &mut distances,
                    &mut indices,
                )
            });
        });
    }

    group.finish();
}

fn bench_nearest_wide(c: &mut Criterion) {
    let mut group = c.benchmark_group("nearest_wide");
    let k = 10;
    let n = 10_000;

    for width in [2usize, 4, 8, 16] {
        group.throughput(Throughput::Elements(n as u64));
        let data = random_wide(n, width);
        let x: Vec<u64> = random_narrow(width);
        let mut distances = vec![0u32; k + 1];
        let mut indices = vec![0usize; k + 1];

        group.bench_with_input(BenchmarkId::from_parameter(width), &width, |bench, _| {
            bench.iter(|| {
                nearest_wide(
                    black_box(&data),
                    k,
                    black_box(&x),
                    &mut distances,
                    &mut indices,
                )
            });
        });
    }

    group.finish();
}

fn bench_nearest_wide_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("nearest_wide_batch");
    let k = 10;
    let n = 10_000;
    let width = 8;
    let data = random_wide(n, width);
    let x: Vec<u64> = random_narrow(width);

    for batch_len in [16usize, 64, 256] {
        group.throughput(Throughput::Elements(n as u64));
        let mut batch = vec![0u32; batch_len];
        let mut distances = vec![0u32; k + 1];
        let mut indices = vec![0usize; k + 1];

        group.bench_with_input(
            BenchmarkId::from_parameter(batch_len),
            &batch_len,
            |bench, _| {
                bench.iter(|| {
                    nearest_wide_batch(
                        black_box(&data),
                        k,
                        black_box(&x),
                        &mut batch,
                        &mut distances,
                        &mut indices,
                    )
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_nearest_narrow,
    bench_nearest_wide,
    bench_nearest_wide_batch
);
criterion_main!(benches);
