//! Benchmarks for the colored noise generators.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use yeep::dsp::{NoiseGenerator, NoiseKind};

use crate::BLOCK_SIZES;

pub fn bench_noise(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/noise");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        for kind in [NoiseKind::White, NoiseKind::Pink, NoiseKind::Brown] {
            let mut generator = NoiseGenerator::with_seed(kind, size, 42).unwrap();
            group.bench_with_input(BenchmarkId::new(kind.name(), size), &size, |b, _| {
                b.iter(|| {
                    generator.fill(black_box(&mut buffer));
                })
            });
        }
    }

    group.finish();
}
