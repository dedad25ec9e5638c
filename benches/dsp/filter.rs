//! Benchmarks for the state-variable filter.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use yeep::dsp::{filter::DEFAULT_Q, FilterType, NoiseGenerator, NoiseKind, SVFilter};

use crate::BLOCK_SIZES;

pub fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/filter");

    for &size in BLOCK_SIZES {
        // Noise input so the filter has something to chew on
        let mut input = vec![0.0f32; size];
        NoiseGenerator::with_seed(NoiseKind::White, size, 7)
            .unwrap()
            .fill(&mut input);
        let mut buffer = input.clone();

        for filter_type in [FilterType::LowPass, FilterType::HighPass] {
            let mut filter = SVFilter::new(filter_type);
            group.bench_with_input(
                BenchmarkId::new(filter_type.to_string(), size),
                &size,
                |b, _| {
                    b.iter(|| {
                        buffer.copy_from_slice(&input);
                        filter.render(black_box(&mut buffer), 2_000.0, DEFAULT_Q, 48_000.0);
                    })
                },
            );
        }

        // Cutoff moving every sample, as under a sweep
        let mut filter = SVFilter::lowpass();
        group.bench_with_input(BenchmarkId::new("swept", size), &size, |b, _| {
            b.iter(|| {
                for (i, s) in buffer.iter_mut().enumerate() {
                    let cutoff = 500.0 + i as f32;
                    *s = filter.next_sample(black_box(input[i]), cutoff, DEFAULT_Q, 48_000.0);
                }
            })
        });
    }

    group.finish();
}
