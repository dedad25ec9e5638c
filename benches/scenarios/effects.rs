//! Benchmarks for whole effects.

use std::hint::black_box;

use criterion::{BatchSize, BenchmarkId, Criterion};
use yeep::{
    graph::{RecordingHost, RenderContext},
    EffectOptions, EngineConfig, Yeep,
};

use crate::BLOCK_SIZES;

/// A tone effect, a noise effect, and the densest composite.
const EFFECTS: &[&str] = &["ping", "snare", "zelda", "beat"];

fn engine() -> (EngineConfig, Yeep) {
    let config = EngineConfig::default().with_logging(false);
    let yeep = Yeep::new(config.clone()).unwrap();
    (config, yeep)
}

/// Graph construction: validation dry run plus the real schedule.
pub fn bench_schedule(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/schedule");
    let (_, yeep) = engine();

    for &name in EFFECTS {
        group.bench_function(name, |b| {
            b.iter_batched(
                || RecordingHost::new(48_000.0),
                |mut host| {
                    yeep.play(&mut host, black_box(name), EffectOptions::default())
                        .unwrap();
                    host
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

/// First block of a freshly scheduled effect, every source live.
pub fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/render");
    let (config, yeep) = engine();

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        for &name in EFFECTS {
            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, _| {
                b.iter_batched(
                    || {
                        let mut context = RenderContext::new(&config).unwrap().with_seed(1);
                        yeep.play(&mut context, name, EffectOptions::default())
                            .unwrap();
                        context
                    },
                    |mut context| {
                        context.render(black_box(&mut buffer));
                        context
                    },
                    BatchSize::SmallInput,
                )
            });
        }
    }

    group.finish();
}
