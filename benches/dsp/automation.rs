//! Benchmarks for automation timelines, the per-sample cost of envelopes.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use yeep::{
    dsp::Automation,
    sfx::{Envelope, EnvelopeShape, EnvelopeSpec},
};

use crate::BLOCK_SIZES;

const SAMPLE_RATE: f64 = 48_000.0;

fn envelope_timeline(shape: EnvelopeShape) -> Automation {
    let mut automation = Automation::new(0.0);
    let envelope = Envelope::new(shape, &EnvelopeSpec::adsr(), 0.0).unwrap();
    for breakpoint in envelope.breakpoints() {
        automation.push(breakpoint.to_event());
    }
    automation
}

pub fn bench_automation(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/automation");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        for (label, shape) in [("ar", EnvelopeShape::Ar), ("adsr", EnvelopeShape::Adsr)] {
            // Cursor walk through the attack, as the render path does
            let mut automation = envelope_timeline(shape);
            group.bench_with_input(BenchmarkId::new(label, size), &size, |b, _| {
                b.iter(|| {
                    for (k, out) in buffer.iter_mut().enumerate() {
                        *out = automation.next_value(black_box(0.01 + k as f64 / SAMPLE_RATE));
                    }
                })
            });
        }

        // Random access lookup
        let automation = envelope_timeline(EnvelopeShape::Adsr);
        group.bench_with_input(BenchmarkId::new("value_at", size), &size, |b, _| {
            b.iter(|| {
                for (k, out) in buffer.iter_mut().enumerate() {
                    *out = automation.value_at(black_box(0.06 + k as f64 / SAMPLE_RATE));
                }
            })
        });
    }

    group.finish();
}
