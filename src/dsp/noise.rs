use std::{fmt, str::FromStr};

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Result, YeepError};

/*
Colored Noise
=============

White noise has equal energy at every frequency. Coloring it is a matter of
running it through a low-order recurrence whose state carries over from one
sample to the next (and from one block to the next):

  white   independent uniform draws in [-1, 1]
  pink    sum of six leaky integrators plus a one-sample delayed tap
          (Paul Kellet's refined approximation), falls ≈ -3 dB/octave
  brown   one leaky integrator, falls ≈ -6 dB/octave

The scale factors (0.11 for pink, 3.5 for brown) bring the output back to
roughly unit peak level.

State is owned by exactly one generator and survives across `fill` calls.
*/

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NoiseKind {
    #[default]
    White,
    Pink,
    Brown,
}

impl NoiseKind {
    pub const ALL: [NoiseKind; 3] = [NoiseKind::White, NoiseKind::Pink, NoiseKind::Brown];

    pub fn name(self) -> &'static str {
        match self {
            NoiseKind::White => "white",
            NoiseKind::Pink => "pink",
            NoiseKind::Brown => "brown",
        }
    }
}

impl fmt::Display for NoiseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for NoiseKind {
    type Err = YeepError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        NoiseKind::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| YeepError::UnknownNoiseKind(s.to_string()))
    }
}

/// Kellet pink-noise filter state.
#[derive(Debug, Clone, Copy, Default)]
pub struct PinkState {
    b: [f32; 7],
}

impl PinkState {
    const GAIN: f32 = 0.11;

    #[inline]
    pub fn step(&mut self, white: f32) -> f32 {
        let b = &mut self.b;
        b[0] = 0.99886 * b[0] + white * 0.0555179;
        b[1] = 0.99332 * b[1] + white * 0.0750759;
        b[2] = 0.96900 * b[2] + white * 0.1538520;
        b[3] = 0.86650 * b[3] + white * 0.3104856;
        b[4] = 0.55000 * b[4] + white * 0.5329522;
        b[5] = -0.7616 * b[5] - white * 0.0168980;
        let out = b.iter().sum::<f32>() + white * 0.5362;
        // b6 feeds the next sample, not this one
        b[6] = white * 0.115926;
        out * Self::GAIN
    }
}

/// Leaky-integrator (random walk) state.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrownState {
    last_out: f32,
}

impl BrownState {
    const LEAK: f32 = 0.02;
    const GAIN: f32 = 3.5;

    #[inline]
    pub fn step(&mut self, white: f32) -> f32 {
        self.last_out = (self.last_out + Self::LEAK * white) / (1.0 + Self::LEAK);
        self.last_out * Self::GAIN
    }
}

#[derive(Debug, Clone, Copy)]
enum NoiseState {
    White,
    Pink(PinkState),
    Brown(BrownState),
}

/// A pull-based noise source.
///
/// The host calls [`NoiseGenerator::fill`] once per block; nothing in the
/// per-sample path allocates, locks or fails.
pub struct NoiseGenerator {
    kind: NoiseKind,
    state: NoiseState,
    rng: Pcg32,
    buffer_size: usize,
}

impl NoiseGenerator {
    /// Create a generator seeded from OS entropy.
    pub fn new(kind: NoiseKind, buffer_size: usize) -> Result<Self> {
        Self::with_rng(kind, buffer_size, Pcg32::from_entropy())
    }

    /// Create a generator with a fixed seed (reproducible runs, tests).
    pub fn with_seed(kind: NoiseKind, buffer_size: usize, seed: u64) -> Result<Self> {
        Self::with_rng(kind, buffer_size, Pcg32::seed_from_u64(seed))
    }

    fn with_rng(kind: NoiseKind, buffer_size: usize, rng: Pcg32) -> Result<Self> {
        if buffer_size == 0 {
            return Err(YeepError::InvalidBufferSize(buffer_size));
        }
        let state = match kind {
            NoiseKind::White => NoiseState::White,
            NoiseKind::Pink => NoiseState::Pink(PinkState::default()),
            NoiseKind::Brown => NoiseState::Brown(BrownState::default()),
        };
        Ok(Self {
            kind,
            state,
            rng,
            buffer_size,
        })
    }

    pub fn kind(&self) -> NoiseKind {
        self.kind
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        let white = self.rng.gen::<f32>() * 2.0 - 1.0;
        match &mut self.state {
            NoiseState::White => white,
            NoiseState::Pink(pink) => pink.step(white),
            NoiseState::Brown(brown) => brown.step(white),
        }
    }

    /// Fill a block with noise. State carries over to the next call.
    pub fn fill(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.next_sample();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const N: usize = 48_000;

    fn render(kind: NoiseKind, seed: u64) -> Vec<f32> {
        let mut generator = NoiseGenerator::with_seed(kind, 4096, seed).unwrap();
        let mut out = vec![0.0f32; N];
        for block in out.chunks_mut(generator.buffer_size()) {
            generator.fill(block);
        }
        out
    }

    #[test]
    fn white_is_centered_and_bounded() {
        let samples = render(NoiseKind::White, 7);
        let mean = samples.iter().map(|&s| s as f64).sum::<f64>() / N as f64;
        assert!(mean.abs() < 0.02, "mean drifted: {mean}");
        assert!(samples.iter().all(|s| (-1.0..=1.0).contains(s)));
    }

    #[test]
    fn pink_is_bounded() {
        let samples = render(NoiseKind::Pink, 11);
        let peak = samples.iter().fold(0.0f32, |acc, &s| acc.max(s.abs()));
        assert!(peak < 1.5, "pink peak too high: {peak}");
        assert!(peak > 0.05, "pink suspiciously quiet: {peak}");
    }

    #[test]
    fn brown_walk_is_bounded() {
        let samples = render(NoiseKind::Brown, 13);
        // |last_out| <= 0.02 / 0.02 = 1 for any input sequence, times the 3.5 gain
        assert!(samples.iter().all(|s| s.abs() <= 3.5));
    }

    #[test]
    fn pink_delayed_tap_applies_to_next_sample() {
        let mut pink = PinkState::default();
        let first = pink.step(1.0);
        let expected_first = (0.0555179 + 0.0750759 + 0.1538520 + 0.3104856 + 0.5329522
            - 0.0168980
            + 0.5362)
            * 0.11;
        assert!((first - expected_first).abs() < 1e-6);

        // With silence in, the second sample still carries b6 from the first
        let second = pink.step(0.0);
        assert!(second.abs() > 0.0);
    }

    #[test]
    fn brown_recurrence() {
        let mut brown = BrownState::default();
        let out = brown.step(1.0);
        assert!((out - 0.02 / 1.02 * 3.5).abs() < 1e-6);
    }

    #[test]
    fn state_persists_across_blocks() {
        let mut whole = NoiseGenerator::with_seed(NoiseKind::Brown, 64, 3).unwrap();
        let mut split = NoiseGenerator::with_seed(NoiseKind::Brown, 64, 3).unwrap();

        let mut a = vec![0.0f32; 128];
        whole.fill(&mut a);

        let mut b = vec![0.0f32; 128];
        let (head, tail) = b.split_at_mut(64);
        split.fill(head);
        split.fill(tail);

        assert_eq!(a, b);
    }

    #[test]
    fn generators_do_not_share_state() {
        let mut a = NoiseGenerator::with_seed(NoiseKind::Pink, 32, 5).unwrap();
        let mut b = NoiseGenerator::with_seed(NoiseKind::Pink, 32, 5).unwrap();

        let mut first = [0.0f32; 32];
        a.fill(&mut first);
        a.fill(&mut first);

        let mut fresh = [0.0f32; 32];
        b.fill(&mut fresh);
        let mut again = [0.0f32; 32];
        NoiseGenerator::with_seed(NoiseKind::Pink, 32, 5)
            .unwrap()
            .fill(&mut again);
        assert_eq!(fresh, again);
    }

    #[test]
    fn zero_buffer_is_rejected() {
        assert!(matches!(
            NoiseGenerator::new(NoiseKind::White, 0),
            Err(YeepError::InvalidBufferSize(0))
        ));
    }

    #[test]
    fn parses_kinds() {
        assert_eq!("pink".parse::<NoiseKind>(), Ok(NoiseKind::Pink));
        assert!("blue".parse::<NoiseKind>().is_err());
    }
}
