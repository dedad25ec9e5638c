use std::{f32::consts::PI, fmt, str::FromStr};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::YeepError;

/*
| type              | passes          | rejects      |
| ----------------- | --------------- | ------------ |
| low-pass          | below cutoff    | above cutoff |
| high-pass         | above cutoff    | below cutoff |
| band-pass         | around cutoff   | outside      |
| notch / band-stop | outside         | around       |

Topology-preserving state-variable filter. All four responses come out of the
same two integrators; `filter_type` picks one. Q follows the usual biquad
meaning (0.7071 is Butterworth), internally k = 1 / Q.

The cutoff can change every sample (automation); the warped coefficient is
only recomputed when it actually moves.
*/

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterType {
    LowPass,
    HighPass,
    BandPass,
    Notch,
}

impl FilterType {
    pub const ALL: [FilterType; 4] = [
        FilterType::LowPass,
        FilterType::HighPass,
        FilterType::BandPass,
        FilterType::Notch,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FilterType::LowPass => "lowpass",
            FilterType::HighPass => "highpass",
            FilterType::BandPass => "bandpass",
            FilterType::Notch => "notch",
        }
    }
}

impl fmt::Display for FilterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FilterType {
    type Err = YeepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FilterType::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| YeepError::UnknownFilterType(s.to_string()))
    }
}

pub const DEFAULT_Q: f32 = std::f32::consts::FRAC_1_SQRT_2;

pub struct FilterOutputs {
    pub lowpass: f32,
    pub bandpass: f32,
    pub highpass: f32,
    pub notch: f32,
}

pub struct SVFilter {
    ic1eq: f32, // First integrator's memory
    ic2eq: f32, // Second integrator's memory

    filter_type: FilterType,

    // Coefficient cache
    g: f32,
    g_cutoff: f32,
    g_sample_rate: f32,
}

impl SVFilter {
    pub fn new(filter_type: FilterType) -> Self {
        Self {
            ic1eq: 0.0,
            ic2eq: 0.0,
            filter_type,
            g: 0.0,
            g_cutoff: f32::NAN,
            g_sample_rate: f32::NAN,
        }
    }

    pub fn lowpass() -> Self {
        Self::new(FilterType::LowPass)
    }

    pub fn highpass() -> Self {
        Self::new(FilterType::HighPass)
    }

    pub fn filter_type(&self) -> FilterType {
        self.filter_type
    }

    #[inline]
    fn update_g(&mut self, cutoff_hz: f32, sample_rate: f32) {
        if cutoff_hz == self.g_cutoff && sample_rate == self.g_sample_rate {
            return;
        }
        // Keep the prewarp below Nyquist so tan() stays finite
        let nyquist = 0.5 * sample_rate;
        let fc = cutoff_hz.clamp(1.0, nyquist * 0.99);
        self.g = (PI * fc / sample_rate).tan();
        self.g_cutoff = cutoff_hz;
        self.g_sample_rate = sample_rate;
    }

    #[inline]
    fn tick(&mut self, sample: f32, k: f32) -> FilterOutputs {
        let g = self.g;
        let h = 1.0 / (1.0 + g * (g + k));
        let v3 = sample - self.ic2eq;
        let v1 = h * (self.ic1eq + g * v3);
        let v2 = self.ic2eq + g * v1;

        self.ic1eq = 2.0 * v1 - self.ic1eq;
        self.ic2eq = 2.0 * v2 - self.ic2eq;

        FilterOutputs {
            lowpass: v2,
            bandpass: v1,
            highpass: sample - k * v1 - v2,
            notch: sample - k * v1,
        }
    }

    /// Filter one sample with the given cutoff and Q.
    #[inline]
    pub fn next_sample(&mut self, sample: f32, cutoff_hz: f32, q: f32, sample_rate: f32) -> f32 {
        self.update_g(cutoff_hz, sample_rate);
        let k = 1.0 / q.max(0.01);
        let outputs = self.tick(sample, k);

        match self.filter_type {
            FilterType::LowPass => outputs.lowpass,
            FilterType::HighPass => outputs.highpass,
            FilterType::BandPass => outputs.bandpass,
            FilterType::Notch => outputs.notch,
        }
    }

    /// Filter a block in place at a fixed cutoff and Q.
    pub fn render(&mut self, buffer: &mut [f32], cutoff_hz: f32, q: f32, sample_rate: f32) {
        for sample in buffer.iter_mut() {
            *sample = self.next_sample(*sample, cutoff_hz, q, sample_rate);
        }
    }

    pub fn reset(&mut self) {
        self.ic1eq = 0.0;
        self.ic2eq = 0.0;
    }
}
