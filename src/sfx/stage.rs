//! Filter and gain stages inserted before or after the envelope.
//!
//! Stages are plain descriptions; nothing touches the host until the whole
//! chain has been validated.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    dsp::{AutomationEvent, FilterType},
    error::{check_duration, Result, YeepError},
    graph::{NodeId, Param, RenderHost},
};

/// A parameter change relative to the moment the sound is triggered.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamStep {
    Set { offset: f64, value: f32 },
    LinearRamp { offset: f64, value: f32 },
    ExponentialRamp { offset: f64, value: f32 },
}

impl ParamStep {
    fn offset(&self) -> f64 {
        match *self {
            ParamStep::Set { offset, .. }
            | ParamStep::LinearRamp { offset, .. }
            | ParamStep::ExponentialRamp { offset, .. } => offset,
        }
    }

    fn validate(&self) -> Result<()> {
        check_duration("offset", self.offset())?;
        match *self {
            ParamStep::ExponentialRamp { value, .. } if !(value.is_finite() && value > 0.0) => {
                Err(YeepError::InvalidFrequency { hz: value })
            }
            ParamStep::Set { value, .. } | ParamStep::LinearRamp { value, .. }
                if !value.is_finite() =>
            {
                Err(YeepError::InvalidFrequency { hz: value })
            }
            _ => Ok(()),
        }
    }

    /// The same step, `by` seconds later.
    pub fn shifted(self, by: f64) -> Self {
        match self {
            ParamStep::Set { offset, value } => ParamStep::Set {
                offset: offset + by,
                value,
            },
            ParamStep::LinearRamp { offset, value } => ParamStep::LinearRamp {
                offset: offset + by,
                value,
            },
            ParamStep::ExponentialRamp { offset, value } => ParamStep::ExponentialRamp {
                offset: offset + by,
                value,
            },
        }
    }

    /// Anchor the step at absolute time `now`.
    pub fn at(self, now: f64) -> AutomationEvent {
        match self {
            ParamStep::Set { offset, value } => AutomationEvent::SetValue {
                time: now + offset,
                value,
            },
            ParamStep::LinearRamp { offset, value } => AutomationEvent::LinearRamp {
                end: now + offset,
                value,
            },
            ParamStep::ExponentialRamp { offset, value } => AutomationEvent::ExponentialRamp {
                end: now + offset,
                value,
            },
        }
    }
}

/// Stage Q unless overridden: a 1 dB resonant bump for lowpass and
/// highpass, unit Q for the band responses.
pub fn default_q(filter_type: FilterType) -> f32 {
    match filter_type {
        FilterType::LowPass | FilterType::HighPass => 10f32.powf(1.0 / 20.0),
        FilterType::BandPass | FilterType::Notch => 1.0,
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    /// Resonant filter with an optional cutoff sweep.
    Filter {
        filter_type: FilterType,
        cutoff: f32,
        q: f32,
        sweep: Vec<ParamStep>,
    },
    /// Fixed gain multiplier.
    Gain(f32),
}

impl Stage {
    pub fn filter(filter_type: FilterType, cutoff: f32) -> Self {
        Stage::Filter {
            filter_type,
            cutoff,
            q: default_q(filter_type),
            sweep: Vec::new(),
        }
    }

    pub fn lowpass(cutoff: f32) -> Self {
        Self::filter(FilterType::LowPass, cutoff)
    }

    pub fn highpass(cutoff: f32) -> Self {
        Self::filter(FilterType::HighPass, cutoff)
    }

    pub fn bandpass(cutoff: f32) -> Self {
        Self::filter(FilterType::BandPass, cutoff)
    }

    pub fn gain(gain: f32) -> Self {
        Stage::Gain(gain)
    }

    pub fn with_q(mut self, value: f32) -> Self {
        if let Stage::Filter { q, .. } = &mut self {
            *q = value;
        }
        self
    }

    /// Add a cutoff change. Ignored on gain stages.
    pub fn with_step(mut self, step: ParamStep) -> Self {
        if let Stage::Filter { sweep, .. } = &mut self {
            sweep.push(step);
        }
        self
    }

    /// Hold `from` at `offset`, then sweep exponentially to `to` over `duration`.
    pub fn sweep_exp(self, offset: f64, from: f32, to: f32, duration: f64) -> Self {
        self.with_step(ParamStep::Set {
            offset,
            value: from,
        })
        .with_step(ParamStep::ExponentialRamp {
            offset: offset + duration,
            value: to,
        })
    }

    /// Push every cutoff change `by` seconds later.
    pub fn delayed(mut self, by: f64) -> Self {
        if let Stage::Filter { sweep, .. } = &mut self {
            for step in sweep.iter_mut() {
                *step = step.shifted(by);
            }
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Stage::Filter {
                cutoff, q, sweep, ..
            } => {
                if !(cutoff.is_finite() && *cutoff > 0.0) {
                    return Err(YeepError::InvalidFrequency { hz: *cutoff });
                }
                if !(q.is_finite() && *q > 0.0) {
                    return Err(YeepError::InvalidLevel {
                        field: "q",
                        level: *q,
                    });
                }
                sweep.iter().try_for_each(ParamStep::validate)
            }
            Stage::Gain(gain) => {
                if gain.is_finite() && *gain >= 0.0 {
                    Ok(())
                } else {
                    Err(YeepError::InvalidLevel {
                        field: "gain",
                        level: *gain,
                    })
                }
            }
        }
    }

    /// Create the node for this stage, sweeps anchored at `now`.
    pub fn create(&self, host: &mut dyn RenderHost, now: f64) -> Result<NodeId> {
        match self {
            Stage::Filter {
                filter_type,
                cutoff,
                q,
                sweep,
            } => {
                let node = host.create_filter(*filter_type, *cutoff, *q)?;
                for step in sweep {
                    host.automate(node, Param::Cutoff, step.at(now))?;
                }
                Ok(node)
            }
            Stage::Gain(gain) => host.create_gain(*gain),
        }
    }
}
