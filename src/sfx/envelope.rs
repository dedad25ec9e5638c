use tracing::trace;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    dsp::AutomationEvent,
    error::{check_duration, check_level, Result},
    graph::{NodeId, Param, RenderHost},
    SILENCE,
};

/*
Gain Envelopes
==============

An envelope is a gain curve written once into a gain node's automation
timeline, anchored at the absolute clock time the sound was triggered.

  gain
  attack_vol ┤        ╱╲
  decay_vol  ┤       ╱  ╲__________
             │      ╱              ╲
  0.00001    ┤_____╱                ╲___
             └────┬────┬───┬───────┬────┬──→ time
             start+delay  +A  +D   +S   +R

Breakpoints, in order:

  1. set 0 at time 0          hard reset, nothing carries over
  2. set 0.00001 at start+delay
  3. exp ramp to attack_vol   ending after attack
  4. ADSR: exp ramp to decay_vol after decay, hold decay_vol through
     sustain (a ramp to the same value), exp ramp to 0.00001 after release
     AR:   exp ramp to 0.00001 after release

Exponential ramps sound linear to the ear (loudness is logarithmic) and avoid
clicks. They cannot reach 0, hence the 0.00001 floor.
*/

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeShape {
    /// Attack-release.
    Ar,
    /// Attack-decay-sustain-release.
    Adsr,
}

/// Envelope timing and levels. Durations in seconds, levels as linear gain.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeSpec {
    pub delay: f64,
    pub attack: f64,
    pub attack_vol: f32,
    pub decay: f64,
    pub decay_vol: f32,
    pub sustain: f64,
    pub release: f64,
}

impl EnvelopeSpec {
    /// Attack-release defaults.
    pub fn ar() -> Self {
        Self {
            delay: 0.0,
            attack: 0.05,
            attack_vol: 1.0,
            decay: 0.0,
            decay_vol: 1.0,
            sustain: 0.0,
            release: 0.02,
        }
    }

    /// Attack-decay-sustain-release defaults.
    pub fn adsr() -> Self {
        Self {
            delay: 0.0,
            attack: 0.05,
            attack_vol: 1.0,
            decay: 0.02,
            decay_vol: 0.8,
            sustain: 0.2,
            release: 0.02,
        }
    }

    pub fn with_delay(mut self, delay: f64) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_attack(mut self, attack: f64, attack_vol: f32) -> Self {
        self.attack = attack;
        self.attack_vol = attack_vol;
        self
    }

    pub fn with_decay(mut self, decay: f64, decay_vol: f32) -> Self {
        self.decay = decay;
        self.decay_vol = decay_vol;
        self
    }

    pub fn with_sustain(mut self, sustain: f64) -> Self {
        self.sustain = sustain;
        self
    }

    pub fn with_release(mut self, release: f64) -> Self {
        self.release = release;
        self
    }

    pub fn validate(&self, shape: EnvelopeShape) -> Result<()> {
        check_duration("delay", self.delay)?;
        check_duration("attack", self.attack)?;
        check_duration("release", self.release)?;
        check_level("attack_vol", self.attack_vol, 1.0)?;
        if shape == EnvelopeShape::Adsr {
            check_duration("decay", self.decay)?;
            check_duration("sustain", self.sustain)?;
            check_level("decay_vol", self.decay_vol, 1.0)?;
        }
        Ok(())
    }

    /// Seconds from trigger to the end of the release.
    pub fn total_duration(&self, shape: EnvelopeShape) -> f64 {
        match shape {
            EnvelopeShape::Ar => self.delay + self.attack + self.release,
            EnvelopeShape::Adsr => {
                self.delay + self.attack + self.decay + self.sustain + self.release
            }
        }
    }
}

impl Default for EnvelopeSpec {
    fn default() -> Self {
        Self::adsr()
    }
}

/// How the value is reached at a breakpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Set,
    ExponentialRamp,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Breakpoint {
    /// Absolute clock time in seconds.
    pub time: f64,
    pub value: f32,
    pub transition: Transition,
}

impl Breakpoint {
    fn set(time: f64, value: f32) -> Self {
        Self {
            time,
            value,
            transition: Transition::Set,
        }
    }

    fn ramp(time: f64, value: f32) -> Self {
        Self {
            time,
            value,
            transition: Transition::ExponentialRamp,
        }
    }

    pub fn to_event(self) -> AutomationEvent {
        match self.transition {
            Transition::Set => AutomationEvent::SetValue {
                time: self.time,
                value: self.value,
            },
            Transition::ExponentialRamp => AutomationEvent::ExponentialRamp {
                end: self.time,
                value: self.value,
            },
        }
    }
}

/// A validated gain curve anchored at an absolute start time.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    shape: EnvelopeShape,
    breakpoints: Vec<Breakpoint>,
}

impl Envelope {
    pub fn new(shape: EnvelopeShape, spec: &EnvelopeSpec, start: f64) -> Result<Self> {
        spec.validate(shape)?;

        let mut t = start + spec.delay;
        let mut breakpoints = vec![Breakpoint::set(0.0, 0.0), Breakpoint::set(t, SILENCE)];

        t += spec.attack;
        breakpoints.push(Breakpoint::ramp(t, spec.attack_vol));

        if shape == EnvelopeShape::Adsr {
            t += spec.decay;
            breakpoints.push(Breakpoint::ramp(t, spec.decay_vol));
            t += spec.sustain;
            breakpoints.push(Breakpoint::ramp(t, spec.decay_vol));
        }

        t += spec.release;
        breakpoints.push(Breakpoint::ramp(t, SILENCE));

        Ok(Self { shape, breakpoints })
    }

    pub fn shape(&self) -> EnvelopeShape {
        self.shape
    }

    pub fn breakpoints(&self) -> &[Breakpoint] {
        &self.breakpoints
    }

    /// Absolute time the gain is back at the floor.
    pub fn end_time(&self) -> f64 {
        self.breakpoints.last().map_or(0.0, |b| b.time)
    }

    /// Write the curve into `gain`'s automation timeline, in order.
    pub fn apply(&self, host: &mut dyn RenderHost, gain: NodeId) -> Result<()> {
        for breakpoint in &self.breakpoints {
            host.automate(gain, Param::Gain, breakpoint.to_event())?;
        }
        trace!(node = %gain, end = self.end_time(), "envelope scheduled");
        Ok(())
    }
}

/// Create a gain node driven by an envelope starting now.
pub fn build_envelope(
    host: &mut dyn RenderHost,
    shape: EnvelopeShape,
    spec: &EnvelopeSpec,
) -> Result<NodeId> {
    let envelope = Envelope::new(shape, spec, host.current_time())?;
    let gain = host.create_gain(0.0)?;
    envelope.apply(host, gain)?;
    Ok(gain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::YeepError, graph::RecordingHost};

    fn times(envelope: &Envelope) -> Vec<f64> {
        envelope.breakpoints().iter().map(|b| b.time).collect()
    }

    #[test]
    fn ar_breakpoints() {
        let spec = EnvelopeSpec::ar().with_delay(0.5);
        let envelope = Envelope::new(EnvelopeShape::Ar, &spec, 10.0).unwrap();
        let points = envelope.breakpoints();

        assert_eq!(points.len(), 4);
        assert_eq!(points[0], Breakpoint::set(0.0, 0.0));
        assert_eq!(points[1], Breakpoint::set(10.5, SILENCE));
        assert!((points[2].time - 10.55).abs() < 1e-9);
        assert_eq!(points[2].value, 1.0);
        assert_eq!(points[2].transition, Transition::ExponentialRamp);
        assert!((points[3].time - 10.57).abs() < 1e-9);
        assert_eq!(points[3].value, SILENCE);
    }

    #[test]
    fn adsr_holds_decay_level_through_sustain() {
        let spec = EnvelopeSpec::adsr();
        let envelope = Envelope::new(EnvelopeShape::Adsr, &spec, 0.0).unwrap();
        let points = envelope.breakpoints();

        assert_eq!(points.len(), 6);
        assert_eq!(points[3].value, 0.8);
        assert_eq!(points[4].value, 0.8);
        assert!((points[4].time - points[3].time - 0.2).abs() < 1e-9);
        assert_eq!(points[5].value, SILENCE);
    }

    #[test]
    fn breakpoints_are_time_ordered() {
        let spec = EnvelopeSpec::adsr()
            .with_delay(0.3)
            .with_attack(0.0, 0.5)
            .with_sustain(1.5);
        let envelope = Envelope::new(EnvelopeShape::Adsr, &spec, 2.0).unwrap();
        assert!(times(&envelope).windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn total_duration_matches_end() {
        let spec = EnvelopeSpec::adsr().with_delay(0.25).with_release(0.7);
        for shape in [EnvelopeShape::Ar, EnvelopeShape::Adsr] {
            let envelope = Envelope::new(shape, &spec, 3.0).unwrap();
            let expected = 3.0 + spec.total_duration(shape);
            assert!((envelope.end_time() - expected).abs() < 1e-9);
        }
        assert!((spec.total_duration(EnvelopeShape::Ar) - (0.25 + 0.05 + 0.7)).abs() < 1e-9);
    }

    #[test]
    fn never_targets_zero_with_a_ramp() {
        let envelope = Envelope::new(EnvelopeShape::Adsr, &EnvelopeSpec::adsr(), 0.0).unwrap();
        assert!(envelope
            .breakpoints()
            .iter()
            .filter(|b| b.transition == Transition::ExponentialRamp)
            .all(|b| b.value > 0.0));
    }

    #[test]
    fn rejects_invalid_specs() {
        let negative = EnvelopeSpec::ar().with_release(-1.0);
        assert!(matches!(
            Envelope::new(EnvelopeShape::Ar, &negative, 0.0),
            Err(YeepError::InvalidDuration { field: "release", .. })
        ));

        let silent = EnvelopeSpec::adsr().with_decay(0.1, 0.0);
        assert!(matches!(
            Envelope::new(EnvelopeShape::Adsr, &silent, 0.0),
            Err(YeepError::InvalidLevel { field: "decay_vol", .. })
        ));

        // AR ignores decay fields
        assert!(Envelope::new(EnvelopeShape::Ar, &silent, 0.0).is_ok());
    }

    #[test]
    fn build_envelope_applies_curve_to_new_gain() {
        let mut host = RecordingHost::new(48_000.0);
        host.set_time(1.0);
        let gain = build_envelope(&mut host, EnvelopeShape::Ar, &EnvelopeSpec::ar()).unwrap();

        let events = host.automation(gain, Param::Gain);
        assert_eq!(events.len(), 4);
        assert_eq!(
            events[1],
            AutomationEvent::SetValue {
                time: 1.0,
                value: SILENCE
            }
        );
    }
}
