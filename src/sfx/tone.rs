use tracing::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    dsp::Waveform,
    error::Result,
    graph::{NodeId, RenderHost},
    sfx::{
        envelope::{Envelope, EnvelopeShape, EnvelopeSpec},
        frequency::Pitch,
        stage::Stage,
    },
};

/*
Tones
=====

One oscillator, one envelope, any number of stages on either side:

  [osc] ──→ pre stages ──→ [envelope gain] ──→ post stages ──→ destination

The oscillator starts when the tone is built and stops once the envelope's
release is over. It is never restarted; a stopped chain is left for the host
to discard.

Example usage:
  // A short ping
  build_tone(host, EnvelopeShape::Ar, &ArTone::new("C5").into())?;

  // Filtered square thump
  let kick = ArTone::new("A1")
      .waveform(Waveform::Square)
      .post_gain(Stage::lowpass(500.0))
      .post_gain(Stage::gain(1.5));
*/

/// Full ADSR tone description.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct ToneSpec {
    pub waveform: Waveform,
    pub freq: Pitch,
    pub envelope: EnvelopeSpec,
    pub pre_gain: Vec<Stage>,
    pub post_gain: Vec<Stage>,
}

impl Default for ToneSpec {
    fn default() -> Self {
        Self {
            waveform: Waveform::Sine,
            freq: Pitch::default(),
            envelope: EnvelopeSpec::adsr(),
            pre_gain: Vec::new(),
            post_gain: Vec::new(),
        }
    }
}

impl ToneSpec {
    pub fn new(freq: impl Into<Pitch>) -> Self {
        Self {
            freq: freq.into(),
            ..Self::default()
        }
    }

    pub fn waveform(mut self, waveform: Waveform) -> Self {
        self.waveform = waveform;
        self
    }

    pub fn envelope(mut self, envelope: EnvelopeSpec) -> Self {
        self.envelope = envelope;
        self
    }

    pub fn delay(mut self, delay: f64) -> Self {
        self.envelope.delay = delay;
        self
    }

    pub fn pre_gain(mut self, stage: Stage) -> Self {
        self.pre_gain.push(stage);
        self
    }

    pub fn post_gain(mut self, stage: Stage) -> Self {
        self.post_gain.push(stage);
        self
    }
}

/// Attack-release shorthand: rise for `up`, fall for `down`, peak at `vol`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct ArTone {
    pub waveform: Waveform,
    pub freq: Pitch,
    pub delay: f64,
    pub up: f64,
    pub vol: f32,
    pub down: f64,
    pub pre_gain: Vec<Stage>,
    pub post_gain: Vec<Stage>,
}

impl Default for ArTone {
    fn default() -> Self {
        Self {
            waveform: Waveform::Sine,
            freq: Pitch::default(),
            delay: 0.0,
            up: 0.05,
            vol: 0.4,
            down: 0.5,
            pre_gain: Vec::new(),
            post_gain: Vec::new(),
        }
    }
}

impl ArTone {
    pub fn new(freq: impl Into<Pitch>) -> Self {
        Self {
            freq: freq.into(),
            ..Self::default()
        }
    }

    pub fn waveform(mut self, waveform: Waveform) -> Self {
        self.waveform = waveform;
        self
    }

    pub fn delay(mut self, delay: f64) -> Self {
        self.delay = delay;
        self
    }

    pub fn up(mut self, up: f64) -> Self {
        self.up = up;
        self
    }

    pub fn vol(mut self, vol: f32) -> Self {
        self.vol = vol;
        self
    }

    pub fn down(mut self, down: f64) -> Self {
        self.down = down;
        self
    }

    pub fn pre_gain(mut self, stage: Stage) -> Self {
        self.pre_gain.push(stage);
        self
    }

    pub fn post_gain(mut self, stage: Stage) -> Self {
        self.post_gain.push(stage);
        self
    }
}

impl From<ArTone> for ToneSpec {
    /// ADSR with no decay and no sustain; the level holds at `vol` into the release.
    fn from(tone: ArTone) -> Self {
        ToneSpec {
            waveform: tone.waveform,
            freq: tone.freq,
            envelope: EnvelopeSpec {
                delay: tone.delay,
                attack: tone.up,
                attack_vol: tone.vol,
                decay: 0.0,
                decay_vol: tone.vol,
                sustain: 0.0,
                release: tone.down,
            },
            pre_gain: tone.pre_gain,
            post_gain: tone.post_gain,
        }
    }
}

/// Wire `source → pre → envelope gain → post → destination`.
///
/// Callers validate everything first; this only talks to the host.
pub(crate) fn wire_chain(
    host: &mut dyn RenderHost,
    source: NodeId,
    pre_gain: &[Stage],
    envelope: &Envelope,
    post_gain: &[Stage],
    now: f64,
) -> Result<NodeId> {
    let mut last = source;

    for stage in pre_gain {
        let node = stage.create(host, now)?;
        host.connect(last, node)?;
        last = node;
    }

    let gain = host.create_gain(0.0)?;
    envelope.apply(host, gain)?;
    host.connect(last, gain)?;
    last = gain;

    for stage in post_gain {
        let node = stage.create(host, now)?;
        host.connect(last, node)?;
        last = node;
    }

    let destination = host.destination();
    host.connect(last, destination)?;
    Ok(last)
}

/// Build and schedule a one-shot tone. Returns the last node of the chain
/// before the destination.
///
/// `EnvelopeShape::Ar` ignores the decay and sustain fields.
pub fn build_tone(host: &mut dyn RenderHost, shape: EnvelopeShape, spec: &ToneSpec) -> Result<NodeId> {
    // Validate the whole tone before touching the host
    let frequency = spec.freq.resolve()?;
    let now = host.current_time();
    let envelope = Envelope::new(shape, &spec.envelope, now)?;
    for stage in spec.pre_gain.iter().chain(&spec.post_gain) {
        stage.validate()?;
    }

    let osc = host.create_oscillator(spec.waveform, frequency)?;
    let last = wire_chain(host, osc, &spec.pre_gain, &envelope, &spec.post_gain, now)?;

    let stop = envelope.end_time();
    host.start(osc, now)?;
    host.stop(osc, stop)?;

    debug!(
        waveform = %spec.waveform,
        frequency,
        delay = spec.envelope.delay,
        start = now,
        stop,
        "tone scheduled"
    );
    Ok(last)
}

/// Build an attack-release tone.
pub fn tone_ar(host: &mut dyn RenderHost, tone: ArTone) -> Result<NodeId> {
    build_tone(host, EnvelopeShape::Ar, &tone.into())
}

/// Build an ADSR tone.
pub fn tone_adsr(host: &mut dyn RenderHost, spec: &ToneSpec) -> Result<NodeId> {
    build_tone(host, EnvelopeShape::Adsr, spec)
}
