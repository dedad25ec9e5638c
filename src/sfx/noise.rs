use tracing::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    config::DEFAULT_NOISE_BUFFER_SIZE,
    dsp::NoiseKind,
    error::{Result, YeepError},
    graph::{NodeId, RenderHost},
    sfx::{
        envelope::{Envelope, EnvelopeShape, EnvelopeSpec},
        stage::Stage,
        tone::wire_chain,
    },
};

/// A one-shot burst of noise shaped by an attack-release envelope.
///
/// The source is stopped once the release is over, same as a tone.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct NoiseSpec {
    pub kind: NoiseKind,
    /// Samples generated per refill. `None` uses the engine default.
    pub buffer_size: Option<usize>,
    pub envelope: EnvelopeSpec,
    pub pre_gain: Vec<Stage>,
    pub post_gain: Vec<Stage>,
}

impl Default for NoiseSpec {
    fn default() -> Self {
        Self {
            kind: NoiseKind::White,
            buffer_size: None,
            envelope: EnvelopeSpec::ar(),
            pre_gain: Vec::new(),
            post_gain: Vec::new(),
        }
    }
}

impl NoiseSpec {
    pub fn new(kind: NoiseKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    pub fn buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = Some(buffer_size);
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

/// Build and schedule a noise burst. Returns the last node before the
/// destination.
pub fn build_noise(host: &mut dyn RenderHost, spec: &NoiseSpec) -> Result<NodeId> {
    let buffer_size = spec.buffer_size.unwrap_or(DEFAULT_NOISE_BUFFER_SIZE);
    if buffer_size == 0 {
        return Err(YeepError::InvalidBufferSize(buffer_size));
    }
    let now = host.current_time();
    let envelope = Envelope::new(EnvelopeShape::Ar, &spec.envelope, now)?;
    for stage in spec.pre_gain.iter().chain(&spec.post_gain) {
        stage.validate()?;
    }

    let source = host.create_noise(spec.kind, buffer_size)?;
    let last = wire_chain(host, source, &spec.pre_gain, &envelope, &spec.post_gain, now)?;

    let stop = envelope.end_time();
    host.start(source, now)?;
    host.stop(source, stop)?;

    debug!(
        kind = %spec.kind,
        buffer_size,
        start = now,
        stop,
        "noise scheduled"
    );
    Ok(last)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{NodeKind, Param, RecordingHost};

    #[test]
    fn noise_is_one_shot() {
        let mut host = RecordingHost::new(44_100.0);
        host.set_time(0.5);
        let spec = NoiseSpec::new(NoiseKind::Pink)
            .envelope(EnvelopeSpec::ar().with_attack(0.0, 1.0).with_release(1.0))
            .delay(0.25);
        build_noise(&mut host, &spec).unwrap();

        let sources = host.sources();
        assert_eq!(sources.len(), 1);
        assert_eq!(
            sources[0].kind,
            NodeKind::Noise {
                kind: NoiseKind::Pink,
                buffer_size: DEFAULT_NOISE_BUFFER_SIZE
            }
        );
        assert_eq!(sources[0].start, Some(0.5));
        assert!((sources[0].stop.unwrap() - 1.75).abs() < 1e-9);
    }

    #[test]
    fn stages_wrap_the_envelope() {
        let mut host = RecordingHost::new(44_100.0);
        let spec = NoiseSpec::default()
            .post_gain(Stage::highpass(1500.0).sweep_exp(0.0, 1500.0, 3000.0, 0.5));
        let last = build_noise(&mut host, &spec).unwrap();

        let source = host.sources()[0].node;
        let chain = host.chain(source);
        assert_eq!(chain.len(), 4);
        assert_eq!(chain[2], last);
        assert_eq!(host.automation(chain[1], Param::Gain).len(), 4);
        assert_eq!(host.automation(last, Param::Cutoff).len(), 2);
    }

    #[test]
    fn zero_buffer_is_rejected_before_any_node() {
        let mut host = RecordingHost::new(44_100.0);
        let spec = NoiseSpec::default().buffer_size(0);
        assert_eq!(
            build_noise(&mut host, &spec),
            Err(YeepError::InvalidBufferSize(0))
        );
        assert!(host.calls().is_empty());
    }
}
