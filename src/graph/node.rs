use std::fmt;

use crate::{
    dsp::{AutomationEvent, FilterType, NoiseKind, Waveform},
    error::Result,
};

/// Handle to a node owned by a render host.
///
/// Ids carry a generation so a handle to a discarded node never aliases a
/// newer node that reused its slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl NodeId {
    pub(crate) fn new(index: usize, generation: u32) -> Self {
        Self {
            index: index as u32,
            generation,
        }
    }

    pub fn index(self) -> usize {
        self.index as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}.{}", self.index, self.generation)
    }
}

/// Automatable parameters exposed by graph nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Param {
    /// Oscillator frequency in Hz.
    Frequency,
    /// Linear gain multiplier.
    Gain,
    /// Filter cutoff in Hz.
    Cutoff,
    /// Filter quality factor.
    Q,
}

impl Param {
    pub fn name(self) -> &'static str {
        match self {
            Param::Frequency => "frequency",
            Param::Gain => "gain",
            Param::Cutoff => "cutoff",
            Param::Q => "q",
        }
    }
}

/// What a node is, independent of its render state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeKind {
    Destination,
    Oscillator { waveform: Waveform, frequency: f32 },
    Noise { kind: NoiseKind, buffer_size: usize },
    Filter { filter_type: FilterType, cutoff: f32, q: f32 },
    Gain { gain: f32 },
}

impl NodeKind {
    /// Sources generate signal and take no inputs.
    pub fn is_source(&self) -> bool {
        matches!(self, NodeKind::Oscillator { .. } | NodeKind::Noise { .. })
    }

    pub fn has_param(&self, param: Param) -> bool {
        matches!(
            (self, param),
            (NodeKind::Oscillator { .. }, Param::Frequency)
                | (NodeKind::Filter { .. }, Param::Cutoff | Param::Q)
                | (NodeKind::Gain { .. }, Param::Gain)
        )
    }
}

/// The capability a render host offers to the builders.
///
/// Every builder receives the host explicitly, so independent hosts (a live
/// output, an offline bounce, a recorder in tests) can coexist. All methods
/// run in the control domain; a host renders in its own callback.
pub trait RenderHost {
    fn sample_rate(&self) -> f32;

    /// Monotonic clock in seconds.
    fn current_time(&self) -> f64;

    /// Shared output sink. Everything connected to it is summed.
    fn destination(&self) -> NodeId;

    fn create_oscillator(&mut self, waveform: Waveform, frequency: f32) -> Result<NodeId>;

    fn create_noise(&mut self, kind: NoiseKind, buffer_size: usize) -> Result<NodeId>;

    fn create_filter(&mut self, filter_type: FilterType, cutoff: f32, q: f32) -> Result<NodeId>;

    fn create_gain(&mut self, gain: f32) -> Result<NodeId>;

    /// Route the output of `from` into `to`. Connections must stay acyclic.
    fn connect(&mut self, from: NodeId, to: NodeId) -> Result<()>;

    /// Schedule an automation event on a node parameter.
    fn automate(&mut self, node: NodeId, param: Param, event: AutomationEvent) -> Result<()>;

    /// Schedule a source to begin producing signal at `at`.
    fn start(&mut self, node: NodeId, at: f64) -> Result<()>;

    /// Schedule a source to go silent at `at`. A stopped source is never restarted.
    fn stop(&mut self, node: NodeId, at: f64) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_belong_to_their_nodes() {
        let osc = NodeKind::Oscillator {
            waveform: Waveform::Sine,
            frequency: 440.0,
        };
        assert!(osc.has_param(Param::Frequency));
        assert!(!osc.has_param(Param::Gain));

        let filter = NodeKind::Filter {
            filter_type: FilterType::LowPass,
            cutoff: 500.0,
            q: 1.0,
        };
        assert!(filter.has_param(Param::Cutoff));
        assert!(filter.has_param(Param::Q));
        assert!(!NodeKind::Destination.has_param(Param::Gain));
    }

    #[test]
    fn sources() {
        assert!(NodeKind::Noise {
            kind: NoiseKind::Pink,
            buffer_size: 64
        }
        .is_source());
        assert!(!NodeKind::Gain { gain: 1.0 }.is_source());
    }
}
