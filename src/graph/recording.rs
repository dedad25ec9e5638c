use crate::{
    dsp::{AutomationEvent, FilterType, NoiseKind, Waveform},
    error::{Result, YeepError},
    graph::node::{NodeId, NodeKind, Param, RenderHost},
};

/// One call made against a [`RecordingHost`].
#[derive(Debug, Clone, PartialEq)]
pub enum HostCall {
    Create { node: NodeId, kind: NodeKind },
    Connect { from: NodeId, to: NodeId },
    Automate {
        node: NodeId,
        param: Param,
        event: AutomationEvent,
    },
    Start { node: NodeId, at: f64 },
    Stop { node: NodeId, at: f64 },
}

/// A scheduled oscillator or noise source, as seen by the recorder.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledSource {
    pub node: NodeId,
    pub kind: NodeKind,
    pub start: Option<f64>,
    pub stop: Option<f64>,
}

/// A host that renders nothing and remembers everything.
///
/// Used for dry runs and for checking what an effect schedules. The clock
/// only moves when told to.
pub struct RecordingHost {
    sample_rate: f32,
    time: f64,
    kinds: Vec<NodeKind>,
    calls: Vec<HostCall>,
}

impl RecordingHost {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            time: 0.0,
            kinds: vec![NodeKind::Destination],
            calls: Vec::new(),
        }
    }

    pub fn set_time(&mut self, time: f64) {
        self.time = time;
    }

    pub fn calls(&self) -> &[HostCall] {
        &self.calls
    }

    pub fn kind(&self, node: NodeId) -> Option<NodeKind> {
        self.kinds.get(node.index()).copied()
    }

    /// Nodes created so far, the destination excluded.
    pub fn node_count(&self) -> usize {
        self.kinds.len() - 1
    }

    /// Every source in creation order with its start/stop schedule.
    pub fn sources(&self) -> Vec<ScheduledSource> {
        let mut sources: Vec<ScheduledSource> = self
            .calls
            .iter()
            .filter_map(|call| match *call {
                HostCall::Create { node, kind } if kind.is_source() => Some(ScheduledSource {
                    node,
                    kind,
                    start: None,
                    stop: None,
                }),
                _ => None,
            })
            .collect();

        for call in &self.calls {
            match *call {
                HostCall::Start { node, at } => {
                    if let Some(source) = sources.iter_mut().find(|s| s.node == node) {
                        source.start.get_or_insert(at);
                    }
                }
                HostCall::Stop { node, at } => {
                    if let Some(source) = sources.iter_mut().find(|s| s.node == node) {
                        source.stop = Some(at);
                    }
                }
                _ => {}
            }
        }
        sources
    }

    /// Automation events scheduled on a parameter, in call order.
    pub fn automation(&self, node: NodeId, param: Param) -> Vec<AutomationEvent> {
        self.calls
            .iter()
            .filter_map(|call| match *call {
                HostCall::Automate {
                    node: n,
                    param: p,
                    event,
                } if n == node && p == param => Some(event),
                _ => None,
            })
            .collect()
    }

    /// Nodes `node` outputs into.
    pub fn outputs(&self, node: NodeId) -> Vec<NodeId> {
        self.calls
            .iter()
            .filter_map(|call| match *call {
                HostCall::Connect { from, to } if from == node => Some(to),
                _ => None,
            })
            .collect()
    }

    /// Follow first outputs from `node` to the end of its chain.
    pub fn chain(&self, node: NodeId) -> Vec<NodeId> {
        let mut chain = vec![node];
        let mut current = node;
        while let Some(&next) = self.outputs(current).first() {
            chain.push(next);
            current = next;
        }
        chain
    }

    fn create(&mut self, kind: NodeKind) -> NodeId {
        let node = NodeId::new(self.kinds.len(), 0);
        self.kinds.push(kind);
        self.calls.push(HostCall::Create { node, kind });
        node
    }

    fn lookup(&self, node: NodeId) -> Result<NodeKind> {
        self.kind(node).ok_or(YeepError::UnknownNode(node.index()))
    }
}

impl RenderHost for RecordingHost {
    fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    fn current_time(&self) -> f64 {
        self.time
    }

    fn destination(&self) -> NodeId {
        NodeId::new(0, 0)
    }

    fn create_oscillator(&mut self, waveform: Waveform, frequency: f32) -> Result<NodeId> {
        Ok(self.create(NodeKind::Oscillator {
            waveform,
            frequency,
        }))
    }

    fn create_noise(&mut self, kind: NoiseKind, buffer_size: usize) -> Result<NodeId> {
        if buffer_size == 0 {
            return Err(YeepError::InvalidBufferSize(buffer_size));
        }
        Ok(self.create(NodeKind::Noise { kind, buffer_size }))
    }

    fn create_filter(&mut self, filter_type: FilterType, cutoff: f32, q: f32) -> Result<NodeId> {
        Ok(self.create(NodeKind::Filter {
            filter_type,
            cutoff,
            q,
        }))
    }

    fn create_gain(&mut self, gain: f32) -> Result<NodeId> {
        Ok(self.create(NodeKind::Gain { gain }))
    }

    fn connect(&mut self, from: NodeId, to: NodeId) -> Result<()> {
        let from_kind = self.lookup(from)?;
        let to_kind = self.lookup(to)?;
        if matches!(from_kind, NodeKind::Destination) || to_kind.is_source() || from == to {
            return Err(YeepError::InvalidConnection(format!("{from} -> {to}")));
        }
        self.calls.push(HostCall::Connect { from, to });
        Ok(())
    }

    fn automate(&mut self, node: NodeId, param: Param, event: AutomationEvent) -> Result<()> {
        if !self.lookup(node)?.has_param(param) {
            return Err(YeepError::InvalidParam {
                node: node.index(),
                param: param.name(),
            });
        }
        self.calls.push(HostCall::Automate { node, param, event });
        Ok(())
    }

    fn start(&mut self, node: NodeId, at: f64) -> Result<()> {
        if !self.lookup(node)?.is_source() {
            return Err(YeepError::InvalidConnection(format!("{node} is not a source")));
        }
        self.calls.push(HostCall::Start { node, at });
        Ok(())
    }

    fn stop(&mut self, node: NodeId, at: f64) -> Result<()> {
        if !self.lookup(node)?.is_source() {
            return Err(YeepError::InvalidConnection(format!("{node} is not a source")));
        }
        self.calls.push(HostCall::Stop { node, at });
        Ok(())
    }
}
