use tracing::{debug, trace};

use crate::{
    config::EngineConfig,
    dsp::{Automation, AutomationEvent, FilterType, NoiseGenerator, NoiseKind, Oscillator, SVFilter, Waveform},
    error::{Result, YeepError},
    graph::node::{NodeId, NodeKind, Param, RenderHost},
    MAX_BLOCK_SIZE,
};

/*
Render Context
==============

A block renderer that owns every node of every scheduled effect. It plays
two roles:

  control domain   builders create nodes, connect them and schedule
                   automation through the `RenderHost` methods; `prune`
                   discards chains whose sources have stopped
  render domain    `render` fills an output block, advancing the clock;
                   it only touches preallocated buffers

Rendering walks the nodes in dependency order (inputs before consumers). Each
node sums its inputs into a scratch buffer, processes it into its own output
buffer, and the destination's output is the mix.

  [osc] ──→ [filter] ──→ [gain] ──┐
  [noise] ──→ [gain] ──→ [filter] ─┼──→ (+) destination ──→ out
  [osc] ──→ [gain] ────────────────┘
*/

/// Start/stop window of a source.
#[derive(Debug, Clone, Copy, Default)]
struct Span {
    start: Option<f64>,
    stop: Option<f64>,
    finished: bool,
}

impl Span {
    #[inline]
    fn is_playing(&mut self, t: f64) -> bool {
        if let Some(stop) = self.stop {
            if t >= stop {
                self.finished = true;
                return false;
            }
        }
        matches!(self.start, Some(start) if t >= start)
    }
}

/// Noise source pulling fixed-size blocks from its generator.
struct NoiseSource {
    generator: NoiseGenerator,
    block: Vec<f32>,
    position: usize,
}

impl NoiseSource {
    fn new(generator: NoiseGenerator) -> Self {
        let block = vec![0.0; generator.buffer_size()];
        Self {
            position: block.len(),
            generator,
            block,
        }
    }

    #[inline]
    fn next_sample(&mut self) -> f32 {
        if self.position == self.block.len() {
            self.generator.fill(&mut self.block);
            self.position = 0;
        }
        let sample = self.block[self.position];
        self.position += 1;
        sample
    }
}

enum Node {
    Destination,
    Oscillator {
        osc: Oscillator,
        frequency: Automation,
        span: Span,
    },
    Noise {
        source: NoiseSource,
        span: Span,
    },
    Filter {
        filter: SVFilter,
        cutoff: Automation,
        q: Automation,
    },
    Gain {
        gain: Automation,
    },
}

impl Node {
    fn span_mut(&mut self) -> Option<&mut Span> {
        match self {
            Node::Oscillator { span, .. } | Node::Noise { span, .. } => Some(span),
            _ => None,
        }
    }

    fn is_finished(&self) -> bool {
        match self {
            Node::Oscillator { span, .. } | Node::Noise { span, .. } => span.finished,
            _ => false,
        }
    }

    /// A source nobody ever started, left behind by a failed build.
    fn is_abandoned(&self) -> bool {
        match self {
            Node::Oscillator { span, .. } | Node::Noise { span, .. } => span.start.is_none(),
            _ => false,
        }
    }

    fn automation_mut(&mut self, param: Param) -> Option<&mut Automation> {
        match (self, param) {
            (Node::Oscillator { frequency, .. }, Param::Frequency) => Some(frequency),
            (Node::Filter { cutoff, .. }, Param::Cutoff) => Some(cutoff),
            (Node::Filter { q, .. }, Param::Q) => Some(q),
            (Node::Gain { gain }, Param::Gain) => Some(gain),
            _ => None,
        }
    }

    #[inline]
    fn process(&mut self, input: &[f32], output: &mut [f32], start: f64, sample_rate: f32) {
        let rate = sample_rate as f64;
        match self {
            Node::Destination => output.copy_from_slice(input),
            Node::Oscillator {
                osc,
                frequency,
                span,
            } => {
                for (k, out) in output.iter_mut().enumerate() {
                    let t = start + k as f64 / rate;
                    *out = if span.is_playing(t) {
                        osc.next_sample(frequency.next_value(t), sample_rate)
                    } else {
                        0.0
                    };
                }
            }
            Node::Noise { source, span } => {
                for (k, out) in output.iter_mut().enumerate() {
                    let t = start + k as f64 / rate;
                    *out = if span.is_playing(t) {
                        source.next_sample()
                    } else {
                        0.0
                    };
                }
            }
            Node::Filter { filter, cutoff, q } => {
                for (k, (out, &x)) in output.iter_mut().zip(input).enumerate() {
                    let t = start + k as f64 / rate;
                    *out = filter.next_sample(x, cutoff.next_value(t), q.next_value(t), sample_rate);
                }
            }
            Node::Gain { gain } => {
                for (k, (out, &x)) in output.iter_mut().zip(input).enumerate() {
                    let t = start + k as f64 / rate;
                    *out = x * gain.next_value(t);
                }
            }
        }
    }
}

struct Slot {
    kind: NodeKind,
    node: Node,
    inputs: Vec<NodeId>,
    output: Vec<f32>,
}

struct Entry {
    generation: u32,
    slot: Option<Slot>,
}

pub struct RenderContext {
    sample_rate: f32,
    frames: u64,
    max_nodes: usize,
    live: usize,
    entries: Vec<Entry>,
    free: Vec<usize>,
    destination: NodeId,
    /// Render order: every node feeding the destination, inputs first.
    order: Vec<usize>,
    scratch: Vec<f32>,
    seed: Option<u64>,
}

impl RenderContext {
    pub fn new(config: &EngineConfig) -> Result<Self> {
        config.validate()?;
        let mut context = Self {
            sample_rate: config.sample_rate,
            frames: 0,
            max_nodes: config.max_nodes,
            live: 0,
            entries: Vec::new(),
            free: Vec::new(),
            destination: NodeId::new(0, 0),
            order: Vec::new(),
            scratch: vec![0.0; MAX_BLOCK_SIZE],
            seed: None,
        };
        context.destination = context.insert(NodeKind::Destination, Node::Destination)?;
        context.rebuild_order();
        Ok(context)
    }

    /// Seed noise sources deterministically (each new source gets the next seed).
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Number of live nodes, the destination included.
    pub fn node_count(&self) -> usize {
        self.live
    }

    /// Kind of a live node.
    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.slot(id).ok().map(|slot| slot.kind)
    }

    /// True when no source is scheduled or playing.
    pub fn is_idle(&self) -> bool {
        self.entries
            .iter()
            .filter_map(|e| e.slot.as_ref())
            .all(|slot| !slot.kind.is_source() || slot.node.is_finished())
    }

    fn slot(&self, id: NodeId) -> Result<&Slot> {
        self.entries
            .get(id.index())
            .filter(|e| e.generation == id.generation)
            .and_then(|e| e.slot.as_ref())
            .ok_or(YeepError::UnknownNode(id.index()))
    }

    fn slot_mut(&mut self, id: NodeId) -> Result<&mut Slot> {
        self.entries
            .get_mut(id.index())
            .filter(|e| e.generation == id.generation)
            .and_then(|e| e.slot.as_mut())
            .ok_or(YeepError::UnknownNode(id.index()))
    }

    fn insert(&mut self, kind: NodeKind, node: Node) -> Result<NodeId> {
        if self.live >= self.max_nodes {
            return Err(YeepError::HostCapacity {
                limit: self.max_nodes,
            });
        }
        let slot = Slot {
            kind,
            node,
            inputs: Vec::new(),
            output: vec![0.0; MAX_BLOCK_SIZE],
        };
        let id = match self.free.pop() {
            Some(index) => {
                let entry = &mut self.entries[index];
                entry.generation = entry.generation.wrapping_add(1);
                entry.slot = Some(slot);
                NodeId::new(index, entry.generation)
            }
            None => {
                self.entries.push(Entry {
                    generation: 0,
                    slot: Some(slot),
                });
                NodeId::new(self.entries.len() - 1, 0)
            }
        };
        self.live += 1;
        trace!(node = %id, ?kind, "created node");
        Ok(id)
    }

    fn remove(&mut self, index: usize) {
        if let Some(entry) = self.entries.get_mut(index) {
            if entry.slot.take().is_some() {
                self.free.push(index);
                self.live -= 1;
            }
        }
    }

    fn next_seed(&mut self) -> Option<u64> {
        let seed = self.seed?;
        self.seed = Some(seed.wrapping_add(1));
        Some(seed)
    }

    /// True if `target` feeds into `from` (directly or through other nodes).
    fn feeds(&self, target: NodeId, from: NodeId) -> bool {
        let mut stack = vec![from];
        let mut seen = vec![false; self.entries.len()];
        while let Some(id) = stack.pop() {
            if id == target {
                return true;
            }
            if std::mem::replace(&mut seen[id.index()], true) {
                continue;
            }
            if let Ok(slot) = self.slot(id) {
                stack.extend(slot.inputs.iter().copied());
            }
        }
        false
    }

    /// Post-order walk from the destination through inputs.
    fn rebuild_order(&mut self) {
        let mut order = Vec::with_capacity(self.live);
        let mut visited = vec![false; self.entries.len()];
        let mut stack = vec![(self.destination, false)];

        while let Some((id, expanded)) = stack.pop() {
            let index = id.index();
            if expanded {
                order.push(index);
                continue;
            }
            if visited[index] {
                continue;
            }
            visited[index] = true;
            stack.push((id, true));
            if let Ok(slot) = self.slot(id) {
                for &input in slot.inputs.iter().rev() {
                    if !visited[input.index()] {
                        stack.push((input, false));
                    }
                }
            }
        }
        self.order = order;
    }

    /// Render the next block of mixed output and advance the clock.
    ///
    /// Allocation-free: every buffer it touches was sized at node creation.
    pub fn render(&mut self, out: &mut [f32]) {
        for chunk in out.chunks_mut(MAX_BLOCK_SIZE) {
            self.render_chunk(chunk);
        }
    }

    fn render_chunk(&mut self, out: &mut [f32]) {
        let frames = out.len();
        let start = self.current_time();
        let sample_rate = self.sample_rate;
        let destination = self.destination.index();
        let Self {
            entries,
            order,
            scratch,
            ..
        } = &mut *self;

        for &index in order.iter() {
            let mix = &mut scratch[..frames];
            mix.fill(0.0);
            if let Some(slot) = entries[index].slot.as_ref() {
                for input in &slot.inputs {
                    if let Some(source) = entries[input.index()].slot.as_ref() {
                        for (m, &s) in mix.iter_mut().zip(&source.output[..frames]) {
                            *m += s;
                        }
                    }
                }
            }
            if let Some(slot) = entries[index].slot.as_mut() {
                slot.node
                    .process(mix, &mut slot.output[..frames], start, sample_rate);
            }
        }

        match entries[destination].slot.as_ref() {
            Some(slot) => out.copy_from_slice(&slot.output[..frames]),
            None => out.fill(0.0),
        }
        self.frames += frames as u64;
    }

    /// Discard sources that have stopped or were never started, and every
    /// node left without input.
    ///
    /// Runs in the control domain, between effect builds: a source created
    /// but not yet started at this point belongs to a build that failed.
    /// Returns the number of nodes removed.
    pub fn prune(&mut self) -> usize {
        let mut doomed: Vec<usize> = self
            .entries
            .iter()
            .enumerate()
            .filter_map(|(index, e)| {
                e.slot
                    .as_ref()
                    .filter(|slot| slot.node.is_finished() || slot.node.is_abandoned())
                    .map(|_| index)
            })
            .collect();

        let mut removed = 0;
        while let Some(index) = doomed.pop() {
            if self.entries[index].slot.is_none() {
                continue;
            }
            let generation = self.entries[index].generation;
            let gone = NodeId::new(index, generation);
            self.remove(index);
            removed += 1;

            for (other, entry) in self.entries.iter_mut().enumerate() {
                let Some(slot) = entry.slot.as_mut() else {
                    continue;
                };
                let before = slot.inputs.len();
                slot.inputs.retain(|&input| input != gone);
                let orphaned = before > 0 && slot.inputs.is_empty();
                if orphaned && !matches!(slot.kind, NodeKind::Destination) {
                    doomed.push(other);
                }
            }
        }

        if removed > 0 {
            self.rebuild_order();
            debug!(removed, live = self.live, "pruned finished nodes");
        }
        removed
    }

    /// Offline bounce: render `seconds` of output, pruning between blocks.
    pub fn render_seconds(&mut self, seconds: f64) -> Vec<f32> {
        let total = (seconds * self.sample_rate as f64).round().max(0.0) as usize;
        let mut out = vec![0.0f32; total];
        for block in out.chunks_mut(512) {
            self.render(block);
            self.prune();
        }
        out
    }

    fn source_span(&mut self, node: NodeId) -> Result<&mut Span> {
        self.slot_mut(node)?
            .node
            .span_mut()
            .ok_or_else(|| YeepError::InvalidConnection(format!("{node} is not a source")))
    }
}

impl RenderHost for RenderContext {
    fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    fn current_time(&self) -> f64 {
        self.frames as f64 / self.sample_rate as f64
    }

    fn destination(&self) -> NodeId {
        self.destination
    }

    fn create_oscillator(&mut self, waveform: Waveform, frequency: f32) -> Result<NodeId> {
        let node = Node::Oscillator {
            osc: Oscillator::new(waveform),
            frequency: Automation::new(frequency),
            span: Span::default(),
        };
        self.insert(
            NodeKind::Oscillator {
                waveform,
                frequency,
            },
            node,
        )
    }

    fn create_noise(&mut self, kind: NoiseKind, buffer_size: usize) -> Result<NodeId> {
        let generator = match self.next_seed() {
            Some(seed) => NoiseGenerator::with_seed(kind, buffer_size, seed)?,
            None => NoiseGenerator::new(kind, buffer_size)?,
        };
        let node = Node::Noise {
            source: NoiseSource::new(generator),
            span: Span::default(),
        };
        self.insert(NodeKind::Noise { kind, buffer_size }, node)
    }

    fn create_filter(&mut self, filter_type: FilterType, cutoff: f32, q: f32) -> Result<NodeId> {
        let node = Node::Filter {
            filter: SVFilter::new(filter_type),
            cutoff: Automation::new(cutoff),
            q: Automation::new(q),
        };
        self.insert(
            NodeKind::Filter {
                filter_type,
                cutoff,
                q,
            },
            node,
        )
    }

    fn create_gain(&mut self, gain: f32) -> Result<NodeId> {
        self.insert(
            NodeKind::Gain { gain },
            Node::Gain {
                gain: Automation::new(gain),
            },
        )
    }

    fn connect(&mut self, from: NodeId, to: NodeId) -> Result<()> {
        let from_kind = self.slot(from)?.kind;
        let to_kind = self.slot(to)?.kind;
        if matches!(from_kind, NodeKind::Destination) {
            return Err(YeepError::InvalidConnection(
                "destination has no output".into(),
            ));
        }
        if to_kind.is_source() {
            return Err(YeepError::InvalidConnection(format!(
                "{to} is a source and takes no input"
            )));
        }
        if from == to || self.feeds(to, from) {
            return Err(YeepError::InvalidConnection(format!(
                "{from} -> {to} would form a cycle"
            )));
        }

        let slot = self.slot_mut(to)?;
        if !slot.inputs.contains(&from) {
            slot.inputs.push(from);
        }
        self.rebuild_order();
        Ok(())
    }

    fn automate(&mut self, node: NodeId, param: Param, event: AutomationEvent) -> Result<()> {
        self.slot_mut(node)?
            .node
            .automation_mut(param)
            .ok_or(YeepError::InvalidParam {
                node: node.index(),
                param: param.name(),
            })?
            .push(event);
        Ok(())
    }

    fn start(&mut self, node: NodeId, at: f64) -> Result<()> {
        let span = self.source_span(node)?;
        if span.start.is_none() {
            span.start = Some(at);
        }
        Ok(())
    }

    fn stop(&mut self, node: NodeId, at: f64) -> Result<()> {
        let span = self.source_span(node)?;
        span.stop = Some(at);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> RenderContext {
        let config = EngineConfig::default().with_sample_rate(1_000.0);
        RenderContext::new(&config).unwrap().with_seed(1)
    }

    fn rms(buffer: &[f32]) -> f32 {
        (buffer.iter().map(|s| s * s).sum::<f32>() / buffer.len().max(1) as f32).sqrt()
    }

    #[test]
    fn empty_graph_renders_silence() {
        let mut ctx = context();
        let mut out = vec![1.0f32; 64];
        ctx.render(&mut out);
        assert!(out.iter().all(|&s| s == 0.0));
        assert!((ctx.current_time() - 0.064).abs() < 1e-9);
    }

    #[test]
    fn source_plays_between_start_and_stop() {
        let mut ctx = context();
        let osc = ctx.create_oscillator(Waveform::Square, 100.0).unwrap();
        let dest = ctx.destination();
        ctx.connect(osc, dest).unwrap();
        ctx.start(osc, 0.1).unwrap();
        ctx.stop(osc, 0.2).unwrap();

        let out = ctx.render_seconds(0.3);
        assert!(out[..100].iter().all(|&s| s == 0.0));
        assert!(out[100..200].iter().all(|&s| s.abs() == 1.0));
        assert!(out[200..].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn gain_automation_shapes_signal() {
        let mut ctx = context();
        let osc = ctx.create_oscillator(Waveform::Square, 50.0).unwrap();
        let gain = ctx.create_gain(1.0).unwrap();
        let dest = ctx.destination();
        ctx.connect(osc, gain).unwrap();
        ctx.connect(gain, dest).unwrap();
        ctx.automate(
            gain,
            Param::Gain,
            AutomationEvent::SetValue {
                time: 0.0,
                value: 0.0,
            },
        )
        .unwrap();
        ctx.automate(
            gain,
            Param::Gain,
            AutomationEvent::LinearRamp {
                end: 1.0,
                value: 1.0,
            },
        )
        .unwrap();
        ctx.start(osc, 0.0).unwrap();

        let mut out = vec![0.0f32; 1000];
        ctx.render(&mut out);
        assert!(rms(&out[..100]) < rms(&out[900..]));
        assert!((out[500].abs() - 0.5).abs() < 0.01);
    }

    #[test]
    fn parallel_chains_sum_at_destination() {
        let mut ctx = context();
        let dest = ctx.destination();
        for _ in 0..2 {
            let osc = ctx.create_oscillator(Waveform::Square, 10.0).unwrap();
            ctx.connect(osc, dest).unwrap();
            ctx.start(osc, 0.0).unwrap();
        }
        let mut out = vec![0.0f32; 10];
        ctx.render(&mut out);
        assert!(out.iter().all(|&s| s == 2.0));
    }

    #[test]
    fn rejects_cycles_and_bad_edges() {
        let mut ctx = context();
        let a = ctx.create_gain(1.0).unwrap();
        let b = ctx.create_gain(1.0).unwrap();
        let osc = ctx.create_oscillator(Waveform::Sine, 440.0).unwrap();
        ctx.connect(a, b).unwrap();

        assert!(matches!(ctx.connect(b, a), Err(YeepError::InvalidConnection(_))));
        assert!(matches!(ctx.connect(a, a), Err(YeepError::InvalidConnection(_))));
        assert!(matches!(ctx.connect(a, osc), Err(YeepError::InvalidConnection(_))));
        let dest = ctx.destination();
        assert!(ctx.connect(dest, a).is_err());
    }

    #[test]
    fn rejects_foreign_params() {
        let mut ctx = context();
        let gain = ctx.create_gain(1.0).unwrap();
        let err = ctx
            .automate(
                gain,
                Param::Cutoff,
                AutomationEvent::SetValue {
                    time: 0.0,
                    value: 1.0,
                },
            )
            .unwrap_err();
        assert!(matches!(err, YeepError::InvalidParam { param: "cutoff", .. }));
    }

    #[test]
    fn capacity_is_enforced() {
        let config = EngineConfig {
            max_nodes: 3,
            ..EngineConfig::default()
        };
        let mut ctx = RenderContext::new(&config).unwrap();
        ctx.create_gain(1.0).unwrap();
        ctx.create_gain(1.0).unwrap();
        assert_eq!(
            ctx.create_gain(1.0),
            Err(YeepError::HostCapacity { limit: 3 })
        );
    }

    #[test]
    fn prune_discards_finished_chain() {
        let mut ctx = context();
        let dest = ctx.destination();
        let noise = ctx.create_noise(NoiseKind::White, 64).unwrap();
        let gain = ctx.create_gain(0.5).unwrap();
        let filter = ctx.create_filter(FilterType::LowPass, 200.0, 1.0).unwrap();
        ctx.connect(noise, gain).unwrap();
        ctx.connect(gain, filter).unwrap();
        ctx.connect(filter, dest).unwrap();
        ctx.start(noise, 0.0).unwrap();
        ctx.stop(noise, 0.05).unwrap();

        assert_eq!(ctx.node_count(), 4);
        assert!(!ctx.is_idle());
        let out = ctx.render_seconds(0.1);
        assert!(rms(&out[..50]) > 0.0);
        assert_eq!(ctx.node_count(), 1);
        assert!(ctx.is_idle());
        assert!(ctx.kind(gain).is_none());
    }

    #[test]
    fn prune_reclaims_unstarted_chain() {
        let config = EngineConfig {
            max_nodes: 4,
            ..EngineConfig::default()
        };
        let mut ctx = RenderContext::new(&config).unwrap();
        let osc = ctx.create_oscillator(Waveform::Square, 55.0).unwrap();
        let gain = ctx.create_gain(0.0).unwrap();
        let filter = ctx.create_filter(FilterType::LowPass, 500.0, 1.0).unwrap();
        ctx.connect(osc, gain).unwrap();
        ctx.connect(gain, filter).unwrap();
        assert!(matches!(ctx.create_gain(1.5), Err(YeepError::HostCapacity { .. })));
        assert!(!ctx.is_idle());

        assert_eq!(ctx.prune(), 3);
        assert_eq!(ctx.node_count(), 1);
        assert!(ctx.is_idle());
        assert!(ctx.kind(filter).is_none());
        assert!(ctx.create_oscillator(Waveform::Sine, 440.0).is_ok());
    }

    #[test]
    fn stale_ids_do_not_alias_reused_slots() {
        let mut ctx = context();
        let osc = ctx.create_oscillator(Waveform::Sine, 100.0).unwrap();
        let dest = ctx.destination();
        ctx.connect(osc, dest).unwrap();
        ctx.start(osc, 0.0).unwrap();
        ctx.stop(osc, 0.01).unwrap();
        ctx.render_seconds(0.02);

        let gain = ctx.create_gain(1.0).unwrap();
        assert_eq!(gain.index(), osc.index());
        assert!(matches!(ctx.start(osc, 0.0), Err(YeepError::UnknownNode(_))));
    }

    #[test]
    fn noise_is_reproducible_with_seed() {
        let render = || {
            let mut ctx = context();
            let dest = ctx.destination();
            let noise = ctx.create_noise(NoiseKind::Pink, 128).unwrap();
            ctx.connect(noise, dest).unwrap();
            ctx.start(noise, 0.0).unwrap();
            ctx.render_seconds(0.2)
        };
        assert_eq!(render(), render());
    }
}
