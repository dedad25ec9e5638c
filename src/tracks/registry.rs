use std::{collections::HashMap, fmt};

use tracing::debug;

use crate::{
    config::EngineConfig,
    error::{check_duration, Result, YeepError},
    graph::{NodeId, RenderHost},
    sfx::{build_noise, build_tone, ArTone, EnvelopeShape, NoiseSpec, Stage, ToneSpec},
    tracks::EffectOptions,
};

/*
Effect Registry
===============

Effects are named procedures that schedule sounds. Composite effects call
other effects, which makes the registry a dependency graph:

  rimshot ──→ snare
          ├─→ kick
          └─→ splash

Every effect declares the effects it calls when it is registered. `build()`
checks the graph once, up front:

  - names are unique
  - every dependency is registered
  - no effect reaches itself, directly or through others

At play time a body may only call its declared dependencies, so the call
tree of any play is bounded by the checked graph and cannot recurse forever.

Offsets accumulate down the tree. A body schedules sounds relative to its
own start; the composer adds the delay of every play on the way down.
*/

/// Body of a registered effect.
pub type EffectFn = Box<dyn Fn(&mut Composer<'_>) -> Result<()> + Send + Sync>;

struct Effect {
    name: String,
    dependencies: Vec<usize>,
    body: EffectFn,
}

/// A checked, immutable set of named effects.
pub struct TrackRegistry {
    effects: Vec<Effect>,
    index: HashMap<String, usize>,
}

impl fmt::Debug for TrackRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl TrackRegistry {
    pub fn builder() -> TrackRegistryBuilder {
        TrackRegistryBuilder::default()
    }

    /// Registry holding only the built-in effect library.
    pub fn with_builtins() -> Result<Self> {
        Self::builder().with_builtins().build()
    }

    /// Effect names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.effects.iter().map(|effect| effect.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Declared dependencies of `name`.
    pub fn dependencies(&self, name: &str) -> Result<Vec<&str>> {
        let id = self.lookup(name)?;
        Ok(self.effects[id]
            .dependencies
            .iter()
            .map(|&dep| self.effects[dep].name.as_str())
            .collect())
    }

    fn lookup(&self, name: &str) -> Result<usize> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| YeepError::UnknownEffect(name.to_string()))
    }

    /// Run `name` against `host` with the given options.
    pub fn play(
        &self,
        host: &mut dyn RenderHost,
        config: &EngineConfig,
        name: &str,
        options: EffectOptions,
    ) -> Result<()> {
        let id = self.lookup(name)?;
        check_duration("delay", options.delay)?;
        let mut composer = Composer {
            registry: self,
            config,
            host,
            effect: id,
            offset: options.delay,
        };
        composer.run()
    }
}

struct Registration {
    name: String,
    dependencies: Vec<String>,
    body: EffectFn,
}

/// Collects effects; `build()` checks them as a whole.
#[derive(Default)]
pub struct TrackRegistryBuilder {
    registrations: Vec<Registration>,
}

impl TrackRegistryBuilder {
    /// Register `name`, which may call each of `dependencies` while it plays.
    pub fn register<F>(mut self, name: impl Into<String>, dependencies: &[&str], body: F) -> Self
    where
        F: Fn(&mut Composer<'_>) -> Result<()> + Send + Sync + 'static,
    {
        self.registrations.push(Registration {
            name: name.into(),
            dependencies: dependencies.iter().map(|dep| dep.to_string()).collect(),
            body: Box::new(body),
        });
        self
    }

    /// Add the built-in notification, tune and drum effects.
    pub fn with_builtins(self) -> Self {
        let builder = super::notification::register(self);
        let builder = super::tune::register(builder);
        super::drum::register(builder)
    }

    pub fn build(self) -> Result<TrackRegistry> {
        let mut index = HashMap::with_capacity(self.registrations.len());
        for (id, registration) in self.registrations.iter().enumerate() {
            if index.insert(registration.name.clone(), id).is_some() {
                return Err(YeepError::DuplicateEffect(registration.name.clone()));
            }
        }

        let mut effects = Vec::with_capacity(self.registrations.len());
        for registration in self.registrations {
            let dependencies = registration
                .dependencies
                .iter()
                .map(|dep| {
                    index
                        .get(dep)
                        .copied()
                        .ok_or_else(|| YeepError::UnknownEffect(dep.clone()))
                })
                .collect::<Result<Vec<_>>>()?;
            effects.push(Effect {
                name: registration.name,
                dependencies,
                body: registration.body,
            });
        }

        if let Some(cycle) = find_cycle(&effects) {
            return Err(YeepError::CyclicEffect(cycle));
        }

        Ok(TrackRegistry { effects, index })
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    OnPath,
    Done,
}

/// Depth-first search over declared dependencies. Returns the names along
/// the first cycle found, closed by repeating its first effect.
fn find_cycle(effects: &[Effect]) -> Option<Vec<String>> {
    fn visit(
        effects: &[Effect],
        id: usize,
        marks: &mut [Mark],
        path: &mut Vec<usize>,
    ) -> Option<Vec<String>> {
        marks[id] = Mark::OnPath;
        path.push(id);
        for &dep in &effects[id].dependencies {
            match marks[dep] {
                Mark::OnPath => {
                    let start = path.iter().position(|&p| p == dep).unwrap_or(0);
                    let mut cycle: Vec<String> = path[start..]
                        .iter()
                        .map(|&p| effects[p].name.clone())
                        .collect();
                    cycle.push(effects[dep].name.clone());
                    return Some(cycle);
                }
                Mark::Unvisited => {
                    if let Some(cycle) = visit(effects, dep, marks, path) {
                        return Some(cycle);
                    }
                }
                Mark::Done => {}
            }
        }
        path.pop();
        marks[id] = Mark::Done;
        None
    }

    let mut marks = vec![Mark::Unvisited; effects.len()];
    let mut path = Vec::new();
    for id in 0..effects.len() {
        if marks[id] == Mark::Unvisited {
            if let Some(cycle) = visit(effects, id, &mut marks, &mut path) {
                return Some(cycle);
            }
        }
    }
    None
}

/// What an effect body sees while it plays.
///
/// Every sound built through the composer is shifted by the accumulated
/// delay of the plays that led here.
pub struct Composer<'a> {
    registry: &'a TrackRegistry,
    config: &'a EngineConfig,
    host: &'a mut dyn RenderHost,
    effect: usize,
    offset: f64,
}

impl Composer<'_> {
    /// Name of the effect currently playing.
    pub fn name(&self) -> &str {
        &self.registry.effects[self.effect].name
    }

    /// Schedule an attack-release tone relative to this effect's start.
    pub fn tone_ar(&mut self, tone: ArTone) -> Result<NodeId> {
        self.tone(EnvelopeShape::Ar, tone.into())
    }

    /// Schedule an ADSR tone relative to this effect's start.
    pub fn tone_adsr(&mut self, spec: ToneSpec) -> Result<NodeId> {
        self.tone(EnvelopeShape::Adsr, spec)
    }

    fn tone(&mut self, shape: EnvelopeShape, mut spec: ToneSpec) -> Result<NodeId> {
        spec.envelope.delay += self.offset;
        spec.pre_gain = shift(spec.pre_gain, self.offset);
        spec.post_gain = shift(spec.post_gain, self.offset);
        build_tone(&mut *self.host, shape, &spec)
    }

    /// Schedule a noise burst relative to this effect's start.
    pub fn noise(&mut self, mut spec: NoiseSpec) -> Result<NodeId> {
        spec.envelope.delay += self.offset;
        spec.pre_gain = shift(spec.pre_gain, self.offset);
        spec.post_gain = shift(spec.post_gain, self.offset);
        spec.buffer_size = spec.buffer_size.or(Some(self.config.noise_buffer_size));
        build_noise(&mut *self.host, &spec)
    }

    /// Play a declared dependency, `options.delay` after this effect's start.
    pub fn play(&mut self, name: &str, options: EffectOptions) -> Result<()> {
        let callee = self.registry.lookup(name)?;
        if !self.registry.effects[self.effect].dependencies.contains(&callee) {
            return Err(YeepError::UndeclaredDependency {
                caller: self.name().to_string(),
                callee: name.to_string(),
            });
        }
        check_duration("delay", options.delay)?;

        debug!(caller = self.name(), effect = name, delay = options.delay, "nested play");
        let mut composer = Composer {
            registry: self.registry,
            config: self.config,
            host: &mut *self.host,
            effect: callee,
            offset: self.offset + options.delay,
        };
        composer.run()
    }

    fn run(&mut self) -> Result<()> {
        let registry = self.registry;
        (registry.effects[self.effect].body)(self)
    }
}

fn shift(stages: Vec<Stage>, by: f64) -> Vec<Stage> {
    stages.into_iter().map(|stage| stage.delayed(by)).collect()
}
