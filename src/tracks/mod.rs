//! Named effects and the engine facade.
//!
//! # Example
//!
//! ```ignore
//! use yeep::{graph::RenderContext, EffectOptions, EngineConfig, Yeep};
//!
//! let config = EngineConfig::default();
//! let yeep = Yeep::new(config.clone())?;
//! let mut context = RenderContext::new(&config)?;
//!
//! yeep.play(&mut context, "add", EffectOptions::default())?;
//! yeep.play(&mut context, "rimshot", EffectOptions::delayed(0.5))?;
//! let samples = context.render_seconds(2.0);
//! ```

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    config::EngineConfig,
    error::Result,
    graph::{RecordingHost, RenderHost},
};

/// Drum hits and patterns.
pub mod drum;
/// UI notification chimes.
pub mod notification;
/// Effect registry and the composer handed to effect bodies.
pub mod registry;
/// Melodic stingers.
pub mod tune;

pub use registry::{Composer, EffectFn, TrackRegistry, TrackRegistryBuilder};

/// Per-play options. Each play gets its own copy.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EffectOptions {
    /// Seconds between the call and the effect's start.
    pub delay: f64,
}

impl EffectOptions {
    pub fn delayed(delay: f64) -> Self {
        Self { delay }
    }
}

/// Effect library bound to an engine configuration.
#[derive(Debug)]
pub struct Yeep {
    config: EngineConfig,
    registry: TrackRegistry,
}

impl Yeep {
    /// Engine with the built-in effects.
    pub fn new(config: EngineConfig) -> Result<Self> {
        Self::with_registry(config, TrackRegistry::with_builtins()?)
    }

    pub fn with_registry(config: EngineConfig, registry: TrackRegistry) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, registry })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &TrackRegistry {
        &self.registry
    }

    pub fn effects(&self) -> impl Iterator<Item = &str> {
        self.registry.names()
    }

    /// Schedule `name` on `host`.
    ///
    /// The effect is first run against a [`RecordingHost`] at the same clock
    /// time, so bad notes, levels or durations anywhere in its call tree are
    /// reported before `host` sees a single node.
    pub fn play(&self, host: &mut dyn RenderHost, name: &str, options: EffectOptions) -> Result<()> {
        let mut dry_run = RecordingHost::new(host.sample_rate());
        dry_run.set_time(host.current_time());

        let result = self
            .registry
            .play(&mut dry_run, &self.config, name, options)
            .and_then(|()| self.registry.play(host, &self.config, name, options));

        match &result {
            Ok(()) if self.config.logging => {
                info!(effect = name, delay = options.delay, nodes = dry_run.node_count(), "played");
            }
            Ok(()) => {}
            Err(err) => warn!(effect = name, error = %err, "play rejected"),
        }
        result
    }
}
