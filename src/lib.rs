pub mod config;
pub mod dsp; // Allocation-free render-domain primitives
pub mod error;
pub mod graph; // Render host capability and node graph
pub mod sfx; // Envelope, tone and noise builders
pub mod tracks; // Named effects and their registry

pub use config::EngineConfig;
pub use error::{Result, YeepError};
pub use tracks::{EffectOptions, Yeep};

pub const MAX_BLOCK_SIZE: usize = 2048;

/// Gain floor used in place of silence; exponential ramps cannot reach 0.
pub const SILENCE: f32 = 0.00001;
