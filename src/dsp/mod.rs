//! Low-level DSP primitives used by the render host.
//!
//! These components are allocation-free and realtime-safe once constructed,
//! making them safe to embed directly inside graph nodes. They stay focused
//! on the signal-processing math; wiring and scheduling live in `graph` and
//! `sfx`.

/// Parameter automation timelines (set, linear and exponential ramps).
pub mod automation;
/// State-variable filter implementation with multiple responses.
pub mod filter;
/// White, pink and brown noise generators.
pub mod noise;
/// Periodic oscillator waveforms.
pub mod oscillator;

pub use automation::{Automation, AutomationEvent};
pub use filter::{FilterType, SVFilter};
pub use noise::{NoiseGenerator, NoiseKind};
pub use oscillator::{Oscillator, Waveform};
