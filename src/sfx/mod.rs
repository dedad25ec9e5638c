//! Sound-effect builders.
//!
//! Everything here describes a one-shot sound and schedules it on a
//! [`RenderHost`](crate::graph::RenderHost) relative to the host's current
//! clock. Specs are validated as a whole before the first node is created,
//! so a rejected sound leaves no partial graph behind.

/// Exponential AR and ADSR gain envelopes.
pub mod envelope;
/// Note-name to frequency lookup.
pub mod frequency;
/// Enveloped noise bursts.
pub mod noise;
/// Filter and fixed-gain stages.
pub mod stage;
/// Enveloped oscillator tones.
pub mod tone;

pub use envelope::{build_envelope, Envelope, EnvelopeShape, EnvelopeSpec};
pub use frequency::{note, FrequencyTable, Pitch};
pub use noise::{build_noise, NoiseSpec};
pub use stage::{ParamStep, Stage};
pub use tone::{build_tone, tone_adsr, tone_ar, ArTone, ToneSpec};
