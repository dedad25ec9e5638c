//! Drum hits and the patterns built from them.
//!
//! The hits take their start from the options they are played with, so the
//! composite effects below are nothing more than hits at staggered delays.

use crate::{
    dsp::{NoiseKind, Waveform},
    error::Result,
    sfx::{ArTone, EnvelopeSpec, NoiseSpec, Stage},
    tracks::{Composer, EffectOptions, TrackRegistryBuilder},
};

pub(crate) fn register(builder: TrackRegistryBuilder) -> TrackRegistryBuilder {
    builder
        .register("snare", &[], snare)
        .register("kick", &[], kick)
        .register("splash", &[], splash)
        .register("rimshot", &["snare", "kick", "splash"], rimshot)
        .register("beat", &["kick", "snare", "splash"], beat)
}

/// White noise with an instant attack, dulled by a closing lowpass.
pub fn snare(c: &mut Composer<'_>) -> Result<()> {
    // The burst peaks at twice full scale: unit envelope, then 2x gain
    c.noise(
        NoiseSpec::new(NoiseKind::White)
            .envelope(EnvelopeSpec::ar().with_attack(0.0, 1.0).with_release(1.0))
            .post_gain(Stage::gain(2.0))
            .post_gain(Stage::lowpass(5000.0).sweep_exp(0.0, 5000.0, 3000.0, 0.1)),
    )?;
    Ok(())
}

/// Square-wave thump with the lowpass closing almost completely.
pub fn kick(c: &mut Composer<'_>) -> Result<()> {
    c.tone_ar(
        ArTone::new("A1")
            .waveform(Waveform::Square)
            .up(0.02)
            .down(0.6)
            .vol(1.0)
            .post_gain(Stage::lowpass(500.0).sweep_exp(0.0, 500.0, 1.0, 0.4))
            .post_gain(Stage::gain(1.5)),
    )?;
    Ok(())
}

/// Two seconds of white noise thinning out through a rising highpass.
pub fn splash(c: &mut Composer<'_>) -> Result<()> {
    c.noise(
        NoiseSpec::new(NoiseKind::White)
            .envelope(EnvelopeSpec::ar().with_attack(0.0, 1.0).with_release(2.0))
            .post_gain(Stage::highpass(1500.0).sweep_exp(0.0, 1500.0, 3000.0, 0.5)),
    )
    .map(|_| ())
}

pub fn rimshot(c: &mut Composer<'_>) -> Result<()> {
    c.play("snare", EffectOptions::default())?;
    c.play("kick", EffectOptions::delayed(0.3))?;
    c.play("splash", EffectOptions::delayed(0.9))
}

/// One bar: kicks, a backbeat snare, and splashes on every quarter.
pub fn beat(c: &mut Composer<'_>) -> Result<()> {
    for at in [0.0, 0.125, 0.5, 0.625] {
        c.play("kick", EffectOptions::delayed(at))?;
    }
    c.play("snare", EffectOptions::delayed(0.5))?;
    for at in [0.0, 0.25, 0.5, 0.75] {
        c.play("splash", EffectOptions::delayed(at))?;
    }
    Ok(())
}
