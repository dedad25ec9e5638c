//! Little melodic stingers.

use crate::{
    dsp::Waveform,
    error::Result,
    sfx::{EnvelopeSpec, ToneSpec},
    tracks::{Composer, TrackRegistryBuilder},
};

pub(crate) fn register(builder: TrackRegistryBuilder) -> TrackRegistryBuilder {
    builder
        .register("sad_trombone", &[], sad_trombone)
        .register("zelda", &[], zelda)
}

/// Four descending triangle notes, the last one held.
pub fn sad_trombone(c: &mut Composer<'_>) -> Result<()> {
    let base = EnvelopeSpec::adsr()
        .with_attack(0.5, 1.0)
        .with_decay(0.02, 1.0)
        .with_sustain(0.5);

    let notes = [
        ("D4", 0.0, base),
        ("C#4", 0.75, base),
        ("C4", 1.5, base),
        ("B3", 2.25, base.with_sustain(1.5).with_release(0.5)),
    ];
    for (name, delay, envelope) in notes {
        c.tone_adsr(
            ToneSpec::new(name)
                .waveform(Waveform::Triangle)
                .envelope(envelope.with_delay(delay)),
        )?;
    }
    Ok(())
}

/// The secret-found jingle: paired notes climbing in semitones.
pub fn zelda(c: &mut Composer<'_>) -> Result<()> {
    let base = EnvelopeSpec::adsr()
        .with_attack(0.1, 0.4)
        .with_decay(0.02, 0.4)
        .with_release(0.1);

    let pairs = [
        ("D#3", "A4", 0.0, base),
        ("E3", "A#4", 0.2, base),
        ("F3", "B4", 0.4, base),
        ("F#3", "C5", 0.6, base.with_sustain(0.8)),
    ];
    for (low, high, delay, envelope) in pairs {
        for name in [low, high] {
            c.tone_adsr(
                ToneSpec::new(name)
                    .waveform(Waveform::Triangle)
                    .envelope(envelope.with_delay(delay)),
            )?;
        }
    }
    Ok(())
}
