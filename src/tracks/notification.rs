//! Short UI notification chimes.
//!
//! All of them are attack-release sine tones at the default level, spaced a
//! few hundred milliseconds apart.

use crate::{
    error::Result,
    sfx::ArTone,
    tracks::{Composer, TrackRegistryBuilder},
};

pub(crate) fn register(builder: TrackRegistryBuilder) -> TrackRegistryBuilder {
    builder
        .register("ping", &[], ping)
        .register("add", &[], add)
        .register("remove", &[], remove)
        .register("ring", &[], ring)
}

/// Single C5 blip.
pub fn ping(c: &mut Composer<'_>) -> Result<()> {
    c.tone_ar(ArTone::new("C5"))?;
    Ok(())
}

/// Rising third: C5 then E5.
pub fn add(c: &mut Composer<'_>) -> Result<()> {
    c.tone_ar(ArTone::new("C5"))?;
    c.tone_ar(ArTone::new("E5").delay(0.2))?;
    Ok(())
}

/// Falling third: E5 then C5.
pub fn remove(c: &mut Composer<'_>) -> Result<()> {
    c.tone_ar(ArTone::new("E5"))?;
    c.tone_ar(ArTone::new("C5").delay(0.2))?;
    Ok(())
}

/// Phone ring: a four-note figure, played twice 0.8s apart.
pub fn ring(c: &mut Composer<'_>) -> Result<()> {
    const FIGURE: [(&str, f64); 4] = [("C5", 0.0), ("C5", 0.3), ("G5", 0.4), ("E5", 0.5)];

    for round in 0..2 {
        let base = 0.8 * round as f64;
        for (name, at) in FIGURE {
            c.tone_ar(ArTone::new(name).delay(base + at))?;
        }
    }
    Ok(())
}
