/*
Equal-Tempered Frequency Table
==============================

Starting at C0 = 16.35161 Hz, every semitone multiplies the frequency by
2^(1/12). Twelve of those make an octave (exactly double). The table stops
at the last note below 20 kHz (D#10).

  C0  16.35    C4  261.63    A4  440.00    C5  523.25    E5  659.26

Names are pitch class + octave: "C4", "C#4", "A#2". Flats ("Db4") are
accepted on lookup and resolve to the matching sharp.
*/

use std::collections::HashMap;

use lazy_static::lazy_static;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Result, YeepError};

pub const PITCH_CLASSES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

pub const C0_HZ: f64 = 16.35161;
pub const MAX_HZ: f64 = 20_000.0;

lazy_static! {
    static ref GLOBAL_TABLE: FrequencyTable = FrequencyTable::new();
}

pub struct FrequencyTable {
    notes: Vec<(String, f32)>,
    index: HashMap<String, usize>,
}

impl FrequencyTable {
    pub fn new() -> Self {
        let ratio = 2.0f64.powf(1.0 / 12.0);
        let mut notes = Vec::new();
        let mut index = HashMap::new();

        let mut freq = C0_HZ;
        let mut step = 0usize;
        while freq < MAX_HZ {
            let name = format!("{}{}", PITCH_CLASSES[step % 12], step / 12);
            index.insert(name.clone(), notes.len());
            notes.push((name, freq as f32));
            freq *= ratio;
            step += 1;
        }

        Self { notes, index }
    }

    /// Shared table, built on first use.
    pub fn global() -> &'static FrequencyTable {
        &GLOBAL_TABLE
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// All notes in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f32)> {
        self.notes.iter().map(|(name, hz)| (name.as_str(), *hz))
    }

    pub fn frequency(&self, name: &str) -> Result<f32> {
        let position = match self.index.get(name) {
            Some(&position) => Some(position),
            None => sharp_spelling(name).and_then(|sharp| self.index.get(&sharp).copied()),
        };
        position
            .map(|p| self.notes[p].1)
            .ok_or_else(|| YeepError::UnknownNote(name.to_string()))
    }
}

impl Default for FrequencyTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Rewrite a flat ("Db4", "Cb5") as the equivalent sharp spelling.
fn sharp_spelling(name: &str) -> Option<String> {
    let mut chars = name.chars();
    let letter = chars.next()?.to_ascii_uppercase();
    if chars.next()? != 'b' {
        return None;
    }
    let octave: i32 = chars.as_str().parse().ok()?;
    let natural = PITCH_CLASSES.iter().position(|&pc| pc == letter.to_string())? as i32;

    let semitone = octave * 12 + natural - 1;
    if semitone < 0 {
        return None;
    }
    Some(format!(
        "{}{}",
        PITCH_CLASSES[(semitone % 12) as usize],
        semitone / 12
    ))
}

/// A pitch given either directly in Hz or as a note name.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
#[derive(Debug, Clone, PartialEq)]
pub enum Pitch {
    Hz(f32),
    Note(String),
}

impl Pitch {
    pub fn note(name: impl Into<String>) -> Self {
        Pitch::Note(name.into())
    }

    /// Frequency in Hz, checked against the global table.
    pub fn resolve(&self) -> Result<f32> {
        let hz = match self {
            Pitch::Hz(hz) => *hz,
            Pitch::Note(name) => FrequencyTable::global().frequency(name)?,
        };
        if hz.is_finite() && hz > 0.0 {
            Ok(hz)
        } else {
            Err(YeepError::InvalidFrequency { hz })
        }
    }
}

impl Default for Pitch {
    fn default() -> Self {
        Pitch::note("C4")
    }
}

impl From<f32> for Pitch {
    fn from(hz: f32) -> Self {
        Pitch::Hz(hz)
    }
}

impl From<&str> for Pitch {
    fn from(name: &str) -> Self {
        Pitch::note(name)
    }
}

/// Frequency of a note name in the global table.
pub fn note(name: &str) -> Result<f32> {
    FrequencyTable::global().frequency(name)
}
