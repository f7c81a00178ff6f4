//! Pitch classes and the root-name table

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VoicingError};

const SHARP_NAMES: [&str; 12] = ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];
const FLAT_NAMES: [(&str, u8); 5] = [("Db", 1), ("Eb", 3), ("Gb", 6), ("Ab", 8), ("Bb", 10)];

/// A tonal pitch class, C=0 … B=11
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct PitchClass(u8);

impl PitchClass {
    pub const C: Self = Self(0);

    pub fn new(value: u8) -> Result<Self> {
        if value > 11 {
            return Err(VoicingError::InvalidNoteValue {
                value: value as i32,
                context: "pitch class must be within 0..=11".into(),
            });
        }
        Ok(Self(value))
    }

    /// Reduce any integer to a pitch class (euclidean mod 12)
    pub fn wrapping(value: i32) -> Self {
        Self(value.rem_euclid(12) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Transpose upward by `semitones`, wrapping at the octave
    pub fn transpose(self, semitones: u8) -> Self {
        Self::wrapping(self.0 as i32 + semitones as i32)
    }

    /// Sharp-spelled note name
    pub fn name(self) -> &'static str {
        SHARP_NAMES[self.0 as usize]
    }

    /// Iterate all twelve pitch classes in ascending order
    pub fn all() -> impl Iterator<Item = PitchClass> {
        (0..12u8).map(PitchClass)
    }
}

impl TryFrom<u8> for PitchClass {
    type Error = VoicingError;

    fn try_from(value: u8) -> Result<Self> {
        Self::new(value)
    }
}

impl From<PitchClass> for u8 {
    fn from(pc: PitchClass) -> u8 {
        pc.0
    }
}

impl fmt::Display for PitchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Read-only mapping from root names ("C#", "Eb", …) to pitch classes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootNames {
    names: BTreeMap<String, PitchClass>,
}

impl Default for RootNames {
    fn default() -> Self {
        let mut names = BTreeMap::new();
        for pc in PitchClass::all() {
            names.insert(pc.name().to_string(), pc);
        }
        for (name, value) in FLAT_NAMES {
            names.insert(name.to_string(), PitchClass(value));
        }
        Self { names }
    }
}

impl RootNames {
    pub fn from_map(names: BTreeMap<String, PitchClass>) -> Self {
        Self { names }
    }

    pub fn lookup(&self, name: &str) -> Option<PitchClass> {
        self.names.get(name.trim()).copied()
    }

    /// Resolve either a root name or a plain integer in 0..=11
    pub fn resolve(&self, input: &str) -> Result<PitchClass> {
        if let Some(pc) = self.lookup(input) {
            return Ok(pc);
        }
        let value: i32 = input.trim().parse().map_err(|_| VoicingError::InvalidNoteValue {
            value: -1,
            context: format!("unknown root name '{input}'"),
        })?;
        if !(0..=11).contains(&value) {
            return Err(VoicingError::InvalidNoteValue {
                value,
                context: format!("root '{input}' out of range"),
            });
        }
        Ok(PitchClass(value as u8))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, PitchClass)> {
        self.names.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pitch_class_bounds() {
        assert!(PitchClass::new(11).is_ok());
        assert!(matches!(
            PitchClass::new(12),
            Err(VoicingError::InvalidNoteValue { value: 12, .. })
        ));
    }

    #[test]
    fn test_wrapping() {
        assert_eq!(PitchClass::wrapping(-5).value(), 7);
        assert_eq!(PitchClass::wrapping(23).value(), 11);
        assert_eq!(PitchClass::new(10).unwrap().transpose(4).value(), 2);
    }

    #[test]
    fn test_root_names() {
        let roots = RootNames::default();
        assert_eq!(roots.lookup("Eb"), roots.lookup("D#"));
        assert_eq!(roots.resolve("Bb").unwrap().value(), 10);
        assert_eq!(roots.resolve("7").unwrap().value(), 7);
        assert!(roots.resolve("12").is_err());
        assert!(roots.resolve("H").is_err());
        assert_eq!(roots.len(), 17);
    }
}
