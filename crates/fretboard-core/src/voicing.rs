//! Voicing records and the builder that derives them from templates

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VoicingError};
use crate::inversion::{PositionRecord, generate_positions};
use crate::pitch::PitchClass;
use crate::templates::{ChordTemplate, InstrumentSize, StringRangeTemplate};

/// Family a voicing belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum Category {
    /// Hand-defined base voicings and their range projections
    #[default]
    Standard,
    /// Close position V-System
    V1,
    /// Drop-2 V-System
    V2,
}

impl Category {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Standard => "Standard",
            Self::V1 => "V1",
            Self::V2 => "V2",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Catalog key. Unique per (quality, range, root) within a category.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VoicingKey {
    pub category: Category,
    pub quality: String,
    pub range: String,
    pub root: PitchClass,
}

impl fmt::Display for VoicingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} [{}]", self.category, self.root, self.quality, self.range)
    }
}

/// One chord tone on one string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoicedNote {
    pub pitch: PitchClass,
    pub string: String,
}

/// A chord's absolute pitches assigned to the strings of one range, bass first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoicingRecord {
    pub category: Category,
    pub quality: String,
    pub range: String,
    pub root: PitchClass,
    pub notes: Vec<VoicedNote>,
}

impl VoicingRecord {
    pub fn key(&self) -> VoicingKey {
        VoicingKey {
            category: self.category,
            quality: self.quality.clone(),
            range: self.range.clone(),
            root: self.root,
        }
    }

    pub fn arity(&self) -> usize {
        self.notes.len()
    }

    /// Pitches in voicing order
    pub fn pitches(&self) -> Vec<PitchClass> {
        self.notes.iter().map(|n| n.pitch).collect()
    }

    /// Pitches sorted ascending, for order-independent comparison
    pub fn pitch_multiset(&self) -> Vec<PitchClass> {
        let mut pitches = self.pitches();
        pitches.sort();
        pitches
    }

    pub fn strings(&self) -> Vec<&str> {
        self.notes.iter().map(|n| n.string.as_str()).collect()
    }

    /// Same pitches on the same strings in the same order
    pub fn same_notes(&self, other: &VoicingRecord) -> bool {
        self.notes == other.notes
    }

    /// Copy of this voicing with the strings reassigned under a new range name
    pub fn reassigned(&self, range: &str, strings: &[String]) -> Result<VoicingRecord> {
        if strings.len() != self.arity() {
            return Err(VoicingError::MissingTemplate(format!(
                "range '{range}' supplies {} strings for a {}-note chord",
                strings.len(),
                self.arity()
            )));
        }
        let notes = self
            .notes
            .iter()
            .zip(strings)
            .map(|(note, string)| VoicedNote {
                pitch: note.pitch,
                string: string.clone(),
            })
            .collect();
        Ok(VoicingRecord {
            category: self.category,
            quality: self.quality.clone(),
            range: range.to_string(),
            root: self.root,
            notes,
        })
    }
}

impl fmt::Display for VoicingRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.key())?;
        for note in &self.notes {
            write!(f, " {}@{}", note.pitch, note.string)?;
        }
        Ok(())
    }
}

/// A voicing together with the full set of positions it owns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedVoicing {
    pub voicing: VoicingRecord,
    pub positions: Vec<PositionRecord>,
}

impl GeneratedVoicing {
    /// Derive every position for `voicing` on a range of the given instrument size
    pub fn from_voicing(voicing: VoicingRecord, instrument: InstrumentSize) -> Result<Self> {
        let positions = generate_positions(&voicing.pitches(), instrument)?;
        Ok(Self { voicing, positions })
    }

    pub fn key(&self) -> VoicingKey {
        self.voicing.key()
    }
}

/// `(root + interval) mod 12` for each interval, in template order
pub fn chord_pitches(root: PitchClass, intervals: &[u8]) -> Result<Vec<PitchClass>> {
    intervals
        .iter()
        .map(|&interval| {
            let value = (root.value() as i32 + interval as i32) % 12;
            if !(0..=11).contains(&value) {
                return Err(VoicingError::InvalidNoteValue {
                    value,
                    context: format!("root {root} + interval {interval}"),
                });
            }
            PitchClass::new(value as u8)
        })
        .collect()
}

/// Build the voicing of `chord` at `root`, note `i` on `range.strings[i]`
pub fn build_voicing(
    category: Category,
    root: PitchClass,
    chord: &ChordTemplate,
    range: &StringRangeTemplate,
) -> Result<VoicingRecord> {
    let strings = range.roles_for(chord.arity())?;
    let pitches = chord_pitches(root, &chord.intervals)?;
    let notes = pitches
        .into_iter()
        .zip(strings)
        .map(|(pitch, string)| VoicedNote {
            pitch,
            string: string.clone(),
        })
        .collect();
    Ok(VoicingRecord {
        category,
        quality: chord.quality.clone(),
        range: range.name.clone(),
        root,
        notes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templates::TemplateRegistry;

    fn pc(v: u8) -> PitchClass {
        PitchClass::new(v).unwrap()
    }

    #[test]
    fn test_build_major7() {
        let registry = TemplateRegistry::builtin();
        let chord = registry.chord("Major 7").unwrap();
        let range = registry.range("e - d").unwrap();
        let voicing = build_voicing(Category::Standard, pc(0), chord, range).unwrap();
        assert_eq!(voicing.pitches(), vec![pc(0), pc(4), pc(7), pc(11)]);
        assert_eq!(voicing.strings(), vec!["d", "g", "b", "e"]);
        assert_eq!(voicing.key().range, "e - d");
    }

    #[test]
    fn test_notes_follow_mod_12_for_every_root() {
        let registry = TemplateRegistry::builtin();
        let range = registry.range("b - A").unwrap();
        for chord in registry.chords().iter().filter(|c| c.arity() == 4) {
            for root in PitchClass::all() {
                let voicing = build_voicing(Category::Standard, root, chord, range).unwrap();
                for (note, &interval) in voicing.notes.iter().zip(&chord.intervals) {
                    assert_eq!(note.pitch.value(), (root.value() + interval) % 12);
                }
            }
        }
    }

    #[test]
    fn test_wraps_past_octave() {
        let chord = ChordTemplate::new("Dominant 7", vec![0, 4, 7, 10]);
        let pitches = chord_pitches(pc(9), &chord.intervals).unwrap();
        assert_eq!(pitches, vec![pc(9), pc(1), pc(4), pc(7)]);
    }

    #[test]
    fn test_missing_slots() {
        let registry = TemplateRegistry::builtin();
        let chord = registry.chord("Minor 7").unwrap();
        let range = registry.range("e - g").unwrap();
        let err = build_voicing(Category::Standard, pc(2), chord, range).unwrap_err();
        assert!(matches!(err, VoicingError::MissingTemplate(_)));
    }

    #[test]
    fn test_reassigned_keeps_pitches() {
        let registry = TemplateRegistry::builtin();
        let chord = registry.chord("Minor").unwrap();
        let voicing = build_voicing(Category::Standard, pc(5), chord, registry.range("e - g").unwrap()).unwrap();
        let target = registry.range("d - E").unwrap();
        let sibling = voicing.reassigned(&target.name, &target.strings).unwrap();
        assert_eq!(sibling.pitches(), voicing.pitches());
        assert_eq!(sibling.strings(), vec!["E", "A", "d"]);
        assert!(voicing.reassigned("bad", &target.strings[..2]).is_err());
    }
}
