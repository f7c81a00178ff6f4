//! V-System voicing topologies: V1 (close position) and V2 (drop-2)

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VoicingError};
use crate::pitch::PitchClass;
use crate::templates::{ChordTemplate, InstrumentSize, StringRangeTemplate, TemplateRegistry};
use crate::voicing::{Category, GeneratedVoicing, VoicedNote, build_voicing};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VSystem {
    /// Pitches ascending, bass to treble
    V1,
    /// Close position with the second-highest voice dropped to the bass
    V2,
}

impl VSystem {
    pub const ALL: [VSystem; 2] = [Self::V1, Self::V2];

    pub fn category(&self) -> Category {
        match self {
            Self::V1 => Category::V1,
            Self::V2 => Category::V2,
        }
    }

    pub fn name(&self) -> &'static str {
        self.category().name()
    }

    /// Order chord pitches for this topology, bass first
    pub fn order(&self, pitches: &[PitchClass]) -> Vec<PitchClass> {
        let close = close_position(pitches);
        match self {
            Self::V1 => close,
            Self::V2 => drop2(&close),
        }
    }
}

impl fmt::Display for VSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for VSystem {
    type Err = VoicingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "v1" | "close" => Ok(Self::V1),
            "v2" | "drop2" | "drop-2" => Ok(Self::V2),
            other => Err(VoicingError::UnsupportedConfiguration(format!("unknown V-System '{other}'"))),
        }
    }
}

/// Pitches sorted ascending
pub fn close_position(pitches: &[PitchClass]) -> Vec<PitchClass> {
    let mut sorted = pitches.to_vec();
    sorted.sort();
    sorted
}

/// Move the second-highest voice of a close-position ordering to the front.
/// Its residue is unchanged; it now sounds an octave below the rest.
pub fn drop2(close: &[PitchClass]) -> Vec<PitchClass> {
    if close.len() < 2 {
        return close.to_vec();
    }
    let mut ordered = close.to_vec();
    let dropped = ordered.remove(close.len() - 2);
    ordered.insert(0, PitchClass::wrapping(dropped.value() as i32 - 12));
    ordered
}

/// Reject string sets V-Systems are not defined over
pub fn check_string_set(string_set: &StringRangeTemplate, arity: usize) -> Result<()> {
    if string_set.instrument.is_extended() {
        return Err(VoicingError::UnsupportedConfiguration(format!(
            "V-System voicings are only defined on 6-string sets, '{}' is {}-string",
            string_set.name,
            string_set.instrument.string_count()
        )));
    }
    if string_set.slots() < arity {
        return Err(VoicingError::UnsupportedConfiguration(format!(
            "string set '{}' has {} strings, a {arity}-note chord needs {arity}",
            string_set.name,
            string_set.slots()
        )));
    }
    Ok(())
}

/// One V-System voicing with its positions
pub fn build_vsystem(
    system: VSystem,
    root: PitchClass,
    chord: &ChordTemplate,
    string_set: &StringRangeTemplate,
) -> Result<GeneratedVoicing> {
    check_string_set(string_set, chord.arity())?;

    let mut voicing = build_voicing(system.category(), root, chord, string_set)?;
    let strings = string_set.roles_for(chord.arity())?;
    voicing.notes = system
        .order(&voicing.pitches())
        .into_iter()
        .zip(strings)
        .map(|(pitch, string)| VoicedNote {
            pitch,
            string: string.clone(),
        })
        .collect();

    GeneratedVoicing::from_voicing(voicing, InstrumentSize::Six)
}

/// One family unit: which chord at which root, and how it went
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilyUnit {
    pub quality: String,
    pub root: PitchClass,
    pub result: Result<GeneratedVoicing>,
}

/// Every registered quality at every root on one string set
pub fn build_vsystem_family(
    system: VSystem,
    registry: &TemplateRegistry,
    string_set: &StringRangeTemplate,
) -> Vec<FamilyUnit> {
    let mut units = Vec::with_capacity(registry.chords().len() * 12);
    for chord in registry.chords() {
        for root in PitchClass::all() {
            units.push(FamilyUnit {
                quality: chord.quality.clone(),
                root,
                result: build_vsystem(system, root, chord, string_set),
            });
        }
    }
    units
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pcs(values: &[u8]) -> Vec<PitchClass> {
        values.iter().map(|&v| PitchClass::new(v).unwrap()).collect()
    }

    fn values(pitches: &[PitchClass]) -> Vec<u8> {
        pitches.iter().map(|p| p.value()).collect()
    }

    #[test]
    fn test_dominant7_drop2() {
        let registry = TemplateRegistry::builtin();
        let chord = registry.chord("Dominant 7").unwrap();
        let set = registry.range("e - d").unwrap();

        let v1 = build_vsystem(VSystem::V1, PitchClass::C, chord, set).unwrap();
        assert_eq!(values(&v1.voicing.pitches()), vec![0, 4, 7, 10]);

        let v2 = build_vsystem(VSystem::V2, PitchClass::C, chord, set).unwrap();
        assert_eq!(values(&v2.voicing.pitches()), vec![7, 0, 4, 10]);
        assert_eq!(v2.voicing.strings(), vec!["d", "g", "b", "e"]);
        assert_eq!(v2.voicing.pitch_multiset(), v1.voicing.pitch_multiset());
        assert_eq!(v2.voicing.category, Category::V2);
    }

    #[test]
    fn test_close_position_sorts_wrapped_roots() {
        // A7: 9, 1, 4, 7
        assert_eq!(values(&close_position(&pcs(&[9, 1, 4, 7]))), vec![1, 4, 7, 9]);
        assert_eq!(values(&drop2(&pcs(&[1, 4, 7, 9]))), vec![7, 1, 4, 9]);
    }

    #[test]
    fn test_triad_drop2_moves_middle_voice() {
        assert_eq!(values(&VSystem::V2.order(&pcs(&[0, 4, 7]))), vec![4, 0, 7]);
    }

    #[test]
    fn test_family_preserves_pitch_content() {
        let registry = TemplateRegistry::builtin();
        let set = registry.range("b - A").unwrap();
        for system in VSystem::ALL {
            for unit in build_vsystem_family(system, &registry, set) {
                let generated = unit.result.unwrap();
                let chord = registry.chord(&unit.quality).unwrap();
                let mut expected: Vec<u8> =
                    chord.intervals.iter().map(|i| (unit.root.value() + i) % 12).collect();
                expected.sort();
                assert_eq!(values(&generated.voicing.pitch_multiset()), expected);
                assert!(generated.positions[0].is_basic());
            }
        }
    }

    #[test]
    fn test_four_notes_on_three_strings_is_unsupported() {
        let registry = TemplateRegistry::builtin();
        let chord = registry.chord("Major 7").unwrap();
        let set = registry.range("e - g").unwrap();
        let err = build_vsystem(VSystem::V1, PitchClass::C, chord, set).unwrap_err();
        assert!(matches!(err, VoicingError::UnsupportedConfiguration(_)));
    }

    #[test]
    fn test_extended_string_set_is_unsupported() {
        let registry = TemplateRegistry::builtin();
        let chord = registry.chord("Minor 7").unwrap();
        let set = registry.range("highA - g").unwrap();
        let err = build_vsystem(VSystem::V2, PitchClass::C, chord, set).unwrap_err();
        assert!(matches!(err, VoicingError::UnsupportedConfiguration(_)));
    }

    #[test]
    fn test_parse_system() {
        assert_eq!("v1".parse::<VSystem>().unwrap(), VSystem::V1);
        assert_eq!("Drop-2".parse::<VSystem>().unwrap(), VSystem::V2);
        assert!("v7".parse::<VSystem>().is_err());
    }
}
