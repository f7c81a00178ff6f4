//! Chord and string-range templates (read-only generation config)

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VoicingError};
use crate::pitch::RootNames;

/// Chord sizes the inversion labels can name
pub const MIN_ARITY: usize = 3;
pub const MAX_ARITY: usize = 6;

// ============================================================================
// Built-in chord qualities
// ============================================================================

/// Chord qualities shipped with the default registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuiltinQuality {
    Major,
    Minor,
    Diminished,
    Augmented,
    Sus2,
    Sus4,
    Major7,
    Minor7,
    Dominant7,
    Diminished7,
    HalfDiminished7,
    MinorMajor7,
    Major6,
    Minor6,
    Augmented7,
    Dominant7Sus4,
}

impl BuiltinQuality {
    pub const ALL: [BuiltinQuality; 16] = [
        Self::Major,
        Self::Minor,
        Self::Diminished,
        Self::Augmented,
        Self::Sus2,
        Self::Sus4,
        Self::Major7,
        Self::Minor7,
        Self::Dominant7,
        Self::Diminished7,
        Self::HalfDiminished7,
        Self::MinorMajor7,
        Self::Major6,
        Self::Minor6,
        Self::Augmented7,
        Self::Dominant7Sus4,
    ];

    /// Get chord intervals from root
    pub fn intervals(&self) -> &'static [u8] {
        match self {
            Self::Major => &[0, 4, 7],
            Self::Minor => &[0, 3, 7],
            Self::Diminished => &[0, 3, 6],
            Self::Augmented => &[0, 4, 8],
            Self::Sus2 => &[0, 2, 7],
            Self::Sus4 => &[0, 5, 7],
            Self::Major7 => &[0, 4, 7, 11],
            Self::Minor7 => &[0, 3, 7, 10],
            Self::Dominant7 => &[0, 4, 7, 10],
            Self::Diminished7 => &[0, 3, 6, 9],
            Self::HalfDiminished7 => &[0, 3, 6, 10],
            Self::MinorMajor7 => &[0, 3, 7, 11],
            Self::Major6 => &[0, 4, 7, 9],
            Self::Minor6 => &[0, 3, 7, 9],
            Self::Augmented7 => &[0, 4, 8, 10],
            Self::Dominant7Sus4 => &[0, 5, 7, 10],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Major => "Major",
            Self::Minor => "Minor",
            Self::Diminished => "Diminished",
            Self::Augmented => "Augmented",
            Self::Sus2 => "Sus2",
            Self::Sus4 => "Sus4",
            Self::Major7 => "Major 7",
            Self::Minor7 => "Minor 7",
            Self::Dominant7 => "Dominant 7",
            Self::Diminished7 => "Diminished 7",
            Self::HalfDiminished7 => "Minor 7b5",
            Self::MinorMajor7 => "Minor Major 7",
            Self::Major6 => "Major 6",
            Self::Minor6 => "Minor 6",
            Self::Augmented7 => "Augmented 7",
            Self::Dominant7Sus4 => "Dominant 7 Sus4",
        }
    }
}

// ============================================================================
// Instruments and string ranges
// ============================================================================

/// Instrument size class; larger instruments offer every smaller one's ranges
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstrumentSize {
    #[default]
    Six,
    Seven,
    Eight,
}

impl InstrumentSize {
    pub const ALL: [InstrumentSize; 3] = [Self::Six, Self::Seven, Self::Eight];

    pub fn string_count(&self) -> usize {
        match self {
            Self::Six => 6,
            Self::Seven => 7,
            Self::Eight => 8,
        }
    }

    pub fn from_string_count(count: usize) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.string_count() == count)
    }

    /// 7- and 8-string instruments
    pub fn is_extended(&self) -> bool {
        !matches!(self, Self::Six)
    }

    /// Whether an instrument of this size offers a range declared for `other`
    pub fn offers(&self, other: InstrumentSize) -> bool {
        other <= *self
    }
}

/// Quality name plus its ordered semitone intervals
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChordTemplate {
    pub quality: String,
    pub intervals: Vec<u8>,
}

impl ChordTemplate {
    pub fn new(quality: impl Into<String>, intervals: Vec<u8>) -> Self {
        Self {
            quality: quality.into(),
            intervals,
        }
    }

    pub fn arity(&self) -> usize {
        self.intervals.len()
    }

    pub fn validate(&self) -> Result<()> {
        if self.quality.trim().is_empty() {
            return Err(VoicingError::InvalidTemplate("chord quality name is empty".into()));
        }
        if !(MIN_ARITY..=MAX_ARITY).contains(&self.arity()) {
            return Err(VoicingError::InvalidTemplate(format!(
                "'{}' has {} notes, expected {MIN_ARITY}..={MAX_ARITY}",
                self.quality,
                self.arity()
            )));
        }
        if let Some(bad) = self.intervals.iter().find(|&&i| i > 11) {
            return Err(VoicingError::InvalidTemplate(format!(
                "'{}' interval {bad} outside 0..=11",
                self.quality
            )));
        }
        let unique: BTreeSet<u8> = self.intervals.iter().copied().collect();
        if unique.len() != self.intervals.len() {
            return Err(VoicingError::InvalidTemplate(format!(
                "'{}' repeats an interval",
                self.quality
            )));
        }
        Ok(())
    }
}

impl From<BuiltinQuality> for ChordTemplate {
    fn from(q: BuiltinQuality) -> Self {
        Self::new(q.name(), q.intervals().to_vec())
    }
}

/// A named run of strings, ordered bass to treble
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringRangeTemplate {
    pub name: String,
    pub instrument: InstrumentSize,
    pub strings: Vec<String>,
}

impl StringRangeTemplate {
    pub fn new(name: impl Into<String>, instrument: InstrumentSize, strings: &[&str]) -> Self {
        Self {
            name: name.into(),
            instrument,
            strings: strings.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn slots(&self) -> usize {
        self.strings.len()
    }

    /// The first `arity` string roles, bass first
    pub fn roles_for(&self, arity: usize) -> Result<&[String]> {
        if arity > self.slots() {
            return Err(VoicingError::MissingTemplate(format!(
                "range '{}' has {} strings, chord needs {arity}",
                self.name,
                self.slots()
            )));
        }
        Ok(&self.strings[..arity])
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(VoicingError::InvalidTemplate("range name is empty".into()));
        }
        if self.strings.is_empty() {
            return Err(VoicingError::InvalidTemplate(format!("range '{}' has no strings", self.name)));
        }
        if self.slots() > self.instrument.string_count() {
            return Err(VoicingError::InvalidTemplate(format!(
                "range '{}' lists {} strings on a {}-string instrument",
                self.name,
                self.slots(),
                self.instrument.string_count()
            )));
        }
        let unique: BTreeSet<&str> = self.strings.iter().map(String::as_str).collect();
        if unique.len() != self.strings.len() {
            return Err(VoicingError::InvalidTemplate(format!(
                "range '{}' repeats a string",
                self.name
            )));
        }
        Ok(())
    }
}

fn builtin_ranges() -> Vec<StringRangeTemplate> {
    use InstrumentSize::*;
    vec![
        StringRangeTemplate::new("d - E", Six, &["E", "A", "d"]),
        StringRangeTemplate::new("g - A", Six, &["A", "d", "g"]),
        StringRangeTemplate::new("b - d", Six, &["d", "g", "b"]),
        StringRangeTemplate::new("e - g", Six, &["g", "b", "e"]),
        StringRangeTemplate::new("g - E", Six, &["E", "A", "d", "g"]),
        StringRangeTemplate::new("b - A", Six, &["A", "d", "g", "b"]),
        StringRangeTemplate::new("e - d", Six, &["d", "g", "b", "e"]),
        StringRangeTemplate::new("A - lowB", Seven, &["lowB", "E", "A"]),
        StringRangeTemplate::new("d - lowB", Seven, &["lowB", "E", "A", "d"]),
        StringRangeTemplate::new("highA - b", Eight, &["b", "e", "highA"]),
        StringRangeTemplate::new("highA - g", Eight, &["g", "b", "e", "highA"]),
    ]
}

// ============================================================================
// Registry
// ============================================================================

/// Chord templates, range templates and root names, loaded once
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateRegistry {
    chords: Vec<ChordTemplate>,
    ranges: Vec<StringRangeTemplate>,
    roots: RootNames,
}

impl TemplateRegistry {
    /// Empty registry with the default root names
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builtin() -> Self {
        Self {
            chords: BuiltinQuality::ALL.into_iter().map(ChordTemplate::from).collect(),
            ranges: builtin_ranges(),
            roots: RootNames::default(),
        }
    }

    pub fn chord(&self, quality: &str) -> Result<&ChordTemplate> {
        self.chords
            .iter()
            .find(|c| c.quality == quality)
            .ok_or_else(|| VoicingError::UnknownQuality(quality.to_string()))
    }

    pub fn range(&self, name: &str) -> Result<&StringRangeTemplate> {
        self.ranges
            .iter()
            .find(|r| r.name == name)
            .ok_or_else(|| VoicingError::MissingTemplate(format!("no range named '{name}'")))
    }

    pub fn chords(&self) -> &[ChordTemplate] {
        &self.chords
    }

    pub fn ranges(&self) -> &[StringRangeTemplate] {
        &self.ranges
    }

    pub fn roots(&self) -> &RootNames {
        &self.roots
    }

    /// Ranges offered by `instrument` with exactly `arity` strings
    pub fn ranges_for(&self, instrument: InstrumentSize, arity: usize) -> impl Iterator<Item = &StringRangeTemplate> {
        self.ranges
            .iter()
            .filter(move |r| instrument.offers(r.instrument) && r.slots() == arity)
    }

    /// Insert or replace (by quality name)
    pub fn insert_chord(&mut self, chord: ChordTemplate) -> Result<()> {
        chord.validate()?;
        match self.chords.iter_mut().find(|c| c.quality == chord.quality) {
            Some(existing) => *existing = chord,
            None => self.chords.push(chord),
        }
        Ok(())
    }

    /// Insert or replace (by range name)
    pub fn insert_range(&mut self, range: StringRangeTemplate) -> Result<()> {
        range.validate()?;
        match self.ranges.iter_mut().find(|r| r.name == range.name) {
            Some(existing) => *existing = range,
            None => self.ranges.push(range),
        }
        Ok(())
    }

    pub fn set_roots(&mut self, roots: RootNames) {
        self.roots = roots;
    }

    pub fn validate(&self) -> Result<()> {
        for chord in &self.chords {
            chord.validate()?;
        }
        for range in &self.ranges {
            range.validate()?;
        }
        let mut names = BTreeSet::new();
        for range in &self.ranges {
            if !names.insert(range.name.as_str()) {
                return Err(VoicingError::InvalidTemplate(format!("duplicate range '{}'", range.name)));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registry_is_valid() {
        let registry = TemplateRegistry::builtin();
        registry.validate().unwrap();
        assert_eq!(registry.chord("Major 7").unwrap().intervals, vec![0, 4, 7, 11]);
        assert_eq!(registry.range("e - d").unwrap().strings, vec!["d", "g", "b", "e"]);
    }

    #[test]
    fn test_unknown_lookups() {
        let registry = TemplateRegistry::builtin();
        assert!(matches!(registry.chord("Mystery"), Err(VoicingError::UnknownQuality(_))));
        assert!(matches!(registry.range("x - y"), Err(VoicingError::MissingTemplate(_))));
    }

    #[test]
    fn test_ranges_for_instrument() {
        let registry = TemplateRegistry::builtin();
        let six: Vec<_> = registry.ranges_for(InstrumentSize::Six, 4).map(|r| r.name.as_str()).collect();
        assert_eq!(six, vec!["g - E", "b - A", "e - d"]);
        let eight = registry.ranges_for(InstrumentSize::Eight, 4).count();
        assert_eq!(eight, 5);
        assert_eq!(registry.ranges_for(InstrumentSize::Seven, 3).count(), 5);
    }

    #[test]
    fn test_roles_for_needs_enough_slots() {
        let registry = TemplateRegistry::builtin();
        let range = registry.range("e - g").unwrap();
        assert_eq!(range.roles_for(3).unwrap().len(), 3);
        assert!(matches!(range.roles_for(4), Err(VoicingError::MissingTemplate(_))));
    }

    #[test]
    fn test_chord_validation() {
        assert!(ChordTemplate::new("Too Small", vec![0, 4]).validate().is_err());
        assert!(ChordTemplate::new("Wide", vec![0, 4, 14]).validate().is_err());
        assert!(ChordTemplate::new("Doubled", vec![0, 4, 4]).validate().is_err());
        assert!(ChordTemplate::new("Add9", vec![0, 4, 7, 2]).validate().is_ok());
    }

    #[test]
    fn test_insert_replaces_by_name() {
        let mut registry = TemplateRegistry::builtin();
        let before = registry.chords().len();
        registry.insert_chord(ChordTemplate::new("Major", vec![0, 4, 7, 9])).unwrap();
        assert_eq!(registry.chords().len(), before);
        assert_eq!(registry.chord("Major").unwrap().arity(), 4);

        let bad = StringRangeTemplate::new("too wide", InstrumentSize::Six, &["a", "b", "c", "d", "e", "f", "g"]);
        assert!(registry.insert_range(bad).is_err());
    }
}
