//! Rotational inversions of a voicing, expressed as fret offsets
//!
//! Steps are the upward distance from each voice to the next (cyclic),
//! wrapped once into non-negative territory. From there on offsets are fret
//! distances and are never reduced mod 12 again.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VoicingError};
use crate::pitch::PitchClass;
use crate::templates::{InstrumentSize, MAX_ARITY, MIN_ARITY};

/// Closed set of position labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum InversionLabel {
    BasicPosition,
    FirstInversion,
    SecondInversion,
    ThirdInversion,
    FourthInversion,
    FifthInversion,
    /// Octave-displaced alternate offered on 7/8-string ranges
    DropVoicing,
}

impl InversionLabel {
    /// Label for `k` rotations (0 = Basic Position)
    pub fn rotation(k: usize) -> Option<Self> {
        match k {
            0 => Some(Self::BasicPosition),
            1 => Some(Self::FirstInversion),
            2 => Some(Self::SecondInversion),
            3 => Some(Self::ThirdInversion),
            4 => Some(Self::FourthInversion),
            5 => Some(Self::FifthInversion),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::BasicPosition => "Basic Position",
            Self::FirstInversion => "First Inversion",
            Self::SecondInversion => "Second Inversion",
            Self::ThirdInversion => "Third Inversion",
            Self::FourthInversion => "Fourth Inversion",
            Self::FifthInversion => "Fifth Inversion",
            Self::DropVoicing => "Drop Voicing",
        }
    }
}

impl fmt::Display for InversionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One playable variant of a voicing: per-note fret offsets from the base shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionRecord {
    pub label: InversionLabel,
    pub offsets: Vec<u8>,
}

impl PositionRecord {
    pub fn new(label: InversionLabel, offsets: Vec<u8>) -> Self {
        Self { label, offsets }
    }

    /// Largest minus smallest offset (how far the hand stretches)
    pub fn span(&self) -> u8 {
        let max = self.offsets.iter().copied().max().unwrap_or(0);
        let min = self.offsets.iter().copied().min().unwrap_or(0);
        max - min
    }

    pub fn is_basic(&self) -> bool {
        self.label == InversionLabel::BasicPosition && self.offsets.iter().all(|&o| o == 0)
    }
}

/// `step[i] = note[i+1] - note[i]` (cyclic), plus 12 when negative
pub fn step_sequence(pitches: &[PitchClass]) -> Vec<u8> {
    let n = pitches.len();
    (0..n)
        .map(|i| {
            let raw = pitches[(i + 1) % n].value() as i16 - pitches[i].value() as i16;
            if raw < 0 { (raw + 12) as u8 } else { raw as u8 }
        })
        .collect()
}

/// `offset[i]` = sum of `k` consecutive steps starting at `i` (cyclic)
pub fn rotation_offsets(steps: &[u8], k: usize) -> Vec<u8> {
    let n = steps.len();
    (0..n)
        .map(|i| (0..k).map(|j| steps[(i + j) % n]).sum())
        .collect()
}

/// Basic Position plus every rotational inversion for the chord's arity,
/// followed by a Drop Voicing on extended-range instruments.
pub fn generate_positions(pitches: &[PitchClass], instrument: InstrumentSize) -> Result<Vec<PositionRecord>> {
    let n = pitches.len();
    if !(MIN_ARITY..=MAX_ARITY).contains(&n) {
        return Err(VoicingError::UnsupportedConfiguration(format!(
            "cannot invert a {n}-note chord (supported: {MIN_ARITY}..={MAX_ARITY})"
        )));
    }

    let steps = step_sequence(pitches);
    let mut positions = Vec::with_capacity(n + 1);
    positions.push(PositionRecord::new(InversionLabel::BasicPosition, vec![0; n]));
    for k in 1..n {
        let label = InversionLabel::rotation(k).ok_or_else(|| {
            VoicingError::UnsupportedConfiguration(format!("no label for rotation {k}"))
        })?;
        positions.push(PositionRecord::new(label, rotation_offsets(&steps, k)));
    }

    if instrument.is_extended() {
        if let Some(drop) = drop_voicing(&positions[1..]) {
            positions.push(drop);
        }
    }
    Ok(positions)
}

/// Octave-shift one voice of the widest inversion. Lowers the largest offset
/// when that stays non-negative, otherwise raises the smallest.
fn drop_voicing(inversions: &[PositionRecord]) -> Option<PositionRecord> {
    // max_by_key keeps the last maximum; iterate reversed so ties go to the lowest rotation
    let widest = inversions.iter().rev().max_by_key(|p| p.span())?;
    let mut offsets = widest.offsets.clone();

    let max = *offsets.iter().max()?;
    if max >= 12 {
        let idx = offsets.iter().position(|&o| o == max)?;
        offsets[idx] -= 12;
    } else {
        let min = *offsets.iter().min()?;
        let idx = offsets.iter().position(|&o| o == min)?;
        offsets[idx] += 12;
    }
    Some(PositionRecord::new(InversionLabel::DropVoicing, offsets))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pcs(values: &[u8]) -> Vec<PitchClass> {
        values.iter().map(|&v| PitchClass::new(v).unwrap()).collect()
    }

    fn offsets(positions: &[PositionRecord], label: InversionLabel) -> Vec<u8> {
        positions.iter().find(|p| p.label == label).unwrap().offsets.clone()
    }

    #[test]
    fn test_major7_worked_example() {
        let pitches = pcs(&[0, 4, 7, 11]);
        assert_eq!(step_sequence(&pitches), vec![4, 3, 4, 1]);

        let positions = generate_positions(&pitches, InstrumentSize::Six).unwrap();
        assert_eq!(positions.len(), 4);
        assert_eq!(offsets(&positions, InversionLabel::BasicPosition), vec![0, 0, 0, 0]);
        assert_eq!(offsets(&positions, InversionLabel::FirstInversion), vec![4, 3, 4, 1]);
        assert_eq!(offsets(&positions, InversionLabel::SecondInversion), vec![7, 7, 5, 5]);
        assert_eq!(offsets(&positions, InversionLabel::ThirdInversion), vec![11, 8, 9, 8]);
    }

    #[test]
    fn test_triad_generates_three_positions() {
        // C minor: steps (3, 4, 5)
        let positions = generate_positions(&pcs(&[0, 3, 7]), InstrumentSize::Six).unwrap();
        let labels: Vec<_> = positions.iter().map(|p| p.label).collect();
        assert_eq!(
            labels,
            vec![
                InversionLabel::BasicPosition,
                InversionLabel::FirstInversion,
                InversionLabel::SecondInversion
            ]
        );
        assert_eq!(positions[1].offsets, vec![3, 4, 5]);
        assert_eq!(positions[2].offsets, vec![7, 9, 8]);
    }

    #[test]
    fn test_seventh_rotation_formulas() {
        for root in 0..12u8 {
            let pitches = pcs(&[root, (root + 3) % 12, (root + 7) % 12, (root + 10) % 12]);
            let s = step_sequence(&pitches);
            assert_eq!(s.iter().map(|&x| x as u32).sum::<u32>(), 12);
            let (w, x, y, z) = (s[0], s[1], s[2], s[3]);
            let positions = generate_positions(&pitches, InstrumentSize::Six).unwrap();
            assert_eq!(positions[1].offsets, vec![w, x, y, z]);
            assert_eq!(positions[2].offsets, vec![w + x, x + y, y + z, z + w]);
            assert_eq!(positions[3].offsets, vec![w + x + y, x + y + z, y + z + w, z + w + x]);
        }
    }

    #[test]
    fn test_basic_position_always_zero() {
        let cases: [&[u8]; 4] = [&[0, 4, 7], &[11, 2, 5, 9], &[6, 10, 1, 4], &[9, 1, 4]];
        for values in cases {
            for instrument in InstrumentSize::ALL {
                let positions = generate_positions(&pcs(values), instrument).unwrap();
                assert!(positions[0].is_basic());
            }
        }
    }

    #[test]
    fn test_offsets_not_rewrapped() {
        // Drop-2 ordering climbs past the octave
        let positions = generate_positions(&pcs(&[7, 0, 4, 10]), InstrumentSize::Six).unwrap();
        assert_eq!(positions[1].offsets, vec![5, 4, 6, 9]);
        assert_eq!(positions[2].offsets, vec![9, 10, 15, 14]);
        assert_eq!(positions[3].offsets, vec![15, 19, 20, 18]);
    }

    #[test]
    fn test_drop_voicing_only_on_extended_ranges() {
        let pitches = pcs(&[0, 4, 7, 11]);
        let six = generate_positions(&pitches, InstrumentSize::Six).unwrap();
        assert!(six.iter().all(|p| p.label != InversionLabel::DropVoicing));

        let eight = generate_positions(&pitches, InstrumentSize::Eight).unwrap();
        assert_eq!(eight.len(), 5);
        // First and Third tie on span 3; the lower rotation wins and its
        // smallest offset is raised an octave
        assert_eq!(offsets(&eight, InversionLabel::DropVoicing), vec![4, 3, 4, 13]);
    }

    #[test]
    fn test_drop_voicing_lowers_wide_offsets() {
        let positions = generate_positions(&pcs(&[7, 0, 4, 10]), InstrumentSize::Seven).unwrap();
        assert_eq!(offsets(&positions, InversionLabel::DropVoicing), vec![9, 10, 3, 14]);
    }

    #[test]
    fn test_regeneration_is_identical() {
        let pitches = pcs(&[2, 5, 9, 0]);
        let a = generate_positions(&pitches, InstrumentSize::Eight).unwrap();
        let b = generate_positions(&pitches, InstrumentSize::Eight).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_unsupported_arity() {
        assert!(matches!(
            generate_positions(&pcs(&[0, 7]), InstrumentSize::Six),
            Err(VoicingError::UnsupportedConfiguration(_))
        ));
    }
}
