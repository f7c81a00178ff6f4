//! fretboard-core: Chord voicing and inversion generation

mod error;
pub mod inversion;
mod pitch;
pub mod range;
pub mod templates;
mod voicing;
pub mod vsystem;

pub use error::{Result, VoicingError};
pub use inversion::{InversionLabel, PositionRecord, generate_positions, rotation_offsets, step_sequence};
pub use pitch::{PitchClass, RootNames};
pub use range::{Projection, ProjectionTable, expand_ranges, project, sibling_ranges};
pub use templates::{
    BuiltinQuality, ChordTemplate, InstrumentSize, StringRangeTemplate, TemplateRegistry,
};
pub use voicing::{
    Category, GeneratedVoicing, VoicedNote, VoicingKey, VoicingRecord, build_voicing, chord_pitches,
};
pub use vsystem::{FamilyUnit, VSystem, build_vsystem, build_vsystem_family, check_string_set};
