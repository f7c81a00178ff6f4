//! Projection of one canonical voicing onto sibling string ranges

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VoicingError};
use crate::templates::{InstrumentSize, TemplateRegistry};
use crate::voicing::{GeneratedVoicing, VoicingRecord};

/// `(arity, range name)` → string roles, bass first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectionTable {
    entries: BTreeMap<(usize, String), Vec<String>>,
}

impl ProjectionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// One entry per range template, keyed by its own string count
    pub fn from_registry(registry: &TemplateRegistry) -> Self {
        let entries = registry
            .ranges()
            .iter()
            .map(|r| ((r.slots(), r.name.clone()), r.strings.clone()))
            .collect();
        Self { entries }
    }

    /// Add or override a mapping; the role list must match the arity
    pub fn insert(&mut self, arity: usize, range: impl Into<String>, strings: Vec<String>) -> Result<()> {
        let range = range.into();
        if strings.len() != arity {
            return Err(VoicingError::InvalidTemplate(format!(
                "projection for '{range}' lists {} strings for arity {arity}",
                strings.len()
            )));
        }
        self.entries.insert((arity, range), strings);
        Ok(())
    }

    pub fn contains(&self, arity: usize, range: &str) -> bool {
        self.entries.contains_key(&(arity, range.to_string()))
    }

    pub fn get(&self, arity: usize, range: &str) -> Result<&[String]> {
        self.entries
            .get(&(arity, range.to_string()))
            .map(Vec::as_slice)
            .ok_or_else(|| {
                VoicingError::MissingTemplate(format!("no {arity}-note projection for range '{range}'"))
            })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Outcome of projecting onto one sibling range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    pub range: String,
    pub result: Result<GeneratedVoicing>,
}

/// Ranges on `instrument` a voicing of `arity` notes projects onto, in registry order
pub fn sibling_ranges<'a>(
    registry: &'a TemplateRegistry,
    table: &'a ProjectionTable,
    instrument: InstrumentSize,
    arity: usize,
) -> impl Iterator<Item = &'a str> {
    registry
        .ranges()
        .iter()
        .filter(move |r| instrument.offers(r.instrument))
        .filter(move |r| r.slots() == arity || table.contains(arity, &r.name))
        .map(|r| r.name.as_str())
}

/// Project one voicing onto a named range. Pitches are copied unchanged;
/// only string assignment comes from the table.
pub fn project(
    source: &VoicingRecord,
    registry: &TemplateRegistry,
    table: &ProjectionTable,
    range: &str,
) -> Result<GeneratedVoicing> {
    let template = registry.range(range)?;
    let strings = table.get(source.arity(), range)?;
    let sibling = source.reassigned(range, strings)?;
    GeneratedVoicing::from_voicing(sibling, template.instrument)
}

/// Project `source` onto every other range offered by `instrument`.
/// Each sibling fails independently.
pub fn expand_ranges(
    source: &VoicingRecord,
    registry: &TemplateRegistry,
    table: &ProjectionTable,
    instrument: InstrumentSize,
) -> Vec<Projection> {
    sibling_ranges(registry, table, instrument, source.arity())
        .filter(|name| *name != source.range)
        .map(|name| Projection {
            range: name.to_string(),
            result: project(source, registry, table, name),
        })
        .collect()
}
