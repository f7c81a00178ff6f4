//! Voicing catalog: keyed storage for voicings and the positions they own

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use fretboard_core::{GeneratedVoicing, PositionRecord, VoicingKey, VoicingRecord};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

const CATALOG_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Voicing not found: {0}")]
    NotFound(VoicingKey),
    #[error("Invalid positions for {key}: {reason}")]
    InvalidPositions { key: VoicingKey, reason: String },
    #[error("No open transaction")]
    NoTransaction,
    #[error("Unsupported catalog format version {0}")]
    UnsupportedVersion(u32),
}

/// What an upsert did to the stored voicing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    /// Notes changed; the voicing's positions were dropped and must be rebuilt
    Updated,
    Unchanged,
}

/// Storage contract the generator writes through.
///
/// Voicings are create-or-update by key; positions are only ever replaced as
/// a whole set. Transactions nest: `rollback` restores the state at the
/// matching `begin`.
pub trait Catalog {
    fn get(&self, key: &VoicingKey) -> Option<GeneratedVoicing>;
    fn upsert_voicing(&mut self, record: VoicingRecord) -> Result<UpsertOutcome, CatalogError>;
    fn replace_positions(&mut self, key: &VoicingKey, positions: Vec<PositionRecord>) -> Result<(), CatalogError>;
    fn remove(&mut self, key: &VoicingKey) -> Result<GeneratedVoicing, CatalogError>;
    fn keys(&self) -> Vec<VoicingKey>;

    fn begin(&mut self);
    fn commit(&mut self) -> Result<(), CatalogError>;
    fn rollback(&mut self) -> Result<(), CatalogError>;

    fn contains(&self, key: &VoicingKey) -> bool {
        self.get(key).is_some()
    }

    fn positions(&self, key: &VoicingKey) -> Option<Vec<PositionRecord>> {
        self.get(key).map(|g| g.positions)
    }

    fn len(&self) -> usize {
        self.keys().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Run `f` inside a transaction: commit on `Ok`, roll back on `Err`
pub fn transaction<C, T, E, F>(catalog: &mut C, f: F) -> Result<T, E>
where
    C: Catalog + ?Sized,
    E: From<CatalogError>,
    F: FnOnce(&mut C) -> Result<T, E>,
{
    catalog.begin();
    match f(catalog) {
        Ok(value) => {
            catalog.commit()?;
            Ok(value)
        }
        Err(e) => {
            catalog.rollback()?;
            Err(e)
        }
    }
}

/// A position set is storable if it leads with an all-zero Basic Position
/// and every row has one offset per note.
fn check_positions(key: &VoicingKey, arity: usize, positions: &[PositionRecord]) -> Result<(), CatalogError> {
    let invalid = |reason: String| CatalogError::InvalidPositions {
        key: key.clone(),
        reason,
    };
    let first = positions.first().ok_or_else(|| invalid("empty position set".into()))?;
    if !first.is_basic() {
        return Err(invalid(format!("first position is {} {:?}", first.label, first.offsets)));
    }
    if let Some(bad) = positions.iter().find(|p| p.offsets.len() != arity) {
        return Err(invalid(format!(
            "{} has {} offsets for {arity} notes",
            bad.label,
            bad.offsets.len()
        )));
    }
    Ok(())
}

#[derive(Serialize, Deserialize)]
struct CatalogFile {
    version: u32,
    voicings: Vec<GeneratedVoicing>,
}

/// Deterministic in-memory catalog with JSON file persistence
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    entries: BTreeMap<VoicingKey, GeneratedVoicing>,
    snapshots: Vec<BTreeMap<VoicingKey, GeneratedVoicing>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored voicings in key order
    pub fn iter(&self) -> impl Iterator<Item = &GeneratedVoicing> {
        self.entries.values()
    }

    pub fn in_transaction(&self) -> bool {
        !self.snapshots.is_empty()
    }

    /// Write the committed state as pretty JSON via a sibling temp file
    pub fn save_json(&self, path: &Path) -> Result<(), CatalogError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let committed = self.snapshots.first().unwrap_or(&self.entries);
        let file = CatalogFile {
            version: CATALOG_FORMAT_VERSION,
            voicings: committed.values().cloned().collect(),
        };
        let json = serde_json::to_string_pretty(&file)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, path)?;
        info!("Saved {} voicings to {}", file.voicings.len(), path.display());
        Ok(())
    }

    pub fn load_json(path: &Path) -> Result<Self, CatalogError> {
        let text = fs::read_to_string(path)?;
        let file: CatalogFile = serde_json::from_str(&text)?;
        if file.version != CATALOG_FORMAT_VERSION {
            return Err(CatalogError::UnsupportedVersion(file.version));
        }
        let entries = file
            .voicings
            .into_iter()
            .map(|g| (g.key(), g))
            .collect::<BTreeMap<_, _>>();
        info!("Loaded {} voicings from {}", entries.len(), path.display());
        Ok(Self {
            entries,
            snapshots: Vec::new(),
        })
    }

    /// Load `path` if it exists, otherwise start empty
    pub fn open_or_default(path: &Path) -> Result<Self, CatalogError> {
        if path.exists() {
            Self::load_json(path)
        } else {
            debug!("No catalog at {}, starting empty", path.display());
            Ok(Self::new())
        }
    }
}

impl Catalog for MemoryCatalog {
    fn get(&self, key: &VoicingKey) -> Option<GeneratedVoicing> {
        self.entries.get(key).cloned()
    }

    fn upsert_voicing(&mut self, record: VoicingRecord) -> Result<UpsertOutcome, CatalogError> {
        let key = record.key();
        match self.entries.get_mut(&key) {
            Some(existing) if existing.voicing.same_notes(&record) => Ok(UpsertOutcome::Unchanged),
            Some(existing) => {
                existing.voicing = record;
                existing.positions.clear();
                Ok(UpsertOutcome::Updated)
            }
            None => {
                self.entries.insert(
                    key,
                    GeneratedVoicing {
                        voicing: record,
                        positions: Vec::new(),
                    },
                );
                Ok(UpsertOutcome::Created)
            }
        }
    }

    fn replace_positions(&mut self, key: &VoicingKey, positions: Vec<PositionRecord>) -> Result<(), CatalogError> {
        let entry = self
            .entries
            .get_mut(key)
            .ok_or_else(|| CatalogError::NotFound(key.clone()))?;
        check_positions(key, entry.voicing.arity(), &positions)?;
        entry.positions = positions;
        Ok(())
    }

    fn remove(&mut self, key: &VoicingKey) -> Result<GeneratedVoicing, CatalogError> {
        self.entries
            .remove(key)
            .ok_or_else(|| CatalogError::NotFound(key.clone()))
    }

    fn keys(&self) -> Vec<VoicingKey> {
        self.entries.keys().cloned().collect()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn contains(&self, key: &VoicingKey) -> bool {
        self.entries.contains_key(key)
    }

    fn begin(&mut self) {
        self.snapshots.push(self.entries.clone());
    }

    fn commit(&mut self) -> Result<(), CatalogError> {
        self.snapshots.pop().map(|_| ()).ok_or(CatalogError::NoTransaction)
    }

    fn rollback(&mut self) -> Result<(), CatalogError> {
        self.entries = self.snapshots.pop().ok_or(CatalogError::NoTransaction)?;
        Ok(())
    }
}
