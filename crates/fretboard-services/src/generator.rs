//! Generation orchestrator: runs the pure builders and writes through a catalog

use fretboard_core::{
    Category, ChordTemplate, GeneratedVoicing, InstrumentSize, PitchClass, ProjectionTable, TemplateRegistry,
    VSystem, VoicingError, build_voicing, build_vsystem, build_vsystem_family, check_string_set, expand_ranges,
    sibling_ranges,
};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::catalog::{Catalog, CatalogError, UpsertOutcome, transaction};
use crate::report::{BatchReport, UnitOutcome};

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error(transparent)]
    Voicing(#[from] VoicingError),
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),
}

/// A new or changed base voicing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChordDefinition {
    pub quality: String,
    pub root: PitchClass,
    pub range: String,
}

impl ChordDefinition {
    pub fn new(quality: impl Into<String>, root: PitchClass, range: impl Into<String>) -> Self {
        Self {
            quality: quality.into(),
            root,
            range: range.into(),
        }
    }
}

/// Transaction scope for batch runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransactionMode {
    /// Each unit commits on its own; failures are counted and skipped
    #[default]
    PerUnit,
    /// One enclosing transaction; the first failure rolls back the batch
    AllOrNothing,
}

/// Write one voicing and its positions, reusing whatever is already current
pub fn persist_unit<C: Catalog + ?Sized>(
    catalog: &mut C,
    generated: &GeneratedVoicing,
) -> Result<UnitOutcome, CatalogError> {
    let key = generated.key();
    let outcome = match catalog.upsert_voicing(generated.voicing.clone())? {
        UpsertOutcome::Created => UnitOutcome::Created,
        UpsertOutcome::Updated => UnitOutcome::Updated,
        UpsertOutcome::Unchanged => {
            if catalog.positions(&key).as_deref() == Some(generated.positions.as_slice()) {
                return Ok(UnitOutcome::Skipped);
            }
            // Missing or stale
            UnitOutcome::Updated
        }
    };
    catalog.replace_positions(&key, generated.positions.clone())?;
    Ok(outcome)
}

/// Drives voicing generation for one registry and projection table
#[derive(Debug, Clone)]
pub struct Generator {
    registry: TemplateRegistry,
    table: ProjectionTable,
    instrument: InstrumentSize,
}

impl Generator {
    pub fn new(registry: TemplateRegistry, table: ProjectionTable) -> Self {
        Self {
            registry,
            table,
            instrument: InstrumentSize::Eight,
        }
    }

    /// Registry with a projection table seeded from it
    pub fn from_registry(registry: TemplateRegistry) -> Self {
        let table = ProjectionTable::from_registry(&registry);
        Self::new(registry, table)
    }

    /// Largest instrument whose ranges expansion covers
    pub fn with_instrument(mut self, instrument: InstrumentSize) -> Self {
        self.instrument = instrument;
        self
    }

    pub fn registry(&self) -> &TemplateRegistry {
        &self.registry
    }

    pub fn table(&self) -> &ProjectionTable {
        &self.table
    }

    pub fn instrument(&self) -> InstrumentSize {
        self.instrument
    }

    /// Build and invert one standard voicing on a range, honouring the projection table
    pub fn build_unit(&self, chord: &ChordTemplate, root: PitchClass, range: &str) -> Result<GeneratedVoicing, VoicingError> {
        let template = self.registry.range(range)?;
        let strings = self.table.get(chord.arity(), range)?;
        let voicing = build_voicing(Category::Standard, root, chord, template)?.reassigned(range, strings)?;
        GeneratedVoicing::from_voicing(voicing, template.instrument)
    }

    /// Generate a base voicing and cascade it to every sibling range, atomically.
    ///
    /// A sibling whose projection cannot be computed is counted as an error
    /// and skipped; a catalog failure rolls back the whole definition.
    pub fn define_chord<C: Catalog + ?Sized>(
        &self,
        catalog: &mut C,
        definition: &ChordDefinition,
    ) -> Result<BatchReport, GenerateError> {
        let chord = self.registry.chord(&definition.quality)?;
        // Same string order regeneration writes for this key
        let canonical = if self.table.contains(chord.arity(), &definition.range) {
            self.build_unit(chord, definition.root, &definition.range)?
        } else {
            let template = self.registry.range(&definition.range)?;
            let voicing = build_voicing(Category::Standard, definition.root, chord, template)?;
            GeneratedVoicing::from_voicing(voicing, template.instrument)?
        };
        let projections = expand_ranges(&canonical.voicing, &self.registry, &self.table, self.instrument);

        let report = transaction(catalog, |c| -> Result<BatchReport, GenerateError> {
            let mut report = BatchReport::new();
            report.record(persist_unit(c, &canonical)?);
            for projection in projections {
                let unit = format!("{} {} [{}]", definition.root, definition.quality, projection.range);
                match projection.result {
                    Ok(sibling) => report.record(persist_unit(c, &sibling)?),
                    Err(e) => {
                        warn!("Skipping projection {}: {}", unit, e);
                        report.fail(unit, &e);
                    }
                }
            }
            Ok(report)
        })?;

        info!(
            "Defined {} {} on {}: {}",
            definition.root, definition.quality, definition.range, report
        );
        Ok(report)
    }

    /// Regenerate every quality at every root on every range of the instrument
    pub fn regenerate_all<C: Catalog + ?Sized>(
        &self,
        catalog: &mut C,
        mode: TransactionMode,
    ) -> Result<BatchReport, GenerateError> {
        let units = self.all_units();
        info!("Regenerating {} units ({:?})", units.len(), mode);

        let report = match mode {
            TransactionMode::PerUnit => {
                let mut report = BatchReport::new();
                for (label, unit) in units {
                    self.persist_independent(catalog, &mut report, label, unit);
                }
                report
            }
            TransactionMode::AllOrNothing => self.persist_all_or_nothing(catalog, units)?,
        };

        info!("Regeneration finished: {}", report);
        Ok(report)
    }

    /// One V-System voicing, committed on its own
    pub fn generate_vsystem<C: Catalog + ?Sized>(
        &self,
        catalog: &mut C,
        system: VSystem,
        quality: &str,
        root: PitchClass,
        string_set: &str,
    ) -> Result<BatchReport, GenerateError> {
        let chord = self.registry.chord(quality)?;
        let set = self.registry.range(string_set)?;
        let generated = build_vsystem(system, root, chord, set)?;

        let outcome = transaction(catalog, |c| persist_unit(c, &generated))?;
        let mut report = BatchReport::new();
        report.record(outcome);
        debug!("{} {} {} on {}: {:?}", system, root, quality, string_set, outcome);
        Ok(report)
    }

    /// All roots × all qualities for one V-System on one string set.
    ///
    /// Qualities with more notes than the set has strings are counted as
    /// skipped; an extended-range set is rejected before anything is written.
    pub fn generate_vsystem_family<C: Catalog + ?Sized>(
        &self,
        catalog: &mut C,
        system: VSystem,
        string_set: &str,
    ) -> Result<BatchReport, GenerateError> {
        let set = self.registry.range(string_set)?;
        check_string_set(set, 0)?;

        let mut report = BatchReport::new();
        for unit in build_vsystem_family(system, &self.registry, set) {
            let label = format!("{} {} {} [{}]", system, unit.root, unit.quality, string_set);
            match unit.result {
                Err(VoicingError::UnsupportedConfiguration(reason)) => {
                    debug!("Skipping {}: {}", label, reason);
                    report.record(UnitOutcome::Skipped);
                }
                result => self.persist_independent(catalog, &mut report, label, result),
            }
        }

        info!("{} family on {}: {}", system, string_set, report);
        Ok(report)
    }

    fn all_units(&self) -> Vec<(String, Result<GeneratedVoicing, VoicingError>)> {
        let mut units = Vec::new();
        for chord in self.registry.chords() {
            for range in sibling_ranges(&self.registry, &self.table, self.instrument, chord.arity()) {
                for root in PitchClass::all() {
                    let label = format!("{} {} [{}]", root, chord.quality, range);
                    units.push((label, self.build_unit(chord, root, range)));
                }
            }
        }
        units
    }

    fn persist_independent<C: Catalog + ?Sized>(
        &self,
        catalog: &mut C,
        report: &mut BatchReport,
        label: String,
        unit: Result<GeneratedVoicing, VoicingError>,
    ) {
        let generated = match unit {
            Ok(generated) => generated,
            Err(e) => {
                warn!("Failed to generate {}: {}", label, e);
                report.fail(label, &e);
                return;
            }
        };
        match transaction(catalog, |c| persist_unit(c, &generated)) {
            Ok(outcome) => {
                debug!("{}: {:?}", label, outcome);
                report.record(outcome);
            }
            Err(e) => {
                warn!("Failed to store {}: {}", label, e);
                report.fail(label, &e);
            }
        }
    }

    fn persist_all_or_nothing<C: Catalog + ?Sized>(
        &self,
        catalog: &mut C,
        units: Vec<(String, Result<GeneratedVoicing, VoicingError>)>,
    ) -> Result<BatchReport, GenerateError> {
        catalog.begin();
        let mut report = BatchReport::new();
        for (label, unit) in units {
            let result = unit
                .map_err(GenerateError::from)
                .and_then(|g| persist_unit(catalog, &g).map_err(GenerateError::from));
            match result {
                Ok(outcome) => report.record(outcome),
                Err(e) => {
                    catalog.rollback()?;
                    warn!("Rolled back {} units after {} failed: {}", report.total(), label, e);
                    let mut aborted = BatchReport::new();
                    aborted.fail(label, &e);
                    return Ok(aborted);
                }
            }
        }
        catalog.commit()?;
        Ok(report)
    }
}
