//! Command implementations

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context as _, Result, anyhow};
use fretboard_core::{Category, InstrumentSize, PitchClass, VSystem};
use fretboard_services::{
    BatchReport, ChordDefinition, EngineConfig, Generator, MemoryCatalog, TransactionMode, default_catalog_path,
};

/// Config, generator and catalog location shared by every command
pub struct Context {
    generator: Generator,
    catalog_path: PathBuf,
    json: bool,
}

impl Context {
    pub fn load(config: Option<&Path>, catalog: Option<PathBuf>, json: bool) -> Result<Self> {
        let config = EngineConfig::load(config).context("loading config")?;
        let registry = config.registry().context("building template registry")?;
        let table = config.projection_table(&registry).context("building projection table")?;
        let catalog_path = catalog
            .or_else(|| config.engine.catalog.clone())
            .unwrap_or_else(default_catalog_path);
        let generator = Generator::new(registry, table).with_instrument(config.instrument());
        Ok(Self {
            generator,
            catalog_path,
            json,
        })
    }

    fn root(&self, input: &str) -> Result<PitchClass> {
        Ok(self.generator.registry().roots().resolve(input)?)
    }

    fn generator_for(&self, instrument: Option<u8>) -> Result<Generator> {
        let Some(strings) = instrument else {
            return Ok(self.generator.clone());
        };
        let size = InstrumentSize::from_string_count(strings as usize)
            .ok_or_else(|| anyhow!("no {strings}-string instrument"))?;
        Ok(self.generator.clone().with_instrument(size))
    }

    fn open_catalog(&self) -> Result<MemoryCatalog> {
        MemoryCatalog::open_or_default(&self.catalog_path)
            .with_context(|| format!("opening catalog {}", self.catalog_path.display()))
    }

    /// Save the catalog, print the four counts, and fail the run on any error
    fn finish(&self, catalog: &MemoryCatalog, report: &BatchReport) -> Result<ExitCode> {
        if report.written() > 0 {
            catalog
                .save_json(&self.catalog_path)
                .with_context(|| format!("saving catalog {}", self.catalog_path.display()))?;
        }
        if self.json {
            println!("{}", serde_json::to_string_pretty(report)?);
        } else {
            println!("{report}");
            for failure in &report.failures {
                println!("  failed: {}: {}", failure.unit, failure.error);
            }
        }
        Ok(if report.is_clean() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        })
    }
}

pub fn define(ctx: &Context, quality: &str, root: &str, range: &str, instrument: Option<u8>) -> Result<ExitCode> {
    let generator = ctx.generator_for(instrument)?;
    let definition = ChordDefinition::new(quality, ctx.root(root)?, range);
    let mut catalog = ctx.open_catalog()?;

    let report = generator
        .define_chord(&mut catalog, &definition)
        .unwrap_or_else(|e| {
            let mut report = BatchReport::new();
            report.fail(format!("{} {} [{}]", definition.root, quality, range), &e);
            report
        });
    ctx.finish(&catalog, &report)
}

pub fn vsystem(ctx: &Context, system: VSystem, string_set: &str, single: Option<(&str, &str)>) -> Result<ExitCode> {
    let mut catalog = ctx.open_catalog()?;
    let generator = &ctx.generator;

    let result = match single {
        Some((quality, root)) => {
            let root = ctx.root(root)?;
            generator.generate_vsystem(&mut catalog, system, quality, root, string_set)
        }
        None => generator.generate_vsystem_family(&mut catalog, system, string_set),
    };
    let report = result.unwrap_or_else(|e| {
        let mut report = BatchReport::new();
        report.fail(format!("{system} [{string_set}]"), &e);
        report
    });
    ctx.finish(&catalog, &report)
}

pub fn regenerate(ctx: &Context, all_or_nothing: bool, instrument: Option<u8>) -> Result<ExitCode> {
    let generator = ctx.generator_for(instrument)?;
    let mode = if all_or_nothing {
        TransactionMode::AllOrNothing
    } else {
        TransactionMode::PerUnit
    };
    let mut catalog = ctx.open_catalog()?;
    let report = generator.regenerate_all(&mut catalog, mode)?;
    ctx.finish(&catalog, &report)
}

pub fn show(ctx: &Context, quality: &str, root: &str, category: Category) -> Result<ExitCode> {
    let root = ctx.root(root)?;
    let catalog = ctx.open_catalog()?;
    let matches: Vec<_> = catalog
        .iter()
        .filter(|g| g.voicing.category == category && g.voicing.quality == quality && g.voicing.root == root)
        .collect();

    if matches.is_empty() {
        println!("No {category} voicings stored for {root} {quality}");
        return Ok(ExitCode::FAILURE);
    }
    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&matches)?);
        return Ok(ExitCode::SUCCESS);
    }
    for generated in matches {
        println!("{}", generated.voicing);
        for position in &generated.positions {
            let offsets: Vec<String> = position.offsets.iter().map(|o| format!("{o:>2}")).collect();
            println!("  {:<18} {}", position.label.name(), offsets.join(" "));
        }
    }
    Ok(ExitCode::SUCCESS)
}

pub fn templates(ctx: &Context) -> Result<ExitCode> {
    let registry = ctx.generator.registry();
    println!("Chords:");
    for chord in registry.chords() {
        println!("  {:<18} {:?}", chord.quality, chord.intervals);
    }
    println!("Ranges:");
    for range in registry.ranges() {
        println!(
            "  {:<12} {}-string  {}",
            range.name,
            range.instrument.string_count(),
            range.strings.join(" ")
        );
    }
    Ok(ExitCode::SUCCESS)
}
