//! Generation config: template registry overrides loaded from TOML

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use fretboard_core::{
    ChordTemplate, InstrumentSize, PitchClass, ProjectionTable, RootNames, StringRangeTemplate,
    TemplateRegistry, VoicingError,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Template error: {0}")]
    Template(#[from] VoicingError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChordEntry {
    pub quality: String,
    pub intervals: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeEntry {
    pub name: String,
    #[serde(default)]
    pub instrument: InstrumentSize,
    /// Bass to treble
    pub strings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectionEntry {
    pub arity: usize,
    pub range: String,
    pub strings: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSection {
    /// Largest instrument expansion covers (default: eight)
    #[serde(default)]
    pub instrument: Option<InstrumentSize>,
    #[serde(default)]
    pub catalog: Option<PathBuf>,
}

/// Contents of `voicings.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Start from an empty registry instead of the built-in one
    #[serde(default)]
    pub replace_builtin: bool,
    #[serde(default)]
    pub engine: EngineSection,
    #[serde(default)]
    pub chord: Vec<ChordEntry>,
    #[serde(default)]
    pub range: Vec<RangeEntry>,
    #[serde(default)]
    pub roots: BTreeMap<String, u8>,
    #[serde(default)]
    pub projection: Vec<ProjectionEntry>,
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("fretboard")
        .join("voicings.toml")
}

pub fn default_catalog_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("fretboard")
        .join("catalog.json")
}

impl EngineConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// An explicit path must exist; the default path falls back to built-ins
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (default_config_path(), false),
        };
        if !explicit && !path.exists() {
            debug!("No config at {}, using built-in templates", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        info!(
            "Loaded config {} ({} chords, {} ranges)",
            path.display(),
            config.chord.len(),
            config.range.len()
        );
        Ok(config)
    }

    /// Built-in (or empty) registry with this config's entries applied
    pub fn registry(&self) -> Result<TemplateRegistry, ConfigError> {
        let mut registry = if self.replace_builtin {
            TemplateRegistry::new()
        } else {
            TemplateRegistry::builtin()
        };
        for entry in &self.chord {
            registry.insert_chord(ChordTemplate::new(entry.quality.clone(), entry.intervals.clone()))?;
        }
        for entry in &self.range {
            registry.insert_range(StringRangeTemplate {
                name: entry.name.clone(),
                instrument: entry.instrument,
                strings: entry.strings.clone(),
            })?;
        }
        if !self.roots.is_empty() {
            registry.set_roots(self.root_names(registry.roots())?);
        }
        registry.validate()?;
        Ok(registry)
    }

    /// Table seeded from `registry`, then overridden by `[[projection]]`
    pub fn projection_table(&self, registry: &TemplateRegistry) -> Result<ProjectionTable, ConfigError> {
        let mut table = ProjectionTable::from_registry(registry);
        for entry in &self.projection {
            registry.range(&entry.range)?;
            table.insert(entry.arity, entry.range.clone(), entry.strings.clone())?;
        }
        Ok(table)
    }

    pub fn instrument(&self) -> InstrumentSize {
        self.engine.instrument.unwrap_or(InstrumentSize::Eight)
    }

    fn root_names(&self, base: &RootNames) -> Result<RootNames, ConfigError> {
        let mut names: BTreeMap<String, PitchClass> = if self.replace_builtin {
            BTreeMap::new()
        } else {
            base.iter().map(|(k, v)| (k.to_string(), v)).collect()
        };
        for (name, &value) in &self.roots {
            names.insert(name.clone(), PitchClass::new(value)?);
        }
        Ok(RootNames::from_map(names))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r#"
[engine]
instrument = "seven"

[[chord]]
quality = "Add9"
intervals = [0, 4, 7, 2]

[[range]]
name = "e - A skip"
instrument = "six"
strings = ["A", "g", "b", "e"]

[roots]
H = 11

[[projection]]
arity = 3
range = "e - d"
strings = ["d", "b", "e"]
"#;

    #[test]
    fn test_parse_and_apply() {
        let config = EngineConfig::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.instrument(), InstrumentSize::Seven);

        let registry = config.registry().unwrap();
        assert_eq!(registry.chord("Add9").unwrap().intervals, vec![0, 4, 7, 2]);
        assert!(registry.chord("Major 7").is_ok());
        assert_eq!(registry.range("e - A skip").unwrap().slots(), 4);
        assert_eq!(registry.roots().lookup("H").unwrap().value(), 11);
        assert_eq!(registry.roots().lookup("Bb").unwrap().value(), 10);

        let table = config.projection_table(&registry).unwrap();
        assert_eq!(table.get(3, "e - d").unwrap(), ["d", "b", "e"]);
        assert_eq!(table.get(4, "e - A skip").unwrap(), ["A", "g", "b", "e"]);
    }

    #[test]
    fn test_replace_builtin() {
        let config = EngineConfig::from_toml_str(
            r#"
replace_builtin = true

[[chord]]
quality = "Power"
intervals = [0, 7, 5]

[[range]]
name = "g - E"
strings = ["E", "A", "d"]

[roots]
Do = 0
"#,
        )
        .unwrap();
        let registry = config.registry().unwrap();
        assert_eq!(registry.chords().len(), 1);
        assert_eq!(registry.ranges().len(), 1);
        assert_eq!(registry.roots().len(), 1);
        assert!(registry.roots().lookup("C").is_none());
    }

    #[test]
    fn test_invalid_entries_are_rejected() {
        let config = EngineConfig::from_toml_str(
            r#"
[[chord]]
quality = "Broken"
intervals = [0, 4, 13]
"#,
        )
        .unwrap();
        assert!(matches!(config.registry(), Err(ConfigError::Template(_))));

        let config = EngineConfig::from_toml_str(
            r#"
[[projection]]
arity = 3
range = "nowhere"
strings = ["a", "b", "c"]
"#,
        )
        .unwrap();
        let registry = config.registry().unwrap();
        assert!(config.projection_table(&registry).is_err());
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("voicings.toml");
        assert!(matches!(EngineConfig::load(Some(&missing)), Err(ConfigError::Io { .. })));

        std::fs::write(&missing, SAMPLE).unwrap();
        let config = EngineConfig::load(Some(&missing)).unwrap();
        assert_eq!(config.chord.len(), 1);
    }

    #[test]
    fn test_bad_toml() {
        assert!(matches!(
            EngineConfig::from_toml_str("[[chord]]\nquality = 3"),
            Err(ConfigError::Toml(_))
        ));
    }
}
