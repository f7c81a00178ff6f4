//! fretboard-services: Catalog storage, generation orchestration and config

pub mod catalog;
pub mod config;
pub mod generator;
pub mod report;

pub use catalog::{Catalog, CatalogError, MemoryCatalog, UpsertOutcome, transaction};
pub use config::{ConfigError, EngineConfig, default_catalog_path, default_config_path};
pub use generator::{ChordDefinition, GenerateError, Generator, TransactionMode, persist_unit};
pub use report::{BatchReport, UnitFailure, UnitOutcome};
