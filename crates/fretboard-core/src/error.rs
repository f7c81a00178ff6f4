//! Error types for voicing generation

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VoicingError {
    #[error("Invalid note value {value} ({context})")]
    InvalidNoteValue { value: i32, context: String },
    #[error("Missing template: {0}")]
    MissingTemplate(String),
    #[error("Unsupported configuration: {0}")]
    UnsupportedConfiguration(String),
    #[error("Unknown chord quality: {0}")]
    UnknownQuality(String),
    #[error("Invalid template: {0}")]
    InvalidTemplate(String),
}

pub type Result<T> = std::result::Result<T, VoicingError>;
