//! Error types for vocab-core.

use thiserror::Error;

/// Errors raised while reading the vocabulary dataset.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to open dataset: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing required column {0:?}")]
    MissingColumn(&'static str),

    #[error("malformed row at line {line}: {message}")]
    MalformedRow { line: u64, message: String },
}

/// A row that cannot be assigned to a skill group.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataQualityError {
    #[error("invalid skill ordinal {value:?} for skill {skill:?} at line {line}")]
    InvalidOrdinal {
        line: u64,
        skill: String,
        value: String,
    },

    #[error("unusable skill name {skill:?} at line {line}")]
    InvalidSkill { line: u64, skill: String },
}
