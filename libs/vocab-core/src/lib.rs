//! Core vocabulary library shared by the Mochi, Anki and audio pipelines.
//!
//! Provides:
//! - CSV row source for the vocabulary dataset
//! - Skill grouping with ordinal inference
//! - Typed card schema (fixed field keys, fingerprints, card content)
//! - Audio file naming

pub mod error;
pub mod grouper;
pub mod media;
pub mod source;
pub mod types;

pub use error::{DataQualityError, SourceError};
pub use grouper::{Assigned, OrdinalPolicy, SkillGrouper};
pub use media::audio_file_name;
pub use source::{RowSource, SourceRow};
pub use types::{
    audio_markdown, fingerprint_from_fields, FieldKey, FieldMap, FieldValue, Fingerprint,
    SkillGroup, VocabularyRecord, NOT_APPLICABLE,
};
