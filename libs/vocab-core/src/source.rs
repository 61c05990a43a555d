//! CSV row source for the vocabulary dataset.
//!
//! # Format
//! ```text
//! #,Skill,Hebrew,Niqqud,Transliteration,Translation,Gender,Number,Form,Type
//! 1,Basics 1,אני,אֲנִי,ani,I,,singular,,pronoun
//! ```
//!
//! `Gender`, `Number` and `Form` are optional; blank or absent values become
//! [`NOT_APPLICABLE`](crate::types::NOT_APPLICABLE). The ordinal column may
//! also be headed `שבדית`.

use crate::error::SourceError;
use crate::types::or_sentinel;
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;

const ORDINAL_COLUMNS: [&str; 2] = ["#", "שבדית"];
const REQUIRED_COLUMNS: [&str; 6] = [
    "Skill",
    "Hebrew",
    "Niqqud",
    "Transliteration",
    "Translation",
    "Type",
];

/// One dataset row before skill assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRow {
    /// 1-indexed line in the source file.
    pub line: u64,
    /// Raw ordinal column, unparsed.
    pub ordinal: String,
    pub skill: String,
    pub hebrew: String,
    pub niqqud: String,
    pub transliteration: String,
    pub translation: String,
    pub gender: String,
    pub number: String,
    pub form: String,
    pub word_type: String,
}

#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(rename = "#", alias = "שבדית")]
    ordinal: String,
    #[serde(rename = "Skill")]
    skill: String,
    #[serde(rename = "Hebrew")]
    hebrew: String,
    #[serde(rename = "Niqqud")]
    niqqud: String,
    #[serde(rename = "Transliteration")]
    transliteration: String,
    #[serde(rename = "Translation")]
    translation: String,
    #[serde(rename = "Gender", default)]
    gender: Option<String>,
    #[serde(rename = "Number", default)]
    number: Option<String>,
    #[serde(rename = "Form", default)]
    form: Option<String>,
    #[serde(rename = "Type")]
    word_type: String,
}

impl RawRow {
    fn into_row(self, line: u64) -> SourceRow {
        let optional = |v: Option<String>| or_sentinel(v.as_deref().unwrap_or_default());
        SourceRow {
            line,
            ordinal: self.ordinal,
            skill: self.skill,
            hebrew: self.hebrew,
            niqqud: self.niqqud,
            transliteration: self.transliteration,
            translation: self.translation,
            gender: optional(self.gender),
            number: optional(self.number),
            form: optional(self.form),
            word_type: self.word_type,
        }
    }
}

/// Ordered iterator over dataset rows.
pub struct RowSource<R> {
    reader: csv::Reader<R>,
    headers: csv::StringRecord,
    done: bool,
}

impl RowSource<File> {
    /// Open a dataset file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }
}

impl<R: Read> RowSource<R> {
    /// Wrap any reader. Fails if a required column is absent.
    pub fn from_reader(reader: R) -> Result<Self, SourceError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::Headers)
            .from_reader(reader);

        let headers = reader.headers()?.clone();
        let has = |name: &str| headers.iter().any(|h| h == name);

        if !ORDINAL_COLUMNS.iter().any(|c| has(c)) {
            return Err(SourceError::MissingColumn(ORDINAL_COLUMNS[0]));
        }
        if let Some(missing) = REQUIRED_COLUMNS.iter().find(|c| !has(c)) {
            return Err(SourceError::MissingColumn(*missing));
        }

        Ok(Self {
            reader,
            headers,
            done: false,
        })
    }

    fn decode(&self, record: &csv::StringRecord) -> Result<SourceRow, SourceError> {
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        let raw: RawRow =
            record
                .deserialize(Some(&self.headers))
                .map_err(|e| SourceError::MalformedRow {
                    line,
                    message: e.to_string(),
                })?;
        Ok(raw.into_row(line))
    }
}

impl<R: Read> Iterator for RowSource<R> {
    type Item = Result<SourceRow, SourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut record = csv::StringRecord::new();
        match self.reader.read_record(&mut record) {
            Ok(true) => Some(self.decode(&record)),
            Ok(false) => {
                self.done = true;
                None
            }
            Err(e) => {
                // The reader cannot make progress past an I/O failure.
                if e.is_io_error() {
                    self.done = true;
                }
                Some(Err(SourceError::Csv(e)))
            }
        }
    }
}
