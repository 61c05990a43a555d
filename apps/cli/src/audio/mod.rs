//! Local pronunciation audio: lookup and generation.

pub mod tts;

pub use tts::{generate_missing, GenerationReport, GoogleTts, SpeechSynthesizer};

use std::path::{Path, PathBuf};

use vocab_core::{audio_file_name, VocabularyRecord};

/// Where the audio for a record can be found, if anywhere.
pub trait AudioSource {
    fn audio_for(&self, record: &VocabularyRecord) -> Option<PathBuf>;
}

/// A directory of `<niqqud>.mp3` files.
#[derive(Debug, Clone)]
pub struct AudioLibrary {
    dir: PathBuf,
}

impl AudioLibrary {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path the audio for `niqqud` lives at, whether or not it exists.
    pub fn path_for(&self, niqqud: &str) -> PathBuf {
        self.dir.join(audio_file_name(niqqud))
    }

    /// Path of an existing audio file for `niqqud`.
    pub fn existing(&self, niqqud: &str) -> Option<PathBuf> {
        if niqqud.trim().is_empty() {
            return None;
        }
        let path = self.path_for(niqqud);
        path.is_file().then_some(path)
    }
}

impl AudioSource for AudioLibrary {
    fn audio_for(&self, record: &VocabularyRecord) -> Option<PathBuf> {
        self.existing(&record.niqqud)
    }
}
