use std::path::Path;

use anyhow::Context;
use vocab_core::OrdinalPolicy;

use super::load_records;
use crate::anki::{AnkiPackage, PackageSummary};
use crate::audio::{AudioLibrary, AudioSource};

/// Export the dataset as an Anki package.
pub fn run(
    csv: &Path,
    audio_dir: &Path,
    policy: OrdinalPolicy,
    output: &Path,
    deck_name: &str,
    css: Option<&Path>,
) -> anyhow::Result<PackageSummary> {
    let loaded = load_records(csv, policy)
        .with_context(|| format!("Failed to read {}", csv.display()))?;
    let library = AudioLibrary::new(audio_dir);

    let mut package = AnkiPackage::new(deck_name);
    if let Some(css) = css {
        let stylesheet = std::fs::read_to_string(css)
            .with_context(|| format!("Failed to read stylesheet {}", css.display()))?;
        package = package.with_css(stylesheet);
    }

    for record in loaded.records {
        let audio = library.audio_for(&record);
        package.add(record, audio);
    }
    if package.is_empty() {
        tracing::warn!("No records to export");
    }

    package
        .write(output)
        .with_context(|| format!("Failed to write {}", output.display()))
}
