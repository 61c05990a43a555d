use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use vocab_core::RowSource;

use crate::audio::{generate_missing, AudioLibrary, GenerationReport, GoogleTts};
use crate::config::TtsConfig;
use crate::retry::BackoffPolicy;

/// Generate audio for every niqqud in the dataset that has no file yet.
pub async fn run(
    csv: &Path,
    audio_dir: &Path,
    max_attempts: u32,
) -> anyhow::Result<GenerationReport> {
    let config = TtsConfig::from_env().context("Text-to-speech configuration")?;
    let tts = GoogleTts::new(config)?;

    let words = dataset_words(csv)?;
    let library = AudioLibrary::new(audio_dir);
    let policy = BackoffPolicy::new(max_attempts, Duration::from_secs(1));

    let report = generate_missing(&tts, &library, words, &policy)
        .await
        .with_context(|| format!("Failed to prepare {}", audio_dir.display()))?;
    tracing::info!(
        "Audio finished: {} generated, {} already present, {} failed",
        report.generated,
        report.already_present,
        report.failed.len()
    );
    Ok(report)
}

/// Niqqud of every readable row, in source order. Ordinals play no part.
fn dataset_words(csv: &Path) -> anyhow::Result<Vec<String>> {
    let source = RowSource::open(csv).with_context(|| format!("Failed to read {}", csv.display()))?;
    let mut words = Vec::new();
    for row in source {
        match row {
            Ok(row) => words.push(row.niqqud),
            Err(e) => tracing::warn!("Skipping unreadable row: {}", e),
        }
    }
    Ok(words)
}
