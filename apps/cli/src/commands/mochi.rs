use std::path::Path;

use anyhow::Context;
use vocab_core::OrdinalPolicy;

use super::load_records;
use crate::audio::AudioLibrary;
use crate::config::MochiConfig;
use crate::mochi::{CardStore, MochiClient};
use crate::sync::{sync_records, SyncOptions, SyncReport};

/// Sync the dataset into Mochi.
pub async fn run(
    csv: &Path,
    audio_dir: &Path,
    policy: OrdinalPolicy,
) -> anyhow::Result<SyncReport> {
    let config = MochiConfig::from_env().context("Mochi configuration")?;
    let options = SyncOptions::from_config(&config);
    let client = MochiClient::new(config)?;
    let library = AudioLibrary::new(audio_dir);

    sync_dataset(&client, &library, &options, csv, policy).await
}

/// Load the dataset and sync it into `store`.
pub async fn sync_dataset<S: CardStore>(
    store: &S,
    library: &AudioLibrary,
    options: &SyncOptions,
    csv: &Path,
    policy: OrdinalPolicy,
) -> anyhow::Result<SyncReport> {
    let loaded = load_records(csv, policy)
        .with_context(|| format!("Failed to read {}", csv.display()))?;

    let mut report = match sync_records(store, library, options, loaded.records).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("Sync setup failed: {}", e);
            return Err(e.into());
        }
    };
    report.rejected_rows += loaded.rejected;

    tracing::info!(
        "Sync finished: {} decks created, {} cards created, {} duplicates skipped, {} audio attached, {} rows rejected, {} failures",
        report.decks_created,
        report.cards_created,
        report.duplicates_skipped,
        report.audio_attached,
        report.rejected_rows,
        report.failures.len()
    );
    Ok(report)
}
