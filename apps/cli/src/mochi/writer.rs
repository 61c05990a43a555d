//! Card creation and audio attachment.

use std::path::Path;

use uuid::Uuid;
use vocab_core::{audio_markdown, FieldMap, VocabularyRecord};

use super::types::{CardUpdate, NewCard};
use super::CardStore;
use crate::error::StoreError;

/// Length of the random prefix given to uploaded files.
const UPLOAD_PREFIX_LEN: usize = 16;

/// Writes vocabulary cards into a [`CardStore`].
///
/// Failures are returned as-is; callers decide whether to log and move on.
pub struct CardWriter<'a, S> {
    store: &'a S,
    template_id: String,
}

impl<'a, S: CardStore> CardWriter<'a, S> {
    pub fn new(store: &'a S, template_id: impl Into<String>) -> Self {
        Self {
            store,
            template_id: template_id.into(),
        }
    }

    /// Create the card for `record` in `deck_id`, returning the card id.
    pub async fn create_card(
        &self,
        deck_id: &str,
        record: &VocabularyRecord,
    ) -> Result<String, StoreError> {
        let card = NewCard {
            content: record.card_content(None),
            deck_id: deck_id.to_string(),
            template_id: self.template_id.clone(),
            fields: record.card_fields(None),
        };
        self.store.create_card(&card).await
    }

    /// Upload `audio_path` to the card and reference it from the card fields.
    ///
    /// Returns the uploaded file name.
    pub async fn attach_audio(
        &self,
        card_id: &str,
        record: &VocabularyRecord,
        audio_path: &Path,
    ) -> Result<String, StoreError> {
        let bytes = tokio::fs::read(audio_path)
            .await
            .map_err(|e| StoreError::FileSystem(format!("{}: {}", audio_path.display(), e)))?;

        let file_name = upload_file_name(audio_path);
        self.store.upload_attachment(card_id, &file_name, bytes).await?;

        let audio = audio_markdown(&file_name);
        self.update_card_fields(card_id, record.card_fields(Some(&audio))).await?;
        Ok(file_name)
    }

    /// Replace the structured fields of a card.
    pub async fn update_card_fields(
        &self,
        card_id: &str,
        fields: FieldMap,
    ) -> Result<(), StoreError> {
        self.store.update_card(card_id, &CardUpdate { fields }).await
    }
}

/// Random hex name keeping the original extension, e.g. `3f9a…c2.mp3`.
fn upload_file_name(path: &Path) -> String {
    let prefix: String = Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(UPLOAD_PREFIX_LEN)
        .collect();
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => format!("{}.{}", prefix, ext),
        None => prefix,
    }
}
