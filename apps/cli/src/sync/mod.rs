//! Incremental sync of vocabulary records into the remote card store.
//!
//! Setup resolves the deck hierarchy (`<root>/Skills/<n>. <skill>`); each
//! record is then matched against the cards already in its skill deck and
//! either skipped, given its missing audio, or created.

use std::collections::HashMap;

use serde::Serialize;
use vocab_core::{Fingerprint, SkillGroup, VocabularyRecord};

use crate::audio::AudioSource;
use crate::config::{MochiConfig, SKILLS_DECK_NAME};
use crate::error::{StoreError, SyncError};
use crate::mochi::{CardStore, CardWriter, ExistingCard, NewDeck, RemoteDirectoryIndex, SkillDeck};

/// Where to sync and with which card template.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub root_deck_id: Option<String>,
    pub root_deck_name: String,
    pub container_name: String,
    pub template_id: String,
}

impl SyncOptions {
    pub fn from_config(config: &MochiConfig) -> Self {
        Self {
            root_deck_id: config.root_deck_id.clone(),
            root_deck_name: config.root_deck_name.clone(),
            container_name: SKILLS_DECK_NAME.to_string(),
            template_id: config.template_id.clone(),
        }
    }
}

/// A record that could not be synced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordFailure {
    pub hebrew: String,
    pub translation: String,
    pub skill: String,
    pub error: String,
}

/// Counts for one sync run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub decks_created: usize,
    pub cards_created: usize,
    pub duplicates_skipped: usize,
    pub audio_attached: usize,
    pub rejected_rows: usize,
    pub failures: Vec<RecordFailure>,
}

/// What happened to a single record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    Created {
        card_id: String,
        audio: Option<String>,
    },
    Duplicate,
    AudioAttached {
        card_id: String,
        file_name: String,
    },
    Failed,
}

enum DeckState {
    /// `cards` is loaded on first use for decks that existed before the run.
    Ready {
        deck_id: String,
        cards: Option<HashMap<Fingerprint, ExistingCard>>,
    },
    Failed,
}

/// Per-run sync state over a prepared deck hierarchy.
pub struct Reconciler<'a, S, A> {
    index: RemoteDirectoryIndex<'a, S>,
    writer: CardWriter<'a, S>,
    store: &'a S,
    audio: &'a A,
    root_id: String,
    container_id: String,
    decks: HashMap<String, DeckState>,
    report: SyncReport,
}

impl<'a, S: CardStore, A: AudioSource> Reconciler<'a, S, A> {
    /// Probe the store and resolve the root deck, the skills container and
    /// the existing skill decks. Any failure here aborts the run.
    pub async fn prepare(
        store: &'a S,
        audio: &'a A,
        options: &SyncOptions,
    ) -> Result<Self, SyncError> {
        store.ping().await.map_err(SyncError::Unreachable)?;

        let index = RemoteDirectoryIndex::new(store);
        let mut report = SyncReport::default();

        let root_id = Self::resolve_root(store, &index, options, &mut report).await?;
        let container_id = match find_deck(&index, Some(&root_id), &options.container_name).await? {
            Some(id) => id,
            None => {
                let id = create_required(store, &options.container_name, Some(&root_id), 0).await?;
                report.decks_created += 1;
                id
            }
        };

        let decks = index
            .skill_decks(&container_id)
            .await?
            .into_values()
            .map(|SkillDeck { deck_id, skill }| {
                let state = DeckState::Ready {
                    deck_id,
                    cards: None,
                };
                (skill.name, state)
            })
            .collect::<HashMap<_, _>>();
        tracing::info!(
            "Found {} existing skill decks under {:?}",
            decks.len(),
            options.container_name
        );

        Ok(Self {
            index,
            writer: CardWriter::new(store, options.template_id.clone()),
            store,
            audio,
            root_id,
            container_id,
            decks,
            report,
        })
    }

    async fn resolve_root(
        store: &S,
        index: &RemoteDirectoryIndex<'a, S>,
        options: &SyncOptions,
        report: &mut SyncReport,
    ) -> Result<String, SyncError> {
        if let Some(id) = &options.root_deck_id {
            match store.get_deck(id).await? {
                Some(deck) => {
                    tracing::info!("Using root deck {:?} ({})", deck.name, deck.id);
                    return Ok(deck.id);
                }
                None => tracing::warn!("Configured root deck {} not found, looking up by name", id),
            }
        }

        if let Some(id) = find_deck(index, None, &options.root_deck_name).await? {
            tracing::info!("Using root deck {:?} ({})", options.root_deck_name, id);
            return Ok(id);
        }

        let id = create_required(store, &options.root_deck_name, None, 0).await?;
        report.decks_created += 1;
        Ok(id)
    }

    pub fn root_id(&self) -> &str {
        &self.root_id
    }

    pub fn container_id(&self) -> &str {
        &self.container_id
    }


    /// Sync one record. Failures are logged and recorded, never returned.
    pub async fn sync_record(&mut self, record: &VocabularyRecord) -> RecordOutcome {
        match self.try_sync(record).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(
                    "Failed to sync {} ({}) in skill {:?}: {}",
                    record.hebrew,
                    record.translation,
                    record.skill.name,
                    e
                );
                self.report.failures.push(RecordFailure {
                    hebrew: record.hebrew.clone(),
                    translation: record.translation.clone(),
                    skill: record.skill.name.clone(),
                    error: e.to_string(),
                });
                RecordOutcome::Failed
            }
        }
    }

    async fn try_sync(&mut self, record: &VocabularyRecord) -> Result<RecordOutcome, RecordError> {
        let deck_id = self.ensure_deck(&record.skill).await?;
        let fingerprint = record.fingerprint();
        let existing = self.known_cards(&record.skill.name)?.get(&fingerprint).cloned();

        if let Some(existing) = existing {
            return self.reconcile_existing(record, &fingerprint, existing).await;
        }

        let card_id = self.writer.create_card(&deck_id, record).await?;
        self.report.cards_created += 1;
        tracing::info!(
            "Created card {} for {} ({}) in {:?}",
            card_id,
            record.hebrew,
            record.translation,
            record.skill.name
        );

        let audio = self.attach_if_available(&card_id, record).await;
        if let Ok(cards) = self.known_cards(&record.skill.name) {
            cards.insert(
                fingerprint,
                ExistingCard {
                    card_id: card_id.clone(),
                    has_audio: audio.is_some(),
                },
            );
        }
        Ok(RecordOutcome::Created { card_id, audio })
    }

    async fn reconcile_existing(
        &mut self,
        record: &VocabularyRecord,
        fingerprint: &Fingerprint,
        existing: ExistingCard,
    ) -> Result<RecordOutcome, RecordError> {
        if existing.has_audio {
            tracing::debug!("Skipping duplicate {} ({})", record.hebrew, record.translation);
            self.report.duplicates_skipped += 1;
            return Ok(RecordOutcome::Duplicate);
        }
        let Some(path) = self.audio.audio_for(record) else {
            tracing::debug!(
                "Skipping duplicate {} ({}), no audio",
                record.hebrew,
                record.translation
            );
            self.report.duplicates_skipped += 1;
            return Ok(RecordOutcome::Duplicate);
        };

        let file_name = self
            .writer
            .attach_audio(&existing.card_id, record, &path)
            .await?;
        self.report.audio_attached += 1;
        tracing::info!("Attached audio {} to card {}", file_name, existing.card_id);

        if let Some(card) = self.known_cards(&record.skill.name)?.get_mut(fingerprint) {
            card.has_audio = true;
        }
        Ok(RecordOutcome::AudioAttached {
            card_id: existing.card_id,
            file_name,
        })
    }

    /// Attach local audio to a freshly created card. The card stays even if
    /// this fails; a later run retries the attachment.
    async fn attach_if_available(
        &mut self,
        card_id: &str,
        record: &VocabularyRecord,
    ) -> Option<String> {
        let path = self.audio.audio_for(record)?;
        match self.writer.attach_audio(card_id, record, &path).await {
            Ok(file_name) => {
                self.report.audio_attached += 1;
                Some(file_name)
            }
            Err(e) => {
                tracing::warn!("Failed to attach audio to card {}: {}", card_id, e);
                None
            }
        }
    }

    /// Deck id for the skill, creating the deck on first sight.
    async fn ensure_deck(&mut self, skill: &SkillGroup) -> Result<String, RecordError> {
        if !self.decks.contains_key(&skill.name) {
            let deck = NewDeck {
                name: skill.deck_name(),
                parent_id: Some(self.container_id.clone()),
                sort: skill.ordinal,
            };
            let state = match self.store.create_deck(&deck).await {
                Ok(deck_id) => {
                    tracing::info!("Created deck {:?} ({})", deck.name, deck_id);
                    self.report.decks_created += 1;
                    DeckState::Ready {
                        deck_id,
                        cards: Some(HashMap::new()),
                    }
                }
                Err(e) => {
                    tracing::warn!("Failed to create deck {:?}: {}", deck.name, e);
                    self.decks.insert(skill.name.clone(), DeckState::Failed);
                    return Err(RecordError::Store(e));
                }
            };
            self.decks.insert(skill.name.clone(), state);
        }

        let needs_index = match self.decks.get(&skill.name) {
            Some(DeckState::Ready { cards: None, .. }) => true,
            Some(DeckState::Ready { .. }) => false,
            Some(DeckState::Failed) | None => return Err(RecordError::DeckUnavailable),
        };
        if needs_index {
            self.load_cards(&skill.name).await?;
        }

        match self.decks.get(&skill.name) {
            Some(DeckState::Ready { deck_id, .. }) => Ok(deck_id.clone()),
            _ => Err(RecordError::DeckUnavailable),
        }
    }

    async fn load_cards(&mut self, skill: &str) -> Result<(), RecordError> {
        let Some(DeckState::Ready { deck_id, .. }) = self.decks.get(skill) else {
            return Err(RecordError::DeckUnavailable);
        };
        let deck_id = deck_id.clone();

        match self.index.card_fingerprints(&deck_id, skill).await {
            Ok(fingerprints) => {
                tracing::debug!("Indexed {} cards in deck {}", fingerprints.len(), deck_id);
                self.decks.insert(
                    skill.to_string(),
                    DeckState::Ready {
                        deck_id,
                        cards: Some(fingerprints),
                    },
                );
                Ok(())
            }
            Err(e) => {
                // Without the card list every create could be a duplicate.
                tracing::warn!("Failed to list cards in deck {}: {}", deck_id, e);
                self.decks.insert(skill.to_string(), DeckState::Failed);
                Err(RecordError::Store(e))
            }
        }
    }

    fn known_cards(
        &mut self,
        skill: &str,
    ) -> Result<&mut HashMap<Fingerprint, ExistingCard>, RecordError> {
        match self.decks.get_mut(skill) {
            Some(DeckState::Ready {
                cards: Some(cards), ..
            }) => Ok(cards),
            _ => Err(RecordError::DeckUnavailable),
        }
    }

    pub fn report(&self) -> &SyncReport {
        &self.report
    }

    pub fn finish(self) -> SyncReport {
        self.report
    }
}

/// Per-record failure; never aborts the run.
#[derive(Debug, thiserror::Error)]
enum RecordError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("skill deck unavailable after an earlier failure")]
    DeckUnavailable,
}

async fn find_deck<S: CardStore>(
    index: &RemoteDirectoryIndex<'_, S>,
    parent_id: Option<&str>,
    name: &str,
) -> Result<Option<String>, StoreError> {
    let decks = index.list_subdecks(parent_id).await?;
    Ok(decks.into_iter().find(|d| d.name == name).map(|d| d.id))
}

async fn create_required<S: CardStore>(
    store: &S,
    name: &str,
    parent_id: Option<&str>,
    sort: i64,
) -> Result<String, SyncError> {
    let deck = NewDeck {
        name: name.to_string(),
        parent_id: parent_id.map(str::to_string),
        sort,
    };
    match store.create_deck(&deck).await {
        Ok(id) => {
            tracing::info!("Created deck {:?} ({})", name, id);
            Ok(id)
        }
        Err(source) => Err(SyncError::RequiredDeck {
            name: name.to_string(),
            source,
        }),
    }
}

/// Sync every record in order and return the run's report.
pub async fn sync_records<S, A, I>(
    store: &S,
    audio: &A,
    options: &SyncOptions,
    records: I,
) -> Result<SyncReport, SyncError>
where
    S: CardStore,
    A: AudioSource,
    I: IntoIterator<Item = VocabularyRecord>,
{
    let mut reconciler = Reconciler::prepare(store, audio, options).await?;
    for record in records {
        reconciler.sync_record(&record).await;
    }
    Ok(reconciler.finish())
}
