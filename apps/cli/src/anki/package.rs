//! `.apkg` packaging of vocabulary records.

use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use base64::Engine;
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};
use uuid::Uuid;
use vocab_core::{FieldKey, VocabularyRecord, NOT_APPLICABLE};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::collection::{CardRow, Collection, CollectionMeta, NoteRow};
use super::model::{model_json, stable_id, DEFAULT_CSS, MODEL_NAME, TEMPLATES};
use crate::config::SKILLS_DECK_NAME;
use crate::error::PackageError;

const COLLECTION_FILE: &str = "collection.anki2";
const MEDIA_MANIFEST: &str = "media";

/// Anki's built-in deck.
const DEFAULT_DECK_ID: i64 = 1;

struct PendingNote {
    record: VocabularyRecord,
    audio: Option<PathBuf>,
    guid: String,
}

/// Counts for a written package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PackageSummary {
    pub decks: usize,
    pub notes: usize,
    pub cards: usize,
    pub media: usize,
}

/// Collects records and writes them as one Anki package.
///
/// Notes land in `<root>::Skills::<NN>. <skill>` decks. Note GUIDs and deck
/// ids are derived from content so importing a newer package updates the
/// existing notes.
pub struct AnkiPackage {
    root_deck: String,
    css: String,
    skills: BTreeMap<String, Vec<PendingNote>>,
    guids: HashSet<String>,
}

impl AnkiPackage {
    pub fn new(root_deck: impl Into<String>) -> Self {
        Self {
            root_deck: root_deck.into(),
            css: DEFAULT_CSS.to_string(),
            skills: BTreeMap::new(),
            guids: HashSet::new(),
        }
    }

    pub fn with_css(mut self, css: impl Into<String>) -> Self {
        self.css = css.into();
        self
    }

    /// Queue a record. Returns `false` for a record already queued.
    pub fn add(&mut self, record: VocabularyRecord, audio: Option<PathBuf>) -> bool {
        let guid = note_guid(&record);
        if !self.guids.insert(guid.clone()) {
            tracing::debug!("Skipping duplicate note {} ({})", record.hebrew, record.translation);
            return false;
        }
        self.skills
            .entry(record.skill.sort_key())
            .or_default()
            .push(PendingNote {
                record,
                audio,
                guid,
            });
        true
    }

    pub fn len(&self) -> usize {
        self.guids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guids.is_empty()
    }

    fn skill_deck_name(&self, sort_key: &str) -> String {
        format!("{}::{}::{}", self.root_deck, SKILLS_DECK_NAME, sort_key)
    }

    /// Write the package to `output`, replacing any existing file.
    pub fn write(&self, output: &Path) -> Result<PackageSummary, PackageError> {
        let now = Utc::now();
        let now_ms = now.timestamp_millis();
        let model_id = stable_id(MODEL_NAME);

        let mut deck_names = vec![
            self.root_deck.clone(),
            format!("{}::{}", self.root_deck, SKILLS_DECK_NAME),
        ];
        deck_names.extend(self.skills.keys().map(|key| self.skill_deck_name(key)));

        let mut notes = Vec::new();
        let mut cards = Vec::new();
        let mut media: Vec<(String, PathBuf)> = Vec::new();
        let mut media_names = HashSet::new();
        let mut next_id = now_ms;

        for (sort_key, pending) in &self.skills {
            let deck_id = stable_id(&self.skill_deck_name(sort_key));
            for note in pending {
                let audio_name = note.audio.as_ref().and_then(|path| {
                    let name = path.file_name()?.to_str()?.to_string();
                    if media_names.insert(name.clone()) {
                        media.push((name.clone(), path.clone()));
                    }
                    Some(name)
                });

                let note_id = next_id;
                next_id += 1;
                let fields = note_fields(&note.record, sort_key, audio_name.as_deref());
                let sort_field = fields[0].clone();
                notes.push(NoteRow {
                    id: note_id,
                    guid: note.guid.clone(),
                    model_id,
                    checksum: field_checksum(&sort_field),
                    sort_field,
                    fields,
                });

                for ord in 0..TEMPLATES.len() {
                    cards.push(CardRow {
                        id: next_id,
                        note_id,
                        deck_id,
                        ord: ord as i64,
                        due: notes.len() as i64,
                    });
                    next_id += 1;
                }
            }
        }

        let first_skill_deck = deck_names
            .get(2)
            .map(|name| stable_id(name))
            .unwrap_or(DEFAULT_DECK_ID);
        let meta = CollectionMeta {
            created: now.timestamp() - now.timestamp() % 86_400,
            modified_ms: now_ms,
            conf: collection_conf(first_skill_deck, model_id),
            models: Value::Object(Map::from_iter([(
                model_id.to_string(),
                model_json(model_id, first_skill_deck, &self.css, now.timestamp()),
            )])),
            decks: decks_json(&deck_names, now.timestamp()),
            dconf: json!({ "1": deck_conf() }),
        };

        let scratch = output.with_extension(format!("{}.anki2", Uuid::new_v4().simple()));
        let result = Collection::create(&scratch)
            .and_then(|mut collection| collection.write(&meta, &notes, &cards))
            .map_err(PackageError::from)
            .and_then(|()| write_archive(output, &scratch, &media));
        if let Err(e) = std::fs::remove_file(&scratch) {
            tracing::debug!("Could not remove {}: {}", scratch.display(), e);
        }
        result?;

        let summary = PackageSummary {
            decks: deck_names.len(),
            notes: notes.len(),
            cards: cards.len(),
            media: media.len(),
        };
        tracing::info!(
            "Wrote {} notes ({} cards, {} media files) to {}",
            summary.notes,
            summary.cards,
            summary.media,
            output.display()
        );
        Ok(summary)
    }
}

/// Field values in model order.
///
/// Blank grammatical attributes stay empty so the templates' `{{#Gender}}`
/// style sections hide them.
fn note_fields(record: &VocabularyRecord, sort_key: &str, audio: Option<&str>) -> Vec<String> {
    let mut fields: Vec<String> = FieldKey::CARD
        .iter()
        .map(|&key| {
            let value = record.value(key).unwrap_or_default();
            match key {
                FieldKey::Gender | FieldKey::Number | FieldKey::Form if value == NOT_APPLICABLE => {
                    String::new()
                }
                _ => value.to_string(),
            }
        })
        .collect();
    fields.push(audio.map(|name| format!("[sound:{}]", name)).unwrap_or_default());
    fields.push(sort_key.to_string());
    fields
}

/// GUID from the record's identity, so re-exports keep note identity.
fn note_guid(record: &VocabularyRecord) -> String {
    let fp = record.fingerprint();
    let key = [
        fp.skill.as_str(),
        fp.translation.as_str(),
        fp.gender.as_str(),
        fp.number.as_str(),
        fp.form.as_str(),
        fp.word_type.as_str(),
    ]
    .join("\u{1f}");
    let digest = Sha256::digest(key.as_bytes());
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(&digest[..9])
}

fn field_checksum(field: &str) -> i64 {
    let digest = Sha256::digest(field.as_bytes());
    i64::from(u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]))
}

fn write_archive(
    output: &Path,
    collection: &Path,
    media: &[(String, PathBuf)],
) -> Result<(), PackageError> {
    let file = File::create(output)?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    zip.start_file(COLLECTION_FILE, options)?;
    zip.write_all(&std::fs::read(collection)?)?;

    let mut manifest = Map::new();
    for (index, (name, path)) in media.iter().enumerate() {
        manifest.insert(index.to_string(), Value::String(name.clone()));
        zip.start_file(index.to_string(), options)?;
        zip.write_all(&std::fs::read(path)?)?;
    }

    zip.start_file(MEDIA_MANIFEST, options)?;
    zip.write_all(serde_json::to_string(&Value::Object(manifest))?.as_bytes())?;

    zip.finish()?;
    Ok(())
}

fn decks_json(names: &[String], modified: i64) -> Value {
    let mut decks = Map::new();
    decks.insert(DEFAULT_DECK_ID.to_string(), deck_json(DEFAULT_DECK_ID, "Default", modified));
    for name in names {
        let id = stable_id(name);
        decks.insert(id.to_string(), deck_json(id, name, modified));
    }
    Value::Object(decks)
}

fn deck_json(id: i64, name: &str, modified: i64) -> Value {
    json!({
        "id": id,
        "name": name,
        "desc": "",
        "mod": modified,
        "usn": -1,
        "collapsed": false,
        "browserCollapsed": false,
        "newToday": [0, 0],
        "revToday": [0, 0],
        "lrnToday": [0, 0],
        "timeToday": [0, 0],
        "dyn": 0,
        "conf": 1,
        "extendNew": 10,
        "extendRev": 50,
    })
}

fn collection_conf(current_deck: i64, model_id: i64) -> Value {
    json!({
        "activeDecks": [current_deck],
        "curDeck": current_deck,
        "curModel": model_id.to_string(),
        "newSpread": 0,
        "collapseTime": 1200,
        "timeLim": 0,
        "estTimes": true,
        "dueCounts": true,
        "nextPos": 1,
        "sortType": "noteFld",
        "sortBackwards": false,
        "addToCur": true,
    })
}

fn deck_conf() -> Value {
    json!({
        "id": 1,
        "name": "Default",
        "mod": 0,
        "usn": 0,
        "maxTaken": 60,
        "autoplay": true,
        "timer": 0,
        "replayq": true,
        "dyn": false,
        "new": {
            "delays": [1, 10],
            "ints": [1, 4, 7],
            "initialFactor": 2500,
            "order": 1,
            "perDay": 20,
            "bury": true,
            "separate": true,
        },
        "rev": {
            "perDay": 200,
            "ease4": 1.3,
            "fuzz": 0.05,
            "ivlFct": 1,
            "maxIvl": 36500,
            "bury": true,
            "minSpace": 1,
        },
        "lapse": {
            "delays": [10],
            "mult": 0,
            "minInt": 1,
            "leechFails": 8,
            "leechAction": 0,
        },
    })
}
