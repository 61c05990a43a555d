//! Writing an Anki collection database.

use std::path::Path;

use rusqlite::{params, Connection};
use serde_json::Value;

use super::schema::{SCHEMA, SCHEMA_VERSION};

/// Separator between note fields in `notes.flds`.
pub const FIELD_SEPARATOR: char = '\u{1f}';

pub(crate) struct NoteRow {
    pub id: i64,
    pub guid: String,
    pub model_id: i64,
    pub fields: Vec<String>,
    pub sort_field: String,
    pub checksum: i64,
}

pub(crate) struct CardRow {
    pub id: i64,
    pub note_id: i64,
    pub deck_id: i64,
    pub ord: i64,
    pub due: i64,
}

/// Collection-level JSON blobs stored in the single `col` row.
pub(crate) struct CollectionMeta {
    pub created: i64,
    pub modified_ms: i64,
    pub conf: Value,
    pub models: Value,
    pub decks: Value,
    pub dconf: Value,
}

pub(crate) struct Collection {
    conn: Connection,
}

impl Collection {
    /// Create an empty collection at `path`.
    pub fn create<P: AsRef<Path>>(path: P) -> rusqlite::Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Write metadata, notes and cards in one transaction.
    pub fn write(
        &mut self,
        meta: &CollectionMeta,
        notes: &[NoteRow],
        cards: &[CardRow],
    ) -> rusqlite::Result<()> {
        let modified = meta.modified_ms / 1000;
        let tx = self.conn.transaction()?;

        tx.execute(
            "INSERT OR REPLACE INTO col (id, crt, mod, scm, ver, dty, usn, ls, conf, models, decks, dconf, tags)
             VALUES (1, ?1, ?2, ?3, ?4, 0, 0, 0, ?5, ?6, ?7, ?8, '{}')",
            params![
                meta.created,
                meta.modified_ms,
                meta.modified_ms,
                SCHEMA_VERSION,
                meta.conf.to_string(),
                meta.models.to_string(),
                meta.decks.to_string(),
                meta.dconf.to_string(),
            ],
        )?;

        {
            let mut insert_note = tx.prepare(
                "INSERT INTO notes (id, guid, mid, mod, usn, tags, flds, sfld, csum, flags, data)
                 VALUES (?1, ?2, ?3, ?4, -1, '', ?5, ?6, ?7, 0, '')",
            )?;
            for note in notes {
                let flds = note.fields.join(&FIELD_SEPARATOR.to_string());
                insert_note.execute(params![
                    note.id,
                    note.guid,
                    note.model_id,
                    modified,
                    flds,
                    note.sort_field,
                    note.checksum,
                ])?;
            }

            let mut insert_card = tx.prepare(
                "INSERT INTO cards (id, nid, did, ord, mod, usn, type, queue, due, ivl, factor, reps, lapses, left, odue, odid, flags, data)
                 VALUES (?1, ?2, ?3, ?4, ?5, -1, 0, 0, ?6, 0, 0, 0, 0, 0, 0, 0, 0, '')",
            )?;
            for card in cards {
                insert_card.execute(params![
                    card.id,
                    card.note_id,
                    card.deck_id,
                    card.ord,
                    modified,
                    card.due,
                ])?;
            }
        }

        tx.commit()
    }
}
