//! Wire types for the Mochi API.

use serde::{Deserialize, Serialize};
use vocab_core::{FieldKey, FieldMap};

/// One page of a listing.
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub docs: Vec<T>,
    #[serde(default)]
    pub bookmark: Option<String>,
}

impl<T> Page<T> {
    pub fn new(docs: Vec<T>, bookmark: Option<String>) -> Self {
        Self { docs, bookmark }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RemoteDeck {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RemoteCard {
    pub id: String,
    pub deck_id: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub fields: FieldMap,
}

impl RemoteCard {
    pub fn has_audio(&self) -> bool {
        self.fields
            .get(FieldKey::Audio.id())
            .is_some_and(|f| !f.value.trim().is_empty())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct NewDeck {
    pub name: String,
    pub parent_id: Option<String>,
    pub sort: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct NewCard {
    pub content: String,
    pub deck_id: String,
    pub template_id: String,
    pub fields: FieldMap,
}

/// Body of a card update; only the structured fields change.
#[derive(Debug, Clone, Serialize)]
pub struct CardUpdate {
    pub fields: FieldMap,
}

/// Response to a create call; only the id is used.
#[derive(Debug, Deserialize)]
pub(crate) struct Created {
    pub id: String,
}
