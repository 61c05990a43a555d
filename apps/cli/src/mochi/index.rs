//! Read-only view of the remote deck hierarchy and card fingerprints.

use std::collections::HashMap;
use std::future::Future;

use vocab_core::{fingerprint_from_fields, Fingerprint, SkillGroup};

use super::types::{Page, RemoteCard, RemoteDeck};
use super::CardStore;
use crate::error::StoreError;

/// Items requested per listing call.
pub const PAGE_SIZE: usize = 100;

/// A skill deck found under the skills container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillDeck {
    pub deck_id: String,
    pub skill: SkillGroup,
}

/// A remote card matched by fingerprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingCard {
    pub card_id: String,
    pub has_audio: bool,
}

/// Paginated listings over a [`CardStore`].
pub struct RemoteDirectoryIndex<'a, S> {
    store: &'a S,
    page_size: usize,
}

impl<'a, S: CardStore> RemoteDirectoryIndex<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self::with_page_size(store, PAGE_SIZE)
    }

    pub fn with_page_size(store: &'a S, page_size: usize) -> Self {
        Self {
            store,
            page_size: page_size.max(1),
        }
    }

    /// Direct children of `parent_id`, or top-level decks for `None`.
    pub async fn list_subdecks(
        &self,
        parent_id: Option<&str>,
    ) -> Result<Vec<RemoteDeck>, StoreError> {
        let store = self.store;
        let limit = self.page_size;
        let decks =
            drain_pages(move |bookmark| store.list_decks_page(parent_id, bookmark, limit)).await?;

        // The filter parameter is advisory; enforce it here.
        Ok(decks
            .into_iter()
            .filter(|deck| deck.parent_id.as_deref() == parent_id)
            .collect())
    }

    /// All cards stored in `deck_id`.
    pub async fn list_cards(&self, deck_id: &str) -> Result<Vec<RemoteCard>, StoreError> {
        let store = self.store;
        let limit = self.page_size;
        let cards =
            drain_pages(move |bookmark| store.list_cards_page(deck_id, bookmark, limit)).await?;

        Ok(cards.into_iter().filter(|card| card.deck_id == deck_id).collect())
    }

    /// Skill decks under `parent_id`, keyed by skill name.
    ///
    /// Decks whose names do not parse as `"<n>. <skill>"` and the notes deck
    /// are left out. When two decks share a skill name the first one listed
    /// wins.
    pub async fn skill_decks(
        &self,
        parent_id: &str,
    ) -> Result<HashMap<String, SkillDeck>, StoreError> {
        let mut decks = HashMap::new();
        for deck in self.list_subdecks(Some(parent_id)).await? {
            let Some(skill) = SkillGroup::parse_deck_name(&deck.name) else {
                tracing::debug!("Ignoring non-skill deck {:?} ({})", deck.name, deck.id);
                continue;
            };
            if decks.contains_key(&skill.name) {
                tracing::warn!("Duplicate remote deck for skill {:?}: {}", skill.name, deck.id);
                continue;
            }
            decks.insert(
                skill.name.clone(),
                SkillDeck {
                    deck_id: deck.id,
                    skill,
                },
            );
        }
        Ok(decks)
    }

    /// Fingerprints of the cards in a skill deck.
    pub async fn card_fingerprints(
        &self,
        deck_id: &str,
        skill: &str,
    ) -> Result<HashMap<Fingerprint, ExistingCard>, StoreError> {
        let mut fingerprints = HashMap::new();
        for card in self.list_cards(deck_id).await? {
            let Some(fingerprint) = fingerprint_from_fields(&card.fields, skill) else {
                tracing::debug!("Card {} has no translation, not indexed", card.id);
                continue;
            };
            let has_audio = card.has_audio();
            fingerprints
                .entry(fingerprint)
                .and_modify(|existing: &mut ExistingCard| existing.has_audio |= has_audio)
                .or_insert(ExistingCard {
                    card_id: card.id,
                    has_audio,
                });
        }
        Ok(fingerprints)
    }
}

/// Follow bookmarks until the listing is exhausted.
///
/// Stops when a page is empty, carries no bookmark, or repeats the bookmark
/// it was requested with.
pub(crate) async fn drain_pages<T, F, Fut>(mut fetch: F) -> Result<Vec<T>, StoreError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>, StoreError>>,
{
    let mut items = Vec::new();
    let mut bookmark: Option<String> = None;

    loop {
        let page = fetch(bookmark.clone()).await?;
        let exhausted = page.docs.is_empty();
        items.extend(page.docs);

        match page.bookmark {
            Some(next) if !exhausted && bookmark.as_deref() != Some(next.as_str()) => {
                bookmark = Some(next);
            }
            _ => break,
        }
    }

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mochi::memory::MemoryStore;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use vocab_core::{FieldKey, FieldMap, FieldValue};

    fn deck(id: &str, name: &str, parent: Option<&str>) -> RemoteDeck {
        RemoteDeck {
            id: id.to_string(),
            name: name.to_string(),
            parent_id: parent.map(str::to_string),
            sort: None,
        }
    }

    fn card(id: &str, deck_id: &str, translation: Option<&str>, audio: bool) -> RemoteCard {
        let mut fields = FieldMap::new();
        if let Some(t) = translation {
            fields.insert(
                FieldKey::Translation.id().to_string(),
                FieldValue::new(FieldKey::Translation, t),
            );
        }
        if audio {
            fields.insert(
                FieldKey::Audio.id().to_string(),
                FieldValue::new(FieldKey::Audio, "![audio](@media/a.mp3)"),
            );
        }
        RemoteCard {
            id: id.to_string(),
            deck_id: deck_id.to_string(),
            content: String::new(),
            fields,
        }
    }

    #[tokio::test]
    async fn drain_stops_on_non_advancing_cursor() {
        let requested = RefCell::new(Vec::new());
        let items = drain_pages(|bookmark: Option<String>| {
            requested.borrow_mut().push(bookmark.clone());
            let page = match bookmark.as_deref() {
                None => Page::new(vec![1, 2], Some("b1".to_string())),
                Some("b1") => Page::new(vec![3, 4], Some("b2".to_string())),
                // Page 3 hands back the cursor it was asked with.
                Some("b2") => Page::new(vec![5], Some("b2".to_string())),
                Some(other) => panic!("unexpected bookmark {other}"),
            };
            async move { Ok(page) }
        })
        .await
        .unwrap();

        assert_eq!(items, vec![1, 2, 3, 4, 5]);
        assert_eq!(
            *requested.borrow(),
            vec![None, Some("b1".to_string()), Some("b2".to_string())]
        );
    }

    #[tokio::test]
    async fn drain_stops_without_bookmark() {
        let calls = RefCell::new(0);
        let items = drain_pages(|_| {
            *calls.borrow_mut() += 1;
            async { Ok(Page::new(vec!["only"], None)) }
        })
        .await
        .unwrap();
        assert_eq!(items, vec!["only"]);
        assert_eq!(*calls.borrow(), 1);
    }

    #[tokio::test]
    async fn drain_stops_on_empty_page() {
        let calls = RefCell::new(0);
        let items: Vec<u8> = drain_pages(|bookmark: Option<String>| {
            *calls.borrow_mut() += 1;
            let next = format!("{}x", bookmark.unwrap_or_default());
            async move { Ok(Page::new(Vec::new(), Some(next))) }
        })
        .await
        .unwrap();
        assert!(items.is_empty());
        assert_eq!(*calls.borrow(), 1);
    }

    #[tokio::test]
    async fn drain_propagates_errors() {
        let result: Result<Vec<u8>, _> = drain_pages(|_| async {
            Err(StoreError::Network("connection refused".to_string()))
        })
        .await;
        assert!(matches!(result, Err(StoreError::Network(_))));
    }

    #[tokio::test]
    async fn list_subdecks_follows_pages() {
        let store = MemoryStore::new();
        for i in 0..7 {
            store.insert_deck(deck(&format!("d{i}"), &format!("{i}. Skill {i}"), Some("skills")));
        }
        store.insert_deck(deck("other", "1. Elsewhere", Some("root")));

        let index = RemoteDirectoryIndex::with_page_size(&store, 3);
        let decks = index.list_subdecks(Some("skills")).await.unwrap();
        assert_eq!(decks.len(), 7);
        assert_eq!(store.deck_page_requests(), 3);
    }

    #[tokio::test]
    async fn top_level_listing_excludes_children() {
        let store = MemoryStore::new();
        store.insert_deck(deck("root", "Hebrew Vocabulary", None));
        store.insert_deck(deck("skills", "Skills", Some("root")));

        let index = RemoteDirectoryIndex::new(&store);
        let decks = index.list_subdecks(None).await.unwrap();
        assert_eq!(decks, vec![deck("root", "Hebrew Vocabulary", None)]);
    }

    #[tokio::test]
    async fn skill_decks_skip_notes_and_unnumbered() {
        let store = MemoryStore::new();
        store.insert_deck(deck("d12", "12. Food", Some("skills")));
        store.insert_deck(deck("d3", "3. Notes", Some("skills")));
        store.insert_deck(deck("misc", "Misc", Some("skills")));

        let index = RemoteDirectoryIndex::new(&store);
        let decks = index.skill_decks("skills").await.unwrap();
        assert_eq!(decks.len(), 1);
        assert_eq!(
            decks["Food"],
            SkillDeck {
                deck_id: "d12".to_string(),
                skill: SkillGroup::new(12, "Food"),
            }
        );
    }

    #[tokio::test]
    async fn card_fingerprints_skip_cards_without_translation() {
        let store = MemoryStore::new();
        store.insert_card(card("c1", "d1", Some("bread"), true));
        store.insert_card(card("c2", "d1", None, false));
        store.insert_card(card("c3", "d2", Some("water"), false));

        let index = RemoteDirectoryIndex::new(&store);
        let fingerprints = index.card_fingerprints("d1", "Food").await.unwrap();
        assert_eq!(fingerprints.len(), 1);

        let (fingerprint, existing) = fingerprints.into_iter().next().unwrap();
        assert_eq!(fingerprint.translation, "bread");
        assert_eq!(fingerprint.skill, "Food");
        assert_eq!(
            existing,
            ExistingCard {
                card_id: "c1".to_string(),
                has_audio: true,
            }
        );
    }
}
