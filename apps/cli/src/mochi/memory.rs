//! In-memory card store for tests.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;

use vocab_core::FieldKey;

use super::types::{CardUpdate, NewCard, NewDeck, Page, RemoteCard, RemoteDeck};
use super::CardStore;
use crate::error::StoreError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub card_id: String,
    pub file_name: String,
    pub size: usize,
}

/// Paginates by offset; the bookmark is the offset of the next page.
#[derive(Default)]
pub struct MemoryStore {
    decks: RefCell<Vec<RemoteDeck>>,
    cards: RefCell<Vec<RemoteCard>>,
    attachments: RefCell<Vec<Attachment>>,
    next_id: Cell<u32>,
    deck_page_requests: Cell<usize>,
    updates: Cell<usize>,
    unreachable: Cell<bool>,
    failing_decks: RefCell<HashSet<String>>,
    failing_cards: RefCell<HashSet<String>>,
    failing_uploads: Cell<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_deck(&self, deck: RemoteDeck) {
        self.decks.borrow_mut().push(deck);
    }

    pub fn insert_card(&self, card: RemoteCard) {
        self.cards.borrow_mut().push(card);
    }

    pub fn decks(&self) -> Vec<RemoteDeck> {
        self.decks.borrow().clone()
    }

    pub fn cards(&self) -> Vec<RemoteCard> {
        self.cards.borrow().clone()
    }

    pub fn attachments(&self) -> Vec<Attachment> {
        self.attachments.borrow().clone()
    }

    pub fn deck_page_requests(&self) -> usize {
        self.deck_page_requests.get()
    }

    pub fn updates(&self) -> usize {
        self.updates.get()
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.set(unreachable);
    }

    /// Deck creation fails for this name.
    pub fn fail_deck(&self, name: &str) {
        self.failing_decks.borrow_mut().insert(name.to_string());
    }

    /// Card creation fails for this translation.
    pub fn fail_card(&self, translation: &str) {
        self.failing_cards.borrow_mut().insert(translation.to_string());
    }

    pub fn fail_uploads(&self, fail: bool) {
        self.failing_uploads.set(fail);
    }

    fn id(&self, prefix: &str) -> String {
        let next = self.next_id.get() + 1;
        self.next_id.set(next);
        format!("{prefix}-{next}")
    }

    fn check_reachable(&self) -> Result<(), StoreError> {
        if self.unreachable.get() {
            Err(StoreError::Network("connection refused".to_string()))
        } else {
            Ok(())
        }
    }
}

fn paginate<T: Clone>(items: Vec<T>, bookmark: Option<String>, limit: usize) -> Page<T> {
    let start = bookmark.and_then(|b| b.parse::<usize>().ok()).unwrap_or(0);
    let end = (start + limit).min(items.len());
    let docs = items.get(start..end).map(<[T]>::to_vec).unwrap_or_default();
    let bookmark = (end < items.len()).then(|| end.to_string());
    Page::new(docs, bookmark)
}

fn server_error(message: &str) -> StoreError {
    StoreError::Backend {
        status: 500,
        message: message.to_string(),
    }
}

impl CardStore for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.check_reachable()
    }

    async fn get_deck(&self, deck_id: &str) -> Result<Option<RemoteDeck>, StoreError> {
        self.check_reachable()?;
        Ok(self.decks.borrow().iter().find(|d| d.id == deck_id).cloned())
    }

    async fn list_decks_page(
        &self,
        parent_id: Option<&str>,
        bookmark: Option<String>,
        limit: usize,
    ) -> Result<Page<RemoteDeck>, StoreError> {
        self.check_reachable()?;
        self.deck_page_requests.set(self.deck_page_requests.get() + 1);
        let decks: Vec<RemoteDeck> = self
            .decks
            .borrow()
            .iter()
            .filter(|d| parent_id.is_none() || d.parent_id.as_deref() == parent_id)
            .cloned()
            .collect();
        Ok(paginate(decks, bookmark, limit))
    }

    async fn list_cards_page(
        &self,
        deck_id: &str,
        bookmark: Option<String>,
        limit: usize,
    ) -> Result<Page<RemoteCard>, StoreError> {
        self.check_reachable()?;
        let cards: Vec<RemoteCard> = self
            .cards
            .borrow()
            .iter()
            .filter(|c| c.deck_id == deck_id)
            .cloned()
            .collect();
        Ok(paginate(cards, bookmark, limit))
    }

    async fn create_deck(&self, deck: &NewDeck) -> Result<String, StoreError> {
        self.check_reachable()?;
        if self.failing_decks.borrow().contains(&deck.name) {
            return Err(server_error("deck rejected"));
        }
        let id = self.id("deck");
        self.insert_deck(RemoteDeck {
            id: id.clone(),
            name: deck.name.clone(),
            parent_id: deck.parent_id.clone(),
            sort: Some(deck.sort),
        });
        Ok(id)
    }

    async fn create_card(&self, card: &NewCard) -> Result<String, StoreError> {
        self.check_reachable()?;
        let translation = card
            .fields
            .get(FieldKey::Translation.id())
            .map(|f| f.value.clone())
            .unwrap_or_default();
        if self.failing_cards.borrow().contains(&translation) {
            return Err(server_error("card rejected"));
        }
        let id = self.id("card");
        self.insert_card(RemoteCard {
            id: id.clone(),
            deck_id: card.deck_id.clone(),
            content: card.content.clone(),
            fields: card.fields.clone(),
        });
        Ok(id)
    }

    async fn update_card(&self, card_id: &str, update: &CardUpdate) -> Result<(), StoreError> {
        self.check_reachable()?;
        let mut cards = self.cards.borrow_mut();
        let card = cards
            .iter_mut()
            .find(|c| c.id == card_id)
            .ok_or_else(|| StoreError::Backend {
                status: 404,
                message: format!("card {card_id} not found"),
            })?;
        card.fields = update.fields.clone();
        self.updates.set(self.updates.get() + 1);
        Ok(())
    }

    async fn upload_attachment(
        &self,
        card_id: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<(), StoreError> {
        self.check_reachable()?;
        if self.failing_uploads.get() {
            return Err(server_error("upload rejected"));
        }
        self.attachments.borrow_mut().push(Attachment {
            card_id: card_id.to_string(),
            file_name: file_name.to_string(),
            size: bytes.len(),
        });
        Ok(())
    }
}
