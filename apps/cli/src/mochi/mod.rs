//! Mochi remote card store: HTTP client, directory index and card writer.

pub mod client;
pub mod index;
pub mod types;
pub mod writer;

#[cfg(test)]
pub(crate) mod memory;

pub use client::MochiClient;
pub use index::{ExistingCard, RemoteDirectoryIndex, SkillDeck, PAGE_SIZE};
pub use types::{CardUpdate, NewCard, NewDeck, Page, RemoteCard, RemoteDeck};
pub use writer::CardWriter;

use crate::error::StoreError;

/// Operations the sync engine needs from a remote card store.
///
/// Every call is a single request; callers await each one before issuing the
/// next.
#[allow(async_fn_in_trait)]
pub trait CardStore {
    /// Cheap authenticated request used as a startup probe.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Fetch one deck, `None` if it does not exist.
    async fn get_deck(&self, deck_id: &str) -> Result<Option<RemoteDeck>, StoreError>;

    async fn list_decks_page(
        &self,
        parent_id: Option<&str>,
        bookmark: Option<String>,
        limit: usize,
    ) -> Result<Page<RemoteDeck>, StoreError>;

    async fn list_cards_page(
        &self,
        deck_id: &str,
        bookmark: Option<String>,
        limit: usize,
    ) -> Result<Page<RemoteCard>, StoreError>;

    /// Create a deck and return its id.
    async fn create_deck(&self, deck: &NewDeck) -> Result<String, StoreError>;

    /// Create a card and return its id.
    async fn create_card(&self, card: &NewCard) -> Result<String, StoreError>;

    async fn update_card(&self, card_id: &str, update: &CardUpdate) -> Result<(), StoreError>;

    async fn upload_attachment(
        &self,
        card_id: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<(), StoreError>;
}
