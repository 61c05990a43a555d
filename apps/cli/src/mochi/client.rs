//! HTTP client for the Mochi API.

use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

use super::types::{CardUpdate, Created, NewCard, NewDeck, Page, RemoteCard, RemoteDeck};
use super::CardStore;
use crate::config::MochiConfig;
use crate::error::StoreError;

const AUDIO_MIME: &str = "audio/mpeg";

/// Authenticated Mochi client.
pub struct MochiClient {
    client: Client,
    config: MochiConfig,
}

impl MochiClient {
    pub fn new(config: MochiConfig) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| StoreError::Network(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url, path.trim_start_matches('/'))
    }

    /// Basic auth with the API key as username and an empty password.
    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .basic_auth(&self.config.api_key, None::<&str>)
            .header(reqwest::header::ACCEPT, "application/json")
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, StoreError> {
        let resp = self
            .authed(request)
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            return Err(StoreError::Backend { status, message });
        }
        Ok(resp)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, StoreError> {
        self.send(request)
            .await?
            .json()
            .await
            .map_err(|e| StoreError::Parse(e.to_string()))
    }

    fn page_query(
        filter: (&'static str, Option<&str>),
        bookmark: Option<String>,
        limit: usize,
    ) -> Vec<(&'static str, String)> {
        let mut query = vec![("limit", limit.to_string())];
        if let (key, Some(value)) = filter {
            query.push((key, value.to_string()));
        }
        if let Some(bookmark) = bookmark {
            query.push(("bookmark", bookmark));
        }
        query
    }
}

impl CardStore for MochiClient {
    async fn ping(&self) -> Result<(), StoreError> {
        let request = self.client.get(self.url("decks/")).query(&[("limit", "1")]);
        self.send(request).await.map(|_| ())
    }

    async fn get_deck(&self, deck_id: &str) -> Result<Option<RemoteDeck>, StoreError> {
        let request = self.client.get(self.url(&format!("decks/{}", deck_id)));
        match self.send_json(request).await {
            Ok(deck) => Ok(Some(deck)),
            Err(StoreError::Backend { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn list_decks_page(
        &self,
        parent_id: Option<&str>,
        bookmark: Option<String>,
        limit: usize,
    ) -> Result<Page<RemoteDeck>, StoreError> {
        let query = Self::page_query(("parent-id", parent_id), bookmark, limit);
        let request = self.client.get(self.url("decks/")).query(&query);
        self.send_json(request).await
    }

    async fn list_cards_page(
        &self,
        deck_id: &str,
        bookmark: Option<String>,
        limit: usize,
    ) -> Result<Page<RemoteCard>, StoreError> {
        let query = Self::page_query(("deck-id", Some(deck_id)), bookmark, limit);
        let request = self.client.get(self.url("cards/")).query(&query);
        self.send_json(request).await
    }

    async fn create_deck(&self, deck: &NewDeck) -> Result<String, StoreError> {
        let request = self.client.post(self.url("decks/")).json(deck);
        let created: Created = self.send_json(request).await?;
        Ok(created.id)
    }

    async fn create_card(&self, card: &NewCard) -> Result<String, StoreError> {
        let request = self.client.post(self.url("cards/")).json(card);
        let created: Created = self.send_json(request).await?;
        Ok(created.id)
    }

    async fn update_card(&self, card_id: &str, update: &CardUpdate) -> Result<(), StoreError> {
        let request = self
            .client
            .post(self.url(&format!("cards/{}", card_id)))
            .json(update);
        self.send(request).await.map(|_| ())
    }

    async fn upload_attachment(
        &self,
        card_id: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<(), StoreError> {
        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(AUDIO_MIME)
            .map_err(|e| StoreError::Parse(e.to_string()))?;
        let form = Form::new().part("file", part);

        let request = self
            .client
            .post(self.url(&format!("cards/{}/attachments/{}", card_id, file_name)))
            .multipart(form);
        self.send(request).await.map(|_| ())
    }
}
